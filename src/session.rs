use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use std::fmt;

const SUFFIX_LEN: usize = 9;

/// Identifier correlating every request from one client run with one
/// backend-side conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh `session_<epoch-millis>_<base36 suffix>` identifier.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .filter_map(|_| std::char::from_digit(rng.gen_range(0..36), 36))
            .collect();

        SessionId(format!("session_{}_{}", Utc::now().timestamp_millis(), suffix))
    }

    /// Wrap an identifier handed in from outside (e.g. `--session`).
    pub fn from_existing(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(SessionId(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_has_expected_shape() {
        let id = SessionId::generate();
        let parts: Vec<&str> = id.as_str().split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn two_ids_differ() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn blank_external_id_is_rejected() {
        assert!(SessionId::from_existing("   ").is_none());
        assert_eq!(
            SessionId::from_existing("session_1_abc").map(|s| s.to_string()),
            Some("session_1_abc".to_string())
        );
    }
}
