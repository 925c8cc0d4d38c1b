//! Topic key definitions and parsing.

use serde::{Deserialize, Serialize};

/// Logical addressable channel that zero or more live connections
/// subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum TopicKey {
    /// Personal notification channel of one user.
    User(i64),
    /// Chat room of one ride.
    Conversation(i64),
}

impl TopicKey {
    /// Parses a topic string into a typed key.
    pub fn parse(topic: &str) -> Option<Self> {
        let (kind, id) = topic.split_once(':')?;
        let id: i64 = id.parse().ok()?;
        match kind {
            "user" => Some(TopicKey::User(id)),
            "conversation" => Some(TopicKey::Conversation(id)),
            _ => None,
        }
    }
}

impl std::fmt::Display for TopicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopicKey::User(id) => write!(f, "user:{id}"),
            TopicKey::Conversation(id) => write!(f, "conversation:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        assert_eq!(TopicKey::parse("user:7"), Some(TopicKey::User(7)));
        assert_eq!(
            TopicKey::parse("conversation:42"),
            Some(TopicKey::Conversation(42))
        );
        assert_eq!(TopicKey::User(7).to_string(), "user:7");
        assert_eq!(TopicKey::Conversation(42).to_string(), "conversation:42");
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(TopicKey::parse("admin:sessions"), None);
        assert_eq!(TopicKey::parse("user:abc"), None);
        assert_eq!(TopicKey::parse("user"), None);
    }
}
