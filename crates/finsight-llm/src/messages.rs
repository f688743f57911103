//! Conversation turns

use serde::{Deserialize, Serialize};

/// Who wrote a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// The model's own earlier output
    Assistant,
}

/// A single text turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles() {
        assert_eq!(Message::user("Analyze MSFT").role, Role::User);
        assert_eq!(Message::assistant("MSFT looks fairly valued").role, Role::Assistant);
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(Message::assistant("Hold")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "assistant", "text": "Hold" }));
    }
}
