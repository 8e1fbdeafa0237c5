//! Records persisted by the companion and the store contract the core
//! depends on. `SqliteStore` in `db.rs` is the shipped implementation.

use crate::error::StoreError;
use crate::personality::PersonalityProfile;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
    System,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Ai => "ai",
            Sender::System => "system",
        }
    }

}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "ai" => Ok(Sender::Ai),
            "system" => Ok(Sender::System),
            other => Err(format!("unknown sender '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: String,
}

/// One row of the conversation list, newest day first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationInfo {
    pub id: String,
    pub day: NaiveDate,
    pub day_label: String,
    pub last_message: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationStats {
    pub total_conversations: i64,
    pub total_messages: i64,
    pub user_messages: i64,
    pub ai_messages: i64,
}

/// Persistence contract. Implementations serialize access per conversation.
pub trait ConversationStore: Send + Sync {
    /// Latest-updated profile; the default one is created on first use.
    fn get_current_personality(&self) -> Result<PersonalityProfile, StoreError>;

    /// Replaces the current profile wholesale.
    fn save_personality(&self, profile: &PersonalityProfile) -> Result<(), StoreError>;

    fn get_or_create_conversation_for(&self, day: NaiveDate) -> Result<String, StoreError>;

    fn append_message(
        &self,
        conversation_id: &str,
        sender: Sender,
        text: &str,
    ) -> Result<Message, StoreError>;

    /// Last `limit` messages, in chronological order.
    fn recent_messages(&self, conversation_id: &str, limit: usize) -> Result<Vec<Message>, StoreError>;

    fn full_history(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError>;

    fn list_conversations(&self, today: NaiveDate) -> Result<Vec<ConversationInfo>, StoreError>;

    fn delete_conversation(&self, conversation_id: &str) -> Result<(), StoreError>;

    fn stats(&self) -> Result<ConversationStats, StoreError>;

    fn reset_personality(&self) -> Result<PersonalityProfile, StoreError> {
        let profile = PersonalityProfile::default();
        self.save_personality(&profile)?;
        Ok(profile)
    }
}

/// "Hoje", "Ontem", or dd/mm/yyyy.
pub fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    if day == today {
        "Hoje".to_string()
    } else if today.pred_opt() == Some(day) {
        "Ontem".to_string()
    } else {
        day.format("%d/%m/%Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_label() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(day_label(today, today), "Hoje");
        assert_eq!(day_label(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(), today), "Ontem");
        assert_eq!(day_label(NaiveDate::from_ymd_opt(2024, 2, 20).unwrap(), today), "20/02/2024");
    }

    #[test]
    fn test_sender_round_trip_names() {
        for sender in [Sender::User, Sender::Ai, Sender::System] {
            assert_eq!(sender.as_str().parse::<Sender>(), Ok(sender));
        }
        assert!("bot".parse::<Sender>().is_err());
    }
}
