use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Conversation between two users, optionally anchored to a listing.
/// Lookups OR-match the participant pair in either order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub participant1_id: Uuid,
    pub participant2_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.participant1_id == user_id || self.participant2_id == user_id
    }

    /// The participant that is not `user_id`
    pub fn other_participant(&self, user_id: Uuid) -> Uuid {
        if self.participant1_id == user_id {
            self.participant2_id
        } else {
            self.participant1_id
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_participant_resolves_by_equality() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let conv = Conversation {
            id: Uuid::new_v4(),
            participant1_id: a,
            participant2_id: b,
            listing_id: None,
            created_at: chrono::Utc::now(),
        };
        assert_eq!(conv.other_participant(a), b);
        assert_eq!(conv.other_participant(b), a);
        assert!(conv.involves(a) && conv.involves(b));
        assert!(!conv.involves(Uuid::new_v4()));
    }
}
