//! entrant (player or team) and its memberships

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntrantStatus {
    Active,
    Dropped,
    Disqualified,
}

#[derive(Debug, Clone)]
pub struct Entrant {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub name: String,
    pub status: EntrantStatus,
}

impl Entrant {
    pub fn is_active(&self) -> bool {
        self.status == EntrantStatus::Active
    }
}

#[derive(Debug, Clone)]
pub struct EntrantMember {
    pub id: Uuid,
    pub entrant_id: Uuid,
    pub user_id: Uuid,
    pub is_captain: bool,
}
