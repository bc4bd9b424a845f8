//! a single match within a stage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
    Canceled,
}

#[derive(Debug, Clone)]
pub struct Match {
    pub id: Uuid,
    /// row version, used by the database port to detect concurrent writers
    pub version: i64,
    pub stage_id: Uuid,
    pub round_number: i32,
    pub match_order: i32,
    pub best_of: i32,
    pub status: MatchStatus,
    pub entrant1: Option<Uuid>,
    pub entrant2: Option<Uuid>,
    pub score1: Option<i32>,
    pub score2: Option<i32>,
    /// 1 or 2, set once the match (or bye) has a winner
    pub winner_slot: Option<u8>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn has_both_entrants(&self) -> bool {
        self.entrant1.is_some() && self.entrant2.is_some()
    }

    pub fn captains_entrants(&self) -> Vec<Uuid> {
        [self.entrant1, self.entrant2].into_iter().flatten().collect()
    }
}

/// a match shell not yet persisted; the database port assigns its id on insert.
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub stage_id: Uuid,
    pub round_number: i32,
    pub match_order: i32,
    pub best_of: i32,
    pub status: MatchStatus,
    pub entrant1: Option<Uuid>,
    pub entrant2: Option<Uuid>,
}

/// a partial update applied to an existing match row; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct MatchUpdate {
    pub id: Uuid,
    pub status: Option<MatchStatus>,
    pub entrant1: Option<Uuid>,
    pub entrant2: Option<Uuid>,
    pub score1: Option<i32>,
    pub score2: Option<i32>,
    pub winner_slot: Option<u8>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl MatchUpdate {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}
