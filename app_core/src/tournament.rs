//! tournament aggregate root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentStatus {
    Registration,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentVisibility {
    Public,
    Private,
}

/// the two bracket structures the structure builder can produce; doubles as the
/// stage type tag since each tournament currently has exactly one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentFormat {
    League,
    SingleElim,
}

impl TournamentFormat {
    pub fn as_seed_str(&self) -> &'static str {
        match self {
            TournamentFormat::League => "LEAGUE",
            TournamentFormat::SingleElim => "SINGLE_ELIM",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tournament {
    pub id: Uuid,
    /// row version, used by the database port to detect concurrent writers
    pub version: i64,
    pub owner_id: Uuid,
    pub name: String,
    pub visibility: TournamentVisibility,
    pub status: TournamentStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// minutes of mandatory gap between two matches of the same player
    pub game_gaps: i32,
    pub team_size: i32,
}

impl Tournament {
    pub fn is_locked_for_build(&self) -> bool {
        matches!(
            self.status,
            TournamentStatus::Running | TournamentStatus::Finished
        )
    }
}
