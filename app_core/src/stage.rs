//! a single phase of a tournament, containing matches of one format

use crate::TournamentFormat;
use serde_json::Value as Json;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Stage {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub stage_type: TournamentFormat,
    pub stage_order: i32,
    pub best_of_default: i32,
    pub config: Json,
}

impl Stage {
    pub fn bracket_size(&self) -> Option<u32> {
        self.config.get("bracket_size")?.as_u64().map(|v| v as u32)
    }
}
