//! database port: the collaborator contract the core needs from persistence.
//!
//! split into one sub-trait per entity, the way the postgres adapter crate is
//! organized one file per entity; `DatabasePort` is the umbrella the core holds.

use crate::{Entrant, Match, MatchUpdate, NewMatch, Tournament, TournamentFormat, UserAvailability};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

pub trait DatabasePort: DbpTournament + DbpStage + DbpMatch + DbpAvailability + Send + Sync {}
impl<T: DbpTournament + DbpStage + DbpMatch + DbpAvailability + Send + Sync> DatabasePort for T {}

#[async_trait]
pub trait DbpTournament: Send + Sync {
    /// load and row-lock a tournament for the duration of the caller's transaction
    async fn load_tournament_for_update(&self, tournament_id: Uuid) -> DbResult<Option<Tournament>>;

    /// persist a tournament's mutable fields (status, at minimum)
    async fn save_tournament(&self, tournament: &Tournament) -> DbResult<()>;

    /// load ACTIVE entrants together with their distinct member counts
    async fn load_active_entrants_with_member_counts(
        &self,
        tournament_id: Uuid,
    ) -> DbResult<Vec<(Entrant, usize)>>;

    /// remove entrants (and their memberships) by id, used to prune incomplete teams
    async fn delete_entrants_by_id(&self, entrant_ids: &[Uuid]) -> DbResult<()>;

    /// entrant id -> captain user id; callers treat a missing entry as a hard failure
    async fn load_captains(&self, entrant_ids: &[Uuid]) -> DbResult<HashMap<Uuid, Uuid>>;
}

#[async_trait]
pub trait DbpStage: Send + Sync {
    /// true if the tournament already has at least one stage
    async fn tournament_has_stage(&self, tournament_id: Uuid) -> DbResult<bool>;

    /// create a stage for a tournament and return its id
    async fn insert_stage(
        &self,
        tournament_id: Uuid,
        format: TournamentFormat,
        config: serde_json::Value,
    ) -> DbResult<Uuid>;
}

#[async_trait]
pub trait DbpMatch: Send + Sync {
    async fn bulk_insert_matches(&self, matches: &[NewMatch]) -> DbResult<Vec<Match>>;

    async fn bulk_update_matches(&self, updates: &[MatchUpdate]) -> DbResult<()>;

    /// matches of a stage ordered by (round_number, match_order), used to locate byes
    async fn load_stage_matches(&self, stage_id: Uuid) -> DbResult<Vec<Match>>;

    /// matches that already have scheduled_at and touch any of the given entrants
    async fn load_already_scheduled_matches_touching(
        &self,
        entrant_ids: &[Uuid],
    ) -> DbResult<Vec<Match>>;

    /// unscheduled, fully-populated matches of a tournament, ordered by id
    async fn load_unscheduled_matches(&self, tournament_id: Uuid) -> DbResult<Vec<Match>>;
}

#[async_trait]
pub trait DbpAvailability: Send + Sync {
    async fn load_availabilities(&self, user_ids: &[Uuid]) -> DbResult<Vec<UserAvailability>>;
}

#[derive(Debug, Error)]
pub enum DbError {
    /// update could not find a matching id + version
    #[error("optimistic lock conflict")]
    OptimisticLockConflict,

    /// id does not exist
    #[error("entity not found")]
    NotFound,

    /// constraint name if returned from the database
    #[error("unique violation{0:?}")]
    UniqueViolation(Option<String>),

    /// constraint name if returned from the database
    #[error("foreign key violation{0:?}")]
    ForeignKeyViolation(Option<String>),

    /// constraint name if returned from the database
    #[error("check violation{0:?}")]
    CheckViolation(Option<String>),

    /// transient db problem, retry may work
    #[error("serialization failure")]
    SerializationFailure,

    /// connection, pool, or other db error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DbResult<T> = Result<T, DbError>;
