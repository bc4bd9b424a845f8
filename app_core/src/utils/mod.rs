// shared, entity-agnostic helpers

pub mod validation;
