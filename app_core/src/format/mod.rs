// bracket/structure generators, one per supported tournament format

pub mod league;
pub mod single_elim;
