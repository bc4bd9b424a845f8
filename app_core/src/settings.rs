//! process-wide scheduling configuration, read once at job start.

use chrono_tz::Tz;
use std::str::FromStr;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    /// the timezone in which `UserAvailability` weekly offsets are interpreted.
    pub local_tz: Tz,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self { local_tz: Tz::UTC }
    }
}

impl SchedulerSettings {
    /// reads `TOURNAMENT_SCHEDULING_TZ`, defaulting to UTC if unset or unparseable.
    pub fn from_env() -> Self {
        let local_tz = std::env::var("TOURNAMENT_SCHEDULING_TZ")
            .ok()
            .and_then(|v| Tz::from_str(&v).ok())
            .unwrap_or(Tz::UTC);
        Self { local_tz }
    }
}
