use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::fmt;
use uuid::Uuid;

pub type Id = Uuid;

pub type Timestamp = DateTime<Utc>;

pub fn generate_id() -> Id {
    Uuid::new_v4()
}

/// Current time at the precision PostgreSQL keeps for `TIMESTAMPTZ`, so a
/// value survives a round trip through the store unchanged.
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

/// Next `updated_at` for an entity last written at `previous`.
///
/// Always later than `previous`, even when the clock has not moved since.
pub fn next_update_time(previous: Timestamp) -> Timestamp {
    now().max(previous + Duration::microseconds(1))
}

/// Persisted resource kinds, used to label store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    UserAudio,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::User => write!(f, "User"),
            Resource::UserAudio => write!(f, "Audio"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_update_time_is_strictly_later() {
        let far_future = now() + Duration::hours(1);
        let next = next_update_time(far_future);
        assert!(next > far_future);

        let past = now() - Duration::hours(1);
        assert!(next_update_time(past) > past);
    }

    #[test]
    fn test_now_has_microsecond_precision() {
        let ts = now();
        assert_eq!(ts.timestamp_subsec_nanos() % 1_000, 0);
    }
}
