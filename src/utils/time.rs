//! Timestamp helpers shared by the link-request lifecycle.

use crate::error::{constants, GatepassError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Get the current timestamp in milliseconds
///
/// # Errors
/// Returns a `GatepassError::Custom` if the system time is earlier than UNIX_EPOCH
pub fn current_timestamp() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .map_err(|_| GatepassError::Custom(constants::ERR_SYSTEM_TIME.into()))
}

/// Get the current timestamp in whole seconds.
///
/// Link requests stamp and compare their `requested_at` field in epoch
/// seconds, matching the persistence schema's `requestTime` column.
pub fn epoch_seconds() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .map_err(|_| GatepassError::Custom(constants::ERR_SYSTEM_TIME.into()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_are_consistent() {
        let millis = current_timestamp().unwrap();
        let seconds = epoch_seconds().unwrap();
        // Same clock, two granularities
        assert!(millis / 1000 >= seconds);
        assert!(millis / 1000 - seconds <= 1);
    }
}
