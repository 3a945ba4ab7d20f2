//! Millisecond Unix timestamps for payment proofs.
//!
//! A [`PaymentProof`](crate::proto::PaymentProof) records the instant it was
//! created as milliseconds since the Unix epoch. Unlike second-resolution
//! authorization windows, the proof timestamp travels as a bare JSON integer.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::time::{Duration, SystemTime};

/// Milliseconds since the Unix epoch (1970-01-01T00:00:00Z).
///
/// # Serialization
///
/// Serialized as a JSON integer:
///
/// ```json
/// 1699999999123
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, PartialOrd, Ord, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnixMillis(u64);

impl Display for UnixMillis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UnixMillis {
    fn from(millis: u64) -> Self {
        Self(millis)
    }
}

impl UnixMillis {
    /// Creates a new [`UnixMillis`] from a raw milliseconds value.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the current system time as a [`UnixMillis`].
    ///
    /// A clock set before the Unix epoch yields zero.
    #[must_use]
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }

    /// Returns the timestamp as raw milliseconds since the Unix epoch.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }
}
