// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deadline arithmetic on the monotonic clock.

use std::time::Duration;

use tokio::time::Instant;

use super::ExecError;

/// Absolute deadline `timeout` from now. Overflow propagates as an error
/// rather than saturating.
pub(crate) fn deadline_after(timeout: Duration) -> Result<Instant, ExecError> {
    Instant::now()
        .checked_add(timeout)
        .ok_or(ExecError::DeadlineOverflow)
}
