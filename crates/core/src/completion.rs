//! Pure accrual and completion rules for timed lessons.
//!
//! Every path that can complete a timed lesson funnels through this module,
//! so the completion ceiling lives in exactly one place: accrued time never
//! exceeds the required duration, and reaching it flips the record to
//! completed at exactly that duration.

/// Server-side policy for accepting client time submissions.
///
/// Clients report in `submit_interval_secs` batches; `tolerance_secs` absorbs
/// scheduling jitter on the client timer. A single submission is never
/// credited for more than `max_increment_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitPolicy {
    pub submit_interval_secs: u32,
    pub tolerance_secs: u32,
}

impl SubmitPolicy {
    /// Largest amount of watch time a single submission may credit.
    #[must_use]
    pub const fn max_increment_secs(&self) -> u32 {
        self.submit_interval_secs + self.tolerance_secs
    }
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            submit_interval_secs: 15,
            tolerance_secs: 5,
        }
    }
}

/// Result of applying accrued time against a required duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementOutcome {
    /// Still short of the required duration.
    Partial { total_secs: u32 },
    /// Required duration reached; `total_secs` is clamped to exactly it.
    Completed { total_secs: u32 },
}

impl IncrementOutcome {
    #[must_use]
    pub fn total_secs(&self) -> u32 {
        match self {
            Self::Partial { total_secs } | Self::Completed { total_secs } => *total_secs,
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Apply one client-reported increment to the saved total.
///
/// `saved_secs` is `None` when no progress record exists yet. The elapsed
/// amount is clamped to the policy's per-submission maximum before it is
/// added. `required_secs` must be positive; untimed lessons never reach the
/// accrual path.
#[must_use]
pub fn apply_increment(
    saved_secs: Option<u32>,
    elapsed_secs: u32,
    required_secs: u32,
    policy: &SubmitPolicy,
) -> IncrementOutcome {
    let credited = elapsed_secs.min(policy.max_increment_secs());
    let total = saved_secs.unwrap_or(0).saturating_add(credited);
    resolve(total, required_secs)
}

/// Apply an explicitly assigned duration, as used by support tooling.
///
/// Skips the per-submission clamp but still runs the ceiling rule, so an
/// assigned duration at or past the requirement completes the lesson at
/// exactly the required duration.
#[must_use]
pub fn apply_explicit_duration(duration_secs: u32, required_secs: u32) -> IncrementOutcome {
    resolve(duration_secs, required_secs)
}

fn resolve(total_secs: u32, required_secs: u32) -> IncrementOutcome {
    if total_secs >= required_secs {
        IncrementOutcome::Completed {
            total_secs: required_secs,
        }
    } else {
        IncrementOutcome::Partial { total_secs }
    }
}
