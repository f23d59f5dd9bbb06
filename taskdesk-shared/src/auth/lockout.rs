/// Login-attempt lockout policy
///
/// Every account is in one of two states: `Active` (fewer than
/// [`MAX_FAILED_ATTEMPTS`] consecutive failures, no live lock) or `Locked`
/// (`locked_until` lies in the future). Three consecutive wrong passwords
/// lock the account for five minutes; a successful login or an admin
/// unlock resets the failure counter and clears the lock.
///
/// Lock expiry alone does NOT reset the counter: an account that waits out
/// its lock and fails once more is re-locked immediately, because the
/// post-increment count is still at or above the threshold. Only
/// [`record_success`]/[`unlock_account`] reset it.
///
/// The pure functions in this module make every decision; storage effects
/// go through [`crate::models::user::User`], where the failure-counter
/// increment and the conditional lock are a single atomic
/// `UPDATE … RETURNING` statement. Concurrent failed attempts therefore
/// cannot both observe the pre-increment count.
///
/// # Login flow contract
///
/// 1. Check the lock first; a locked account is rejected with the
///    remaining minutes (rounded up) regardless of password correctness.
/// 2. Only on password mismatch, record a failure.
/// 3. Only on password match, record a success.
///
/// Failure and success paths are mutually exclusive per attempt.
///
/// # Example
///
/// ```no_run
/// use chrono::Utc;
/// use sqlx::PgPool;
/// use taskdesk_shared::auth::lockout::{authenticate, AuthResult, LoginError};
///
/// # async fn example(pool: PgPool) -> Result<(), LoginError> {
/// match authenticate(&pool, "ada@example.com", "hunter2!", Utc::now()).await? {
///     AuthResult::Success(user) => println!("welcome {}", user.name),
///     AuthResult::InvalidCredentials { attempts_remaining } => {
///         println!("wrong password ({attempts_remaining:?} attempts left)")
///     }
///     AuthResult::AccountLocked { minutes_remaining } => {
///         println!("locked for another {minutes_remaining} minute(s)")
///     }
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::warn;

use super::password::{self, PasswordError};
use crate::models::user::User;

/// Consecutive failures at which an account locks
pub const MAX_FAILED_ATTEMPTS: i32 = 3;

/// How long a triggered lock lasts
///
/// Fixed; there is no backoff growth on repeated lockouts. A cycle of
/// three failures always yields exactly this window, including when it
/// re-triggers right after an earlier lock expired.
pub const LOCK_DURATION_MINUTES: i64 = 5;

/// Error type for the authentication flow
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// Password hash could not be verified (malformed stored hash)
    #[error("Password verification failed: {0}")]
    Password(#[from] PasswordError),

    /// Storage failure; no state mutation may be assumed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of recording one failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The attempt tripped (or kept) the lock
    Locked {
        /// When the lock expires
        until: DateTime<Utc>,
    },

    /// Still active; this many attempts remain before the lock triggers
    AttemptsRemaining(i32),
}

/// Outcome of one authentication attempt, free of transport framing
#[derive(Debug, Clone)]
pub enum AuthResult {
    /// Password matched; the failure counter has been reset
    Success(User),

    /// Password mismatch or unknown account
    InvalidCredentials {
        /// Attempts left before the account locks; None when the email did
        /// not match an account (there is no counter to report, and the
        /// response must not reveal which case occurred)
        attempts_remaining: Option<i32>,
    },

    /// Account is locked
    AccountLocked {
        /// Remaining lock time, rounded up to whole minutes
        minutes_remaining: i64,
    },
}

/// Returns true iff `locked_until` is set and strictly in the future
///
/// Pure check, no side effects.
pub fn is_locked(locked_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    matches!(locked_until, Some(until) if until > now)
}

/// Remaining lock time in whole minutes, rounded up
///
/// Returns 0 when the lock has already expired.
pub fn minutes_remaining(locked_until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (locked_until - now).num_seconds().max(0);
    (seconds + 59) / 60
}

/// Lock expiry for a lock triggered at `now`
pub fn lock_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(LOCK_DURATION_MINUTES)
}

/// Decides what a failure that brought the counter to `new_count` means
///
/// `new_count` is the post-increment value. At or above
/// [`MAX_FAILED_ATTEMPTS`] the account locks until `now` plus the lock
/// duration; below it, the remaining attempts are reported.
pub fn failure_outcome(new_count: i32, now: DateTime<Utc>) -> FailureOutcome {
    if new_count >= MAX_FAILED_ATTEMPTS {
        FailureOutcome::Locked { until: lock_expiry(now) }
    } else {
        FailureOutcome::AttemptsRemaining(MAX_FAILED_ATTEMPTS - new_count)
    }
}

/// Runs one authentication attempt against the credential store
///
/// Implements the login flow contract above. `now` is passed in rather
/// than read from the clock so the decision is deterministic given current
/// state.
///
/// # Errors
///
/// Storage and hash-parsing failures propagate; no retry, and the caller
/// may not assume any partial state change.
pub async fn authenticate(
    pool: &PgPool,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<AuthResult, LoginError> {
    let Some(user) = User::find_by_email(pool, email).await? else {
        // Unknown account: same outward result as a wrong password, with
        // no counter to report.
        return Ok(AuthResult::InvalidCredentials { attempts_remaining: None });
    };

    // Lock check comes first; while locked, password correctness is never
    // evaluated.
    if let Some(until) = user.locked_until {
        if until > now {
            return Ok(AuthResult::AccountLocked {
                minutes_remaining: minutes_remaining(until, now),
            });
        }
    }

    if password::verify_password(password, &user.password_hash)? {
        User::clear_failed_attempts(pool, user.id).await?;
        return Ok(AuthResult::Success(user));
    }

    // Wrong password: atomic increment, then interpret the post-increment
    // state.
    let state =
        User::record_failed_attempt(pool, user.id, MAX_FAILED_ATTEMPTS, lock_expiry(now)).await?;

    let Some(state) = state else {
        // Account deleted between the lookup and the update.
        return Ok(AuthResult::InvalidCredentials { attempts_remaining: None });
    };

    match failure_outcome(state.failed_login_attempts, now) {
        FailureOutcome::Locked { .. } => {
            warn!(user_id = %user.id, "account locked after repeated failed logins");
            let until = state.locked_until.unwrap_or_else(|| lock_expiry(now));
            Ok(AuthResult::AccountLocked {
                minutes_remaining: minutes_remaining(until, now),
            })
        }
        FailureOutcome::AttemptsRemaining(left) => Ok(AuthResult::InvalidCredentials {
            attempts_remaining: Some(left),
        }),
    }
}

/// Resets an account's lockout state
///
/// The admin unlock action; shares its storage operation with the
/// successful-login reset and is just as idempotent.
///
/// # Returns
///
/// True if the target account exists, false otherwise
pub async fn unlock_account(pool: &PgPool, user_id: uuid::Uuid) -> Result<bool, sqlx::Error> {
    User::clear_failed_attempts(pool, user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_is_locked_requires_future_expiry() {
        let now = t0();

        assert!(!is_locked(None, now));
        assert!(!is_locked(Some(now), now), "expiry equal to now is not locked");
        assert!(!is_locked(Some(now - Duration::seconds(1)), now));
        assert!(is_locked(Some(now + Duration::seconds(1)), now));
        assert!(is_locked(Some(now + Duration::minutes(5)), now));
    }

    #[test]
    fn test_minutes_remaining_rounds_up() {
        let now = t0();

        assert_eq!(minutes_remaining(now + Duration::minutes(5), now), 5);
        assert_eq!(minutes_remaining(now + Duration::seconds(301), now), 6);
        assert_eq!(minutes_remaining(now + Duration::seconds(61), now), 2);
        assert_eq!(minutes_remaining(now + Duration::seconds(60), now), 1);
        assert_eq!(minutes_remaining(now + Duration::seconds(1), now), 1);
        assert_eq!(minutes_remaining(now, now), 0);
        assert_eq!(minutes_remaining(now - Duration::minutes(1), now), 0);
    }

    #[test]
    fn test_minutes_remaining_decreases_as_time_advances() {
        let now = t0();
        let until = lock_expiry(now);

        let mut last = minutes_remaining(until, now);
        for elapsed in [60, 120, 180, 240, 300] {
            let later = now + Duration::seconds(elapsed);
            let current = minutes_remaining(until, later);
            assert!(current < last, "{current} should be below {last}");
            last = current;
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn test_failure_outcome_below_threshold_reports_remaining() {
        let now = t0();

        assert_eq!(failure_outcome(1, now), FailureOutcome::AttemptsRemaining(2));
        assert_eq!(failure_outcome(2, now), FailureOutcome::AttemptsRemaining(1));
    }

    #[test]
    fn test_failure_outcome_locks_at_threshold() {
        let now = t0();

        let outcome = failure_outcome(MAX_FAILED_ATTEMPTS, now);
        assert_eq!(outcome, FailureOutcome::Locked { until: now + Duration::minutes(5) });
    }

    #[test]
    fn test_failure_outcome_relocks_past_threshold() {
        // The counter is not reset by lock expiry, so the failure after a
        // waited-out lock arrives with a count above the threshold and must
        // re-lock immediately.
        let now = t0();

        assert_eq!(
            failure_outcome(MAX_FAILED_ATTEMPTS + 1, now),
            FailureOutcome::Locked { until: now + Duration::minutes(5) }
        );
    }

    #[test]
    fn test_lock_expiry_is_five_minutes_out() {
        let now = t0();
        assert_eq!(lock_expiry(now) - now, Duration::minutes(LOCK_DURATION_MINUTES));
    }

    #[test]
    fn test_lock_duration_does_not_grow() {
        // Two full fail-lock cycles produce identical windows.
        let first = failure_outcome(3, t0());
        let second = failure_outcome(6, t0() + Duration::minutes(10));

        let FailureOutcome::Locked { until: first_until } = first else {
            panic!("first cycle should lock");
        };
        let FailureOutcome::Locked { until: second_until } = second else {
            panic!("second cycle should lock");
        };

        assert_eq!(first_until - t0(), Duration::minutes(5));
        assert_eq!(second_until - (t0() + Duration::minutes(10)), Duration::minutes(5));
    }

    #[test]
    fn test_minutes_remaining_at_lock_instant_is_five() {
        let now = t0();
        let FailureOutcome::Locked { until } = failure_outcome(3, now) else {
            panic!("should lock");
        };
        assert_eq!(minutes_remaining(until, now), 5);
    }

    // authenticate()/unlock_account() hit the database and are covered in
    // tests/lockout_db_tests.rs.
}
