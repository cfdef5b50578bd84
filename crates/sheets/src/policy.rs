//! Retry and read-cache policies applied at call sites.

use std::time::{Duration, Instant};

use crate::client::SheetsError;

/// Errors that may succeed on a second try.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for SheetsError {
    fn is_transient(&self) -> bool {
        SheetsError::is_transient(self)
    }
}

/// Fixed attempt budget with linear backoff (`delay * attempt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// First authenticated call.
    pub fn auth() -> Self {
        Self::new(3, Duration::from_secs(1))
    }

    /// Worksheet values fetch.
    pub fn fetch() -> Self {
        Self::new(2, Duration::from_secs(1))
    }

    /// Single attempt.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Run `op` until it succeeds, fails permanently, or the budget runs out.
pub fn with_retry<T, E, F>(policy: &RetryPolicy, what: &str, op: F) -> Result<T, E>
where
    E: Transient + std::fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    retry_with_sleep(policy, what, op, std::thread::sleep)
}

fn retry_with_sleep<T, E, F, S>(
    policy: &RetryPolicy,
    what: &str,
    mut op: F,
    mut sleep: S,
) -> Result<T, E>
where
    E: Transient + std::fmt::Display,
    F: FnMut() -> Result<T, E>,
    S: FnMut(Duration),
{
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let wait = policy.delay * attempt;
                log::warn!(
                    "{}: attempt {}/{} failed ({}); retrying in {:?}",
                    what,
                    attempt,
                    policy.max_attempts,
                    e,
                    wait
                );
                sleep(wait);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// One cached value with a time-to-live.
#[derive(Debug)]
pub struct TimedCache<T> {
    ttl: Duration,
    entry: Option<(Instant, T)>,
}

impl<T: Clone> TimedCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value if it has not expired.
    pub fn get(&self) -> Option<T> {
        match &self.entry {
            Some((at, value)) if at.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        }
    }

    pub fn insert(&mut self, value: T) {
        self.entry = Some((Instant::now(), value));
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Cached value, or compute, store and return a fresh one. Errors are
    /// not cached.
    pub fn get_or_try_insert_with<E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.get() {
            return Ok(value);
        }
        let value = f()?;
        self.insert(value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn quick(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO)
    }

    #[test]
    fn retries_transient_until_success() {
        let calls = Cell::new(0);
        let result: Result<u32, SheetsError> = with_retry(&quick(3), "open", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(SheetsError::Http(503, "busy".into()))
            } else {
                Ok(7)
            }
        });
        assert_eq!(result, Ok(7));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn gives_up_after_budget() {
        let calls = Cell::new(0);
        let result: Result<(), SheetsError> = with_retry(&quick(2), "open", || {
            calls.set(calls.get() + 1);
            Err(SheetsError::Network("reset".into()))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn permanent_errors_fail_fast() {
        let calls = Cell::new(0);
        let result: Result<(), SheetsError> = with_retry(&quick(5), "open", || {
            calls.set(calls.get() + 1);
            Err(SheetsError::NotAuthenticated)
        });
        assert_eq!(result, Err(SheetsError::NotAuthenticated));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn backoff_grows_linearly() {
        let policy = RetryPolicy::new(3, Duration::from_millis(250));
        let mut waits = Vec::new();
        let result: Result<(), SheetsError> = retry_with_sleep(
            &policy,
            "fetch",
            || Err(SheetsError::Http(429, "slow down".into())),
            |d| waits.push(d),
        );
        assert!(result.is_err());
        assert_eq!(waits, vec![Duration::from_millis(250), Duration::from_millis(500)]);
    }

    #[test]
    fn no_sleep_after_success_or_permanent_error() {
        let mut waits = Vec::new();
        let ok: Result<u32, SheetsError> =
            retry_with_sleep(&RetryPolicy::auth(), "auth", || Ok(1), |d| waits.push(d));
        assert_eq!(ok, Ok(1));
        let denied: Result<u32, SheetsError> = retry_with_sleep(
            &RetryPolicy::auth(),
            "auth",
            || Err(SheetsError::NotAuthenticated),
            |d| waits.push(d),
        );
        assert!(denied.is_err());
        assert!(waits.is_empty());
    }

    #[test]
    fn presets() {
        assert_eq!(RetryPolicy::auth().max_attempts, 3);
        assert_eq!(RetryPolicy::fetch().max_attempts, 2);
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn cache_hits_until_invalidated() {
        let mut cache = TimedCache::new(Duration::from_secs(60));
        let calls = Cell::new(0);
        let fetch = || -> Result<u32, SheetsError> {
            calls.set(calls.get() + 1);
            Ok(calls.get())
        };

        assert_eq!(cache.get_or_try_insert_with(fetch), Ok(1));
        assert_eq!(cache.get_or_try_insert_with(fetch), Ok(1));
        cache.invalidate();
        assert_eq!(cache.get_or_try_insert_with(fetch), Ok(2));
    }

    #[test]
    fn zero_ttl_never_hits() {
        let mut cache = TimedCache::new(Duration::ZERO);
        cache.insert(1);
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn errors_are_not_cached() {
        let mut cache: TimedCache<u32> = TimedCache::new(Duration::from_secs(60));
        let r: Result<u32, SheetsError> =
            cache.get_or_try_insert_with(|| Err(SheetsError::Network("x".into())));
        assert!(r.is_err());
        assert_eq!(cache.get(), None);
    }
}
