//! Login-attempt throttling.
//!
//! A sliding window of failed attempts per client key. Once a key has
//! `max_attempts` failures inside the window, every further attempt is
//! rejected until the oldest failure ages out. Successful logins are never
//! counted. Keys whose failures have all aged out are dropped whenever a new
//! failure is recorded, so the table only holds keys active within one
//! window.

use std::{
  collections::{HashMap, VecDeque},
  sync::{Mutex, PoisonError},
  time::{Duration, Instant},
};

use rolo_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
  pub max_attempts: u32,
  pub window:       Duration,
}

impl Default for ThrottlePolicy {
  fn default() -> Self {
    Self { max_attempts: 3, window: Duration::from_secs(10 * 60) }
  }
}

#[derive(Debug, Default)]
pub struct LoginThrottle {
  policy:   ThrottlePolicy,
  failures: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl LoginThrottle {
  pub fn new(policy: ThrottlePolicy) -> Self {
    Self { policy, failures: Mutex::default() }
  }

  pub fn policy(&self) -> ThrottlePolicy { self.policy }

  /// Fail with `TooManyRequests` if `key` has used up its attempts.
  pub fn check(&self, key: &str) -> Result<()> {
    let now = Instant::now();
    let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
    let blocked = match failures.get_mut(key) {
      Some(window) => {
        self.prune(window, now);
        let count = window.len();
        if count == 0 {
          failures.remove(key);
        }
        count >= self.policy.max_attempts as usize
      }
      None => false,
    };

    if blocked {
      Err(Error::TooManyRequests(
        "too many login attempts, please try again later".into(),
      ))
    } else {
      Ok(())
    }
  }

  pub fn record_failure(&self, key: &str) {
    let now = Instant::now();
    let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
    failures.retain(|_, window| {
      self.prune(window, now);
      !window.is_empty()
    });
    failures.entry(key.to_owned()).or_default().push_back(now);
  }

  /// Number of keys currently holding failures.
  pub fn tracked_keys(&self) -> usize {
    self.failures.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  fn prune(&self, window: &mut VecDeque<Instant>, now: Instant) {
    while window
      .front()
      .is_some_and(|t| now.duration_since(*t) >= self.policy.window)
    {
      window.pop_front();
    }
  }
}
