//! In-memory storage for browser sessions.
//!
//! Each browser (identified by the session cookie) gets a `BrowserSession`
//! holding its remote API session and its practise state. Sessions expire
//! after a configurable duration of inactivity.

use crate::api::ApiSession;
use crate::config;
use crate::practise::SessionState;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Everything the server keeps for one browser
#[derive(Debug, Clone)]
pub struct BrowserSession {
  /// Remote session, present while signed in
  pub remote: Option<ApiSession>,
  pub practise: SessionState,
}

impl BrowserSession {
  fn new(feedback_clear_ms: u64) -> Self {
    Self {
      remote: None,
      practise: SessionState::new(feedback_clear_ms),
    }
  }

  /// Forget the remote session and everything practised under it
  pub fn reset_auth(&mut self) {
    self.remote = None;
    self.practise.sign_out();
  }
}

/// Session entry with last access time for expiration
struct SessionEntry {
  session: BrowserSession,
  last_access: DateTime<Utc>,
}

pub struct SessionStore {
  sessions: Mutex<HashMap<String, SessionEntry>>,
  expiry: Duration,
  feedback_clear_ms: u64,
}

impl SessionStore {
  pub fn new(expiry_hours: i64, feedback_clear_ms: u64) -> Self {
    Self {
      sessions: Mutex::new(HashMap::new()),
      expiry: Duration::hours(expiry_hours),
      feedback_clear_ms,
    }
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
    self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Run `f` on the session for `session_id`, creating it if missing or
  /// expired. The store stays locked while `f` runs, so `f` must not block.
  pub fn with<R>(&self, session_id: &str, f: impl FnOnce(&mut BrowserSession) -> R) -> R {
    self.with_at(session_id, Utc::now(), f)
  }

  fn with_at<R>(&self, session_id: &str, now: DateTime<Utc>, f: impl FnOnce(&mut BrowserSession) -> R) -> R {
    let mut sessions = self.lock();

    // Clean up expired sessions occasionally (~10% chance)
    if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
      cleanup_expired(&mut sessions, now - self.expiry);
    }

    let entry = sessions
      .entry(session_id.to_string())
      .or_insert_with(|| SessionEntry {
        session: BrowserSession::new(self.feedback_clear_ms),
        last_access: now,
      });
    if entry.last_access < now - self.expiry {
      tracing::debug!("Session {} expired, starting over", session_id);
      entry.session = BrowserSession::new(self.feedback_clear_ms);
    }
    entry.last_access = now;
    f(&mut entry.session)
  }

  #[cfg(test)]
  fn len(&self) -> usize {
    self.lock().len()
  }
}

/// Clean up expired sessions
fn cleanup_expired(sessions: &mut HashMap<String, SessionEntry>, cutoff: DateTime<Utc>) {
  sessions.retain(|_, entry| entry.last_access > cutoff);
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
