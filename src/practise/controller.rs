//! Async orchestration of practise transitions and vocabulary API calls.
//!
//! Every operation follows the same pattern: lock the session, run a
//! transition, unlock, await the API, then lock again to apply the result.
//! The session lock is never held across an `.await`.

use std::sync::Arc;

use chrono::Utc;

use super::state::{AnswerOutcome, LoadOutcome, LoadTicket};
use super::view::PractiseView;
use crate::api::{ApiError, ApiSession, LogOnError, Result, VocabularyApi};
use crate::domain::{
  Completion, EntryId, ExampleSentence, ExerciseMode, ProgressSummary, Provenance, Resolution,
  VocabularyEntry,
};
use crate::session::SessionStore;

#[derive(Clone)]
pub struct PractiseController {
  api: Arc<dyn VocabularyApi>,
  sessions: Arc<SessionStore>,
  log_give_up: bool,
}

impl PractiseController {
  pub fn new(api: Arc<dyn VocabularyApi>, sessions: Arc<SessionStore>, log_give_up: bool) -> Self {
    Self {
      api,
      sessions,
      log_give_up,
    }
  }

  /// Current view of the session
  pub fn view(&self, session_id: &str) -> PractiseView {
    self
      .sessions
      .with(session_id, |s| PractiseView::build(&s.practise, Utc::now()))
  }

  pub fn username(&self, session_id: &str) -> Option<String> {
    self
      .sessions
      .with(session_id, |s| s.remote.as_ref().map(|r| r.username.clone()))
  }

  /// Remote session of a signed-in browser
  fn remote(&self, session_id: &str) -> Result<ApiSession> {
    self
      .sessions
      .with(session_id, |s| s.remote.clone())
      .ok_or(ApiError::Unauthorized)
  }

  /// Any auth failure resets the browser session the same way
  fn guard<T>(&self, session_id: &str, remote: &ApiSession, result: Result<T>) -> Result<T> {
    if result.as_ref().is_err_and(ApiError::is_unauthorized) {
      reset_if_current(&self.sessions, session_id, remote);
    }
    result
  }

  // ==================== Sign-in / sign-out ====================

  pub async fn sign_in(&self, session_id: &str, username: &str, password: &str) -> Result<PractiseView> {
    let remote = self.api.sign_in(username, password).await?;
    let entries = match self.api.fetch_entries(&remote).await {
      Ok(entries) => entries,
      Err(err) => {
        self.api.sign_out(&remote).await.log_warn("Remote sign-out failed");
        return Err(err);
      }
    };
    tracing::info!("{} signed in with {} entries", remote.username, entries.len());

    Ok(self.sessions.with(session_id, |s| {
      s.remote = Some(remote);
      s.practise.sign_in(entries);
      PractiseView::build(&s.practise, Utc::now())
    }))
  }

  pub async fn sign_out(&self, session_id: &str) -> PractiseView {
    let (remote, view) = self.sessions.with(session_id, |s| {
      let remote = s.remote.take();
      s.reset_auth();
      (remote, PractiseView::build(&s.practise, Utc::now()))
    });
    if let Some(remote) = remote {
      self.api.sign_out(&remote).await.log_warn("Remote sign-out failed");
    }
    view
  }

  // ==================== Mode & loading ====================

  pub async fn select_mode(&self, session_id: &str, mode: ExerciseMode) -> Result<PractiseView> {
    let remote = self.remote(session_id)?;
    let ticket = self
      .sessions
      .with(session_id, |s| s.practise.select_mode(mode, &mut rand::rng()));
    self.load(session_id, &remote, ticket).await
  }

  pub fn change_mode(&self, session_id: &str) -> PractiseView {
    self.sessions.with(session_id, |s| {
      s.practise.change_mode();
      PractiseView::build(&s.practise, Utc::now())
    })
  }

  pub async fn next(&self, session_id: &str) -> Result<PractiseView> {
    let remote = self.remote(session_id)?;
    let ticket = self
      .sessions
      .with(session_id, |s| s.practise.request_next(&mut rand::rng()));
    self.load(session_id, &remote, ticket).await
  }

  /// Request the exercise named by `ticket` and apply it if still current
  async fn load(&self, session_id: &str, remote: &ApiSession, ticket: Option<LoadTicket>) -> Result<PractiseView> {
    let Some(ticket) = ticket else {
      return Ok(self.view(session_id));
    };
    tracing::debug!("Loading {} exercise for entry {}", ticket.mode.as_str(), ticket.entry_id);

    let outcome = match ticket.mode {
      ExerciseMode::Flashcard(direction) => {
        let result = self.api.request_flashcard(remote, ticket.entry_id, direction).await;
        self.sessions.with(session_id, |s| {
          s.practise.apply_flashcard(ticket, result, &mut rand::rng())
        })
      }
      ExerciseMode::Cloze => {
        let result = self.api.request_cloze(remote, ticket.entry_id).await;
        self.sessions.with(session_id, |s| s.practise.apply_cloze(ticket, result))
      }
    };

    if outcome == LoadOutcome::SignedOut {
      reset_if_current(&self.sessions, session_id, remote);
      return Err(ApiError::Unauthorized);
    }
    Ok(self.view(session_id))
  }

  /// Re-fetch the entry set and let the session react to it
  async fn refresh_entries(&self, session_id: &str, remote: &ApiSession) -> Result<PractiseView> {
    let entries = self.api.fetch_entries(remote).await;
    let entries = self.guard(session_id, remote, entries)?;
    let ticket = self
      .sessions
      .with(session_id, |s| s.practise.replace_entries(entries, &mut rand::rng()));
    self.load(session_id, remote, ticket).await
  }

  // ==================== Answering ====================

  pub fn choose(&self, session_id: &str, option_id: &str) -> Result<PractiseView> {
    self.answer(session_id, |s| s.choose_option(option_id, Utc::now()))
  }

  pub fn check(&self, session_id: &str, input: &str) -> Result<PractiseView> {
    self.answer(session_id, |s| s.submit_cloze(input, Utc::now()))
  }

  pub fn give_up(&self, session_id: &str) -> Result<PractiseView> {
    self.answer(session_id, |s| s.give_up())
  }

  fn answer(
    &self,
    session_id: &str,
    transition: impl FnOnce(&mut super::SessionState) -> AnswerOutcome,
  ) -> Result<PractiseView> {
    let remote = self.remote(session_id)?;
    let outcome = self.sessions.with(session_id, |s| transition(&mut s.practise));

    if let AnswerOutcome::Resolved(completion) = outcome {
      if completion.resolution == Resolution::Solved || self.log_give_up {
        self.log_completion(session_id, remote, completion);
      }
    }
    Ok(self.view(session_id))
  }

  /// Fire-and-forget progress logging
  fn log_completion(&self, session_id: &str, remote: ApiSession, completion: Completion) {
    let api = Arc::clone(&self.api);
    let sessions = Arc::clone(&self.sessions);
    let session_id = session_id.to_string();

    tokio::spawn(async move {
      match api.log_exercise_completion(&remote, completion).await {
        Ok(()) => {}
        Err(ApiError::Unauthorized) => reset_if_current(&sessions, &session_id, &remote),
        Err(e) => tracing::warn!("Failed to log {} completion: {}", completion.mode.as_str(), e),
      }
    });
  }

  pub fn clear_feedback(&self, session_id: &str, token: u64) -> PractiseView {
    self.sessions.with(session_id, |s| {
      s.practise.clear_feedback(token);
      PractiseView::build(&s.practise, Utc::now())
    })
  }

  /// Save a word-bar suggestion as a practise-derived entry
  pub async fn save_suggestion(&self, session_id: &str, phrase: &str, translation: &str) -> Result<PractiseView> {
    let remote = self.remote(session_id)?;
    let saved = self
      .api
      .save_entry(&remote, translation, phrase, Provenance::Practise)
      .await;
    self.guard(session_id, &remote, saved)?;

    self
      .sessions
      .with(session_id, |s| s.practise.remove_suggestion(phrase));
    self.refresh_entries(session_id, &remote).await
  }

  // ==================== Dictionary ====================

  /// Fresh entry list; the session's cached set is replaced with it
  pub async fn entries(&self, session_id: &str) -> Result<Vec<VocabularyEntry>> {
    let remote = self.remote(session_id)?;
    self.refresh_entries(session_id, &remote).await?;
    Ok(self.sessions.with(session_id, |s| s.practise.entries().to_vec()))
  }

  pub async fn save_entry(&self, session_id: &str, text: &str, translation: &str) -> Result<Vec<VocabularyEntry>> {
    let remote = self.remote(session_id)?;
    let saved = self
      .api
      .save_entry(&remote, text, translation, Provenance::External)
      .await;
    self.guard(session_id, &remote, saved)?;
    self.entries(session_id).await
  }

  pub async fn delete_entry(&self, session_id: &str, entry_id: EntryId) -> Result<Vec<VocabularyEntry>> {
    let remote = self.remote(session_id)?;
    let deleted = self.api.delete_entry(&remote, entry_id).await;
    self.guard(session_id, &remote, deleted)?;
    self.entries(session_id).await
  }

  pub async fn generate_example(&self, session_id: &str, entry_id: EntryId) -> Result<Vec<ExampleSentence>> {
    let remote = self.remote(session_id)?;
    let examples = self.api.generate_example(&remote, entry_id, true).await;
    let examples = self.guard(session_id, &remote, examples)?;
    self.refresh_entries(session_id, &remote).await?;
    Ok(examples)
  }

  pub async fn delete_example(
    &self,
    session_id: &str,
    entry_id: EntryId,
    index: usize,
  ) -> Result<Vec<ExampleSentence>> {
    let remote = self.remote(session_id)?;
    let examples = self.api.delete_example(&remote, entry_id, index).await;
    let examples = self.guard(session_id, &remote, examples)?;
    self.refresh_entries(session_id, &remote).await?;
    Ok(examples)
  }

  // ==================== Progress ====================

  pub async fn progress(&self, session_id: &str, days: u32) -> Result<ProgressSummary> {
    let remote = self.remote(session_id)?;
    let summary = self.api.progress_daily(&remote, days).await;
    self.guard(session_id, &remote, summary)
  }
}

/// Reset the session unless it has already moved on to another remote
/// session (signed out and back in while the call was in flight)
fn reset_if_current(sessions: &SessionStore, session_id: &str, remote: &ApiSession) {
  sessions.with(session_id, |s| {
    if s.remote.as_ref().is_none_or(|r| r.token == remote.token) {
      tracing::info!("Remote session for {} lapsed, signing out", remote.username);
      s.reset_auth();
    }
  });
}
