//! Collaborator interface to the remote vocabulary service.
//!
//! The practise controller only talks to [`VocabularyApi`]. Two
//! implementations exist: [`http::HttpVocabularyApi`] for the real service
//! and [`memory::MemoryApi`] for the demo mode and tests.

pub mod http;
pub mod memory;
pub mod wire;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
  ClozeQuestion, Completion, EntryId, ExampleSentence, FlashcardDirection, FlashcardQuestion,
  ProgressSummary, Provenance, VocabularyEntry,
};

pub use http::HttpVocabularyApi;
pub use memory::MemoryApi;

/// Errors from the remote vocabulary service
#[derive(Debug, Error)]
pub enum ApiError {
  /// The remote session is missing or has lapsed
  #[error("Authentication required.")]
  Unauthorized,
  /// Sign-in refused, e.g. bad credentials
  #[error("{0}")]
  SignInRejected(String),
  /// The service answered with an error message meant for the user
  #[error("{0}")]
  Service(String),
  #[error("Could not reach the vocabulary service.")]
  Transport(#[from] reqwest::Error),
  #[error("Unexpected response from the vocabulary service: {0}")]
  Malformed(String),
}

impl ApiError {
  pub fn is_unauthorized(&self) -> bool {
    matches!(self, Self::Unauthorized)
  }
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Remote session obtained at sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSession {
  pub username: String,
  /// Value of the remote session cookie
  pub token: String,
}

/// Operations the practise controller needs from the vocabulary service
#[async_trait]
pub trait VocabularyApi: Send + Sync {
  async fn sign_in(&self, username: &str, password: &str) -> Result<ApiSession>;

  async fn sign_out(&self, session: &ApiSession) -> Result<()>;

  /// Entries of the signed-in user, newest first
  async fn fetch_entries(&self, session: &ApiSession) -> Result<Vec<VocabularyEntry>>;

  async fn request_flashcard(
    &self,
    session: &ApiSession,
    entry_id: EntryId,
    direction: FlashcardDirection,
  ) -> Result<FlashcardQuestion>;

  async fn request_cloze(&self, session: &ApiSession, entry_id: EntryId) -> Result<ClozeQuestion>;

  async fn log_exercise_completion(&self, session: &ApiSession, completion: Completion) -> Result<()>;

  async fn save_entry(
    &self,
    session: &ApiSession,
    text: &str,
    translation: &str,
    provenance: Provenance,
  ) -> Result<()>;

  async fn delete_entry(&self, session: &ApiSession, entry_id: EntryId) -> Result<()>;

  /// Generate an example sentence; returns the entry's examples afterwards
  async fn generate_example(
    &self,
    session: &ApiSession,
    entry_id: EntryId,
    append: bool,
  ) -> Result<Vec<ExampleSentence>>;

  /// Remove the example at `index`; returns the remaining examples
  async fn delete_example(
    &self,
    session: &ApiSession,
    entry_id: EntryId,
    index: usize,
  ) -> Result<Vec<ExampleSentence>>;

  async fn progress_daily(&self, session: &ApiSession, days: u32) -> Result<ProgressSummary>;
}

/// Log-and-continue for best-effort remote calls
pub trait LogOnError<T> {
  fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
  fn log_warn(self, context: &str) -> Option<T> {
    self.map_err(|e| tracing::warn!("{}: {}", context, e)).ok()
  }
}
