//! Practise session state and its transitions.
//!
//! Every transition is a synchronous method on [`SessionState`]; network
//! calls happen outside, in the controller. A load hands out a
//! [`LoadTicket`] and the response is applied only while the ticket's
//! generation and mode still match the session.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::selector::{pick_entry, shuffle_options};
use crate::api::ApiError;
use crate::config::DEFAULT_FEEDBACK_CLEAR_MS;
use crate::domain::{
  usable_entries, ClozeQuestion, Completion, EntryId, ExerciseKind, ExerciseMode, FlashcardQuestion,
  QuestionError, Resolution, VocabularyEntry,
};
use crate::phrases::extract_phrases;
use crate::validation::{evaluate_cloze, ClozeVerdict};

/// Where the session is in the question lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
  NoModeSelected,
  /// A mode is selected but there are no usable entries to practise
  AwaitingEntries,
  Loading,
  Ready,
  /// Input is locked until the next question is requested
  Answered(Resolution),
  /// The last load failed; the message is shown as-is and a retry is allowed
  Failed(String),
}

/// The question currently on screen
#[derive(Debug, Clone, PartialEq)]
pub enum Question {
  Flashcard(FlashcardQuestion),
  Cloze(ClozeQuestion),
}

impl Question {
  pub fn entry_id(&self) -> EntryId {
    match self {
      Self::Flashcard(q) => q.entry_id,
      Self::Cloze(q) => q.entry_id,
    }
  }

  pub fn kind(&self) -> ExerciseKind {
    match self {
      Self::Flashcard(_) => ExerciseKind::Flashcard,
      Self::Cloze(_) => ExerciseKind::Cloze,
    }
  }
}

/// Transient "try again" feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
  Incorrect,
  Near,
  Empty,
}

impl FeedbackKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Incorrect => "incorrect",
      Self::Near => "near",
      Self::Empty => "empty",
    }
  }

  pub fn message(&self) -> &'static str {
    match self {
      Self::Incorrect => ClozeVerdict::Incorrect.feedback(),
      Self::Near => ClozeVerdict::Near.feedback(),
      Self::Empty => ClozeVerdict::Empty.feedback(),
    }
  }
}

/// Feedback with the token that clears it and the time it lapses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
  pub kind: FeedbackKind,
  pub token: u64,
  pub expires_at: DateTime<Utc>,
}

/// Handle for one outstanding exercise request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
  pub generation: u64,
  pub mode: ExerciseMode,
  pub entry_id: EntryId,
}

/// What happened to a provider response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
  Applied,
  Failed,
  /// The session moved on while the request was in flight
  Discarded,
  SignedOut,
}

/// Result of a selection, typed answer, or give-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
  /// Nothing to answer, input locked, or wrong question type
  Ignored,
  Retry(FeedbackKind),
  Resolved(Completion),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LoadingFlags {
  flashcard: bool,
  cloze: bool,
}

impl LoadingFlags {
  fn get(&self, kind: ExerciseKind) -> bool {
    match kind {
      ExerciseKind::Flashcard => self.flashcard,
      ExerciseKind::Cloze => self.cloze,
    }
  }

  fn set(&mut self, kind: ExerciseKind, value: bool) {
    match kind {
      ExerciseKind::Flashcard => self.flashcard = value,
      ExerciseKind::Cloze => self.cloze = value,
    }
  }
}

/// Practise state for one browser session
#[derive(Debug, Clone)]
pub struct SessionState {
  signed_in: bool,
  entries: Vec<VocabularyEntry>,
  mode: Option<ExerciseMode>,
  phase: Phase,
  question: Option<Question>,
  loading: LoadingFlags,
  selection_locked: bool,
  generation: u64,
  feedback: Option<Feedback>,
  feedback_seq: u64,
  feedback_delay: Duration,
  wrong_options: Vec<String>,
  revealed_answer: Option<String>,
  suggestions: Vec<String>,
}

impl Default for SessionState {
  fn default() -> Self {
    Self::new(DEFAULT_FEEDBACK_CLEAR_MS)
  }
}

impl SessionState {
  pub fn new(feedback_clear_ms: u64) -> Self {
    Self {
      signed_in: false,
      entries: Vec::new(),
      mode: None,
      phase: Phase::NoModeSelected,
      question: None,
      loading: LoadingFlags::default(),
      selection_locked: false,
      generation: 0,
      feedback: None,
      feedback_seq: 0,
      feedback_delay: Duration::milliseconds(feedback_clear_ms as i64),
      wrong_options: Vec::new(),
      revealed_answer: None,
      suggestions: Vec::new(),
    }
  }

  // ==================== Accessors ====================

  pub fn is_signed_in(&self) -> bool {
    self.signed_in
  }

  pub fn entries(&self) -> &[VocabularyEntry] {
    &self.entries
  }

  pub fn mode(&self) -> Option<ExerciseMode> {
    self.mode
  }

  pub fn phase(&self) -> &Phase {
    &self.phase
  }

  pub fn question(&self) -> Option<&Question> {
    self.question.as_ref()
  }

  #[cfg(test)]
  pub fn is_loading(&self, kind: ExerciseKind) -> bool {
    self.loading.get(kind)
  }

  pub fn is_locked(&self) -> bool {
    self.selection_locked
  }

  pub fn wrong_options(&self) -> &[String] {
    &self.wrong_options
  }

  pub fn revealed_answer(&self) -> Option<&str> {
    self.revealed_answer.as_deref()
  }

  pub fn suggestions(&self) -> &[String] {
    &self.suggestions
  }

  pub fn feedback_delay(&self) -> Duration {
    self.feedback_delay
  }

  /// Feedback that has not lapsed or been cleared yet
  pub fn visible_feedback(&self, now: DateTime<Utc>) -> Option<&Feedback> {
    self.feedback.as_ref().filter(|f| f.expires_at > now)
  }

  // ==================== Sign-in / sign-out ====================

  /// Start a signed-in session with a freshly fetched entry set
  pub fn sign_in(&mut self, entries: Vec<VocabularyEntry>) {
    self.reset();
    self.signed_in = true;
    self.entries = entries;
  }

  /// Drop everything; responses still in flight will be discarded
  pub fn sign_out(&mut self) {
    self.reset();
  }

  fn reset(&mut self) {
    let generation = self.generation + 1;
    let feedback_seq = self.feedback_seq;
    let delay = self.feedback_delay;
    *self = Self {
      generation,
      feedback_seq,
      feedback_delay: delay,
      ..Self::default()
    };
  }

  fn clear_question(&mut self) {
    self.question = None;
    self.feedback = None;
    self.selection_locked = false;
    self.wrong_options.clear();
    self.revealed_answer = None;
    self.suggestions.clear();
  }

  /// Invalidate outstanding requests and their loading flags
  fn bump_generation(&mut self) {
    self.generation += 1;
    self.loading = LoadingFlags::default();
  }

  // ==================== Mode & loading ====================

  /// Switch to `mode`, discarding any question in progress
  pub fn select_mode<R: Rng + ?Sized>(&mut self, mode: ExerciseMode, rng: &mut R) -> Option<LoadTicket> {
    if !self.signed_in {
      return None;
    }
    self.bump_generation();
    self.clear_question();
    self.mode = Some(mode);
    self.start_load(rng)
  }

  /// Back to the mode picker
  pub fn change_mode(&mut self) {
    self.bump_generation();
    self.clear_question();
    self.mode = None;
    self.phase = Phase::NoModeSelected;
  }

  /// Explicit "next exercise" (also the retry after a failed load)
  pub fn request_next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<LoadTicket> {
    self.start_load(rng)
  }

  /// Replace the entry set wholesale after a fetch
  pub fn replace_entries<R: Rng + ?Sized>(
    &mut self,
    entries: Vec<VocabularyEntry>,
    rng: &mut R,
  ) -> Option<LoadTicket> {
    if !self.signed_in {
      return None;
    }
    self.entries = entries;

    if usable_entries(&self.entries).is_empty() {
      self.bump_generation();
      self.clear_question();
      self.phase = if self.mode.is_some() {
        Phase::AwaitingEntries
      } else {
        Phase::NoModeSelected
      };
      return None;
    }

    if self.phase == Phase::AwaitingEntries {
      return self.start_load(rng);
    }
    None
  }

  fn start_load<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<LoadTicket> {
    if !self.signed_in {
      return None;
    }
    let mode = self.mode?;
    if self.loading.get(mode.kind()) {
      tracing::debug!("{} request already in flight", mode.as_str());
      return None;
    }

    let Some(entry_id) = pick_entry(&self.entries, rng).map(|e| e.id) else {
      self.clear_question();
      self.phase = Phase::AwaitingEntries;
      return None;
    };

    self.clear_question();
    self.loading.set(mode.kind(), true);
    self.phase = Phase::Loading;
    Some(LoadTicket {
      generation: self.generation,
      mode,
      entry_id,
    })
  }

  fn is_current(&self, ticket: &LoadTicket) -> bool {
    ticket.generation == self.generation && self.mode == Some(ticket.mode)
  }

  /// Apply a flashcard response for `ticket`
  pub fn apply_flashcard<R: Rng + ?Sized>(
    &mut self,
    ticket: LoadTicket,
    result: Result<FlashcardQuestion, ApiError>,
    rng: &mut R,
  ) -> LoadOutcome {
    self.apply(ticket, result, |question| {
      let question = question.validate()?;
      Ok(Question::Flashcard(shuffle_options(question, rng)))
    })
  }

  /// Apply a cloze response for `ticket`
  pub fn apply_cloze(&mut self, ticket: LoadTicket, result: Result<ClozeQuestion, ApiError>) -> LoadOutcome {
    self.apply(ticket, result, |question| Ok(Question::Cloze(question.validate()?)))
  }

  fn apply<T>(
    &mut self,
    ticket: LoadTicket,
    result: Result<T, ApiError>,
    accept: impl FnOnce(T) -> Result<Question, QuestionError>,
  ) -> LoadOutcome {
    if !self.is_current(&ticket) {
      tracing::debug!("Discarding stale {} response for entry {}", ticket.mode.as_str(), ticket.entry_id);
      return LoadOutcome::Discarded;
    }
    self.loading.set(ticket.mode.kind(), false);

    let payload = match result {
      Ok(payload) => payload,
      Err(ApiError::Unauthorized) => {
        self.sign_out();
        return LoadOutcome::SignedOut;
      }
      Err(e) => {
        tracing::warn!("Failed to load {} exercise: {}", ticket.mode.as_str(), e);
        self.phase = Phase::Failed(e.to_string());
        return LoadOutcome::Failed;
      }
    };

    match accept(payload) {
      Ok(question) if question.kind() == ticket.mode.kind() => {
        self.clear_question();
        self.question = Some(question);
        self.phase = Phase::Ready;
        LoadOutcome::Applied
      }
      Ok(_) => {
        self.phase = Phase::Failed("Unexpected exercise type.".to_string());
        LoadOutcome::Failed
      }
      Err(e) => {
        tracing::warn!("Rejected {} exercise for entry {}: {:?}", ticket.mode.as_str(), ticket.entry_id, e);
        self.phase = Phase::Failed(e.to_string());
        LoadOutcome::Failed
      }
    }
  }

  // ==================== Answering ====================

  fn answerable(&self) -> bool {
    self.phase == Phase::Ready && !self.selection_locked
  }

  fn set_feedback(&mut self, kind: FeedbackKind, now: DateTime<Utc>) -> AnswerOutcome {
    self.feedback_seq += 1;
    self.feedback = Some(Feedback {
      kind,
      token: self.feedback_seq,
      expires_at: now + self.feedback_delay,
    });
    AnswerOutcome::Retry(kind)
  }

  fn resolve(&mut self, resolution: Resolution) -> AnswerOutcome {
    self.selection_locked = true;
    self.feedback = None;
    self.phase = Phase::Answered(resolution);
    match self.mode {
      Some(mode) => AnswerOutcome::Resolved(Completion { mode, resolution }),
      None => AnswerOutcome::Ignored,
    }
  }

  /// Pick a flashcard option by id
  pub fn choose_option(&mut self, option_id: &str, now: DateTime<Utc>) -> AnswerOutcome {
    if !self.answerable() || self.wrong_options.iter().any(|id| id == option_id) {
      return AnswerOutcome::Ignored;
    }
    let Some(Question::Flashcard(question)) = &self.question else {
      return AnswerOutcome::Ignored;
    };
    let Some(option) = question.option(option_id) else {
      return AnswerOutcome::Ignored;
    };

    if option.is_correct {
      self.resolve(Resolution::Solved)
    } else {
      self.wrong_options.push(option_id.to_string());
      self.set_feedback(FeedbackKind::Incorrect, now)
    }
  }

  /// Check a typed cloze answer
  pub fn submit_cloze(&mut self, input: &str, now: DateTime<Utc>) -> AnswerOutcome {
    if !self.answerable() {
      return AnswerOutcome::Ignored;
    }
    let Some(Question::Cloze(question)) = &self.question else {
      return AnswerOutcome::Ignored;
    };

    match evaluate_cloze(input, &question.answer) {
      ClozeVerdict::Correct => self.reveal_cloze(Resolution::Solved),
      ClozeVerdict::Near => self.set_feedback(FeedbackKind::Near, now),
      ClozeVerdict::Incorrect => self.set_feedback(FeedbackKind::Incorrect, now),
      ClozeVerdict::Empty => self.set_feedback(FeedbackKind::Empty, now),
    }
  }

  /// Reveal the cloze answer and lock input
  pub fn give_up(&mut self) -> AnswerOutcome {
    if !self.answerable() || !matches!(self.question, Some(Question::Cloze(_))) {
      return AnswerOutcome::Ignored;
    }
    self.reveal_cloze(Resolution::GaveUp)
  }

  fn reveal_cloze(&mut self, resolution: Resolution) -> AnswerOutcome {
    if let Some(Question::Cloze(question)) = &self.question {
      self.revealed_answer = Some(question.answer.clone());
      self.suggestions = extract_phrases(&question.filled_sentence(), &question.answer);
    }
    self.resolve(resolution)
  }

  /// Clear feedback if `token` still names it; stale tokens do nothing
  pub fn clear_feedback(&mut self, token: u64) -> bool {
    if self.feedback.as_ref().is_some_and(|f| f.token == token) {
      self.feedback = None;
      true
    } else {
      false
    }
  }

  /// Drop a suggestion once it has been saved
  pub fn remove_suggestion(&mut self, phrase: &str) {
    self.suggestions.retain(|s| s != phrase);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{ExampleSentence, FlashcardDirection, FlashcardOption};
  use rand::SeedableRng;
  use rand::rngs::StdRng;

  const FLASHCARD: ExerciseMode = ExerciseMode::Flashcard(FlashcardDirection::TargetToSource);

  fn rng() -> StdRng {
    StdRng::seed_from_u64(1234)
  }

  fn entries() -> Vec<VocabularyEntry> {
    vec![
      VocabularyEntry::new(EntryId(1), "car", "bil")
        .with_examples(vec![ExampleSentence::new("Jeg elsker den røde bil.", "I love the red car.")]),
      VocabularyEntry::new(EntryId(2), "cat", "kat"),
    ]
  }

  fn signed_in() -> SessionState {
    let mut state = SessionState::default();
    state.sign_in(entries());
    state
  }

  fn flashcard_for(entry_id: EntryId, count: usize) -> FlashcardQuestion {
    FlashcardQuestion {
      entry_id,
      prompt: "bil".to_string(),
      part_of_speech: Some("noun".to_string()),
      options: (0..count)
        .map(|i| FlashcardOption {
          id: format!("opt-{}", i),
          label: format!("label-{}", i),
          translation: None,
          note: None,
          is_correct: i == 0,
        })
        .collect(),
    }
  }

  fn cloze_for(entry_id: EntryId) -> ClozeQuestion {
    ClozeQuestion {
      entry_id,
      prompt: "Jeg elsker den røde _____.".to_string(),
      answer: "bil".to_string(),
      hint: Some("car".to_string()),
    }
  }

  fn ready_flashcard(state: &mut SessionState) {
    let mut r = rng();
    let ticket = state.select_mode(FLASHCARD, &mut r).unwrap();
    let outcome = state.apply_flashcard(ticket, Ok(flashcard_for(ticket.entry_id, 4)), &mut r);
    assert_eq!(outcome, LoadOutcome::Applied);
  }

  fn ready_cloze(state: &mut SessionState) {
    let ticket = state.select_mode(ExerciseMode::Cloze, &mut rng()).unwrap();
    assert_eq!(state.apply_cloze(ticket, Ok(cloze_for(ticket.entry_id))), LoadOutcome::Applied);
  }

  #[test]
  fn test_signed_out_session_cannot_select_mode() {
    let mut state = SessionState::default();
    assert!(state.select_mode(ExerciseMode::Cloze, &mut rng()).is_none());
    assert_eq!(state.phase(), &Phase::NoModeSelected);
  }

  #[test]
  fn test_mode_without_entries_waits_then_loads() {
    let mut state = SessionState::default();
    state.sign_in(vec![VocabularyEntry::new(EntryId(9), "empty", "  ")]);

    assert!(state.select_mode(ExerciseMode::Cloze, &mut rng()).is_none());
    assert_eq!(state.phase(), &Phase::AwaitingEntries);
    assert_eq!(state.mode(), Some(ExerciseMode::Cloze));

    let ticket = state.replace_entries(entries(), &mut rng()).unwrap();
    assert_eq!(ticket.mode, ExerciseMode::Cloze);
    assert_eq!(state.phase(), &Phase::Loading);
    assert!(state.is_loading(ExerciseKind::Cloze));
  }

  #[test]
  fn test_loading_flag_suppresses_duplicate_request() {
    let mut state = signed_in();
    let mut r = rng();
    assert!(state.select_mode(FLASHCARD, &mut r).is_some());
    assert!(state.request_next(&mut r).is_none());
    assert!(state.is_loading(ExerciseKind::Flashcard));
    assert!(!state.is_loading(ExerciseKind::Cloze));
  }

  #[test]
  fn test_ticket_targets_usable_entry() {
    let mut state = SessionState::default();
    state.sign_in(vec![
      VocabularyEntry::new(EntryId(1), "", "bil"),
      VocabularyEntry::new(EntryId(2), "cat", "kat"),
    ]);
    let ticket = state.select_mode(FLASHCARD, &mut rng()).unwrap();
    assert_eq!(ticket.entry_id, EntryId(2));
  }

  #[test]
  fn test_valid_flashcard_becomes_ready() {
    let mut state = signed_in();
    ready_flashcard(&mut state);

    assert_eq!(state.phase(), &Phase::Ready);
    assert!(!state.is_loading(ExerciseKind::Flashcard));
    let Some(Question::Flashcard(q)) = state.question() else {
      panic!("expected flashcard");
    };
    assert_eq!(q.options.len(), 4);
    assert_eq!(q.options.iter().filter(|o| o.is_correct).count(), 1);
  }

  #[test]
  fn test_too_few_options_is_a_retryable_error() {
    let mut state = signed_in();
    let mut r = rng();
    let ticket = state.select_mode(FLASHCARD, &mut r).unwrap();
    let outcome = state.apply_flashcard(ticket, Ok(flashcard_for(ticket.entry_id, 3)), &mut r);

    assert_eq!(outcome, LoadOutcome::Failed);
    assert_eq!(state.phase(), &Phase::Failed("Unable to prepare enough flashcards.".to_string()));
    assert!(state.question().is_none());
    assert!(state.request_next(&mut r).is_some());
  }

  #[test]
  fn test_service_error_message_is_kept_verbatim() {
    let mut state = signed_in();
    let ticket = state.select_mode(ExerciseMode::Cloze, &mut rng()).unwrap();
    let outcome = state.apply_cloze(
      ticket,
      Err(ApiError::Service("Unable to create a sentence right now.".to_string())),
    );
    assert_eq!(outcome, LoadOutcome::Failed);
    assert_eq!(
      state.phase(),
      &Phase::Failed("Unable to create a sentence right now.".to_string())
    );
  }

  #[test]
  fn test_unauthorized_response_signs_out() {
    let mut state = signed_in();
    let ticket = state.select_mode(ExerciseMode::Cloze, &mut rng()).unwrap();
    assert_eq!(state.apply_cloze(ticket, Err(ApiError::Unauthorized)), LoadOutcome::SignedOut);
    assert!(!state.is_signed_in());
    assert!(state.entries().is_empty());
    assert!(state.question().is_none());
    assert_eq!(state.phase(), &Phase::NoModeSelected);
  }

  #[test]
  fn test_mode_switch_discards_stale_flashcard() {
    let mut state = signed_in();
    let mut r = rng();
    let flashcard_ticket = state.select_mode(FLASHCARD, &mut r).unwrap();
    let cloze_ticket = state.select_mode(ExerciseMode::Cloze, &mut r).unwrap();

    let late = state.apply_flashcard(
      flashcard_ticket,
      Ok(flashcard_for(flashcard_ticket.entry_id, 4)),
      &mut r,
    );
    assert_eq!(late, LoadOutcome::Discarded);
    assert!(state.question().is_none());
    assert_eq!(state.phase(), &Phase::Loading);

    assert_eq!(
      state.apply_cloze(cloze_ticket, Ok(cloze_for(cloze_ticket.entry_id))),
      LoadOutcome::Applied
    );
    assert!(matches!(state.question(), Some(Question::Cloze(_))));
  }

  #[test]
  fn test_switching_back_to_same_mode_is_not_blocked() {
    let mut state = signed_in();
    let mut r = rng();
    let first = state.select_mode(FLASHCARD, &mut r).unwrap();
    state.select_mode(ExerciseMode::Cloze, &mut r).unwrap();
    let second = state.select_mode(FLASHCARD, &mut r).unwrap();

    assert_eq!(
      state.apply_flashcard(first, Ok(flashcard_for(first.entry_id, 4)), &mut r),
      LoadOutcome::Discarded
    );
    assert_eq!(
      state.apply_flashcard(second, Ok(flashcard_for(second.entry_id, 4)), &mut r),
      LoadOutcome::Applied
    );
  }

  #[test]
  fn test_wrong_then_right_flashcard_answer() {
    let mut state = signed_in();
    ready_flashcard(&mut state);
    let now = Utc::now();

    let Some(Question::Flashcard(q)) = state.question() else {
      panic!("expected flashcard");
    };
    let wrong = q.options.iter().find(|o| !o.is_correct).unwrap().id.clone();
    let right = q.correct_option().unwrap().id.clone();

    assert_eq!(state.choose_option(&wrong, now), AnswerOutcome::Retry(FeedbackKind::Incorrect));
    assert_eq!(state.phase(), &Phase::Ready);
    assert_eq!(state.wrong_options(), &[wrong.clone()]);
    assert_eq!(state.choose_option(&wrong, now), AnswerOutcome::Ignored);
    assert_eq!(state.choose_option("no-such-option", now), AnswerOutcome::Ignored);

    let outcome = state.choose_option(&right, now);
    assert_eq!(
      outcome,
      AnswerOutcome::Resolved(Completion {
        mode: FLASHCARD,
        resolution: Resolution::Solved
      })
    );
    assert!(state.is_locked());
    assert!(state.visible_feedback(now).is_none());
    // locked until the next question
    assert_eq!(state.choose_option(&right, now), AnswerOutcome::Ignored);
  }

  #[test]
  fn test_cloze_near_answer_keeps_question_open() {
    let mut state = signed_in();
    ready_cloze(&mut state);
    let now = Utc::now();

    assert_eq!(state.submit_cloze("bol", now), AnswerOutcome::Retry(FeedbackKind::Near));
    assert_eq!(state.phase(), &Phase::Ready);
    assert!(!state.is_locked());
    assert_eq!(state.submit_cloze("  ", now), AnswerOutcome::Retry(FeedbackKind::Empty));
    assert_eq!(state.submit_cloze("hund", now), AnswerOutcome::Retry(FeedbackKind::Incorrect));
  }

  #[test]
  fn test_cloze_correct_answer_reveals_suggestions() {
    let mut state = signed_in();
    ready_cloze(&mut state);

    let outcome = state.submit_cloze("BIL", Utc::now());
    assert!(matches!(
      outcome,
      AnswerOutcome::Resolved(Completion {
        resolution: Resolution::Solved,
        ..
      })
    ));
    assert_eq!(state.phase(), &Phase::Answered(Resolution::Solved));
    assert_eq!(state.suggestions(), &["Jeg elsker".to_string(), "den røde".to_string()]);
  }

  #[test]
  fn test_give_up_reveals_answer_and_locks() {
    let mut state = signed_in();
    ready_cloze(&mut state);

    let outcome = state.give_up();
    assert_eq!(
      outcome,
      AnswerOutcome::Resolved(Completion {
        mode: ExerciseMode::Cloze,
        resolution: Resolution::GaveUp
      })
    );
    assert_eq!(state.revealed_answer(), Some("bil"));
    assert!(state.is_locked());
    assert_eq!(state.submit_cloze("bil", Utc::now()), AnswerOutcome::Ignored);
    assert_eq!(state.give_up(), AnswerOutcome::Ignored);
  }

  #[test]
  fn test_give_up_only_applies_to_cloze() {
    let mut state = signed_in();
    ready_flashcard(&mut state);
    assert_eq!(state.give_up(), AnswerOutcome::Ignored);
  }

  #[test]
  fn test_next_after_answer_unlocks() {
    let mut state = signed_in();
    ready_cloze(&mut state);
    state.give_up();

    let ticket = state.request_next(&mut rng()).unwrap();
    assert_eq!(state.phase(), &Phase::Loading);
    assert!(!state.is_locked());
    assert!(state.revealed_answer().is_none());
    assert!(state.suggestions().is_empty());
    assert_eq!(ticket.mode, ExerciseMode::Cloze);
  }

  #[test]
  fn test_feedback_expires_and_stale_clear_is_noop() {
    let mut state = signed_in();
    ready_cloze(&mut state);
    let now = Utc::now();

    state.submit_cloze("hund", now);
    let first = state.visible_feedback(now).unwrap().token;
    state.submit_cloze("kat", now);
    let second = state.visible_feedback(now).unwrap().token;
    assert_ne!(first, second);

    assert!(!state.clear_feedback(first));
    assert!(state.visible_feedback(now).is_some());
    assert!(state.clear_feedback(second));
    assert!(state.visible_feedback(now).is_none());

    state.submit_cloze("hund", now);
    let later = now + state.feedback_delay() + Duration::milliseconds(1);
    assert!(state.visible_feedback(later).is_none());
  }

  #[test]
  fn test_feedback_timer_from_old_question_is_noop() {
    let mut state = signed_in();
    ready_cloze(&mut state);
    let now = Utc::now();
    state.submit_cloze("hund", now);
    let token = state.visible_feedback(now).unwrap().token;

    let ticket = state.request_next(&mut rng()).unwrap();
    state.apply_cloze(ticket, Ok(cloze_for(ticket.entry_id)));
    assert!(!state.clear_feedback(token));
    assert_eq!(state.phase(), &Phase::Ready);
  }

  #[test]
  fn test_sign_out_from_every_phase() {
    let mut r = rng();

    let mut loading = signed_in();
    let ticket = loading.select_mode(FLASHCARD, &mut r).unwrap();
    loading.sign_out();
    assert_eq!(
      loading.apply_flashcard(ticket, Ok(flashcard_for(ticket.entry_id, 4)), &mut r),
      LoadOutcome::Discarded
    );

    let mut ready = signed_in();
    ready_cloze(&mut ready);
    ready.sign_out();

    let mut answered = signed_in();
    ready_cloze(&mut answered);
    answered.give_up();
    answered.sign_out();

    for state in [loading, ready, answered] {
      assert!(!state.is_signed_in());
      assert!(state.entries().is_empty());
      assert!(state.question().is_none());
      assert!(state.mode().is_none());
      assert_eq!(state.phase(), &Phase::NoModeSelected);
    }
  }

  #[test]
  fn test_change_mode_returns_to_picker() {
    let mut state = signed_in();
    ready_cloze(&mut state);
    state.change_mode();
    assert_eq!(state.phase(), &Phase::NoModeSelected);
    assert!(state.mode().is_none());
    assert!(state.question().is_none());
    assert!(state.is_signed_in());
  }

  #[test]
  fn test_emptied_entry_set_resets_question() {
    let mut state = signed_in();
    ready_cloze(&mut state);
    assert!(state.replace_entries(Vec::new(), &mut rng()).is_none());
    assert_eq!(state.phase(), &Phase::AwaitingEntries);
    assert!(state.question().is_none());
  }

  #[test]
  fn test_refresh_keeps_current_question() {
    let mut state = signed_in();
    ready_cloze(&mut state);
    assert!(state.replace_entries(entries(), &mut rng()).is_none());
    assert_eq!(state.phase(), &Phase::Ready);
    assert!(state.question().is_some());
  }
}
