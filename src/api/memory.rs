//! In-memory vocabulary service.
//!
//! Used when no remote base URL is configured, and by the tests. Exercise
//! generation follows the remote contract: flashcards draw distractors from
//! the user's other entries and cloze prompts mask the Danish answer inside an
//! example sentence. A cloze prefers a fresh sentence from the entry's queue,
//! appending it to the entry, and falls back to a stored one.

use std::collections::{HashMap, VecDeque};
use std::ops::Range;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rand::seq::{IndexedRandom, SliceRandom};

use super::{ApiError, ApiSession, Result, VocabularyApi};
use crate::config::{
  CLOZE_BLANK, DISTRACTOR_COUNT, MAX_EXAMPLES_PER_ENTRY, MAX_PROGRESS_DAYS, MIN_FLASHCARD_OPTIONS,
};
use crate::domain::{
  dedup_examples, pad_daily_counts, window_start, ClozeQuestion, Completion, EntryId, ExampleSentence,
  FlashcardDirection, FlashcardOption, FlashcardQuestion, ProgressSummary, Provenance, VocabularyEntry,
};
use crate::session::generate_session_id;

const DEMO_USER: &str = "tester";
const DEMO_PASSWORD: &str = "1234";

/// (english, danish, danish example, english example)
const DEMO_ENTRIES: &[(&str, &str, &str, &str)] = &[
  ("car", "bil", "Jeg kører min bil til arbejde hver dag.", "I drive my car to work every day."),
  ("house", "hus", "Vores hus ligger tæt på stranden.", "Our house is close to the beach."),
  ("to eat", "spise", "Vi skal spise aftensmad klokken seks.", "We are going to eat dinner at six."),
  ("beautiful", "smuk", "Det er en smuk dag i København.", "It is a beautiful day in Copenhagen."),
  ("bread", "brød", "Han køber frisk brød hos bageren.", "He buys fresh bread at the baker's."),
  ("tomorrow", "i morgen", "Vi ses i morgen på kontoret.", "See you tomorrow at the office."),
  ("cosy", "hyggelig", "Aftenen var meget hyggelig.", "The evening was very cosy."),
  ("bicycle", "cykel", "Min cykel står i gården.", "My bicycle is in the courtyard."),
];

/// Sentences handed out as fresh cloze examples: (danish word, danish, english)
const DEMO_FRESH_EXAMPLES: &[(&str, &str, &str)] = &[
  ("bil", "Vi lejede en bil i ferien.", "We rented a car on holiday."),
  ("bil", "Hans bil er gammel men god.", "His car is old but good."),
  ("hus", "Vores nye hus er stort.", "Our new house is big."),
  ("spise", "Børnene vil spise pizza.", "The children want to eat pizza."),
  ("smuk", "Hun synger en smuk sang.", "She sings a beautiful song."),
  ("brød", "Vi spiser brød til frokost.", "We eat bread for lunch."),
  ("hyggelig", "Det var en hyggelig aften med venner.", "It was a cosy evening with friends."),
  ("cykel", "Jeg cykler, for min cykel er hurtig.", "I cycle, because my bicycle is fast."),
];

#[derive(Default)]
struct MemoryUser {
  password: String,
  entries: Vec<VocabularyEntry>,
  /// Unused sentences per entry, consumed by cloze requests
  fresh_examples: HashMap<EntryId, VecDeque<ExampleSentence>>,
  exercises: HashMap<NaiveDate, i64>,
}

#[derive(Default)]
struct MemoryStore {
  users: HashMap<String, MemoryUser>,
  /// session token -> username
  tokens: HashMap<String, String>,
  next_id: i64,
}

impl MemoryStore {
  fn user_mut(&mut self, session: &ApiSession) -> Result<&mut MemoryUser> {
    let username = self.tokens.get(&session.token).ok_or(ApiError::Unauthorized)?;
    self.users.get_mut(username).ok_or(ApiError::Unauthorized)
  }
}

#[derive(Default)]
pub struct MemoryApi {
  store: Mutex<MemoryStore>,
}

fn entry_not_found() -> ApiError {
  ApiError::Service("Entry not found.".to_string())
}

impl MemoryApi {
  pub fn new() -> Self {
    Self::default()
  }

  /// Demo backend: user `tester` / `1234` with a small dictionary
  pub fn demo() -> Self {
    let api = Self::new();
    api.add_user(DEMO_USER, DEMO_PASSWORD);
    for (english, danish, example_da, example_en) in DEMO_ENTRIES {
      let Some(id) = api.insert_entry(
        DEMO_USER,
        english,
        danish,
        vec![ExampleSentence::new(example_da, example_en)],
      ) else {
        continue;
      };
      for (_, fresh_da, fresh_en) in DEMO_FRESH_EXAMPLES.iter().filter(|f| f.0 == *danish) {
        api.queue_example(DEMO_USER, id, ExampleSentence::new(fresh_da, fresh_en));
      }
    }
    api
  }

  fn lock(&self) -> MutexGuard<'_, MemoryStore> {
    self.store.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn add_user(&self, username: &str, password: &str) {
    self.lock().users.insert(
      username.to_string(),
      MemoryUser {
        password: password.to_string(),
        ..MemoryUser::default()
      },
    );
  }

  /// Store an entry directly; returns its id, or `None` for an unknown user
  pub fn insert_entry(
    &self,
    username: &str,
    text: &str,
    translation: &str,
    examples: Vec<ExampleSentence>,
  ) -> Option<EntryId> {
    let mut store = self.lock();
    store.next_id += 1;
    let id = EntryId(store.next_id);
    let user = store.users.get_mut(username)?;
    let mut entry = VocabularyEntry::new(id, text, translation).with_examples(dedup_examples(examples));
    entry.created_at = Some(Utc::now());
    user.entries.push(entry);
    Some(id)
  }

  /// Queue a sentence for the next cloze on `entry_id`
  pub fn queue_example(&self, username: &str, entry_id: EntryId, example: ExampleSentence) {
    if let Some(user) = self.lock().users.get_mut(username) {
      user.fresh_examples.entry(entry_id).or_default().push_back(example);
    }
  }

  /// Forget every issued session token
  pub fn revoke_sessions(&self) {
    self.lock().tokens.clear();
  }

  #[cfg(test)]
  pub fn active_sessions(&self) -> usize {
    self.lock().tokens.len()
  }

  /// Exercises logged today for `username`
  pub fn exercises_today(&self, username: &str) -> i64 {
    let today = Utc::now().date_naive();
    self
      .lock()
      .users
      .get(username)
      .and_then(|u| u.exercises.get(&today).copied())
      .unwrap_or(0)
  }

  fn build_flashcard(
    &self,
    session: &ApiSession,
    entry_id: EntryId,
    direction: FlashcardDirection,
  ) -> Result<FlashcardQuestion> {
    let mut store = self.lock();
    let user = store.user_mut(session)?;
    let target = user
      .entries
      .iter()
      .find(|e| e.id == entry_id)
      .ok_or_else(entry_not_found)?;
    if !target.is_usable() {
      return Err(ApiError::Service("The selected entry is missing a translation.".to_string()));
    }

    let sides = |entry: &VocabularyEntry| match direction {
      FlashcardDirection::SourceToTarget => (entry.text.clone(), entry.translation.clone()),
      FlashcardDirection::TargetToSource => (entry.translation.clone(), entry.text.clone()),
    };
    let (prompt, answer) = sides(target);

    let mut options = vec![FlashcardOption {
      id: format!("entry-{}", target.id),
      label: answer.clone(),
      translation: Some(prompt.clone()),
      note: None,
      is_correct: true,
    }];

    let mut rng = rand::rng();
    let mut others: Vec<&VocabularyEntry> = user
      .entries
      .iter()
      .filter(|e| e.id != entry_id && e.is_usable())
      .collect();
    others.shuffle(&mut rng);
    let mut seen = vec![answer.to_lowercase()];
    for other in others {
      if options.len() > DISTRACTOR_COUNT {
        break;
      }
      let (other_prompt, label) = sides(other);
      if seen.contains(&label.to_lowercase()) {
        continue;
      }
      seen.push(label.to_lowercase());
      options.push(FlashcardOption {
        id: format!("distractor-{}", options.len() - 1),
        label,
        translation: Some(other_prompt),
        note: None,
        is_correct: false,
      });
    }

    if options.len() < MIN_FLASHCARD_OPTIONS {
      return Err(ApiError::Service("Unable to prepare enough flashcards.".to_string()));
    }
    Ok(FlashcardQuestion {
      entry_id,
      prompt,
      part_of_speech: None,
      options,
    })
  }

  fn build_cloze(&self, session: &ApiSession, entry_id: EntryId) -> Result<ClozeQuestion> {
    let mut store = self.lock();
    let user = store.user_mut(session)?;
    let entry = user
      .entries
      .iter_mut()
      .find(|e| e.id == entry_id)
      .ok_or_else(entry_not_found)?;
    if !entry.is_usable() {
      return Err(ApiError::Service("The selected entry is missing a translation.".to_string()));
    }

    let fresh = user
      .fresh_examples
      .get_mut(&entry_id)
      .and_then(VecDeque::pop_front);
    let example = match fresh {
      Some(example) => {
        entry.append_example(example.clone(), MAX_EXAMPLES_PER_ENTRY);
        example
      }
      None => entry
        .examples
        .choose(&mut rand::rng())
        .cloned()
        .ok_or_else(|| ApiError::Service("Unable to create a sentence right now.".to_string()))?,
    };
    let prompt = mask_example(&example.danish, &entry.translation);
    if prompt.is_empty() {
      return Err(ApiError::Service("Unable to prepare a sentence.".to_string()));
    }

    Ok(ClozeQuestion {
      entry_id,
      prompt,
      answer: entry.translation.clone(),
      hint: Some(entry.text.clone()),
    })
  }
}

/// Byte range of the first case-insensitive occurrence of `needle`
fn find_ignore_case(haystack: &str, needle: &str) -> Option<Range<usize>> {
  let needle: Vec<char> = needle.chars().collect();
  if needle.is_empty() {
    return None;
  }

  for (start, _) in haystack.char_indices() {
    let mut rest = haystack[start..].char_indices();
    let mut end = start;
    let matched = needle.iter().all(|n| match rest.next() {
      Some((offset, c)) if c.to_lowercase().eq(n.to_lowercase()) => {
        end = start + offset + c.len_utf8();
        true
      }
      _ => false,
    });
    if matched {
      return Some(start..end);
    }
  }
  None
}

/// Replace the first occurrence of `target` with the blank, or put the blank
/// in front when the sentence does not contain it
fn mask_example(example: &str, target: &str) -> String {
  let example = example.trim();
  let target = target.trim();
  if example.is_empty() {
    return String::new();
  }
  if target.is_empty() {
    return example.to_string();
  }
  match find_ignore_case(example, target) {
    Some(range) => format!("{}{}{}", &example[..range.start], CLOZE_BLANK, &example[range.end..]),
    None => format!("{} {}", CLOZE_BLANK, example),
  }
}

#[async_trait]
impl VocabularyApi for MemoryApi {
  async fn sign_in(&self, username: &str, password: &str) -> Result<ApiSession> {
    let username = username.trim();
    let password = password.trim();
    if username.is_empty() || password.is_empty() {
      return Err(ApiError::SignInRejected("Username and password are required.".to_string()));
    }

    let mut store = self.lock();
    match store.users.get(username) {
      Some(user) if user.password == password => {}
      _ => return Err(ApiError::SignInRejected("Invalid credentials.".to_string())),
    }
    let token = generate_session_id();
    store.tokens.insert(token.clone(), username.to_string());
    Ok(ApiSession {
      username: username.to_string(),
      token,
    })
  }

  async fn sign_out(&self, session: &ApiSession) -> Result<()> {
    self
      .lock()
      .tokens
      .remove(&session.token)
      .map(|_| ())
      .ok_or(ApiError::Unauthorized)
  }

  async fn fetch_entries(&self, session: &ApiSession) -> Result<Vec<VocabularyEntry>> {
    let mut store = self.lock();
    let mut entries = store.user_mut(session)?.entries.clone();
    entries.sort_by(|a, b| b.id.0.cmp(&a.id.0));
    Ok(entries)
  }

  async fn request_flashcard(
    &self,
    session: &ApiSession,
    entry_id: EntryId,
    direction: FlashcardDirection,
  ) -> Result<FlashcardQuestion> {
    self.build_flashcard(session, entry_id, direction)
  }

  async fn request_cloze(&self, session: &ApiSession, entry_id: EntryId) -> Result<ClozeQuestion> {
    self.build_cloze(session, entry_id)
  }

  async fn log_exercise_completion(&self, session: &ApiSession, completion: Completion) -> Result<()> {
    let mut store = self.lock();
    let user = store.user_mut(session)?;
    *user.exercises.entry(Utc::now().date_naive()).or_insert(0) += 1;
    tracing::debug!("Logged {} exercise ({:?})", completion.mode.as_str(), completion.resolution);
    Ok(())
  }

  async fn save_entry(
    &self,
    session: &ApiSession,
    text: &str,
    translation: &str,
    provenance: Provenance,
  ) -> Result<()> {
    if text.trim().is_empty() || translation.trim().is_empty() {
      return Err(ApiError::Service("English and Danish texts are required.".to_string()));
    }
    let mut store = self.lock();
    store.user_mut(session)?;
    store.next_id += 1;
    let mut entry = VocabularyEntry::new(EntryId(store.next_id), text, translation).with_provenance(provenance);
    entry.created_at = Some(Utc::now());
    store.user_mut(session)?.entries.push(entry);
    Ok(())
  }

  async fn delete_entry(&self, session: &ApiSession, entry_id: EntryId) -> Result<()> {
    let mut store = self.lock();
    let user = store.user_mut(session)?;
    let before = user.entries.len();
    user.entries.retain(|e| e.id != entry_id);
    if user.entries.len() == before {
      return Err(entry_not_found());
    }
    Ok(())
  }

  async fn generate_example(
    &self,
    session: &ApiSession,
    _entry_id: EntryId,
    _append: bool,
  ) -> Result<Vec<ExampleSentence>> {
    self.lock().user_mut(session)?;
    Err(ApiError::Service("Example generation is not available in demo mode.".to_string()))
  }

  async fn delete_example(
    &self,
    session: &ApiSession,
    entry_id: EntryId,
    index: usize,
  ) -> Result<Vec<ExampleSentence>> {
    let mut store = self.lock();
    let user = store.user_mut(session)?;
    let entry = user
      .entries
      .iter_mut()
      .find(|e| e.id == entry_id)
      .ok_or_else(entry_not_found)?;
    if index >= entry.examples.len() {
      return Err(ApiError::Service("Example not found.".to_string()));
    }
    entry.examples.remove(index);
    Ok(entry.examples.clone())
  }

  async fn progress_daily(&self, session: &ApiSession, days: u32) -> Result<ProgressSummary> {
    let days = days.clamp(1, MAX_PROGRESS_DAYS);
    let today = Utc::now().date_naive();
    let start = window_start(today, days);

    let mut store = self.lock();
    let user = store.user_mut(session)?;

    let mut words: HashMap<NaiveDate, i64> = HashMap::new();
    for day in user.entries.iter().filter_map(|e| e.created_at).map(|t| t.date_naive()) {
      *words.entry(day).or_insert(0) += 1;
    }
    let total_exercises = user.exercises.values().sum();

    Ok(ProgressSummary {
      words: pad_daily_counts(&words, today, days),
      exercises: pad_daily_counts(&user.exercises, today, days),
      total_entries: user.entries.len() as i64,
      total_exercises,
      start_date: start,
      end_date: today,
      window_days: days,
    })
  }
}
