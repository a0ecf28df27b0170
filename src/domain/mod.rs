pub mod entry;
pub mod exercise;
pub mod progress;

pub use entry::{dedup_examples, usable_entries, EntryId, ExampleSentence, Provenance, VocabularyEntry};
pub use exercise::{
  ClozeQuestion, ClozeSegments, Completion, ExerciseKind, ExerciseMode, FlashcardDirection,
  FlashcardOption, FlashcardQuestion, QuestionError, Resolution,
};
pub use progress::{pad_daily_counts, window_start, DailyCount, ProgressSummary};
