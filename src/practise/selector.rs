//! Random target selection and option shuffling.

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::domain::{usable_entries, FlashcardQuestion, VocabularyEntry};

/// Uniform random draw over the usable entries. Draws are independent, so
/// the same entry may come up twice in a row.
pub fn pick_entry<'a, R: Rng + ?Sized>(
  entries: &'a [VocabularyEntry],
  rng: &mut R,
) -> Option<&'a VocabularyEntry> {
  usable_entries(entries).choose(rng).copied()
}

/// Fisher-Yates shuffle of the options, done once when a question arrives
pub fn shuffle_options<R: Rng + ?Sized>(mut question: FlashcardQuestion, rng: &mut R) -> FlashcardQuestion {
  question.options.shuffle(rng);
  question
}
