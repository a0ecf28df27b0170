//! Serializable projection of a practise session for the browser.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::state::{Phase, Question, SessionState};
use crate::domain::{
  usable_entries, ClozeQuestion, ClozeSegments, EntryId, ExerciseMode, FlashcardDirection, FlashcardQuestion,
  Resolution,
};

/// Everything the practise screen needs to draw itself
#[derive(Debug, Clone, Serialize)]
pub struct PractiseView {
  pub signed_in: bool,
  pub mode: Option<ExerciseMode>,
  pub modes: Vec<ModeChoice>,
  pub status: &'static str,
  pub need_more_entries: bool,
  pub loading: bool,
  pub error: Option<String>,
  pub resolution: Option<Resolution>,
  pub input_enabled: bool,
  pub next_visible: bool,
  pub flashcard: Option<FlashcardView>,
  pub cloze: Option<ClozeView>,
  pub feedback: Option<FeedbackView>,
  pub suggestions: Vec<String>,
  pub usable_entries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModeChoice {
  pub mode: ExerciseMode,
  pub label: &'static str,
  pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlashcardView {
  pub entry_id: EntryId,
  pub prompt: String,
  pub part_of_speech: Option<String>,
  pub options: Vec<OptionView>,
}

/// An option button. Correctness and metadata stay hidden until the
/// question is answered.
#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
  pub id: String,
  pub label: String,
  pub disabled: bool,
  pub state: Option<&'static str>,
  pub translation: Option<String>,
  pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClozeView {
  pub entry_id: EntryId,
  pub prompt: String,
  /// `None` when the prompt has no blank; draw it unsplit
  pub segments: Option<ClozeSegments>,
  pub hint: Option<String>,
  pub revealed_answer: Option<String>,
  pub check_enabled: bool,
  pub give_up_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackView {
  pub kind: &'static str,
  pub message: &'static str,
  pub token: u64,
  /// Milliseconds until the feedback should be cleared
  pub clear_after_ms: i64,
}

fn mode_label(mode: ExerciseMode) -> &'static str {
  match mode {
    ExerciseMode::Flashcard(FlashcardDirection::SourceToTarget) => "English → Danish",
    ExerciseMode::Flashcard(FlashcardDirection::TargetToSource) => "Danish → English",
    ExerciseMode::Cloze => "Fill in the blank",
  }
}

impl PractiseView {
  pub fn build(state: &SessionState, now: DateTime<Utc>) -> Self {
    let signed_in = state.is_signed_in();
    let phase = state.phase();
    let answered = matches!(phase, Phase::Answered(_));
    let input_enabled = signed_in && *phase == Phase::Ready && !state.is_locked();

    let status = match phase {
      Phase::NoModeSelected => "no_mode",
      Phase::AwaitingEntries => "awaiting_entries",
      Phase::Loading => "loading",
      Phase::Ready => "ready",
      Phase::Answered(_) => "answered",
      Phase::Failed(_) => "failed",
    };

    let (flashcard, cloze) = match state.question() {
      Some(Question::Flashcard(q)) => (Some(flashcard_view(q, state, answered, input_enabled)), None),
      Some(Question::Cloze(q)) => (None, Some(cloze_view(q, state, input_enabled))),
      None => (None, None),
    };

    let feedback = state.visible_feedback(now).map(|f| FeedbackView {
      kind: f.kind.as_str(),
      message: f.kind.message(),
      token: f.token,
      clear_after_ms: (f.expires_at - now).num_milliseconds().max(0),
    });

    let mode = state.mode();
    let modes = ExerciseMode::ALL
      .into_iter()
      .map(|m| ModeChoice {
        mode: m,
        label: mode_label(m),
        active: mode == Some(m),
      })
      .collect();

    Self {
      signed_in,
      mode,
      modes,
      status,
      need_more_entries: *phase == Phase::AwaitingEntries,
      loading: *phase == Phase::Loading,
      error: match phase {
        Phase::Failed(message) => Some(message.clone()),
        _ => None,
      },
      resolution: match phase {
        Phase::Answered(resolution) => Some(*resolution),
        _ => None,
      },
      input_enabled,
      // Next is offered after an answer and as the retry after a failure
      next_visible: signed_in && (answered || matches!(phase, Phase::Failed(_))),
      flashcard,
      cloze,
      feedback,
      suggestions: if answered { state.suggestions().to_vec() } else { Vec::new() },
      usable_entries: usable_entries(state.entries()).len(),
    }
  }
}

fn flashcard_view(q: &FlashcardQuestion, state: &SessionState, answered: bool, input_enabled: bool) -> FlashcardView {
  let options = q
    .options
    .iter()
    .map(|o| {
      let wrong = state.wrong_options().contains(&o.id);
      let mark = if answered && o.is_correct {
        Some("correct")
      } else if wrong {
        Some("wrong")
      } else {
        None
      };
      OptionView {
        id: o.id.clone(),
        label: o.label.clone(),
        disabled: !input_enabled || wrong,
        state: mark,
        translation: if answered { o.translation.clone() } else { None },
        note: if answered { o.note.clone() } else { None },
      }
    })
    .collect();

  FlashcardView {
    entry_id: q.entry_id,
    prompt: q.prompt.clone(),
    part_of_speech: q.part_of_speech.clone(),
    options,
  }
}

fn cloze_view(q: &ClozeQuestion, state: &SessionState, input_enabled: bool) -> ClozeView {
  ClozeView {
    entry_id: q.entry_id,
    prompt: q.prompt.clone(),
    segments: q.segments(),
    hint: q.hint.clone(),
    revealed_answer: state.revealed_answer().map(str::to_string),
    check_enabled: input_enabled,
    give_up_enabled: input_enabled,
  }
}
