pub mod controller;
pub mod selector;
pub mod state;
pub mod view;

pub use controller::PractiseController;
pub use selector::{pick_entry, shuffle_options};
pub use state::{AnswerOutcome, Feedback, FeedbackKind, LoadOutcome, LoadTicket, Phase, Question, SessionState};
pub use view::PractiseView;
