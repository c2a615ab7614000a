pub mod feedback_entry;
pub mod questionnaire;
pub mod session_history;

pub use feedback_entry::FeedbackEntry;
pub use questionnaire::QuestionnaireAnswer;
pub use session_history::SessionHistory;
