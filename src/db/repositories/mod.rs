mod feedback;
mod fingerprints;
mod questionnaire;
mod session_history;
