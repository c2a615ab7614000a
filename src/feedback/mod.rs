pub mod events;
pub mod sink;
pub mod types;

pub use events::EventTracker;
pub use sink::FeedbackSink;
pub use types::{
    ContentTags, EventBatch, EventKind, FeedbackAck, FeedbackEvent, FeedbackRequest, Polarity,
    TrackedEvent,
};
