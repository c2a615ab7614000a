pub mod card;
pub mod manager;
pub mod queue;

pub use card::{cards_from, RecommendationCard};
pub use manager::{Attribution, FeedManager, FeedPhase, FetchContext, SwipeDirection};
pub use queue::FeedQueue;
