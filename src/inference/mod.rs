pub mod fallback;
pub mod gateway;
pub mod types;

pub use fallback::synthesize;
pub use gateway::{GatewayPhase, InferenceGateway, Outcome};
pub use types::{
    FailureKind, InferenceRequest, InferenceResult, InferenceSource, Journey, JourneyStage,
    Persona, RemoteDecision, Suggestion, SuggestionContent, UiMode,
};
