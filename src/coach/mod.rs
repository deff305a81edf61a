pub mod advisor;
pub mod guard;
pub mod http_client;
pub mod inference;
pub mod intent;
pub mod prompt;

pub use advisor::{CoachSettings, FinancialCoach, AI_ERROR_PREFIX, MODEL_NOT_LOADED, NO_DATA};
pub use guard::{contains_arithmetic, GuardVerdict};
pub use http_client::{ChatCompletionsClient, DEFAULT_ENDPOINT};
pub use inference::{GenerationOptions, GenerationStats, GenerationStream, InferenceService};
pub use intent::{classify, derive_fact, FactKind, Intent};
