// Library interface for trainready
// The binary and integration tests go through these modules

pub mod config;
pub mod database;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod models;
pub mod progression;
pub mod readiness;
pub mod recommendations;
pub mod session_load;
pub mod store;
pub mod trends;
pub mod validation;

// Re-export commonly used types for convenience
pub use models::*;
pub use database::SqliteStore;
pub use dispatcher::{Action, DispatchResponse, Dispatcher};
pub use error::{Result, StoreError, TrainReadyError, ValidationError};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use progression::{ProgressionConfig, ProgressionRule, ProgressionSuggester, ProgressionSuggestion};
pub use readiness::{ReadinessCalculator, ReadinessTier};
pub use recommendations::RecommendationGenerator;
pub use session_load::{SessionLoadCalculator, WorkloadConfig};
pub use store::{MemoryStore, TrainingStore};
pub use trends::{TrendAnalyzer, TrendConfig, TrendDirection};
