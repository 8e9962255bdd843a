pub mod database;
pub mod extraction;
pub mod metrics;
pub mod providers;

pub use database::Database;
pub use extraction::{ExtractionError, ExtractionPipeline};
pub use providers::{GeminiProvider, MockProvider, VisionModelProvider};
