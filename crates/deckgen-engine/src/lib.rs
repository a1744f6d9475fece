pub mod analyzer;
pub mod batch;
pub mod error;
pub mod generator;
pub mod prompt;

pub use batch::BatchOutcome;
pub use error::EngineError;
pub use generator::{ContentGenerator, GeneratorConfig};
