pub mod categorizer;
pub mod detect;
pub mod error;
pub mod extractor;
pub mod fmt;
pub mod logger;
pub mod models;
pub mod normalizer;
pub mod patterns;
pub mod pdf;
pub mod processor;
pub mod recurring;
pub mod reports;
pub mod settings;

pub use error::{ErrorPayload, Result, StatementError};
pub use processor::{Focus, ProcessOptions, StatementProcessor, StatementReport};
pub use settings::Settings;
