pub mod config;
pub mod pipeline;
pub mod store_file;

pub use config::{ConfigError, Settings};
pub use pipeline::{EnrichedTransaction, PipelineError, ProcessedStatement, StatementPipeline};
pub use store_file::StoreFileError;
