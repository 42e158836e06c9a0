pub mod clean;
pub mod condense;
pub mod config;
pub mod encode;
pub mod error;
pub mod normalize;
pub mod schema;

pub use clean::{clean_observations, CleanedFrame, CleaningReport, CleaningStage, CLEANING_STAGES};
pub use condense::{condense_cleaned, condense_frame, CondenseReport, CondensedFrame};
pub use config::{ConfigError, PipelineConfig, WeatherConsensus};
pub use error::{CleanError, Result};
pub use schema::LcdSchema;
