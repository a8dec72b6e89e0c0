pub mod engine;
pub mod extractor;
pub mod input;
pub mod pipeline;
pub mod response;
pub mod target;

pub use crate::domain::model::{InputRow, ResultRecord, ScrapeOutcome};
pub use crate::domain::ports::{
    ConfigProvider, Fetcher, Pipeline, ShutdownFlag, Sleeper, Storage,
};
pub use crate::utils::error::Result;
