pub mod client;
pub mod etl;
pub mod pipeline;
pub mod reader;
pub mod writer;

pub use crate::domain::model::{Extraction, FetchFailure, PageCursor, Query, ResultSet};
pub use crate::domain::ports::{ConfigProvider, Dataset, PageResponse, PageSource, Pipeline, Storage};
pub use crate::utils::error::Result;
