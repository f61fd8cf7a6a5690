use crate::domain::model::{Extraction, PageCursor, PageSummary, Query, ResultSet};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Human-readable location of the storage root, used in progress messages.
    fn location(&self) -> &str;
}

pub trait ConfigProvider: Send + Sync {
    fn api_key(&self) -> &str;
    fn username(&self) -> &str;
    fn query_file(&self) -> &str;
    fn output_path(&self) -> &str;
    /// Endpoint override; `None` means the dataset's own endpoint.
    fn api_endpoint(&self) -> Option<&str>;
    fn timeout_seconds(&self) -> Option<u64>;
}

/// A raw page as the API answered it.
#[derive(Debug, Clone)]
pub enum PageResponse {
    Ok(serde_json::Value),
    Rejected { status: u16 },
}

#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(
        &self,
        endpoint: &str,
        query: &Query,
        cursor: Option<&PageCursor>,
    ) -> Result<PageResponse>;
}

/// One flavour of passive DNS export: which endpoint it reads, how a page
/// becomes rows, and how the rows are ordered on disk.
pub trait Dataset: Send + Sync {
    type Page: DeserializeOwned + Send;
    type Record: Serialize + Send + Sync;

    fn default_endpoint(&self) -> &'static str;
    fn file_suffix(&self) -> &'static str;
    fn header(&self) -> &'static [&'static str];
    fn summary(&self, query: &Query, page: &Self::Page) -> PageSummary;
    fn next_cursor(&self, page: &Self::Page) -> Option<PageCursor>;
    fn normalize(&self, query: &Query, page: Self::Page) -> Vec<Self::Record>;

    /// Final ordering applied once every page has arrived. Arrival order by default.
    fn finalize(&self, _records: &mut Vec<Self::Record>) {}

    fn file_name(&self, query: &Query) -> String {
        format!("{}{}", query, self.file_suffix())
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Record: Send;

    async fn extract(&self, query: &Query) -> Result<Extraction<Self::Record>>;
    async fn transform(&self, data: ResultSet<Self::Record>) -> Result<ResultSet<Self::Record>>;
    async fn load(&self, result: ResultSet<Self::Record>) -> Result<String>;
}
