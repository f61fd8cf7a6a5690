use crate::core::writer::render_csv;
use crate::core::{
    Dataset, Extraction, FetchFailure, PageCursor, PageResponse, PageSource, Pipeline, Query,
    ResultSet, Storage,
};
use crate::utils::error::{EtlError, Result};
use serde_json::Value;
use std::path::Path;

/// Pages through one dataset endpoint per query and writes the result set to storage.
pub struct ResolutionPipeline<D: Dataset, A: PageSource, S: Storage> {
    dataset: D,
    source: A,
    storage: S,
    endpoint: String,
}

impl<D: Dataset, A: PageSource, S: Storage> ResolutionPipeline<D, A, S> {
    /// Uses the dataset's own endpoint unless `endpoint` overrides it.
    pub fn new(dataset: D, source: A, storage: S, endpoint: Option<&str>) -> Self {
        let endpoint = endpoint.unwrap_or(dataset.default_endpoint()).to_string();
        Self {
            dataset,
            source,
            storage,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Outer error is fatal for the run; inner failure only ends this query.
    async fn request(
        &self,
        query: &Query,
        cursor: Option<&PageCursor>,
    ) -> Result<std::result::Result<Value, FetchFailure>> {
        match self.source.fetch_page(&self.endpoint, query, cursor).await {
            Ok(PageResponse::Ok(body)) => Ok(Ok(body)),
            Ok(PageResponse::Rejected { status }) => Ok(Err(FetchFailure::Status(status))),
            // 連線層錯誤和非 200 一樣只放棄這個查詢
            Err(EtlError::ApiError(e)) => Ok(Err(FetchFailure::Transport(e.to_string()))),
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
impl<D: Dataset, A: PageSource, S: Storage> Pipeline for ResolutionPipeline<D, A, S> {
    type Record = D::Record;

    async fn extract(&self, query: &Query) -> Result<Extraction<D::Record>> {
        let mut result_set = ResultSet::new(query.clone());
        let mut cursor: Option<PageCursor> = None;

        loop {
            tracing::info!("Querying resolutions for: {}", query.defanged());

            let body = match self.request(query, cursor.as_ref()).await? {
                Ok(body) => body,
                Err(failure) => {
                    tracing::error!(
                        "❌ Error in getting data for the domain: {} ({})",
                        query.defanged(),
                        failure
                    );
                    if result_set.pages == 0 {
                        return Ok(Extraction::Abandoned {
                            query: query.clone(),
                            failure,
                        });
                    }
                    tracing::warn!(
                        "Keeping {} records from {} pages already fetched for {}",
                        result_set.records.len(),
                        result_set.pages,
                        query.defanged()
                    );
                    result_set.truncated_by = Some(failure);
                    break;
                }
            };

            let page: D::Page =
                serde_json::from_value(body).map_err(|e| EtlError::ResponseFormat {
                    query: query.to_string(),
                    message: e.to_string(),
                })?;

            if result_set.pages == 0 {
                println!("\n{}", self.dataset.summary(query, &page));
            }

            let next = self.dataset.next_cursor(&page);
            let records = self.dataset.normalize(query, page);
            tracing::debug!(
                "Page {} for {}: {} records",
                result_set.pages + 1,
                query.defanged(),
                records.len()
            );
            result_set.records.extend(records);
            result_set.pages += 1;

            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(Extraction::Collected(result_set))
    }

    async fn transform(&self, mut data: ResultSet<D::Record>) -> Result<ResultSet<D::Record>> {
        self.dataset.finalize(&mut data.records);
        Ok(data)
    }

    async fn load(&self, result: ResultSet<D::Record>) -> Result<String> {
        let file_name = self.dataset.file_name(&result.query);
        let csv = render_csv(self.dataset.header(), &result.records)?;

        tracing::debug!("Writing {} ({} bytes)", file_name, csv.len());
        self.storage.write_file(&file_name, &csv).await?;

        println!(
            "CSV file for {} created in {}\n",
            result.query.defanged(),
            self.storage.location()
        );
        Ok(Path::new(self.storage.location())
            .join(file_name)
            .to_string_lossy()
            .into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::datasets::{AllResolutions, UniqueResolutions};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Serves canned responses in order and records the cursor of every request.
    struct ScriptedSource {
        responses: Mutex<Vec<PageResponse>>,
        seen_cursors: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<PageResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().rev().collect()),
                seen_cursors: Mutex::new(Vec::new()),
            }
        }

        fn cursors(&self) -> Vec<Option<String>> {
            self.seen_cursors.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(
            &self,
            _endpoint: &str,
            _query: &Query,
            cursor: Option<&PageCursor>,
        ) -> Result<PageResponse> {
            self.seen_cursors
                .lock()
                .unwrap()
                .push(cursor.map(|c| c.as_str().to_string()));
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop()
                .expect("more requests than scripted responses"))
        }
    }

    #[async_trait::async_trait]
    impl<T: PageSource> PageSource for Arc<T> {
        async fn fetch_page(
            &self,
            endpoint: &str,
            query: &Query,
            cursor: Option<&PageCursor>,
        ) -> Result<PageResponse> {
            (**self).fetch_page(endpoint, query, cursor).await
        }
    }

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn get_file(&self, path: &str) -> Option<String> {
            let files = self.files.lock().unwrap();
            files
                .get(path)
                .map(|bytes| String::from_utf8(bytes.clone()).unwrap())
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().unwrap();
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        fn location(&self) -> &str {
            "memory"
        }
    }

    fn resolution_page(results: serde_json::Value, next: Option<&str>) -> PageResponse {
        PageResponse::Ok(json!({
            "firstSeen": "2015-01-01 00:00:00",
            "lastSeen": "2016-06-01 00:00:00",
            "queryType": "domain",
            "totalRecords": 3,
            "pager": next.map(|n| json!({"next": n})).unwrap_or(json!(null)),
            "results": results,
        }))
    }

    fn collected<R>(extraction: Extraction<R>) -> ResultSet<R> {
        match extraction {
            Extraction::Collected(set) => set,
            Extraction::Abandoned { failure, .. } => panic!("query abandoned: {}", failure),
        }
    }

    #[tokio::test]
    async fn test_follows_cursor_until_pager_is_empty() {
        let source = Arc::new(ScriptedSource::new(vec![
            resolution_page(json!([{"resolve": "1.1.1.1"}]), Some("page-2")),
            resolution_page(json!([{"resolve": "2.2.2.2"}, {"resolve": "3.3.3.3"}]), Some("page-3")),
            resolution_page(json!([{"resolve": "4.4.4.4"}]), None),
        ]));
        let pipeline =
            ResolutionPipeline::new(AllResolutions, source.clone(), MockStorage::default(), None);

        let set = collected(pipeline.extract(&Query::new("example.com")).await.unwrap());

        assert_eq!(set.pages, 3);
        assert_eq!(set.records.len(), 4);
        assert!(set.is_complete());
        assert_eq!(
            source.cursors(),
            vec![None, Some("page-2".to_string()), Some("page-3".to_string())]
        );
        let resolves: Vec<&str> = set.records.iter().map(|r| r.resolve.as_str()).collect();
        assert_eq!(resolves, vec!["1.1.1.1", "2.2.2.2", "3.3.3.3", "4.4.4.4"]);
    }

    #[tokio::test]
    async fn test_first_page_failure_abandons_query() {
        let source = ScriptedSource::new(vec![PageResponse::Rejected { status: 403 }]);
        let pipeline = ResolutionPipeline::new(AllResolutions, source, MockStorage::default(), None);

        let extraction = pipeline.extract(&Query::new("example.com")).await.unwrap();

        match extraction {
            Extraction::Abandoned { query, failure } => {
                assert_eq!(query.as_str(), "example.com");
                assert_eq!(failure, FetchFailure::Status(403));
            }
            Extraction::Collected(_) => panic!("expected the query to be abandoned"),
        }
    }

    #[tokio::test]
    async fn test_later_page_failure_keeps_earlier_records() {
        let source = ScriptedSource::new(vec![
            resolution_page(json!([{"resolve": "1.1.1.1"}]), Some("page-2")),
            PageResponse::Rejected { status: 500 },
        ]);
        let pipeline = ResolutionPipeline::new(AllResolutions, source, MockStorage::default(), None);

        let set = collected(pipeline.extract(&Query::new("example.com")).await.unwrap());

        assert_eq!(set.pages, 1);
        assert_eq!(set.records.len(), 1);
        assert_eq!(set.truncated_by, Some(FetchFailure::Status(500)));
    }

    #[tokio::test]
    async fn test_missing_record_list_is_response_format_error() {
        let source = ScriptedSource::new(vec![PageResponse::Ok(json!({"pager": null}))]);
        let pipeline = ResolutionPipeline::new(AllResolutions, source, MockStorage::default(), None);

        let err = pipeline.extract(&Query::new("example.com")).await.unwrap_err();
        assert!(matches!(err, EtlError::ResponseFormat { ref query, .. } if query == "example.com"));
    }

    #[tokio::test]
    async fn test_all_resolutions_sorted_by_first_seen_descending() {
        let source = ScriptedSource::new(vec![resolution_page(
            json!([
                {"resolve": "a", "firstSeen": "2014-05-01 10:00:00"},
                {"resolve": "b", "firstSeen": "2016-01-01 00:00:00"},
                {"resolve": "c", "firstSeen": "2014-05-01 10:00:00"},
                {"resolve": "d", "firstSeen": "2015-03-03 03:03:03"},
            ]),
            None,
        )]);
        let storage = MockStorage::default();
        let pipeline = ResolutionPipeline::new(AllResolutions, source, storage.clone(), None);

        let set = collected(pipeline.extract(&Query::new("example.com")).await.unwrap());
        let set = pipeline.transform(set).await.unwrap();

        // a 與 c 同時間，保持原本順序
        let resolves: Vec<&str> = set.records.iter().map(|r| r.resolve.as_str()).collect();
        assert_eq!(resolves, vec!["b", "d", "a", "c"]);

        let path = pipeline.load(set).await.unwrap();
        assert!(path.ends_with("example.com_all_resolutions.csv"));

        let csv = storage.get_file("example.com_all_resolutions.csv").unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Domain,Resolution,First Seen,Last Seen,Collected,Source,Record Hash"
        );
        assert_eq!(lines[1], "example.com,b,2016-01-01 00:00:00,-,-,-,-");
        assert_eq!(lines.len(), 5);
    }

    #[tokio::test]
    async fn test_unique_resolutions_keep_delivery_order() {
        let source = ScriptedSource::new(vec![
            PageResponse::Ok(json!({
                "total": 3,
                "pager": {"next": "2"},
                "frequency": [["1.2.3.4", 5], ["5.6.7.8", 2]],
            })),
            PageResponse::Ok(json!({
                "total": 3,
                "pager": false,
                "frequency": [["9.9.9.9", 7]],
            })),
        ]);
        let storage = MockStorage::default();
        let pipeline = ResolutionPipeline::new(UniqueResolutions, source, storage.clone(), None);

        let set = collected(pipeline.extract(&Query::new("foo.com")).await.unwrap());
        let set = pipeline.transform(set).await.unwrap();
        pipeline.load(set).await.unwrap();

        let csv = storage.get_file("foo.com_unique.csv").unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Domain,IP,Frequency",
                "foo.com,1.2.3.4,5",
                "foo.com,5.6.7.8,2",
                "foo.com,9.9.9.9,7"
            ]
        );
    }

    #[tokio::test]
    async fn test_zero_records_still_writes_header() {
        let source = ScriptedSource::new(vec![resolution_page(json!([]), None)]);
        let storage = MockStorage::default();
        let pipeline = ResolutionPipeline::new(AllResolutions, source, storage.clone(), None);

        let set = collected(pipeline.extract(&Query::new("quiet.example")).await.unwrap());
        assert!(set.records.is_empty());
        pipeline.load(set).await.unwrap();

        let csv = storage.get_file("quiet.example_all_resolutions.csv").unwrap();
        assert_eq!(
            csv,
            "Domain,Resolution,First Seen,Last Seen,Collected,Source,Record Hash\r\n"
        );
    }

    #[test]
    fn test_endpoint_override() {
        let pipeline = ResolutionPipeline::new(
            UniqueResolutions,
            ScriptedSource::new(vec![]),
            MockStorage::default(),
            Some("http://127.0.0.1:9000/unique/"),
        );
        assert_eq!(pipeline.endpoint(), "http://127.0.0.1:9000/unique/");

        let pipeline = ResolutionPipeline::new(
            UniqueResolutions,
            ScriptedSource::new(vec![]),
            MockStorage::default(),
            None,
        );
        assert_eq!(
            pipeline.endpoint(),
            "https://api.passivetotal.org/v2/dns/passive/unique/"
        );
    }
}
