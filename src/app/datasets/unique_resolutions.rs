use crate::core::{Dataset, PageCursor, Query};
use crate::domain::model::{facet_text, FrequencyRecord, PageSummary};
use serde::Deserialize;
use serde_json::Value;

/// Distinct IPs seen for an indicator, with how often each was observed.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueResolutions;

#[derive(Debug, Deserialize)]
pub struct FrequencyPage {
    pub total: Option<Value>,
    #[serde(default)]
    pub pager: Value,
    /// `[ip, count]` pairs in API order.
    pub frequency: Vec<(String, u64)>,
}

impl Dataset for UniqueResolutions {
    type Page = FrequencyPage;
    type Record = FrequencyRecord;

    fn default_endpoint(&self) -> &'static str {
        "https://api.passivetotal.org/v2/dns/passive/unique/"
    }

    fn file_suffix(&self) -> &'static str {
        "_unique.csv"
    }

    fn header(&self) -> &'static [&'static str] {
        &["Domain", "IP", "Frequency"]
    }

    fn summary(&self, query: &Query, page: &FrequencyPage) -> PageSummary {
        PageSummary {
            title: format!("Unique resolutions for: {}", query.defanged()),
            lines: vec![("Unique Resolutions", facet_text(page.total.as_ref()))],
        }
    }

    fn next_cursor(&self, page: &FrequencyPage) -> Option<PageCursor> {
        PageCursor::from_pager(&page.pager)
    }

    fn normalize(&self, query: &Query, page: FrequencyPage) -> Vec<FrequencyRecord> {
        page.frequency
            .into_iter()
            .map(|(ip, frequency)| FrequencyRecord {
                domain: query.to_string(),
                ip,
                frequency,
            })
            .collect()
    }
}
