use crate::core::{Dataset, PageCursor, Query};
use crate::domain::model::{facet_text, PageSummary, ResolutionRecord, PLACEHOLDER};
use serde::Deserialize;
use serde_json::Value;

/// Every passive resolution ever observed for an indicator, newest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllResolutions;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionPage {
    pub first_seen: Option<Value>,
    pub last_seen: Option<Value>,
    pub query_type: Option<Value>,
    pub total_records: Option<Value>,
    #[serde(default)]
    pub pager: Value,
    pub results: Vec<RawResolution>,
}

/// A `results` entry. Any facet may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResolution {
    pub value: Option<Value>,
    pub resolve: Option<Value>,
    pub first_seen: Option<Value>,
    pub last_seen: Option<Value>,
    pub collected: Option<Value>,
    pub source: Option<Value>,
    pub record_hash: Option<Value>,
}

impl RawResolution {
    pub fn normalize(self, query: &Query) -> ResolutionRecord {
        let value = match self.value {
            None | Some(Value::Null) => query.to_string(),
            Some(value) => facet_text(Some(&value)),
        };

        ResolutionRecord {
            value,
            resolve: facet_text(self.resolve.as_ref()),
            first_seen: facet_text(self.first_seen.as_ref()),
            last_seen: facet_text(self.last_seen.as_ref()),
            collected: facet_text(self.collected.as_ref()),
            source: join_sources(self.source.as_ref()),
            record_hash: facet_text(self.record_hash.as_ref()),
        }
    }
}

/// `["riskiq", "pingly"]` becomes `riskiq|pingly`; an empty list counts as missing.
fn join_sources(source: Option<&Value>) -> String {
    match source {
        Some(Value::Array(names)) if names.is_empty() => PLACEHOLDER.to_string(),
        Some(Value::Array(names)) => names
            .iter()
            .map(|name| facet_text(Some(name)))
            .collect::<Vec<_>>()
            .join("|"),
        other => facet_text(other),
    }
}

impl Dataset for AllResolutions {
    type Page = ResolutionPage;
    type Record = ResolutionRecord;

    fn default_endpoint(&self) -> &'static str {
        "https://api.passivetotal.org/v2/dns/passive/"
    }

    fn file_suffix(&self) -> &'static str {
        "_all_resolutions.csv"
    }

    fn header(&self) -> &'static [&'static str] {
        &[
            "Domain",
            "Resolution",
            "First Seen",
            "Last Seen",
            "Collected",
            "Source",
            "Record Hash",
        ]
    }

    fn summary(&self, query: &Query, page: &ResolutionPage) -> PageSummary {
        PageSummary {
            title: format!("Results for: {}", query.defanged()),
            lines: vec![
                ("First Seen", facet_text(page.first_seen.as_ref())),
                ("Last Seen", facet_text(page.last_seen.as_ref())),
                ("Query Type", facet_text(page.query_type.as_ref())),
                ("Total Results", facet_text(page.total_records.as_ref())),
            ],
        }
    }

    fn next_cursor(&self, page: &ResolutionPage) -> Option<PageCursor> {
        PageCursor::from_pager(&page.pager)
    }

    fn normalize(&self, query: &Query, page: ResolutionPage) -> Vec<ResolutionRecord> {
        page.results
            .into_iter()
            .map(|raw| raw.normalize(query))
            .collect()
    }

    /// Newest `firstSeen` first. Timestamps are compared as plain strings and
    /// `sort_by` is stable, so equal timestamps keep their arrival order.
    fn finalize(&self, records: &mut Vec<ResolutionRecord>) {
        records.sort_by(|a, b| b.first_seen.cmp(&a.first_seen));
    }
}
