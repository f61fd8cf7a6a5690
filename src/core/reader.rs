use crate::core::Query;
use crate::utils::error::Result;
use std::path::Path;

/// Trimmed, non-blank lines in file order. Duplicates are kept.
pub fn parse_indicators(text: &str) -> Vec<Query> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Query::new)
        .collect()
}

pub fn read_indicators<P: AsRef<Path>>(path: P) -> Result<Vec<Query>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let queries = parse_indicators(&text);
    tracing::debug!(
        "Read {} indicators from {}",
        queries.len(),
        path.as_ref().display()
    );
    Ok(queries)
}
