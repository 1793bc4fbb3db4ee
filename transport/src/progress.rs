use reqwest::header::HeaderMap;
use serde_json::{Map, Value};
use tracing::debug;

pub const SUMMARY_HEADER: &str = "X-ClickHouse-Summary";

/// The decoded `X-ClickHouse-Summary` object, e.g. `{"read_rows":"10","written_rows":"0"}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSummary(Map<String, Value>);

impl ProgressSummary {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Counters arrive as quoted integers; accept both spellings.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, summary: &ProgressSummary);
}

impl<F> ProgressListener for F
where
    F: Fn(&ProgressSummary) + Send + Sync,
{
    fn on_progress(&self, summary: &ProgressSummary) {
        self(summary)
    }
}

/// Read the last summary header. Missing, malformed and empty summaries all yield `None`.
pub fn parse_summary(headers: &HeaderMap) -> Option<ProgressSummary> {
    let raw = headers.get_all(SUMMARY_HEADER).iter().last()?;
    let text = match raw.to_str() {
        Ok(text) => text,
        Err(e) => {
            debug!(%e, "progress summary is not valid text");
            return None;
        }
    };
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(ProgressSummary(map)),
        Ok(_) => None,
        Err(e) => {
            debug!(%e, summary = text, "cannot decode progress summary");
            None
        }
    }
}

pub(crate) fn report(headers: &HeaderMap, listener: &dyn ProgressListener) {
    if let Some(summary) = parse_summary(headers) {
        listener.on_progress(&summary);
    }
}
