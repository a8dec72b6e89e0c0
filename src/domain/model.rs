use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// One data row of the input CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    /// 1-based position among data rows (header excluded).
    pub line: usize,
    /// Trimmed value of the identifier column.
    pub id: String,
    /// Every column of the row keyed by its header.
    pub columns: BTreeMap<String, String>,
}

impl InputRow {
    pub fn column(&self, name: &str) -> Option<&str> {
        self.columns.get(name).map(String::as_str)
    }
}

/// Scraped output for one input row: the identifier, the fetched fields, and
/// an error marker when the fetch failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultRecord {
    /// `id` and `error` are reserved; fetched fields with those names are dropped.
    pub fn success(id: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.remove("id");
        fields.remove("error");
        Self {
            id: id.into(),
            fields,
            error: None,
        }
    }

    pub fn failure(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum OutputShape {
    /// `[{"id": ...}, ...]` in input order.
    #[default]
    Array,
    /// `{"<id>": {...}, ...}`; a repeated identifier keeps its last record.
    ById,
}

/// All records of a run, in the order their rows were read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputDocument {
    records: Vec<ResultRecord>,
}

impl OutputDocument {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_value(&self, shape: OutputShape) -> serde_json::Result<Value> {
        match shape {
            OutputShape::Array => serde_json::to_value(&self.records),
            OutputShape::ById => {
                let mut by_id = Map::new();
                for record in &self.records {
                    let mut entry = serde_json::to_value(record)?;
                    if let Value::Object(obj) = &mut entry {
                        obj.remove("id");
                    }
                    if by_id.insert(record.id.clone(), entry).is_some() {
                        tracing::warn!("Duplicate identifier {} in output, keeping last record", record.id);
                    }
                }
                Ok(Value::Object(by_id))
            }
        }
    }

    /// Pretty-printed with two-space indentation. The array shape keeps `id`
    /// as the first key of every object.
    pub fn to_json(&self, shape: OutputShape) -> serde_json::Result<String> {
        match shape {
            OutputShape::Array => serde_json::to_string_pretty(&self.records),
            OutputShape::ById => serde_json::to_string_pretty(&self.to_value(shape)?),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    Fatal { id: String, reason: String },
    Interrupted,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Fatal { id, reason } => write!(f, "fatal error on {}: {}", id, reason),
            AbortReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows read from the input.
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub aborted: Option<AbortReason>,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Rows never attempted because the run stopped early.
    pub fn skipped(&self) -> usize {
        self.total.saturating_sub(self.processed())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeOutcome {
    pub document: OutputDocument,
    pub summary: RunSummary,
}

/// A successful (2xx) response, before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}
