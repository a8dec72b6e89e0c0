use crate::domain::model::InputRow;
use crate::utils::error::{Result, ScraperError};
use crate::utils::validation::validate_url;
use std::collections::BTreeMap;
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// Identifier reduced to ASCII alphanumerics.
    Id,
    /// Identifier as written in the input, percent-encoded.
    RawId,
    Column(String),
}

/// Fetch URL pattern such as `https://patents.google.com/patent/US{id}B2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    segments: Vec<Segment>,
}

impl UrlTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let invalid = |reason: &str| ScraperError::InvalidConfigValueError {
            field: "url_template".to_string(),
            value: template.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| invalid("unclosed '{' placeholder"))?;
            let name = after[..close].trim();
            segments.push(match name {
                "" => return Err(invalid("empty '{}' placeholder")),
                "id" => Segment::Id,
                "raw_id" => Segment::RawId,
                column => Segment::Column(column.to_string()),
            });
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        if segments
            .iter()
            .any(|s| matches!(s, Segment::Literal(text) if text.contains('}')))
        {
            return Err(invalid("unmatched '}'"));
        }

        if !segments
            .iter()
            .any(|s| matches!(s, Segment::Id | Segment::RawId))
        {
            return Err(invalid("template must contain {id} or {raw_id}"));
        }

        let parsed = Self { segments };
        let sample = InputRow {
            line: 1,
            id: "US0000000".to_string(),
            columns: BTreeMap::new(),
        };
        validate_url("url_template", &parsed.render(&sample))?;
        Ok(parsed)
    }

    /// Column placeholders whose column is not among `headers`.
    pub fn missing_columns<'a>(&'a self, headers: &[String]) -> Vec<&'a str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Column(name) if !headers.iter().any(|h| h == name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// False when the row has nothing to put in the identifier placeholders,
    /// e.g. an `{id}` template and an identifier made only of punctuation.
    pub fn has_identifier(&self, row: &InputRow) -> bool {
        self.segments.iter().all(|s| match s {
            Segment::Id => !clean_identifier(&row.id).is_empty(),
            Segment::RawId => !row.id.is_empty(),
            _ => true,
        })
    }

    pub fn render(&self, row: &InputRow) -> String {
        let mut url = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Id => url.push_str(&clean_identifier(&row.id)),
                Segment::RawId => url.extend(form_urlencoded::byte_serialize(row.id.as_bytes())),
                Segment::Column(name) => {
                    let value = row.column(name).unwrap_or_default();
                    url.extend(form_urlencoded::byte_serialize(value.as_bytes()));
                }
            }
        }
        url
    }
}

/// Keeps ASCII letters and digits only: `US-6285999-B1` becomes `US6285999B1`.
pub fn clean_identifier(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_alphanumeric).collect()
}
