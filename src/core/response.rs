use crate::core::extractor::extract_patent_page;
use crate::domain::model::FetchedPage;
use crate::utils::error::FetchError;
use serde_json::{Map, Value};

fn looks_like_json(page: &FetchedPage) -> bool {
    let declared = page
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));
    declared || page.body.trim_start().starts_with('{')
}

/// Turns a successful response into the fields of a result record.
///
/// JSON bodies must be objects and are merged as-is. Anything else is parsed
/// as a patent page; `url` is added so the record points at its source.
pub fn parse_page(
    url: &str,
    page: &FetchedPage,
    detailed: bool,
) -> Result<Map<String, Value>, FetchError> {
    if page.body.trim().is_empty() {
        return Err(FetchError::MalformedResponse("empty body".to_string()));
    }

    if looks_like_json(page) {
        return match serde_json::from_str::<Value>(&page.body) {
            Ok(Value::Object(fields)) => Ok(fields),
            Ok(_) => Err(FetchError::MalformedResponse(
                "expected a JSON object".to_string(),
            )),
            Err(e) => Err(FetchError::MalformedResponse(format!("invalid JSON: {}", e))),
        };
    }

    let patent = extract_patent_page(&page.body, detailed);
    if patent.is_empty() {
        return Err(FetchError::MalformedResponse(
            "no patent fields found in page".to_string(),
        ));
    }

    let mut fields = Map::new();
    fields.insert("url".to_string(), Value::String(url.to_string()));
    match serde_json::to_value(patent) {
        Ok(Value::Object(extracted)) => fields.extend(extracted),
        Ok(_) => {}
        Err(e) => return Err(FetchError::MalformedResponse(e.to_string())),
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(content_type: Option<&str>, body: &str) -> FetchedPage {
        FetchedPage {
            status: 200,
            content_type: content_type.map(str::to_string),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_json_object_is_merged() {
        let fields = parse_page(
            "http://x/US1",
            &page(Some("application/json"), r#"{"claim":"foo"}"#),
            false,
        )
        .unwrap();
        assert_eq!(Value::Object(fields), json!({"claim": "foo"}));
    }

    #[test]
    fn test_json_detected_without_content_type() {
        let fields = parse_page("http://x/US1", &page(None, r#"  {"n": 1}"#), false).unwrap();
        assert_eq!(fields.get("n"), Some(&json!(1)));
    }

    #[test]
    fn test_json_array_is_malformed() {
        let err = parse_page("http://x", &page(Some("application/json"), "[1,2]"), false)
            .unwrap_err();
        assert_eq!(err.code(), "malformed_response");
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = parse_page("http://x", &page(Some("application/json"), "{oops"), false)
            .unwrap_err();
        assert_eq!(err.code(), "malformed_response");
    }

    #[test]
    fn test_html_page_gets_url_and_fields() {
        let html = r#"<html><body><h1 class="title">Widget</h1><div class="abstract">Cleans.</div></body></html>"#;
        let fields = parse_page(
            "https://patents.google.com/patent/US1B2",
            &page(Some("text/html; charset=utf-8"), html),
            false,
        )
        .unwrap();

        assert_eq!(
            Value::Object(fields),
            json!({
                "url": "https://patents.google.com/patent/US1B2",
                "title": "Widget",
                "abstract": "Cleans.",
                "description": ""
            })
        );
    }

    #[test]
    fn test_html_without_patent_content_is_malformed() {
        let err = parse_page(
            "http://x",
            &page(Some("text/html"), "<html><body>captcha</body></html>"),
            false,
        )
        .unwrap_err();
        assert_eq!(err.code(), "malformed_response");
    }

    #[test]
    fn test_empty_body_is_malformed() {
        let err = parse_page("http://x", &page(Some("application/json"), "  "), false)
            .unwrap_err();
        assert_eq!(err.code(), "malformed_response");
    }
}
