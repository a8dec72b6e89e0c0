use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::sync::LazyLock;

static CLAIM_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bclaim\s+(\d+)").expect("valid claim pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claim {
    pub number: usize,
    pub text: String,
    pub is_dependent: bool,
    pub depends_on: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub id: String,
    pub title: String,
}

/// Fields pulled from a Google Patents page. The `Option` fields are only
/// filled in detailed mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatentPage {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filing_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifications: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<Vec<Claim>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

impl PatentPage {
    /// A page with none of the main sections is not a patent page.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.abstract_text.is_empty()
            && self.description.is_empty()
            && self.claims.as_ref().map_or(true, Vec::is_empty)
    }
}

// Selectors below are constants, so parsing cannot fail at runtime.
fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(scope: ElementRef<'_>, css: &str) -> String {
    scope
        .select(&selector(css))
        .next()
        .map(element_text)
        .unwrap_or_default()
}

fn all_text(scope: ElementRef<'_>, css: &str) -> Vec<String> {
    scope.select(&selector(css)).map(element_text).collect()
}

/// Parses the page body. `Html` is not `Send`, so this stays synchronous and
/// returns owned data.
pub fn extract_patent_page(html: &str, detailed: bool) -> PatentPage {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut page = PatentPage {
        title: first_text(root, "h1.title"),
        abstract_text: first_text(root, "div.abstract"),
        description: extract_description(root),
        ..PatentPage::default()
    };

    if detailed {
        page.inventors = Some(all_text(root, r#"dd[itemprop="inventor"] span[itemprop="name"]"#));
        page.assignees = Some(all_text(root, r#"dd[itemprop="assignee"] span[itemprop="name"]"#));
        page.filing_date = Some(first_text(root, r#"dd[itemprop="filingDate"] time"#));
        page.publication_date = Some(first_text(root, r#"dd[itemprop="publicationDate"] time"#));
        page.classifications = Some(all_text(root, "li.classification"));
        page.claims = Some(extract_claims(root));
        page.citations = Some(extract_citations(root));
    }

    page
}

fn extract_description(root: ElementRef<'_>) -> String {
    let Some(section) = root
        .select(&selector(r#"section[itemprop="description"]"#))
        .next()
    else {
        return String::new();
    };

    all_text(section, "div.description-paragraph").join("\n\n")
}

fn extract_claims(root: ElementRef<'_>) -> Vec<Claim> {
    let Some(section) = root.select(&selector(r#"section[itemprop="claims"]"#)).next() else {
        return Vec::new();
    };

    all_text(section, "div.claim")
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let depends_on = CLAIM_REFERENCE
                .captures(&text)
                .and_then(|caps| caps[1].parse::<usize>().ok());
            Claim {
                number: i + 1,
                is_dependent: CLAIM_REFERENCE.is_match(&text),
                depends_on,
                text,
            }
        })
        .collect()
}

fn extract_citations(root: ElementRef<'_>) -> Vec<Citation> {
    let id_selector = selector("td.patent-id");
    let title_selector = selector("td.patent-title");

    root.select(&selector("tr.citation"))
        .filter_map(|row| {
            let id = row.select(&id_selector).next()?;
            let title = row.select(&title_selector).next()?;
            Some(Citation {
                id: element_text(id),
                title: element_text(title),
            })
        })
        .collect()
}
