use crate::config::ScraperConfig;
use crate::core::Fetcher;
use crate::domain::model::FetchedPage;
use crate::utils::error::{FetchError, Result, ScraperError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();

        let agent = HeaderValue::from_str(&config.user_agent).map_err(|e| {
            ScraperError::InvalidConfigValueError {
                field: "user_agent".to_string(),
                value: config.user_agent.clone(),
                reason: e.to_string(),
            }
        })?;
        headers.insert(USER_AGENT, agent);

        for (name, value) in &config.headers {
            let invalid = |reason: String| ScraperError::InvalidConfigValueError {
                field: format!("headers.{}", name),
                value: value.clone(),
                reason,
            };
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
            headers.insert(header_name, header_value);
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

fn classify_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(err.to_string())
    } else if err.is_decode() {
        FetchError::MalformedResponse(err.to_string())
    } else {
        FetchError::Network(err.to_string())
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        tracing::debug!("GET {} -> {}", url, status);

        if let Some(err) = FetchError::from_status(status.as_u16()) {
            return Err(err);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(classify_transport_error)?;

        Ok(FetchedPage {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}
