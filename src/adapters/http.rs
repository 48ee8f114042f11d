/*!
 * HTTP adapter clients.
 *
 * Thin JSON clients for deployments that run the NLP models behind a
 * service boundary: a lemmatizer endpoint and a translation endpoint.
 * Both validate their base URL up front and map transport and status
 * failures into the typed dependency errors the pipeline expects.
 */

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::adapters::{Lemmatizer, Translator};
use crate::errors::DependencyError;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Request body for the lemmatizer endpoint
#[derive(Debug, Serialize)]
struct LemmaRequest<'a> {
    word: &'a str,
    language: &'a str,
}

/// Response body from the lemmatizer endpoint
#[derive(Debug, Deserialize)]
struct LemmaResponse {
    lemma: String,
}

/// Request body for the translation endpoint
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source: &'a str,
    target: &'a str,
}

/// Response body from the translation endpoint
#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translation: String,
}

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

fn validate_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint).with_context(|| format!("Invalid endpoint URL: {}", endpoint))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow::anyhow!("Endpoint must be http(s): {}", endpoint));
    }
    Ok(url)
}

async fn post_json<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
    client: &Client,
    url: Url,
    body: &Req,
    what: &str,
) -> Result<Resp, DependencyError> {
    let response = client.post(url).json(body).send().await.map_err(|e| {
        error!("{} request failed: {}", what, e);
        DependencyError::Protocol {
            status_code: 0,
            message: format!("{} unreachable: {}", what, e),
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(DependencyError::Protocol {
            status_code: status.as_u16(),
            message,
        });
    }

    response.json::<Resp>().await.map_err(|e| DependencyError::Protocol {
        status_code: status.as_u16(),
        message: format!("Failed to parse {} response: {}", what, e),
    })
}

/// Lemmatizer client for a remote lemmatization service
#[derive(Debug)]
pub struct HttpLemmatizer {
    endpoint: Url,
    client: Client,
}

impl HttpLemmatizer {
    /// Create a client for the given endpoint with the default timeout
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_timeout(endpoint, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with an explicit request timeout
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            endpoint: validate_endpoint(endpoint)?,
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl Lemmatizer for HttpLemmatizer {
    async fn lemmatize(&self, word: &str, language: &str) -> Result<String, DependencyError> {
        let response: LemmaResponse = post_json(
            &self.client,
            self.endpoint.clone(),
            &LemmaRequest { word, language },
            "lemmatizer",
        )
        .await
        .map_err(|e| DependencyError::Lemmatizer(e.to_string()))?;

        Ok(response.lemma)
    }
}

/// Translator client for a remote translation service
#[derive(Debug)]
pub struct HttpTranslator {
    endpoint: Url,
    client: Client,
}

impl HttpTranslator {
    /// Create a client for the given endpoint with the default timeout
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_timeout(endpoint, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with an explicit request timeout
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            endpoint: validate_endpoint(endpoint)?,
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, DependencyError> {
        let response: TranslateResponse = post_json(
            &self.client,
            self.endpoint.clone(),
            &TranslateRequest { text, source, target },
            "translator",
        )
        .await
        .map_err(|e| DependencyError::Translator(e.to_string()))?;

        Ok(response.translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_httpLemmatizer_invalidUrl_shouldReject() {
        assert!(HttpLemmatizer::new("not a url").is_err());
        assert!(HttpLemmatizer::new("ftp://example.com/lemma").is_err());
    }

    #[test]
    fn test_httpLemmatizer_validUrl_shouldConstruct() {
        assert!(HttpLemmatizer::new("http://localhost:8090/lemmatize").is_ok());
        assert!(HttpTranslator::new("https://nlp.internal/translate").is_ok());
    }

    #[tokio::test]
    async fn test_httpLemmatizer_unreachableHost_shouldReturnTypedError() {
        let lemmatizer =
            HttpLemmatizer::with_timeout("http://127.0.0.1:1/lemmatize", Duration::from_millis(200))
                .unwrap();

        let result = lemmatizer.lemmatize("Hund", "de").await;
        assert!(matches!(result, Err(DependencyError::Lemmatizer(_))));
    }
}
