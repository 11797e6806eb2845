use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::api::ContentSource;
use crate::config::{ClientOptions, EndpointUrl, KEYWORDS, QUOTE_FALLBACK, QUOTE_FALLBACK_AUTHOR};
use crate::error::{ClientOptionsError, FetchError};
use crate::network_common::{read_json, with_deadline};
use crate::types::{ContentKind, ContentResult, ZenQuote};

/// Draws a topic keyword uniformly from [`KEYWORDS`].
pub fn pick_keyword<R>(rng: &mut R) -> &'static str
where
    R: Rng + ?Sized,
{
    KEYWORDS.choose(rng).copied().unwrap_or(KEYWORDS[0])
}

pub struct QuoteClient {
    pub http_client: reqwest::Client,
    pub endpoint: EndpointUrl,
    pub timeout: std::time::Duration,
}

impl QuoteClient {
    pub fn new() -> Result<Self, ClientOptionsError> {
        Self::with_options(ClientOptions::from_base_url(
            crate::config::DEFAULT_ZENQUOTES_API_URL,
        )?)
    }

    pub fn with_options(options: ClientOptions) -> Result<Self, ClientOptionsError> {
        Ok(Self {
            http_client: options.http_client()?,
            endpoint: options.endpoint,
            timeout: options.timeout,
        })
    }

    pub fn build_request(&self, keyword: &str) -> reqwest::RequestBuilder {
        self.http_client.get(self.endpoint.join(keyword))
    }

    pub fn read_json_response(
        &self,
        response_json: serde_json::Value,
    ) -> Result<ContentResult, FetchError> {
        let quotes: Vec<ZenQuote> = serde_json::from_value(response_json)?;
        let quote = quotes
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::MalformedResponse("empty quote list".to_string()))?;

        Ok(ContentResult::quote(quote.q, quote.a))
    }

    pub async fn fetch_with_keyword(&self, keyword: &str) -> Result<ContentResult, FetchError> {
        with_deadline(self.timeout, async {
            let response = self.build_request(keyword).send().await?;
            let body = read_json(response).await?;
            self.read_json_response(body)
        })
        .await
    }

    /// Fetches a quote for a random keyword, falling back to canned copy on failure.
    pub async fn fetch_quote(&self) -> ContentResult {
        self.produce().await
    }
}

#[async_trait::async_trait]
impl ContentSource for QuoteClient {
    fn kind(&self) -> ContentKind {
        ContentKind::Quote
    }

    fn provider(&self) -> &'static str {
        "zenquotes"
    }

    async fn fetch(&self) -> Result<ContentResult, FetchError> {
        let keyword = pick_keyword(&mut rand::thread_rng());
        debug!("requesting quote for keyword {}", keyword);

        self.fetch_with_keyword(keyword).await
    }

    fn fallback(&self, _error: &FetchError) -> ContentResult {
        ContentResult::quote(QUOTE_FALLBACK, QUOTE_FALLBACK_AUTHOR)
    }
}
