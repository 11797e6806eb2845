use crate::api::ContentSource;
use crate::config::{
    ClientOptions, EndpointUrl, JOKE_FALLBACK, JOKE_PROMPT, JOKE_TIMEOUT_FALLBACK, TEMPERATURE,
};
use crate::error::{ClientOptionsError, FetchError};
use crate::network_common::{read_json, with_deadline};
use crate::types::{ContentKind, ContentResult, Message};

#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum MistralModel {
    #[serde(rename = "mistral-tiny")]
    MistralTiny,
    #[serde(rename = "mistral-small")]
    MistralSmall,
    #[serde(rename = "mistral-medium")]
    MistralMedium,
    #[serde(rename = "mistral-large-latest")]
    MistralLarge,
}

impl MistralModel {
    pub fn from_model_name(model: &str) -> Result<Self, String> {
        match model {
            "mistral-tiny" => Ok(MistralModel::MistralTiny),
            "mistral-small" => Ok(MistralModel::MistralSmall),
            "mistral-medium" => Ok(MistralModel::MistralMedium),
            "mistral-large-latest" => Ok(MistralModel::MistralLarge),
            _ => Err(format!("Unknown Mistral model: {}", model)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MistralModel::MistralTiny => "mistral-tiny",
            MistralModel::MistralSmall => "mistral-small",
            MistralModel::MistralMedium => "mistral-medium",
            MistralModel::MistralLarge => "mistral-large-latest",
        }
    }
}

impl std::str::FromStr for MistralModel {
    type Err = String;

    fn from_str(model: &str) -> Result<Self, Self::Err> {
        MistralModel::from_model_name(model)
    }
}

pub struct MistralClient {
    pub http_client: reqwest::Client,
    pub model: MistralModel,
    pub api_key: String,
    pub endpoint: EndpointUrl,
    pub timeout: std::time::Duration,
}

impl MistralClient {
    pub fn new<K>(model: MistralModel, api_key: K) -> Result<Self, ClientOptionsError>
    where
        K: Into<String>,
    {
        Self::with_options(
            model,
            api_key,
            ClientOptions::from_base_url(crate::config::DEFAULT_MISTRAL_API_URL)?,
        )
    }

    pub fn with_options<K>(
        model: MistralModel,
        api_key: K,
        options: ClientOptions,
    ) -> Result<Self, ClientOptionsError>
    where
        K: Into<String>,
    {
        Ok(Self {
            http_client: options.http_client()?,
            model,
            api_key: api_key.into(),
            endpoint: options.endpoint,
            timeout: options.timeout,
        })
    }

    /// Build a single-turn chat completion request
    pub fn build_request(&self, chat_history: &[Message]) -> reqwest::RequestBuilder {
        let body = serde_json::json!({
            "model": self.model.as_str(),
            "messages": chat_history
                .iter()
                .map(Message::to_json)
                .collect::<Vec<serde_json::Value>>(),
            "temperature": TEMPERATURE,
        });

        self.http_client
            .post(self.endpoint.url())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
    }

    pub fn read_json_response(
        &self,
        response_json: &serde_json::Value,
    ) -> Result<String, FetchError> {
        response_json
            .get("choices")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("message"))
            .and_then(|v| v.get("content"))
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| {
                FetchError::MalformedResponse("Missing 'choices[0].message.content'".to_string())
            })
    }

    pub async fn prompt(&self, chat_history: &[Message]) -> Result<String, FetchError> {
        with_deadline(self.timeout, async {
            let response = self.build_request(chat_history).send().await?;
            let body = read_json(response).await?;
            self.read_json_response(&body)
        })
        .await
    }

    /// Asks the model for a joke, falling back to canned copy on failure.
    pub async fn fetch_joke(&self) -> ContentResult {
        self.produce().await
    }
}

#[async_trait::async_trait]
impl ContentSource for MistralClient {
    fn kind(&self) -> ContentKind {
        ContentKind::Joke
    }

    fn provider(&self) -> &'static str {
        "mistral"
    }

    async fn fetch(&self) -> Result<ContentResult, FetchError> {
        let content = self.prompt(&[Message::user(JOKE_PROMPT)]).await?;
        Ok(ContentResult::joke(content))
    }

    fn fallback(&self, error: &FetchError) -> ContentResult {
        if error.is_timeout() {
            ContentResult::joke(JOKE_TIMEOUT_FALLBACK)
        } else {
            ContentResult::joke(JOKE_FALLBACK)
        }
    }
}
