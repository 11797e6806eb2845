//! Runtime configuration.
//!
//! Every option is a CLI flag with an environment variable fallback, read once
//! at startup. The prompt, keyword list and fallback copy are compile-time
//! constants.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::error::ClientOptionsError;
use crate::mistral::MistralModel;
use crate::mock::MockUpstreamServer;

pub const DEFAULT_MISTRAL_API_URL: &str = "https://api.mistral.ai/v1/chat/completions";
pub const DEFAULT_ZENQUOTES_API_URL: &str = "https://zenquotes.io/api/random";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

pub const TEMPERATURE: f64 = 0.7;

pub const KEYWORDS: [&str; 10] = [
    "Anxiety", "Fear", "Freedom", "Life", "Living", "Love", "Pain", "Past", "Time", "Today",
];

pub const JOKE_PROMPT: &str = r#"You are Dave Chappelle,the world famous comedian, trying to cheer up your friend who just went through a breakup.
Generate a single lighthearted joke about relationships, dating, or heartbreak that might make them laugh.
The joke should be original, not commonly known, and avoid being mean-spirited.
Return ONLY the joke text with no additional formatting, warnings, or explanation.
Example tone: "They say there are plenty of fish in the sea, so I'm gonna go back to holding my rod until I catch something else.""#;

pub const QUOTE_FALLBACK: &str = "Sometimes the best quote is the one that remains unspoken.";
pub const QUOTE_FALLBACK_AUTHOR: &str = "Error Handler";
pub const JOKE_TIMEOUT_FALLBACK: &str =
    "The AI service took long to respond. Maybe it's thinking really hard about being funny!";
pub const JOKE_FALLBACK: &str =
    "Sorry, I couldn't generate a joke right now. My comedy circuit is having a bad day!";

/// Joker - serves a random joke or inspirational quote over HTTP
#[derive(Parser, Debug, Clone)]
#[command(name = "joker")]
#[command(about = "Serves a random joke or inspirational quote as JSON")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Bearer token for the completion API. Left empty, joke requests fail upstream
    #[arg(long, env = "MISTRAL_API_KEY", default_value = "", hide_env_values = true)]
    pub mistral_api_key: String,

    /// Chat completion endpoint
    #[arg(long, env = "MISTRAL_API_URL", default_value = DEFAULT_MISTRAL_API_URL)]
    pub mistral_api_url: String,

    /// Completion model
    #[arg(long, env = "MISTRAL_MODEL", default_value = "mistral-medium")]
    pub mistral_model: MistralModel,

    /// Random-quote-by-keyword endpoint; the keyword is appended as a path segment
    #[arg(long, env = "ZENQUOTES_API_URL", default_value = DEFAULT_ZENQUOTES_API_URL)]
    pub zenquotes_api_url: String,

    /// Deadline for each upstream call in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn mistral_options(&self) -> Result<ClientOptions, ClientOptionsError> {
        Ok(ClientOptions::from_base_url(&self.mistral_api_url)?.with_timeout(self.request_timeout()))
    }

    pub fn quote_options(&self) -> Result<ClientOptions, ClientOptionsError> {
        Ok(ClientOptions::from_base_url(&self.zenquotes_api_url)?.with_timeout(self.request_timeout()))
    }

    pub fn validate(&self) -> Result<(), ClientOptionsError> {
        self.mistral_options()?;
        self.quote_options()?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointUrl {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl EndpointUrl {
    pub fn origin(&self) -> String {
        match (self.scheme, self.port) {
            (Scheme::Https, 443) => format!("https://{}", self.host),
            (Scheme::Http, 80) => format!("http://{}", self.host),
            _ => format!("{}://{}:{}", self.scheme.as_str(), self.host, self.port),
        }
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.origin(), self.path)
    }

    /// Appends `segment` to the endpoint path.
    pub fn join(&self, segment: &str) -> String {
        format!("{}/{}", self.url().trim_end_matches('/'), segment)
    }
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub endpoint: EndpointUrl,
    pub disable_proxy: bool,
    pub timeout: Duration,
}

impl ClientOptions {
    pub fn from_base_url(base_url: impl AsRef<str>) -> Result<Self, ClientOptionsError> {
        let url = url::Url::parse(base_url.as_ref())?;
        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(ClientOptionsError::UnsupportedScheme(other.to_string())),
        };

        let host = url
            .host_str()
            .ok_or(ClientOptionsError::MissingHost)?
            .to_string();

        let port = url
            .port_or_known_default()
            .ok_or(ClientOptionsError::MissingPort)?;

        Ok(Self {
            endpoint: EndpointUrl {
                scheme,
                host: host.clone(),
                port,
                path: url.path().to_string(),
            },
            disable_proxy: matches!(host.as_str(), "localhost" | "127.0.0.1"),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn for_mock_server(
        server: &MockUpstreamServer,
        path: &str,
    ) -> Result<Self, ClientOptionsError> {
        let mut options = Self::from_base_url(format!("{}{}", server.base_url(), path))?;
        options.disable_proxy = true;
        Ok(options)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn http_client(&self) -> Result<reqwest::Client, ClientOptionsError> {
        let builder = reqwest::Client::builder();
        let builder = if self.disable_proxy {
            builder.no_proxy()
        } else {
            builder
        };

        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_base_url_keeps_path_and_default_port() {
        let options = ClientOptions::from_base_url(DEFAULT_MISTRAL_API_URL).unwrap();

        assert_eq!(options.endpoint.scheme, Scheme::Https);
        assert_eq!(options.endpoint.host, "api.mistral.ai");
        assert_eq!(options.endpoint.port, 443);
        assert_eq!(options.endpoint.path, "/v1/chat/completions");
        assert_eq!(options.endpoint.url(), DEFAULT_MISTRAL_API_URL);
        assert!(!options.disable_proxy);
        assert_eq!(options.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn loopback_urls_skip_proxy_and_keep_port() {
        let options = ClientOptions::from_base_url("http://127.0.0.1:4242/api/random").unwrap();

        assert!(options.disable_proxy);
        assert_eq!(options.endpoint.origin(), "http://127.0.0.1:4242");
        assert_eq!(
            options.endpoint.join("Love"),
            "http://127.0.0.1:4242/api/random/Love"
        );
    }

    #[test]
    fn join_does_not_double_slashes() {
        let options = ClientOptions::from_base_url("https://zenquotes.io/api/random/").unwrap();

        assert_eq!(
            options.endpoint.join("Time"),
            "https://zenquotes.io/api/random/Time"
        );
    }

    #[test]
    fn rejects_unsupported_scheme() {
        assert!(matches!(
            ClientOptions::from_base_url("ftp://zenquotes.io/api"),
            Err(ClientOptionsError::UnsupportedScheme(scheme)) if scheme == "ftp"
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            ClientOptions::from_base_url("not a url"),
            Err(ClientOptionsError::InvalidUrl(_))
        ));
    }

    #[test]
    fn args_defaults() {
        let args = Args::parse_from([
            "joker",
            "--mistral-api-key",
            "k",
        ]);

        assert_eq!(args.listen.port(), 8080);
        assert_eq!(args.mistral_api_key, "k");
        assert_eq!(args.mistral_model, MistralModel::MistralMedium);
        assert_eq!(args.request_timeout(), DEFAULT_TIMEOUT);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn args_timeout_flows_into_options() {
        let args = Args::parse_from(["joker", "--request-timeout-ms", "250"]);

        assert_eq!(
            args.quote_options().unwrap().timeout,
            Duration::from_millis(250)
        );
        assert_eq!(
            args.mistral_options().unwrap().timeout,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn keywords_are_distinct() {
        let mut sorted = KEYWORDS.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), KEYWORDS.len());
    }
}
