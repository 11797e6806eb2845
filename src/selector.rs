use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use crate::api::ContentSource;
use crate::types::ContentResult;

/// Fair coin: `true` means a joke.
pub fn should_send_joke<R>(rng: &mut R) -> bool
where
    R: Rng + ?Sized,
{
    rng.gen::<f64>() < 0.5
}

/// Picks a joke or a quote on every call. Holds no per-request state.
#[derive(Clone)]
pub struct ContentSelector {
    joke: Arc<dyn ContentSource>,
    quote: Arc<dyn ContentSource>,
}

impl ContentSelector {
    pub fn new(joke: Arc<dyn ContentSource>, quote: Arc<dyn ContentSource>) -> Self {
        Self { joke, quote }
    }

    pub async fn select_content(&self) -> ContentResult {
        let send_joke = should_send_joke(&mut rand::thread_rng());
        self.select_with(send_joke).await
    }

    pub async fn select_with(&self, send_joke: bool) -> ContentResult {
        let source = if send_joke { &self.joke } else { &self.quote };
        debug!("selected {} from {}", source.kind(), source.provider());

        source.produce().await
    }
}
