mod network_common;

pub mod types;

pub mod api;
pub mod config;
pub mod error;
pub mod mistral;
pub mod mock;
pub mod quotes;
pub mod selector;
pub mod server;

use std::sync::Arc;

use crate::config::{Args, ClientOptions};
use crate::error::ClientOptionsError;
use crate::mistral::{MistralClient, MistralModel};
use crate::quotes::QuoteClient;
use crate::selector::ContentSelector;

/// Build the selector from parsed runtime configuration.
///
/// # Errors
/// Returns an error when either upstream URL is invalid or an HTTP client
/// cannot be constructed.
pub fn new_selector(args: &Args) -> Result<ContentSelector, ClientOptionsError> {
    new_selector_with_options(
        args.mistral_model.clone(),
        &args.mistral_api_key,
        args.mistral_options()?,
        args.quote_options()?,
    )
}

/// Build the selector against explicit endpoints, e.g. mock upstreams.
///
/// # Errors
/// Returns an error when an HTTP client cannot be constructed.
pub fn new_selector_with_options(
    model: MistralModel,
    api_key: &str,
    joke_options: ClientOptions,
    quote_options: ClientOptions,
) -> Result<ContentSelector, ClientOptionsError> {
    let joke = MistralClient::with_options(model, api_key, joke_options)?;
    let quote = QuoteClient::with_options(quote_options)?;

    Ok(ContentSelector::new(Arc::new(joke), Arc::new(quote)))
}
