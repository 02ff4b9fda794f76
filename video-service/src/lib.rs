pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod routes;
pub mod services;

use std::sync::Arc;

use credentials::{HashParams, TokenIssuer};

use config::Config;
use db::{UserStore, VideoStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub videos: Arc<dyn VideoStore>,
    pub tokens: TokenIssuer,
    pub hash_params: HashParams,
    pub cdn_base_url: String,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, config: &Config) -> Self
    where
        S: UserStore + VideoStore + 'static,
    {
        AppState {
            users: store.clone(),
            videos: store,
            tokens: TokenIssuer::new(config.signing_key.as_bytes(), config.issuer.as_str(), config.audience.as_str(), config.token_ttl),
            hash_params: config.hash_params,
            cdn_base_url: config.cdn_base_url.clone(),
        }
    }
}
