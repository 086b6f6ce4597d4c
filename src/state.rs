use crate::analysis::{GeminiClient, TextGenerator};
use crate::backend::Backend;
use crate::config::Config;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backend: Arc<dyn Backend>,
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub http: reqwest::Client,
}

/// Outbound client shared by the sentiment proxy and the Gemini generator.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> reqwest::Result<Self> {
        let http = http_client(config.upstream_timeout)?;
        let generator = config.gemini_api_key.as_ref().map(|key| {
            Arc::new(GeminiClient::new(
                http.clone(),
                config.gemini_api_base.clone(),
                config.gemini_model.clone(),
                key.clone(),
            )) as Arc<dyn TextGenerator>
        });

        Ok(Self {
            config: Arc::new(config),
            backend,
            generator,
            http,
        })
    }
}
