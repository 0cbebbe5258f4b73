//! Text-generation client for a hosted model behind an `invoke` endpoint.

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{check_status, TextGenerator};
use crate::config::TextGenerationConfig;
use crate::error::ServiceError;

const SERVICE: &str = "text generation";
const JSON: &str = "application/json";

#[derive(Serialize)]
struct InvokeBody<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug)]
struct InvokeResponse {
    text: String,
}

pub struct HttpTextGenerator {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpTextGenerator {
    pub fn new(client: Client, config: &TextGenerationConfig) -> Self {
        Self {
            client,
            url: format!(
                "{}/model/{}/invoke",
                config.endpoint.trim_end_matches('/'),
                config.model_id
            ),
            api_key: config.api_key.clone(),
        }
    }
}

impl TextGenerator for HttpTextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        let body = serde_json::to_vec(&InvokeBody { text: prompt }).map_err(|e| {
            ServiceError::Decode {
                service: SERVICE,
                reason: e.to_string(),
            }
        })?;

        let mut builder = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .body(body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        log::debug!("Invoking {} with a {}-byte prompt", self.url, prompt.len());
        let response = builder.send().map_err(|source| ServiceError::Transport {
            service: SERVICE,
            source,
        })?;
        let parsed: InvokeResponse =
            check_status(SERVICE, response)?
                .json()
                .map_err(|e| ServiceError::Decode {
                    service: SERVICE,
                    reason: e.to_string(),
                })?;
        Ok(parsed.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: String) -> TextGenerationConfig {
        TextGenerationConfig {
            endpoint,
            model_id: "claude-3-sonnet".to_string(),
            api_key: None,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invokes_model_with_json_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/model/claude-3-sonnet/invoke"))
            .and(header("content-type", JSON))
            .and(header("accept", JSON))
            .and(body_json(json!({"text": "name a chart"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": " Scatter\n"})))
            .expect(1)
            .mount(&server)
            .await;

        let cfg = config(format!("{}/", server.uri()));
        let text = tokio::task::spawn_blocking(move || {
            HttpTextGenerator::new(Client::new(), &cfg).generate("name a chart")
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(text, " Scatter\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn throttling_surfaces_as_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("ThrottlingException"))
            .mount(&server)
            .await;

        let cfg = config(server.uri());
        let err = tokio::task::spawn_blocking(move || {
            HttpTextGenerator::new(Client::new(), &cfg).generate("hello")
        })
        .await
        .unwrap()
        .unwrap_err();
        assert!(matches!(err, ServiceError::Status { status: 429, .. }));
        assert!(err.to_string().contains("ThrottlingException"));
    }
}
