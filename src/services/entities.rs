//! Entity-detection client speaking the Comprehend `DetectEntities` JSON shape.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{check_status, Entity, EntityDetector};
use crate::config::EntitiesConfig;
use crate::error::ServiceError;

const SERVICE: &str = "entity detection";
const TARGET: &str = "Comprehend_20171127.DetectEntities";

#[derive(Serialize)]
struct DetectEntitiesRequest<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
    #[serde(rename = "LanguageCode")]
    language_code: &'a str,
}

#[derive(Deserialize, Debug)]
struct DetectEntitiesResponse {
    #[serde(rename = "Entities", default)]
    entities: Vec<Entity>,
}

pub struct HttpEntityDetector {
    client: Client,
    endpoint: String,
    language: String,
    api_key: Option<String>,
}

impl HttpEntityDetector {
    pub fn new(client: Client, config: &EntitiesConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

impl EntityDetector for HttpEntityDetector {
    fn detect_entities(&self, text: &str) -> Result<Vec<Entity>, ServiceError> {
        let request = DetectEntitiesRequest {
            text,
            language_code: &self.language,
        };

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("X-Amz-Target", TARGET)
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().map_err(|source| ServiceError::Transport {
            service: SERVICE,
            source,
        })?;
        let parsed: DetectEntitiesResponse = check_status(SERVICE, response)?
            .json()
            .map_err(|e| ServiceError::Decode {
                service: SERVICE,
                reason: e.to_string(),
            })?;

        log::debug!("Detected {} entities", parsed.entities.len());
        Ok(parsed.entities)
    }
}
