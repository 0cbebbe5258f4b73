//! Handles for the external services: object storage, entity detection
//! and text generation.
//!
//! Each service sits behind a trait so the pipeline can be driven by the
//! HTTP clients in production and by in-memory fakes in tests. A
//! [`Services`] bundle is built once from [`AppConfig`] and passed
//! explicitly to whatever needs it.

pub mod entities;
pub mod storage;
pub mod textgen;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, HttpConfig, StorageBackend};
use crate::error::ServiceError;

pub use entities::HttpEntityDetector;
pub use storage::{HttpStore, LocalStore};
pub use textgen::HttpTextGenerator;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

pub trait ObjectStore: Send + Sync {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ServiceError>;
    fn get(&self, key: &str) -> Result<Vec<u8>, ServiceError>;
}

pub trait EntityDetector: Send + Sync {
    fn detect_entities(&self, text: &str) -> Result<Vec<Entity>, ServiceError>;
}

pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, ServiceError>;
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A span of the query tagged with a semantic category.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Entity {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Score", default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Entity {
    pub fn new(kind: &str, text: &str) -> Self {
        Self {
            kind: kind.to_string(),
            text: text.to_string(),
            score: None,
        }
    }

    pub fn is_quantity(&self) -> bool {
        self.kind.eq_ignore_ascii_case("quantity")
    }

    pub fn is_other(&self) -> bool {
        self.kind.eq_ignore_ascii_case("other")
    }

    /// Lowercased entity text.
    pub fn normalized(&self) -> String {
        self.text.to_lowercase()
    }
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Services {
    pub storage: Arc<dyn ObjectStore>,
    pub entities: Arc<dyn EntityDetector>,
    pub text: Arc<dyn TextGenerator>,
}

impl Services {
    /// Build the HTTP-backed services described by the configuration.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = http_client(&config.http)?;

        let storage: Arc<dyn ObjectStore> = match config.storage.backend {
            StorageBackend::Local => Arc::new(LocalStore::new(
                config.storage.root.clone(),
                &config.storage.bucket,
            )),
            StorageBackend::Http => Arc::new(HttpStore::new(
                client.clone(),
                &config.storage.endpoint,
                &config.storage.bucket,
            )?),
        };

        Ok(Self {
            storage,
            entities: Arc::new(HttpEntityDetector::new(client.clone(), &config.entities)),
            text: Arc::new(HttpTextGenerator::new(client, &config.text_generation)),
        })
    }
}

pub(crate) fn http_client(config: &HttpConfig) -> anyhow::Result<reqwest::blocking::Client> {
    let mut builder = reqwest::blocking::Client::builder();
    // reqwest's blocking client defaults to a 30s timeout; unset means none.
    builder = builder.timeout(config.timeout_seconds.map(Duration::from_secs));
    Ok(builder.build()?)
}

/// Turn a non-success response into [`ServiceError::Status`].
pub(crate) fn check_status(
    service: &'static str,
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(ServiceError::Status {
        service,
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
pub(crate) mod fakes {
    //! In-memory service doubles shared by the pipeline tests.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryStore {
        pub objects: Mutex<HashMap<String, Vec<u8>>>,
        pub puts: Mutex<Vec<String>>,
    }

    impl ObjectStore for MemoryStore {
        fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ServiceError> {
            self.puts.lock().unwrap().push(key.to_string());
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), bytes.to_vec());
            Ok(())
        }

        fn get(&self, key: &str) -> Result<Vec<u8>, ServiceError> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| ServiceError::InvalidKey(key.to_string()))
        }
    }

    pub struct FixedEntities(pub Vec<Entity>);

    impl EntityDetector for FixedEntities {
        fn detect_entities(&self, _text: &str) -> Result<Vec<Entity>, ServiceError> {
            Ok(self.0.clone())
        }
    }

    /// Replies with a fixed answer and records every prompt it receives.
    pub struct ScriptedText {
        pub reply: String,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedText {
        pub fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl TextGenerator for ScriptedText {
        fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    pub struct FailingText;

    impl TextGenerator for FailingText {
        fn generate(&self, _prompt: &str) -> Result<String, ServiceError> {
            Err(ServiceError::Status {
                service: "text generation",
                status: 429,
                body: "throttled".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_categories_match_case_insensitively() {
        assert!(Entity::new("QUANTITY", "2023").is_quantity());
        assert!(Entity::new("quantity", "2023").is_quantity());
        assert!(Entity::new("OTHER", "Bar").is_other());
        assert_eq!(Entity::new("OTHER", "Bar").normalized(), "bar");
    }

    #[test]
    fn entity_decodes_service_shape() {
        let e: Entity =
            serde_json::from_str(r#"{"Type":"QUANTITY","Text":"Revenue","Score":0.9,"BeginOffset":4}"#)
                .unwrap();
        assert_eq!(e.kind, "QUANTITY");
        assert_eq!(e.text, "Revenue");
        assert_eq!(e.score, Some(0.9));
    }

    #[test]
    fn default_config_builds_services() {
        let services = Services::from_config(&AppConfig::default()).unwrap();
        assert_eq!(Arc::strong_count(&services.text), 1);
    }
}
