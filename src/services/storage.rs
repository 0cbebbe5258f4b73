use std::path::PathBuf;

use reqwest::blocking::Client;
use reqwest::Url;

use super::{check_status, ObjectStore};
use crate::error::ServiceError;

const SERVICE: &str = "object storage";

/// Keys are plain file names; anything that could escape the bucket is refused.
fn validate_key(key: &str) -> Result<(), ServiceError> {
    let bad = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0');
    if bad {
        return Err(ServiceError::InvalidKey(key.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Local directory backend
// ---------------------------------------------------------------------------

/// Stores objects as files under `<root>/<bucket>/<key>`.
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(root: PathBuf, bucket: &str) -> Self {
        Self {
            dir: root.join(bucket),
        }
    }
}

impl ObjectStore for LocalStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ServiceError> {
        validate_key(key)?;
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(key);
        std::fs::write(&path, bytes)?;
        log::debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, ServiceError> {
        validate_key(key)?;
        Ok(std::fs::read(self.dir.join(key))?)
    }
}

// ---------------------------------------------------------------------------
// HTTP backend
// ---------------------------------------------------------------------------

/// Path-style bucket access: `PUT`/`GET {endpoint}/{bucket}/{key}`.
///
/// The bucket and key are pushed as single path segments, so characters such
/// as `#`, `?` and `%` in a file name are percent-encoded.
pub struct HttpStore {
    client: Client,
    base: Url,
}

impl HttpStore {
    pub fn new(client: Client, endpoint: &str, bucket: &str) -> Result<Self, ServiceError> {
        let invalid = |reason: String| ServiceError::InvalidEndpoint {
            service: SERVICE,
            endpoint: endpoint.to_string(),
            reason,
        };
        let mut base = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        base.path_segments_mut()
            .map_err(|_| invalid("URL cannot have a path".to_string()))?
            .pop_if_empty()
            .push(bucket);
        Ok(Self { client, base })
    }

    fn url(&self, key: &str) -> Url {
        let mut url = self.base.clone();
        // `new` already proved the base accepts path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(key);
        }
        url
    }
}

impl ObjectStore for HttpStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ServiceError> {
        validate_key(key)?;
        let url = self.url(key);
        let response = self
            .client
            .put(url.clone())
            .body(bytes.to_vec())
            .send()
            .map_err(|source| ServiceError::Transport {
                service: SERVICE,
                source,
            })?;
        check_status(SERVICE, response)?;
        log::debug!("Uploaded {} bytes to {url}", bytes.len());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, ServiceError> {
        validate_key(key)?;
        let response = self
            .client
            .get(self.url(key))
            .send()
            .map_err(|source| ServiceError::Transport {
                service: SERVICE,
                source,
            })?;
        let bytes = check_status(SERVICE, response)?
            .bytes()
            .map_err(|source| ServiceError::Transport {
                service: SERVICE,
                source,
            })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{body_bytes, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn local_store_round_trips_under_bucket() {
        let root = tempfile::tempdir().unwrap();
        let store = LocalStore::new(root.path().to_path_buf(), "uploads");
        store.put("data.csv", b"a,b\n1,2\n").unwrap();
        assert!(root.path().join("uploads").join("data.csv").exists());
        assert_eq!(store.get("data.csv").unwrap(), b"a,b\n1,2\n");
    }

    #[test]
    fn keys_with_separators_are_refused() {
        let root = tempfile::tempdir().unwrap();
        let store = LocalStore::new(root.path().to_path_buf(), "uploads");
        for key in ["../escape.csv", "dir/data.csv", "..", ""] {
            assert!(matches!(
                store.put(key, b"x"),
                Err(ServiceError::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn missing_local_object_is_io_error() {
        let root = tempfile::tempdir().unwrap();
        let store = LocalStore::new(root.path().to_path_buf(), "uploads");
        assert!(matches!(store.get("absent.csv"), Err(ServiceError::Io(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn http_store_puts_and_gets_by_bucket_path() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/uploads/data.csv"))
            .and(body_bytes(b"a,b\n".to_vec()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/uploads/data.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"a,b\n".to_vec()))
            .mount(&server)
            .await;

        let endpoint = format!("{}/", server.uri());
        let fetched = tokio::task::spawn_blocking(move || {
            let store = HttpStore::new(Client::new(), &endpoint, "uploads")?;
            store.put("data.csv", b"a,b\n")?;
            store.get("data.csv")
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(fetched, b"a,b\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn http_store_reports_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("AccessDenied"))
            .mount(&server)
            .await;

        let endpoint = server.uri();
        let err = tokio::task::spawn_blocking(move || {
            HttpStore::new(Client::new(), &endpoint, "uploads")?.get("data.csv")
        })
        .await
        .unwrap()
        .unwrap_err();
        match err {
            ServiceError::Status { status, body, .. } => {
                assert_eq!(status, 403);
                assert_eq!(body, "AccessDenied");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn http_store_percent_encodes_key_characters() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/uploads/Q1%232024.csv"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/uploads/sales%3Fdraft%25.csv"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = server.uri();
        tokio::task::spawn_blocking(move || {
            let store = HttpStore::new(Client::new(), &endpoint, "uploads")?;
            store.put("Q1#2024.csv", b"a\n1\n")?;
            store.put("sales?draft%.csv", b"a\n1\n")
        })
        .await
        .unwrap()
        .unwrap();
    }

    #[test]
    fn http_store_rejects_malformed_endpoint() {
        let err = HttpStore::new(Client::new(), "not a url", "uploads")
            .err()
            .unwrap();
        assert!(matches!(err, ServiceError::InvalidEndpoint { .. }));
    }
}
