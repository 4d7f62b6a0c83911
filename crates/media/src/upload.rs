//! Image → public URL through a file-hosting service.

use std::path::Path;

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::{debug, warn},
};

use crate::error::{Context, Error, Result};

/// Hosts a local file and returns a URL the completion backend can fetch.
#[async_trait]
pub trait FileHost: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<String>;
}

/// Filestack store API: `POST {endpoint}?key=...` with the raw bytes.
pub struct FilestackUploader {
    client: reqwest::Client,
    endpoint: String,
    api_key: Secret<String>,
}

#[derive(Deserialize)]
struct StoreResponse {
    url: String,
}

impl FilestackUploader {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, api_key: Secret<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl FileHost for FilestackUploader {
    async fn upload(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        debug!(file = %file_name, size = bytes.len(), "uploading file");

        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("key", self.api_key.expose_secret().as_str()),
                ("filename", file_name.as_str()),
            ])
            .header("content-type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::external("upload request failed", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "upload rejected");
            return Err(Error::Upload {
                status: status.as_u16(),
                body,
            });
        }

        let stored: StoreResponse = resp
            .json()
            .await
            .map_err(|e| Error::external("unexpected upload response", e))?;
        Ok(stored.url)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher};

    fn uploader(server: &mockito::Server) -> FilestackUploader {
        FilestackUploader::new(
            reqwest::Client::new(),
            format!("{}/api/store/S3", server.url()),
            Secret::new("fs-key".into()),
        )
    }

    #[tokio::test]
    async fn returns_hosted_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AgAD123.jpg");
        std::fs::write(&path, b"\xff\xd8jpeg").unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/store/S3")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("key".into(), "fs-key".into()),
                Matcher::UrlEncoded("filename".into(), "AgAD123.jpg".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"url":"https://cdn.filestackcontent.com/abc","size":6}"#)
            .create_async()
            .await;

        let url = uploader(&server).upload(&path).await.unwrap();
        assert_eq!(url, "https://cdn.filestackcontent.com/abc");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejection_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.jpg");
        std::fs::write(&path, b"x").unwrap();

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/store/S3")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("invalid key")
            .create_async()
            .await;

        let err = uploader(&server).upload(&path).await.unwrap_err();
        assert!(matches!(err, Error::Upload { status: 403, .. }));
    }

    #[tokio::test]
    async fn missing_file_propagates() {
        let server = mockito::Server::new_async().await;
        let err = uploader(&server)
            .upload(Path::new("/nonexistent/photo.jpg"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
