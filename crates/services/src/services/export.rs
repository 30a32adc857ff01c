//! Turning export responses into downloadable files.
//!
//! The backend answers export mutations with either a base64 document
//! (optionally as a data URL), a serialized Node buffer, or a link to a
//! pre-built file. All three end up as one `ExportArtifact` delivered to a
//! `DownloadSink` exactly once.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::info;
use url::Url;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid base64 document: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unexpected export payload: {0}")]
    UnexpectedPayload(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("download failed: {0}")]
    Download(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportArtifact {
    Document { file_name: String, bytes: Vec<u8> },
    Link { file_name: String, url: Url },
}

impl ExportArtifact {
    pub fn from_response(value: &Value, file_name: &str) -> Result<Self, ExportError> {
        let file_name = file_name.to_string();
        match value {
            Value::String(raw) => {
                let raw = raw.trim();
                if raw.starts_with("http://") || raw.starts_with("https://") {
                    let url = Url::parse(raw)
                        .map_err(|e| ExportError::UnexpectedPayload(e.to_string()))?;
                    return Ok(Self::Link { file_name, url });
                }
                Ok(Self::Document {
                    file_name,
                    bytes: decode_base64(raw)?,
                })
            }
            Value::Object(obj) if obj.get("type").and_then(Value::as_str) == Some("Buffer") => {
                let data = obj
                    .get("data")
                    .and_then(Value::as_array)
                    .ok_or_else(|| ExportError::UnexpectedPayload("buffer without data".into()))?;
                let bytes = data
                    .iter()
                    .map(|b| {
                        b.as_u64()
                            .and_then(|b| u8::try_from(b).ok())
                            .ok_or_else(|| ExportError::UnexpectedPayload(format!("bad byte {b}")))
                    })
                    .collect::<Result<Vec<u8>, _>>()?;
                Ok(Self::Document { file_name, bytes })
            }
            Value::Null => Err(ExportError::UnexpectedPayload("empty export".into())),
            other => Err(ExportError::UnexpectedPayload(other.to_string())),
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            Self::Document { file_name, .. } | Self::Link { file_name, .. } => file_name,
        }
    }
}

/// Decode plain base64 or a `data:<mime>;base64,` URL.
fn decode_base64(raw: &str) -> Result<Vec<u8>, ExportError> {
    let body = match raw.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, body)| body)
            .ok_or_else(|| ExportError::UnexpectedPayload("data url without body".into()))?,
        None => raw,
    };
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

/// Where a delivered export ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub path: PathBuf,
    pub size: usize,
}

#[async_trait]
pub trait DownloadSink: Send + Sync {
    async fn deliver(&self, artifact: ExportArtifact) -> Result<Delivery, ExportError>;
}

/// Writes exports into a directory; links are fetched first.
#[derive(Debug, Clone)]
pub struct FsDownloadSink {
    dir: PathBuf,
    http: Client,
}

impl FsDownloadSink {
    pub fn new(dir: impl Into<PathBuf>, http: Client) -> Self {
        Self {
            dir: dir.into(),
            http,
        }
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, ExportError> {
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ExportError::Download(e.to_string()))?;
        let bytes = res
            .bytes()
            .await
            .map_err(|e| ExportError::Download(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => "export.xlsx".to_string(),
        other => other.to_string(),
    }
}

async fn write_file(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(safe_file_name(file_name));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

#[async_trait]
impl DownloadSink for FsDownloadSink {
    async fn deliver(&self, artifact: ExportArtifact) -> Result<Delivery, ExportError> {
        let (file_name, bytes) = match artifact {
            ExportArtifact::Document { file_name, bytes } => (file_name, bytes),
            ExportArtifact::Link { file_name, url } => {
                info!(url = %url, "fetching export link");
                let bytes = self.fetch(&url).await?;
                (file_name, bytes)
            }
        };
        let path = write_file(&self.dir, &file_name, &bytes).await?;
        info!(path = %path.display(), size = bytes.len(), "export saved");
        Ok(Delivery {
            path,
            size: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_base64_document() {
        let artifact =
            ExportArtifact::from_response(&json!("AAECAwQ="), "Category.xlsx").unwrap();
        assert_eq!(
            artifact,
            ExportArtifact::Document {
                file_name: "Category.xlsx".into(),
                bytes: vec![0, 1, 2, 3, 4],
            }
        );
    }

    #[test]
    fn test_data_url_document() {
        let raw = "data:application/vnd.openxmlformats-officedocument.spreadsheetml.sheet;base64,AAEC\nAwQ=";
        let artifact = ExportArtifact::from_response(&json!(raw), "x.xlsx").unwrap();
        assert!(matches!(artifact, ExportArtifact::Document { ref bytes, .. } if bytes.len() == 5));
    }

    #[test]
    fn test_node_buffer_document() {
        let artifact = ExportArtifact::from_response(
            &json!({ "type": "Buffer", "data": [80, 75, 3, 4] }),
            "x.xlsx",
        )
        .unwrap();
        assert!(matches!(artifact, ExportArtifact::Document { ref bytes, .. } if bytes == &[80, 75, 3, 4]));

        let err = ExportArtifact::from_response(
            &json!({ "type": "Buffer", "data": [300] }),
            "x.xlsx",
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::UnexpectedPayload(_)));
    }

    #[test]
    fn test_link() {
        let artifact =
            ExportArtifact::from_response(&json!("https://files.example.org/a.xlsx"), "a.xlsx")
                .unwrap();
        assert!(matches!(artifact, ExportArtifact::Link { ref url, .. } if url.host_str() == Some("files.example.org")));
    }

    #[test]
    fn test_null_and_garbage_rejected() {
        assert!(ExportArtifact::from_response(&Value::Null, "a").is_err());
        assert!(matches!(
            ExportArtifact::from_response(&json!("@@@"), "a"),
            Err(ExportError::Base64(_))
        ));
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("../etc/passwd"), ".._etc_passwd");
        assert_eq!(safe_file_name(".."), "export.xlsx");
        assert_eq!(safe_file_name("Paddy Variety.xlsx"), "Paddy Variety.xlsx");
    }

    #[tokio::test]
    async fn test_fs_sink_writes_document_once() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsDownloadSink::new(dir.path(), Client::new());
        let delivery = sink
            .deliver(ExportArtifact::Document {
                file_name: "Season.xlsx".into(),
                bytes: vec![1, 2, 3],
            })
            .await
            .unwrap();
        assert_eq!(delivery.size, 3);
        assert_eq!(std::fs::read(&delivery.path).unwrap(), vec![1, 2, 3]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
