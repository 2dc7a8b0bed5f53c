//! File-backed persistence: one pretty-printed JSON payload per template

use async_trait::async_trait;
use clause_editor::{PersistenceAdapter, PersistenceError, TemplatePayload};
use crc32fast::Hasher;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct FileAdapter {
    dir: PathBuf,
}

impl FileAdapter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    async fn write(&self, path: &Path, payload: &TemplatePayload) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(payload).map_err(backend)?;
        tokio::fs::create_dir_all(&self.dir).await.map_err(backend)?;
        tokio::fs::write(path, json).await.map_err(backend)
    }
}

/// `usr-t-{crc32 of name}{unix millis}`
pub fn template_id(name: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(name.as_bytes());
    format!(
        "usr-t-{:x}{}",
        hasher.finalize(),
        chrono::Utc::now().timestamp_millis()
    )
}

fn backend(err: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::Backend(err.to_string())
}

#[async_trait]
impl PersistenceAdapter for FileAdapter {
    async fn create_template(&self, payload: &TemplatePayload) -> Result<String, PersistenceError> {
        let id = template_id(&payload.name);
        self.write(&self.path_for(&id), payload).await?;
        Ok(id)
    }

    async fn update_template(&self, id: &str, payload: &TemplatePayload) -> Result<(), PersistenceError> {
        let path = self.path_for(id);
        if !tokio::fs::try_exists(&path).await.map_err(backend)? {
            return Err(PersistenceError::NotFound(id.to_string()));
        }
        self.write(&path, payload).await
    }

    async fn get_template(&self, id: &str) -> Result<TemplatePayload, PersistenceError> {
        let content = match tokio::fs::read_to_string(self.path_for(id)).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(PersistenceError::NotFound(id.to_string()))
            }
            Err(err) => return Err(backend(err)),
        };
        serde_json::from_str(&content).map_err(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str) -> TemplatePayload {
        TemplatePayload {
            name: name.to_string(),
            category: "기타".to_string(),
            field_schema: Vec::new(),
            document: "<p>본문</p>".to_string(),
        }
    }

    #[test]
    fn test_template_id_shape() {
        let id = template_id("매매 계약서");
        assert!(id.starts_with("usr-t-"));
        assert!(id.len() > "usr-t-".len() + 8);
    }

    #[tokio::test]
    async fn test_file_adapter_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FileAdapter::new(dir.path().join("templates"));

        let id = adapter.create_template(&payload("a")).await.unwrap();
        assert!(adapter.path_for(&id).exists());

        adapter.update_template(&id, &payload("b")).await.unwrap();
        assert_eq!(adapter.get_template(&id).await.unwrap().name, "b");
    }

    #[tokio::test]
    async fn test_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FileAdapter::new(dir.path());
        assert_eq!(
            adapter.get_template("nope").await,
            Err(PersistenceError::NotFound("nope".to_string()))
        );
        assert_eq!(
            adapter.update_template("nope", &payload("a")).await,
            Err(PersistenceError::NotFound("nope".to_string()))
        );
    }
}
