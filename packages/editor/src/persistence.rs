//! # Persistence
//!
//! The save/load contract the editor consumes. Storage itself lives outside
//! the engine; the editor only needs create, update and fetch.

use crate::variables::VariableField;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::Mutex;

/// Opaque storage failure; the engine only distinguishes success from failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Storage failure: {0}")]
    Backend(String),
}

/// Everything stored for one template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePayload {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, alias = "formSchema")]
    pub field_schema: Vec<VariableField>,
    /// Page payloads joined by the page delimiter
    #[serde(default, alias = "htmlTemplate")]
    pub document: String,
}

#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Store a new template and return its id
    async fn create_template(&self, payload: &TemplatePayload) -> Result<String, PersistenceError>;

    async fn update_template(&self, id: &str, payload: &TemplatePayload) -> Result<(), PersistenceError>;

    async fn get_template(&self, id: &str) -> Result<TemplatePayload, PersistenceError>;
}

/// In-process adapter with call counters and one-shot failure injection
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    templates: Mutex<HashMap<String, TemplatePayload>>,
    fail_next: Mutex<Option<String>>,
    next_id: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
    fetches: AtomicUsize,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored template
    pub async fn insert(&self, id: impl Into<String>, payload: TemplatePayload) {
        self.templates.lock().await.insert(id.into(), payload);
    }

    pub async fn stored(&self, id: &str) -> Option<TemplatePayload> {
        self.templates.lock().await.get(id).cloned()
    }

    /// Make the next call fail with `message`
    pub async fn fail_next(&self, message: impl Into<String>) {
        *self.fail_next.lock().await = Some(message.into());
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Total adapter calls of any kind
    pub fn calls(&self) -> usize {
        self.creates() + self.updates() + self.fetches()
    }

    async fn injected_failure(&self) -> Result<(), PersistenceError> {
        match self.fail_next.lock().await.take() {
            Some(message) => Err(PersistenceError::Backend(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryAdapter {
    async fn create_template(&self, payload: &TemplatePayload) -> Result<String, PersistenceError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.injected_failure().await?;
        let id = format!("tpl-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.templates.lock().await.insert(id.clone(), payload.clone());
        Ok(id)
    }

    async fn update_template(&self, id: &str, payload: &TemplatePayload) -> Result<(), PersistenceError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.injected_failure().await?;
        let mut templates = self.templates.lock().await;
        match templates.get_mut(id) {
            Some(stored) => {
                *stored = payload.clone();
                Ok(())
            }
            None => Err(PersistenceError::NotFound(id.to_string())),
        }
    }

    async fn get_template(&self, id: &str) -> Result<TemplatePayload, PersistenceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.injected_failure().await?;
        self.templates
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clause_markup::FieldType;

    fn payload(name: &str) -> TemplatePayload {
        TemplatePayload {
            name: name.to_string(),
            category: "매매".to_string(),
            field_schema: vec![VariableField::new(FieldType::Text, "매도인")],
            document: "<p>x</p>".to_string(),
        }
    }

    #[test]
    fn test_payload_wire_shape() {
        let json = serde_json::to_value(payload("계약서")).unwrap();
        assert_eq!(json["name"], "계약서");
        assert_eq!(json["fieldSchema"][0]["key"], "매도인");
        assert_eq!(json["fieldSchema"][0]["type"], "text");
        assert_eq!(json["fieldSchema"][0]["placeholderHint"], "매도인 을(를) 입력하세요");
        assert_eq!(json["document"], "<p>x</p>");
    }

    #[test]
    fn test_payload_accepts_legacy_names() {
        let json = r#"{
            "name": "임대차",
            "formSchema": [{"key": "보증금", "label": "보증금", "type": "money", "placeholder": "금액", "required": true}],
            "htmlTemplate": "<p>{{보증금}}</p>"
        }"#;
        let payload: TemplatePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.category, "");
        assert_eq!(payload.field_schema[0].field_type, FieldType::Other("money".to_string()));
        assert_eq!(payload.field_schema[0].placeholder_hint, "금액");
        assert_eq!(payload.document, "<p>{{보증금}}</p>");
    }

    #[tokio::test]
    async fn test_memory_adapter_roundtrip() {
        let adapter = MemoryAdapter::new();
        let id = adapter.create_template(&payload("a")).await.unwrap();
        adapter.update_template(&id, &payload("b")).await.unwrap();
        assert_eq!(adapter.get_template(&id).await.unwrap().name, "b");
        assert_eq!((adapter.creates(), adapter.updates(), adapter.fetches()), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_memory_adapter_failures() {
        let adapter = MemoryAdapter::new();
        assert_eq!(
            adapter.update_template("missing", &payload("a")).await,
            Err(PersistenceError::NotFound("missing".to_string()))
        );

        adapter.fail_next("offline").await;
        assert_eq!(
            adapter.create_template(&payload("a")).await,
            Err(PersistenceError::Backend("offline".to_string()))
        );
        assert!(adapter.create_template(&payload("a")).await.is_ok());
    }
}
