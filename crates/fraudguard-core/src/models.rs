//! Domain models for the fraud evaluation pipeline.
//!
//! A [`WorkItem`] is parsed from one inbound queue message, resolved to a
//! [`FileContent`] by the content fetcher, and evaluated into a [`VerdictSet`].
//! The verdict set is the only input to the two persisted shapes
//! ([`FraudRecord`], [`UserFraudStatus`]) and to the outbound [`NotificationMessage`].

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

use crate::error::PipelineError;

/// Location of a stored object: container (bucket) plus object key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocator {
    pub bucket: String,
    pub key: String,
}

impl StorageLocator {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl Display for StorageLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Wire shape of an inbound message. Every field is optional here so that
/// missing fields surface as `MalformedMessage` with a field name instead of
/// a serde error.
#[derive(Debug, Deserialize)]
struct InboundMessage {
    bucket: Option<String>,
    key: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

/// One unit of fraud-evaluation work: a file and the user who owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub locator: StorageLocator,
    pub user_id: String,
}

impl WorkItem {
    pub fn new(locator: StorageLocator, user_id: impl Into<String>) -> Self {
        Self {
            locator,
            user_id: user_id.into(),
        }
    }

    /// Parse an inbound message body.
    ///
    /// Schema: `{"bucket": string, "key": string, "userId": string}`. Unknown
    /// fields are ignored; missing, non-string or blank fields are rejected.
    pub fn from_message(body: &str) -> Result<Self, PipelineError> {
        let message: InboundMessage = serde_json::from_str(body)
            .map_err(|e| PipelineError::MalformedMessage(format!("invalid JSON: {}", e)))?;

        let bucket = required_field(message.bucket, "bucket")?;
        let key = required_field(message.key, "key")?;
        let user_id = required_field(message.user_id, "userId")?;

        Ok(Self::new(StorageLocator::new(bucket, key), user_id))
    }
}

fn required_field(value: Option<String>, name: &str) -> Result<String, PipelineError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(PipelineError::MalformedMessage(format!(
            "field '{}' is empty",
            name
        ))),
        None => Err(PipelineError::MalformedMessage(format!(
            "missing field '{}'",
            name
        ))),
    }
}

/// Raw bytes of a fetched object plus its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

impl FileContent {
    pub fn new(bytes: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex-encoded SHA-256 of the content bytes.
    pub fn sha256_hex(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

/// The signal sources that contribute a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorKind {
    AiInference,
    IdentityHistory,
    ContentHeuristic,
}

impl EvaluatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluatorKind::AiInference => "ai_inference",
            EvaluatorKind::IdentityHistory => "identity_history",
            EvaluatorKind::ContentHeuristic => "content_heuristic",
        }
    }
}

impl Display for EvaluatorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// The three verdicts for one work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictSet {
    pub ai_fraud: bool,
    pub legacy_fraud: bool,
    pub content_fraud: bool,
}

impl VerdictSet {
    pub fn new(ai_fraud: bool, legacy_fraud: bool, content_fraud: bool) -> Self {
        Self {
            ai_fraud,
            legacy_fraud,
            content_fraud,
        }
    }

    /// Combined flag: any single positive verdict escalates the user.
    pub fn is_fraud(&self) -> bool {
        self.ai_fraud || self.legacy_fraud || self.content_fraud
    }
}

/// Document persisted once per successfully fetched work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudRecord {
    pub id: Uuid,
    pub user_id: String,
    pub bucket: String,
    pub key: String,
    pub content_type: Option<String>,
    pub size_bytes: u64,
    pub content_sha256: String,
    pub verdicts: VerdictSet,
    pub created_at: DateTime<Utc>,
}

impl FraudRecord {
    pub fn new(item: &WorkItem, content: &FileContent, verdicts: VerdictSet) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: item.user_id.clone(),
            bucket: item.locator.bucket.clone(),
            key: item.locator.key.clone(),
            content_type: content.content_type.clone(),
            size_bytes: content.len() as u64,
            content_sha256: content.sha256_hex(),
            verdicts,
            created_at: Utc::now(),
        }
    }
}

/// Relational row recording that a user has been flagged. Last write wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFraudStatus {
    pub user_id: String,
    pub is_fraud: bool,
    pub updated_at: DateTime<Utc>,
}

impl UserFraudStatus {
    pub fn flagged(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_fraud: true,
            updated_at: Utc::now(),
        }
    }
}

/// Outbound notification. Serializes to exactly four keys with the checks
/// rendered as `"true"` / `"false"` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "aiFraudCheck", serialize_with = "bool_as_str")]
    pub ai_fraud_check: bool,
    #[serde(rename = "legacyFraudCheck", serialize_with = "bool_as_str")]
    pub legacy_fraud_check: bool,
    #[serde(rename = "contentFraudCheck", serialize_with = "bool_as_str")]
    pub content_fraud_check: bool,
}

impl NotificationMessage {
    pub fn new(user_id: impl Into<String>, verdicts: &VerdictSet) -> Self {
        Self {
            user_id: user_id.into(),
            ai_fraud_check: verdicts.ai_fraud,
            legacy_fraud_check: verdicts.legacy_fraud,
            content_fraud_check: verdicts.content_fraud,
        }
    }

    /// Text payload handed to the outbound channel.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn bool_as_str<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "true" } else { "false" })
}
