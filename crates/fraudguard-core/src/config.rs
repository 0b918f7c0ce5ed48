//! Configuration module
//!
//! All endpoints, queue identifiers and policies are read once at startup
//! into [`Config`] and passed explicitly into the components that need them.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

use crate::policy::{EvaluationMode, FailureDisposition, FailurePolicy};

const DB_MAX_CONNECTIONS: u32 = 10;
const DB_TIMEOUT_SECS: u64 = 30;
const INFERENCE_TIMEOUT_MS: u64 = 10_000;
const LEGACY_TIMEOUT_MS: u64 = 5_000;
const WORKER_MAX_CONCURRENCY: usize = 8;
const QUEUE_WAIT_TIME_SECS: i32 = 20;
const QUEUE_BATCH_SIZE: i32 = 10;

/// Where fetched content lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, LocalStack, ...)
    pub s3_endpoint: Option<String>,
    /// Root directory for the local backend; buckets are subdirectories.
    pub local_storage_path: Option<String>,
}

/// A remote evaluator endpoint with its timeout and failure policy.
#[derive(Clone, Debug)]
pub struct EndpointConfig {
    pub url: String,
    /// Sent as a bearer token when present. Never log this value.
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub failure_policy: FailurePolicy,
}

impl EndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    /// Document store for fraud records.
    pub fraud_record_url: String,
    /// Relational store for user fraud status.
    pub user_status_url: String,
    pub max_connections: u32,
    pub timeout_seconds: u64,
}

#[derive(Clone, Debug)]
pub struct QueueConfig {
    pub inbound_queue_url: String,
    pub outbound_queue_url: String,
    pub dead_letter_queue_url: Option<String>,
    pub wait_time_secs: i32,
    pub batch_size: i32,
}

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub max_concurrency: usize,
    pub evaluation_mode: EvaluationMode,
    pub on_failure: FailureDisposition,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub storage: StorageConfig,
    pub inference: EndpointConfig,
    pub legacy: EndpointConfig,
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
    pub worker: WorkerConfig,
}

impl Config {
    /// Load `.env` (if any) and read configuration from the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| {
            var(name).ok_or_else(|| anyhow::anyhow!("{} must be set", name))
        };

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let region = var("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string());

        let storage = StorageConfig {
            backend: parse_or("STORAGE_BACKEND", var("STORAGE_BACKEND"), StorageBackend::S3)?,
            region: region.clone(),
            s3_endpoint: var("S3_ENDPOINT"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
        };

        let inference = EndpointConfig {
            url: required("INFERENCE_ENDPOINT_URL")?,
            api_key: var("INFERENCE_API_KEY"),
            timeout_ms: parse_or(
                "INFERENCE_TIMEOUT_MS",
                var("INFERENCE_TIMEOUT_MS"),
                INFERENCE_TIMEOUT_MS,
            )?,
            failure_policy: parse_or(
                "INFERENCE_FAILURE_POLICY",
                var("INFERENCE_FAILURE_POLICY"),
                FailurePolicy::FailClosed,
            )?,
        };

        let legacy = EndpointConfig {
            url: required("LEGACY_SYSTEM_URL")?,
            api_key: var("LEGACY_API_KEY"),
            timeout_ms: parse_or(
                "LEGACY_TIMEOUT_MS",
                var("LEGACY_TIMEOUT_MS"),
                LEGACY_TIMEOUT_MS,
            )?,
            failure_policy: parse_or(
                "LEGACY_FAILURE_POLICY",
                var("LEGACY_FAILURE_POLICY"),
                FailurePolicy::FailOpen,
            )?,
        };

        let default_database_url = var("DATABASE_URL");
        let database = DatabaseConfig {
            fraud_record_url: var("FRAUD_RECORD_DATABASE_URL")
                .or_else(|| default_database_url.clone())
                .ok_or_else(|| {
                    anyhow::anyhow!("FRAUD_RECORD_DATABASE_URL or DATABASE_URL must be set")
                })?,
            user_status_url: var("USER_STATUS_DATABASE_URL")
                .or(default_database_url)
                .ok_or_else(|| {
                    anyhow::anyhow!("USER_STATUS_DATABASE_URL or DATABASE_URL must be set")
                })?,
            max_connections: parse_or(
                "DB_MAX_CONNECTIONS",
                var("DB_MAX_CONNECTIONS"),
                DB_MAX_CONNECTIONS,
            )?,
            timeout_seconds: parse_or(
                "DB_TIMEOUT_SECONDS",
                var("DB_TIMEOUT_SECONDS"),
                DB_TIMEOUT_SECS,
            )?,
        };

        let queue = QueueConfig {
            inbound_queue_url: required("INBOUND_QUEUE_URL")?,
            outbound_queue_url: required("OUTBOUND_QUEUE_URL")?,
            dead_letter_queue_url: var("DEAD_LETTER_QUEUE_URL"),
            wait_time_secs: parse_or(
                "QUEUE_WAIT_TIME_SECS",
                var("QUEUE_WAIT_TIME_SECS"),
                QUEUE_WAIT_TIME_SECS,
            )?,
            batch_size: parse_or("QUEUE_BATCH_SIZE", var("QUEUE_BATCH_SIZE"), QUEUE_BATCH_SIZE)?,
        };

        let worker = WorkerConfig {
            max_concurrency: parse_or(
                "WORKER_MAX_CONCURRENCY",
                var("WORKER_MAX_CONCURRENCY"),
                WORKER_MAX_CONCURRENCY,
            )?,
            evaluation_mode: parse_or(
                "EVALUATION_MODE",
                var("EVALUATION_MODE"),
                EvaluationMode::default(),
            )?,
            on_failure: parse_or("ON_FAILURE", var("ON_FAILURE"), FailureDisposition::default())?,
        };

        Ok(Config {
            environment,
            storage,
            inference,
            legacy,
            database,
            queue,
            worker,
        })
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        for (name, url) in [
            ("INFERENCE_ENDPOINT_URL", &self.inference.url),
            ("LEGACY_SYSTEM_URL", &self.legacy.url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow::anyhow!("{} must be an http(s) URL", name));
            }
        }

        for (name, url) in [
            ("FRAUD_RECORD_DATABASE_URL", &self.database.fraud_record_url),
            ("USER_STATUS_DATABASE_URL", &self.database.user_status_url),
        ] {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "{} must be a valid PostgreSQL connection string",
                    name
                ));
            }
        }

        if self.inference.timeout_ms == 0 || self.legacy.timeout_ms == 0 {
            return Err(anyhow::anyhow!(
                "INFERENCE_TIMEOUT_MS and LEGACY_TIMEOUT_MS must be greater than zero"
            ));
        }

        if self.storage.backend == StorageBackend::Local {
            if self.is_production() {
                return Err(anyhow::anyhow!(
                    "STORAGE_BACKEND=local is for development only and cannot be used in production"
                ));
            }
            if self.storage.local_storage_path.is_none() {
                return Err(anyhow::anyhow!(
                    "STORAGE_BACKEND=local requires LOCAL_STORAGE_PATH to be set"
                ));
            }
        }

        if self.worker.on_failure == FailureDisposition::DeadLetter
            && self.queue.dead_letter_queue_url.is_none()
        {
            return Err(anyhow::anyhow!(
                "ON_FAILURE=dead_letter requires DEAD_LETTER_QUEUE_URL to be set"
            ));
        }

        if self.worker.max_concurrency == 0 {
            return Err(anyhow::anyhow!("WORKER_MAX_CONCURRENCY must be at least 1"));
        }

        if !(1..=10).contains(&self.queue.batch_size) {
            return Err(anyhow::anyhow!("QUEUE_BATCH_SIZE must be between 1 and 10"));
        }

        if !(0..=20).contains(&self.queue.wait_time_secs) {
            return Err(anyhow::anyhow!(
                "QUEUE_WAIT_TIME_SECS must be between 0 and 20"
            ));
        }

        Ok(())
    }
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", name, value, e)),
        None => Ok(default),
    }
}
