//! Fraudguard DB Library
//!
//! Persistence for the pipeline: the `FraudRecordStore` and `UserStatusStore`
//! traits, their PostgreSQL implementations, connection setup with migrations,
//! and the `PersistenceSink` the aggregator writes through.

pub mod fraud_record;
pub mod pool;
pub mod sink;
pub mod traits;
pub mod user_status;

pub use fraud_record::FraudRecordRepository;
pub use pool::{setup_pool, StoreKind};
pub use sink::{PersistenceSink, FRAUD_RECORD_STORE, USER_STATUS_STORE};
pub use traits::{FraudRecordStore, UserStatusStore};
pub use user_status::UserStatusRepository;
