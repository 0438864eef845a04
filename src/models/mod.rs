// Data models for the audit API resources

pub mod account;
pub mod audit;
pub mod billing;
pub mod service;
pub(crate) mod timestamp;

pub use account::{ApiKey, CreateApiKeyRequest, UserProfile};
pub use audit::{AuditEvent, Decision, EventQuery, Metrics};
pub use billing::{PricingPlan, Subscription, UNLIMITED_ACTIONS};
pub use service::HealthStatus;
