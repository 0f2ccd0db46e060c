//! `docportal-core`: domain types shared by the portal client.
//!
//! This crate contains **pure domain** primitives (no I/O): identities,
//! sessions, credentials, dashboard payloads and the API error taxonomy.

pub mod dashboard;
pub mod error;
pub mod id;
pub mod role;
pub mod session;

pub use dashboard::{DashboardSummary, DocumentSummary, DocumentType, HealthStatus, SummaryMetric};
pub use error::{ApiError, ApiResult};
pub use id::UserId;
pub use role::Role;
pub use session::{BearerToken, Credentials, LoginResult, Session, UserProfile};
