//! `docportal-client`
//!
//! **Responsibility:** session and data layer of the document portal client.
//!
//! This crate provides:
//! - Durable session storage (token + identity, kept in step)
//! - An authenticated JSON API client with uniform error classification
//! - Login/logout orchestration
//! - A read-through loader for dashboard data
//!
//! Views are a thin shell around [`PortalState`].

pub mod api;
pub mod auth;
pub mod config;
pub mod loader;
pub mod portal;
pub mod session;
pub mod state;
pub mod storage;

pub use api::{ApiClient, RequestDescriptor};
pub use auth::AuthController;
pub use config::{ClientConfig, ConfigError, RetryPolicy};
pub use loader::{LoadPhase, ResolutionOrder, ResourceLoader, ResourceState};
pub use portal::PortalApi;
pub use session::SessionStore;
pub use state::{PortalState, StartupError};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};
