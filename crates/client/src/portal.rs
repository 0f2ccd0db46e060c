//! Typed wrappers over the portal's read endpoints.

use docportal_core::{ApiResult, DashboardSummary, DocumentSummary, DocumentType, HealthStatus};
use reqwest::Method;

use crate::api::{ApiClient, RequestDescriptor};
use crate::loader::ResourceLoader;

pub const DASHBOARD_ENDPOINT: &str = "/dashboard";
pub const DOCUMENTS_ENDPOINT: &str = "/documentos";
pub const DOCUMENT_TYPES_ENDPOINT: &str = "/tipos-documentos";
pub const HEALTH_ENDPOINT: &str = "/health";

#[derive(Debug, Clone)]
pub struct PortalApi {
    api: ApiClient,
}

impl PortalApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn client(&self) -> &ApiClient {
        &self.api
    }

    /// Role-dependent summary counters for the current user.
    pub async fn dashboard(&self) -> ApiResult<DashboardSummary> {
        self.api
            .execute_as(RequestDescriptor::new(Method::GET, DASHBOARD_ENDPOINT))
            .await
    }

    pub async fn documents(&self) -> ApiResult<Vec<DocumentSummary>> {
        self.api
            .execute_as(RequestDescriptor::new(Method::GET, DOCUMENTS_ENDPOINT))
            .await
    }

    pub async fn document_types(&self) -> ApiResult<Vec<DocumentType>> {
        self.api
            .execute_as(RequestDescriptor::new(Method::GET, DOCUMENT_TYPES_ENDPOINT))
            .await
    }

    pub async fn health(&self) -> ApiResult<HealthStatus> {
        self.api
            .execute_as(RequestDescriptor::new(Method::GET, HEALTH_ENDPOINT))
            .await
    }

    /// Loader for the dashboard summary. Not activated yet.
    pub fn dashboard_loader(&self) -> ResourceLoader<DashboardSummary> {
        let portal = self.clone();
        ResourceLoader::new(move || {
            let portal = portal.clone();
            async move { portal.dashboard().await }
        })
    }
}
