//! Payloads of the portal's read endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Role;

/// Body of `GET /dashboard`.
///
/// The server sends a different subset of counters depending on the caller's
/// role, so every counter is optional. Anything else is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_transportadoras: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_usuarios: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_documentos: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentos_pendentes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentos_aprovados: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meus_documentos: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One labelled counter on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryMetric {
    pub label: &'static str,
    pub value: u64,
}

impl SummaryMetric {
    fn new(label: &'static str, value: Option<u64>) -> Self {
        Self {
            label,
            value: value.unwrap_or(0),
        }
    }
}

impl DashboardSummary {
    /// Counters shown to a user with `role`; missing counters read as 0.
    pub fn metrics_for(&self, role: &Role) -> Vec<SummaryMetric> {
        if role.is_admin() {
            vec![
                SummaryMetric::new("Transportadoras", self.total_transportadoras),
                SummaryMetric::new("Usuários", self.total_usuarios),
                SummaryMetric::new("Total Documentos", self.total_documentos),
                SummaryMetric::new("Pendentes", self.documentos_pendentes),
            ]
        } else {
            vec![
                SummaryMetric::new("Meus Documentos", self.meus_documentos),
                SummaryMetric::new("Aprovados", self.documentos_aprovados),
                SummaryMetric::new("Pendentes", self.documentos_pendentes),
            ]
        }
    }
}

/// Entry of `GET /documentos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: i64,
    pub nome: String,
    pub tipo: String,
    pub status: String,
    #[serde(default)]
    pub data_upload: Option<String>,
    #[serde(default)]
    pub transportadora: Option<String>,
}

/// Entry of `GET /tipos-documentos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentType {
    pub id: String,
    pub nome: String,
    #[serde(default)]
    pub descricao: String,
    #[serde(default)]
    pub formatos_aceitos: Vec<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn admin_metrics() {
        let summary: DashboardSummary = serde_json::from_value(json!({
            "total_transportadoras": 15,
            "total_usuarios": 40,
            "total_documentos": 156,
            "documentos_pendentes": 12
        }))
        .unwrap();

        let metrics = summary.metrics_for(&Role::admin());
        let values: Vec<_> = metrics.iter().map(|m| (m.label, m.value)).collect();
        assert_eq!(
            values,
            vec![
                ("Transportadoras", 15),
                ("Usuários", 40),
                ("Total Documentos", 156),
                ("Pendentes", 12),
            ]
        );
    }

    #[test]
    fn carrier_metrics_default_missing_counters_to_zero() {
        let summary: DashboardSummary = serde_json::from_value(json!({
            "meus_documentos": 4,
            "ultima_atualizacao": "2024-01-16T14:20:00Z"
        }))
        .unwrap();

        let metrics = summary.metrics_for(&Role::carrier());
        assert_eq!(metrics[0].value, 4);
        assert_eq!(metrics[1].value, 0);
        assert_eq!(metrics[2].value, 0);
        assert_eq!(
            summary.extra.get("ultima_atualizacao"),
            Some(&json!("2024-01-16T14:20:00Z"))
        );
    }
}
