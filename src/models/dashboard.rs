// src/models/dashboard.rs
use crate::models::license::LicenseStatus;
use serde::Serialize;

/// Contadores do painel de um utilizador.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub license_count: usize,   // Licenças liberadas
    pub pending_licenses: usize, // Enviadas e ainda não liberadas
    pub vehicle_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: LicenseStatus,
    pub count: usize,
}

/// Contadores globais do painel administrativo (rascunhos não entram).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_licenses: usize,
    pub by_status: Vec<StatusCount>,
}

impl AdminStats {
    pub fn count_for(&self, status: LicenseStatus) -> usize {
        self.by_status
            .iter()
            .find(|entry| entry.status == status)
            .map_or(0, |entry| entry.count)
    }
}
