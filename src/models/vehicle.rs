// src/models/vehicle.rs
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// Categorias de veículo aceites no cadastro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum VehicleType {
    #[serde(rename = "Unidade Tratora (Cavalo)")]
    #[sqlx(rename = "Unidade Tratora (Cavalo)")]
    UnidadeTratora,
    #[serde(rename = "Semirreboque")]
    #[sqlx(rename = "Semirreboque")]
    Semirreboque,
    #[serde(rename = "Reboque")]
    #[sqlx(rename = "Reboque")]
    Reboque,
    #[serde(rename = "Dolly")]
    #[sqlx(rename = "Dolly")]
    Dolly,
    #[serde(rename = "Prancha")]
    #[sqlx(rename = "Prancha")]
    Prancha,
}

impl VehicleType {
    pub const ALL: [VehicleType; 5] = [
        VehicleType::UnidadeTratora,
        VehicleType::Semirreboque,
        VehicleType::Reboque,
        VehicleType::Dolly,
        VehicleType::Prancha,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::UnidadeTratora => "Unidade Tratora (Cavalo)",
            VehicleType::Semirreboque => "Semirreboque",
            VehicleType::Reboque => "Reboque",
            VehicleType::Dolly => "Dolly",
            VehicleType::Prancha => "Prancha",
        }
    }
}

impl FromStr for VehicleType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::InvalidInput(format!("Tipo de veículo inválido: {}", s)))
    }
}

// Representa um veículo lido da tabela 'vehicles'
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: i64,
    pub license_plate: String,
    pub vehicle_type: VehicleType,
    pub weight: i64,        // Tara em kg
    pub document_year: i64, // Ano do CRLV
    pub document_url: Option<String>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Dados de um veículo novo, já validados pela camada web.
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub license_plate: String,
    pub vehicle_type: VehicleType,
    pub weight: i64,
    pub document_year: i64,
    pub document_url: Option<String>,
}

/// Atualização parcial: só os campos `Some` mudam.
#[derive(Debug, Clone, Default)]
pub struct VehiclePatch {
    pub license_plate: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    pub weight: Option<i64>,
    pub document_year: Option<i64>,
    pub document_url: Option<String>,
}

impl VehiclePatch {
    pub fn is_empty(&self) -> bool {
        self.license_plate.is_none()
            && self.vehicle_type.is_none()
            && self.weight.is_none()
            && self.document_year.is_none()
            && self.document_url.is_none()
    }

    /// Junta o patch ao registo existente (semântica de merge).
    pub fn apply(self, mut vehicle: Vehicle) -> Vehicle {
        if let Some(plate) = self.license_plate {
            vehicle.license_plate = plate;
        }
        if let Some(vehicle_type) = self.vehicle_type {
            vehicle.vehicle_type = vehicle_type;
        }
        if let Some(weight) = self.weight {
            vehicle.weight = weight;
        }
        if let Some(year) = self.document_year {
            vehicle.document_year = year;
        }
        if let Some(url) = self.document_url {
            vehicle.document_url = Some(url);
        }
        vehicle
    }
}

/// Normaliza a placa: sem espaços à volta e em maiúsculas.
pub fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_type_parses_wire_strings() {
        assert_eq!("Dolly".parse::<VehicleType>().unwrap(), VehicleType::Dolly);
        assert_eq!(
            " Unidade Tratora (Cavalo) ".parse::<VehicleType>().unwrap(),
            VehicleType::UnidadeTratora
        );
        assert!(matches!(
            "Caminhão".parse::<VehicleType>(),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let vehicle = Vehicle {
            id: 1,
            license_plate: "ABC1D23".into(),
            vehicle_type: VehicleType::Semirreboque,
            weight: 7000,
            document_year: 2023,
            document_url: None,
            user_id: 2,
            created_at: Utc::now(),
        };
        let patch = VehiclePatch {
            weight: Some(7500),
            ..Default::default()
        };
        let merged = patch.apply(vehicle);
        assert_eq!(merged.weight, 7500);
        assert_eq!(merged.license_plate, "ABC1D23");
        assert_eq!(merged.vehicle_type, VehicleType::Semirreboque);
    }

    #[test]
    fn plates_are_normalized() {
        assert_eq!(normalize_plate("  abc1d23 "), "ABC1D23");
    }
}
