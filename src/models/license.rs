// src/models/license.rs
use crate::error::AppError;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::{types::Json, FromRow};
use std::str::FromStr;

// --- Enumerações do domínio (strings exatas usadas pelo cliente) ---

/// Configuração do conjunto de veículos a que a licença se aplica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum LicenseSetType {
    #[serde(rename = "Rodotrem 9 eixos")]
    #[sqlx(rename = "Rodotrem 9 eixos")]
    Rodotrem9Eixos,
    #[serde(rename = "Bitrem 9 eixos")]
    #[sqlx(rename = "Bitrem 9 eixos")]
    Bitrem9Eixos,
    #[serde(rename = "Bitrem 7 eixos")]
    #[sqlx(rename = "Bitrem 7 eixos")]
    Bitrem7Eixos,
    #[serde(rename = "Bitrem 6 eixos")]
    #[sqlx(rename = "Bitrem 6 eixos")]
    Bitrem6Eixos,
    #[serde(rename = "Prancha")]
    #[sqlx(rename = "Prancha")]
    Prancha,
}

/// Papel de um veículo dentro do conjunto (para além do veículo principal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleRole {
    FirstTrailer,
    Dolly,
    SecondTrailer,
}

impl VehicleRole {
    pub fn label(&self) -> &'static str {
        match self {
            VehicleRole::FirstTrailer => "primeira carreta",
            VehicleRole::Dolly => "dolly",
            VehicleRole::SecondTrailer => "segunda carreta",
        }
    }
}

impl LicenseSetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseSetType::Rodotrem9Eixos => "Rodotrem 9 eixos",
            LicenseSetType::Bitrem9Eixos => "Bitrem 9 eixos",
            LicenseSetType::Bitrem7Eixos => "Bitrem 7 eixos",
            LicenseSetType::Bitrem6Eixos => "Bitrem 6 eixos",
            LicenseSetType::Prancha => "Prancha",
        }
    }

    /// Papéis de veículo que este tipo de conjunto utiliza.
    pub fn allowed_roles(&self) -> &'static [VehicleRole] {
        match self {
            LicenseSetType::Rodotrem9Eixos => &[
                VehicleRole::FirstTrailer,
                VehicleRole::Dolly,
                VehicleRole::SecondTrailer,
            ],
            LicenseSetType::Bitrem9Eixos
            | LicenseSetType::Bitrem7Eixos
            | LicenseSetType::Bitrem6Eixos => {
                &[VehicleRole::FirstTrailer, VehicleRole::SecondTrailer]
            }
            // Na prancha o "primeiro reboque" é a própria prancha
            LicenseSetType::Prancha => &[VehicleRole::FirstTrailer],
        }
    }
}

/// Estados possíveis de uma licença, pela ordem em que normalmente ocorrem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum LicenseStatus {
    #[default]
    #[serde(rename = "Pendente Cadastro")]
    #[sqlx(rename = "Pendente Cadastro")]
    PendenteCadastro,
    #[serde(rename = "Cadastro em Andamento")]
    #[sqlx(rename = "Cadastro em Andamento")]
    CadastroEmAndamento,
    #[serde(rename = "Reprovado – Pendência de Documentação")]
    #[sqlx(rename = "Reprovado – Pendência de Documentação")]
    Reprovado,
    #[serde(rename = "Análise do Órgão")]
    #[sqlx(rename = "Análise do Órgão")]
    AnaliseDoOrgao,
    #[serde(rename = "Pendente Liberação")]
    #[sqlx(rename = "Pendente Liberação")]
    PendenteLiberacao,
    #[serde(rename = "Liberada")]
    #[sqlx(rename = "Liberada")]
    Liberada,
}

impl LicenseStatus {
    pub const ALL: [LicenseStatus; 6] = [
        LicenseStatus::PendenteCadastro,
        LicenseStatus::CadastroEmAndamento,
        LicenseStatus::Reprovado,
        LicenseStatus::AnaliseDoOrgao,
        LicenseStatus::PendenteLiberacao,
        LicenseStatus::Liberada,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::PendenteCadastro => "Pendente Cadastro",
            LicenseStatus::CadastroEmAndamento => "Cadastro em Andamento",
            LicenseStatus::Reprovado => "Reprovado – Pendência de Documentação",
            LicenseStatus::AnaliseDoOrgao => "Análise do Órgão",
            LicenseStatus::PendenteLiberacao => "Pendente Liberação",
            LicenseStatus::Liberada => "Liberada",
        }
    }
}

impl FromStr for LicenseStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::InvalidInput("Status inválido".to_string()))
    }
}

/// Órgãos/estados onde a licença deve valer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Jurisdiction {
    Sp,
    Mg,
    Mt,
    Pe,
    To,
    Ms,
    Pr,
    Es,
    Dnit,
    Rs,
    Ba,
    Pa,
    Sc,
    Df,
    Ma,
    Go,
    Rj,
    Ce,
    Al,
    Se,
}

/// Remove códigos repetidos mantendo a primeira ocorrência.
pub fn dedupe_states(states: Vec<Jurisdiction>) -> Vec<Jurisdiction> {
    let mut unique = Vec::with_capacity(states.len());
    for state in states {
        if !unique.contains(&state) {
            unique.push(state);
        }
    }
    unique
}

/// Valida o comprimento do conjunto ("19,80" ou "19.80", em metros).
pub fn validate_set_length(raw: &str) -> Result<(), AppError> {
    let normalized = raw.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(()),
        _ => Err(AppError::InvalidInput(format!(
            "Comprimento do conjunto inválido: '{}'",
            raw
        ))),
    }
}

/// Número oficial atribuído no envio: `AET-<ano>-<id com 4 dígitos>`.
pub fn format_license_number(id: i64, at: DateTime<Utc>) -> String {
    format!("AET-{}-{:04}", at.year(), id)
}

// --- Ciclo de vida ---

/// Estágio da licença. Combinações ilegais (ex: "Liberada" sem ficheiro,
/// licença enviada sem número) não têm representação.
#[derive(Debug, Clone, PartialEq)]
pub enum LicenseStage {
    Draft {
        status: LicenseStatus,
    },
    /// `status` nunca é `Liberada` aqui.
    Submitted {
        license_number: String,
        status: LicenseStatus,
    },
    Issued {
        license_number: String,
        file_url: String,
        issue_date: DateTime<Utc>,
        expiration_date: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct License {
    pub id: i64,
    pub set_type: LicenseSetType,
    pub primary_vehicle_id: i64,
    pub first_trailer_id: Option<i64>,
    pub dolly_id: Option<i64>,
    pub second_trailer_id: Option<i64>,
    pub set_length: String,
    pub states: Vec<Jurisdiction>,
    pub stage: LicenseStage,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl License {
    pub fn is_draft(&self) -> bool {
        matches!(self.stage, LicenseStage::Draft { .. })
    }

    pub fn is_issued(&self) -> bool {
        matches!(self.stage, LicenseStage::Issued { .. })
    }

    pub fn status(&self) -> LicenseStatus {
        match &self.stage {
            LicenseStage::Draft { status } | LicenseStage::Submitted { status, .. } => *status,
            LicenseStage::Issued { .. } => LicenseStatus::Liberada,
        }
    }

    pub fn license_number(&self) -> Option<&str> {
        match &self.stage {
            LicenseStage::Draft { .. } => None,
            LicenseStage::Submitted { license_number, .. }
            | LicenseStage::Issued { license_number, .. } => Some(license_number),
        }
    }

    pub fn license_file_url(&self) -> Option<&str> {
        match &self.stage {
            LicenseStage::Issued { file_url, .. } => Some(file_url),
            _ => None,
        }
    }

    pub fn issue_date(&self) -> Option<DateTime<Utc>> {
        match &self.stage {
            LicenseStage::Issued { issue_date, .. } => Some(*issue_date),
            _ => None,
        }
    }

    pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
        match &self.stage {
            LicenseStage::Issued { expiration_date, .. } => Some(*expiration_date),
            _ => None,
        }
    }

    /// Referência usada nas mensagens de atividade: número, ou o id se ainda não houver.
    pub fn display_ref(&self) -> String {
        self.license_number()
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Veículos opcionais preenchidos, com o respetivo papel.
    pub fn filled_roles(&self) -> Vec<(VehicleRole, i64)> {
        [
            (VehicleRole::FirstTrailer, self.first_trailer_id),
            (VehicleRole::Dolly, self.dolly_id),
            (VehicleRole::SecondTrailer, self.second_trailer_id),
        ]
        .into_iter()
        .filter_map(|(role, id)| id.map(|id| (role, id)))
        .collect()
    }

    /// Todos os ids de veículo referenciados pela licença.
    pub fn vehicle_ids(&self) -> Vec<i64> {
        let mut ids = vec![self.primary_vehicle_id];
        ids.extend(self.filled_roles().into_iter().map(|(_, id)| id));
        ids
    }
}

// Projeção JSON plana, com os nomes de campo que o cliente espera
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LicenseJson<'a> {
    id: i64,
    license_number: Option<&'a str>,
    is_draft: bool,
    set_type: LicenseSetType,
    primary_vehicle_id: i64,
    first_trailer_id: Option<i64>,
    dolly_id: Option<i64>,
    second_trailer_id: Option<i64>,
    set_length: &'a str,
    states: &'a [Jurisdiction],
    status: LicenseStatus,
    license_file_url: Option<&'a str>,
    issue_date: Option<DateTime<Utc>>,
    expiration_date: Option<DateTime<Utc>>,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Serialize for License {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        LicenseJson {
            id: self.id,
            license_number: self.license_number(),
            is_draft: self.is_draft(),
            set_type: self.set_type,
            primary_vehicle_id: self.primary_vehicle_id,
            first_trailer_id: self.first_trailer_id,
            dolly_id: self.dolly_id,
            second_trailer_id: self.second_trailer_id,
            set_length: &self.set_length,
            states: &self.states,
            status: self.status(),
            license_file_url: self.license_file_url(),
            issue_date: self.issue_date(),
            expiration_date: self.expiration_date(),
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .serialize(serializer)
    }
}

/// Linha tal como está na tabela 'licenses'.
#[derive(Debug, FromRow)]
pub struct LicenseRow {
    pub id: i64,
    pub license_number: Option<String>,
    pub is_draft: bool,
    pub set_type: LicenseSetType,
    pub primary_vehicle_id: i64,
    pub first_trailer_id: Option<i64>,
    pub dolly_id: Option<i64>,
    pub second_trailer_id: Option<i64>,
    pub set_length: String,
    pub states: Json<Vec<Jurisdiction>>,
    pub status: LicenseStatus,
    pub license_file_url: Option<String>,
    pub issue_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<LicenseRow> for License {
    type Error = AppError;

    fn try_from(row: LicenseRow) -> Result<Self, Self::Error> {
        let corrupt = |why: &str| AppError::CorruptRecord(format!("licença {}: {}", row.id, why));

        let stage = if row.is_draft {
            if row.status == LicenseStatus::Liberada {
                return Err(corrupt("rascunho marcado como liberado"));
            }
            if row.license_number.is_some() {
                return Err(corrupt("rascunho com número atribuído"));
            }
            LicenseStage::Draft { status: row.status }
        } else {
            let Some(license_number) = row.license_number.clone() else {
                return Err(corrupt("licença enviada sem número"));
            };
            if row.status == LicenseStatus::Liberada {
                match (row.license_file_url.clone(), row.issue_date, row.expiration_date) {
                    (Some(file_url), Some(issue_date), Some(expiration_date)) => {
                        LicenseStage::Issued {
                            license_number,
                            file_url,
                            issue_date,
                            expiration_date,
                        }
                    }
                    _ => return Err(corrupt("liberada sem ficheiro ou datas")),
                }
            } else {
                LicenseStage::Submitted {
                    license_number,
                    status: row.status,
                }
            }
        };

        Ok(License {
            id: row.id,
            set_type: row.set_type,
            primary_vehicle_id: row.primary_vehicle_id,
            first_trailer_id: row.first_trailer_id,
            dolly_id: row.dolly_id,
            second_trailer_id: row.second_trailer_id,
            set_length: row.set_length,
            states: row.states.0,
            stage,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// --- Entradas tipadas das operações ---

/// Pedido de nova licença (rascunho ou envio direto).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLicense {
    pub set_type: LicenseSetType,
    pub primary_vehicle_id: i64,
    #[serde(default)]
    pub first_trailer_id: Option<i64>,
    #[serde(default)]
    pub dolly_id: Option<i64>,
    #[serde(default)]
    pub second_trailer_id: Option<i64>,
    pub set_length: String,
    #[serde(default)]
    pub states: Vec<Jurisdiction>,
    #[serde(default)]
    pub is_draft: Option<bool>,
    #[serde(default)]
    pub status: Option<LicenseStatus>,
}

// Distingue campo ausente (None) de `null` explícito (Some(None))
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Atualização parcial pedida pelo dono da licença.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicensePatch {
    #[serde(default)]
    pub set_type: Option<LicenseSetType>,
    #[serde(default)]
    pub primary_vehicle_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub first_trailer_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub dolly_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub second_trailer_id: Option<Option<i64>>,
    #[serde(default)]
    pub set_length: Option<String>,
    #[serde(default)]
    pub states: Option<Vec<Jurisdiction>>,
    #[serde(default)]
    pub is_draft: Option<bool>,
    #[serde(default)]
    pub status: Option<LicenseStatus>,
}

/// Metadados opcionais enviados com o ficheiro da licença emitida.
#[derive(Debug, Clone, Default)]
pub struct IssueMetadata {
    pub license_number: Option<String>,
    pub issue_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
}
