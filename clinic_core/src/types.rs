//! Core domain types for the ClinicTime system.
//!
//! This module defines the records held by the registries:
//! - Services and professionals offered for booking
//! - Patients, appointments, exams and prescriptions
//! - Status / priority / severity enums with their display labels
//! - The authenticated user and role

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Registry-assigned record identifier
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(RecordId)
            .map_err(|_| Error::Other(format!("Invalid id: {}", s)))
    }
}

/// Declares a closed set of values with a wire key and a Portuguese label.
///
/// Parsing accepts either the key or the label, case-insensitively.
macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => ($key:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $key)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stable lowercase key, also used as the facet value
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }

            /// User-facing label
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let needle = s.trim().to_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == needle || v.label().to_lowercase() == needle)
                    .ok_or_else(|| {
                        Error::Other(format!("Unknown {} value: {}", stringify!($name), s))
                    })
            }
        }
    };
}

// ============================================================================
// Status Enums
// ============================================================================

labeled_enum! {
    /// Whether a service or professional is currently offered
    pub enum ActiveStatus {
        Active => ("active", "Ativo"),
        Inactive => ("inactive", "Inativo"),
    }
}

impl ActiveStatus {
    pub fn toggled(self) -> Self {
        match self {
            ActiveStatus::Active => ActiveStatus::Inactive,
            ActiveStatus::Inactive => ActiveStatus::Active,
        }
    }
}

labeled_enum! {
    pub enum AppointmentStatus {
        Scheduled => ("scheduled", "Agendado"),
        Confirmed => ("confirmed", "Confirmado"),
        Cancelled => ("cancelled", "Cancelado"),
    }
}

labeled_enum! {
    pub enum ExamCategory {
        Laboratorial => ("laboratorial", "Laboratorial"),
        Imagem => ("imagem", "Imagem"),
        Cardiologico => ("cardiologico", "Cardiológico"),
        Neurologico => ("neurologico", "Neurológico"),
        Outro => ("outro", "Outro"),
    }
}

impl ExamCategory {
    /// Exam kinds offered by the form for this category
    pub fn kinds(self) -> &'static [&'static str] {
        match self {
            ExamCategory::Laboratorial => &[
                "Hemograma Completo",
                "Glicemia",
                "Colesterol Total e Frações",
                "Triglicerídeos",
                "Ureia e Creatinina",
                "TGO/TGP",
                "Urina Tipo I",
                "TSH",
                "T4 Livre",
                "PSA",
                "Beta HCG",
            ],
            ExamCategory::Imagem => &[
                "Raio-X Tórax",
                "Raio-X Abdome",
                "Ultrassom Abdome",
                "Ultrassom Pélvico",
                "Tomografia Computadorizada",
                "Ressonância Magnética",
                "Mamografia",
                "Densitometria Óssea",
            ],
            ExamCategory::Cardiologico => &[
                "Eletrocardiograma",
                "Ecocardiograma",
                "Teste Ergométrico",
                "Holter 24h",
                "MAPA",
            ],
            ExamCategory::Neurologico => &[
                "Eletroencefalograma",
                "Eletromiografia",
                "Doppler Transcraniano",
            ],
            ExamCategory::Outro => &["Exame Personalizado"],
        }
    }
}

labeled_enum! {
    pub enum ExamStatus {
        Pendente => ("pendente", "Pendente"),
        Coletado => ("coletado", "Coletado"),
        Processando => ("processando", "Processando"),
        Concluido => ("concluido", "Concluído"),
        Cancelado => ("cancelado", "Cancelado"),
    }
}

labeled_enum! {
    pub enum ExamPriority {
        Normal => ("normal", "Normal"),
        Urgente => ("urgente", "Urgente"),
        Emergencia => ("emergencia", "Emergência"),
    }
}

labeled_enum! {
    pub enum PrescriptionStatus {
        Ativo => ("ativo", "Ativo"),
        Concluido => ("concluido", "Concluído"),
        Cancelado => ("cancelado", "Cancelado"),
    }
}

labeled_enum! {
    pub enum AllergySeverity {
        Leve => ("leve", "Leve"),
        Moderada => ("moderada", "Moderada"),
        Grave => ("grave", "Grave"),
    }
}

labeled_enum! {
    pub enum Role {
        Admin => ("admin", "Administrador"),
        Professional => ("professional", "Profissional"),
    }
}

impl Role {
    /// Admins additionally manage professionals and services
    pub fn has_admin_capability(self) -> bool {
        matches!(self, Role::Admin)
    }
}

// ============================================================================
// Registry Records
// ============================================================================

/// Service categories offered by the service form
pub const SERVICE_CATEGORIES: &[&str] = &["Consultas", "Exames", "Procedimentos", "Cirurgias", "Outros"];

/// Specialties offered by the professional form
pub const SPECIALTIES: &[&str] = &[
    "Clínico Geral",
    "Cardiologista",
    "Dermatologista",
    "Neurologista",
    "Ortopedista",
    "Pediatra",
    "Ginecologista",
    "Psiquiatra",
];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: RecordId,
    pub name: String,
    pub description: String,
    pub duration_minutes: u32,
    pub price: f64,
    pub status: ActiveStatus,
    pub category: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Professional {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub specialty: String,
    pub crm: String,
    pub status: ActiveStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Patient {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub cpf: String,
    pub birth_date: Option<NaiveDate>,
    pub address: String,
    pub last_visit: Option<NaiveDate>,
}

impl Patient {
    /// Age in whole years on `today`, if the birth date is known
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.birth_date.and_then(|birth| today.years_since(birth))
    }
}

/// Appointment created from the internal appointments page
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appointment {
    pub id: RecordId,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub service: String,
    pub professional: String,
    pub date: NaiveDate,
    pub time: String,
    pub status: AppointmentStatus,
}

/// A single reported value: numeric or free text
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ResultValue {
    Number(f64),
    Text(String),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExamResult {
    pub date: NaiveDate,
    pub notes: String,
    #[serde(default)]
    pub values: BTreeMap<String, ResultValue>,
    pub normal: bool,
    pub reporting_physician: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exam {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub patient: String,
    pub physician: String,
    pub crm: Option<String>,
    pub kind: String,
    pub category: ExamCategory,
    pub date: NaiveDate,
    pub collected_on: Option<NaiveDate>,
    pub status: ExamStatus,
    pub priority: ExamPriority,
    pub notes: Option<String>,
    pub preparation: Option<String>,
    pub result: Option<ExamResult>,
    pub location: Option<String>,
    pub price: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Prescription {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub patient: String,
    pub physician: String,
    pub date: NaiveDate,
    pub diagnosis: String,
    pub medications: Vec<Medication>,
    pub status: PrescriptionStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Allergy {
    pub id: RecordId,
    pub substance: String,
    pub severity: AllergySeverity,
    pub reaction: String,
}

// ============================================================================
// Identity
// ============================================================================

/// The authenticated identity stored under `session_user`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}
