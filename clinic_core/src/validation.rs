//! Form input types and per-field validation.
//!
//! Each `New*` form mirrors a "create" dialog. `validate()` returns every
//! failing field at once so callers can show the messages inline.

use crate::types::{
    ActiveStatus, AllergySeverity, ExamCategory, ExamPriority, Medication, RecordId,
    SERVICE_CATEGORIES, SPECIALTIES,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Validation messages keyed by field name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    /// Record `message` for `field` when `value` is blank
    pub fn require(&mut self, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.add(field, message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing failed, otherwise the collected errors
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Syntactic email check: a non-empty local part, `@`, and a non-empty domain
///
/// No whitespace anywhere. This is a plausibility check, not RFC 5322.
pub fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

// ============================================================================
// Forms
// ============================================================================

/// "Novo Serviço" dialog
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewService {
    pub name: String,
    pub description: String,
    pub duration_minutes: u32,
    pub price: f64,
    pub status: ActiveStatus,
    pub category: String,
}

impl Default for NewService {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            duration_minutes: 30,
            price: 0.0,
            status: ActiveStatus::Active,
            category: String::new(),
        }
    }
}

impl NewService {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name, "Nome do serviço é obrigatório");
        errors.require("description", &self.description, "Descrição é obrigatória");
        if self.duration_minutes == 0 {
            errors.add("duration", "Duração deve ser maior que zero");
        }
        if !(self.price.is_finite() && self.price > 0.0) {
            errors.add("price", "Preço deve ser maior que zero");
        }
        if self.category.trim().is_empty() {
            errors.add("category", "Categoria é obrigatória");
        } else if !SERVICE_CATEGORIES.contains(&self.category.trim()) {
            errors.add("category", "Categoria inválida");
        }
        errors
    }
}

/// "Novo Paciente" dialog
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub cpf: String,
    pub birth_date: Option<NaiveDate>,
    pub address: String,
}

impl NewPatient {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name, "Nome é obrigatório");
        if self.email.trim().is_empty() {
            errors.add("email", "E-mail é obrigatório");
        } else if !is_plausible_email(&self.email) {
            errors.add("email", "E-mail inválido");
        }
        errors.require("phone", &self.phone, "Telefone é obrigatório");
        errors
    }
}

/// "Novo Profissional" dialog
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewProfessional {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub specialty: String,
    pub crm: String,
    pub status: ActiveStatus,
}

impl Default for NewProfessional {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            specialty: String::new(),
            crm: String::new(),
            status: ActiveStatus::Active,
        }
    }
}

impl NewProfessional {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name, "Nome é obrigatório");
        if !is_plausible_email(&self.email) {
            errors.add("email", "E-mail inválido");
        }
        if self.specialty.trim().is_empty() {
            errors.add("specialty", "Especialidade é obrigatória");
        } else if !SPECIALTIES.contains(&self.specialty.trim()) {
            errors.add("specialty", "Especialidade inválida");
        }
        errors.require("crm", &self.crm, "CRM é obrigatório");
        errors
    }
}

/// "Novo Agendamento" dialog on the internal appointments page
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub service: String,
    pub professional: String,
    pub date: NaiveDate,
    pub time: String,
}

impl NewAppointment {
    pub fn validate(&self, time_slots: &[String]) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("patient_name", &self.patient_name, "Nome do paciente é obrigatório");
        errors.require("service", &self.service, "Serviço é obrigatório");
        errors.require("professional", &self.professional, "Profissional é obrigatório");
        if !time_slots.iter().any(|slot| slot == &self.time) {
            errors.add("time", "Horário indisponível");
        }
        errors
    }
}

/// "Novo Exame" dialog
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewExam {
    pub patient_id: RecordId,
    pub patient: String,
    pub physician: String,
    pub crm: Option<String>,
    pub kind: String,
    pub category: ExamCategory,
    pub date: NaiveDate,
    pub priority: ExamPriority,
    pub notes: Option<String>,
    pub preparation: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
}

impl NewExam {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("patient", &self.patient, "Paciente é obrigatório");
        errors.require("kind", &self.kind, "Tipo de exame é obrigatório");
        if let Some(price) = self.price {
            if !(price.is_finite() && price >= 0.0) {
                errors.add("price", "Valor não pode ser negativo");
            }
        }
        errors
    }
}

/// A medication line being added to a new prescription
pub fn validate_medication(medication: &Medication) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.require("name", &medication.name, "Nome do medicamento é obrigatório");
    errors.require("dosage", &medication.dosage, "Dosagem é obrigatória");
    errors
}

/// "Nova Receita" tab
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewPrescription {
    pub patient_id: RecordId,
    pub patient: String,
    pub physician: String,
    pub date: NaiveDate,
    pub diagnosis: String,
    pub medications: Vec<Medication>,
}

impl NewPrescription {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("physician", &self.physician, "Médico é obrigatório");
        errors.require("diagnosis", &self.diagnosis, "Diagnóstico é obrigatório");
        if self.medications.is_empty() {
            errors.add("medications", "Adicione pelo menos um medicamento");
        }
        for (index, medication) in self.medications.iter().enumerate() {
            for (field, message) in validate_medication(medication).iter() {
                errors.add(&format!("medications[{}].{}", index, field), message);
            }
        }
        errors
    }
}

/// New allergy entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewAllergy {
    pub substance: String,
    pub severity: AllergySeverity,
    pub reaction: String,
}

impl NewAllergy {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("substance", &self.substance, "Substância é obrigatória");
        errors
    }
}
