//! In-memory, insertion-ordered record registries.
//!
//! A `Registry<T>` owns its records and hands out ids from a monotonic
//! counter, so two records created back to back never share an id.
//! Nothing here checks references between registries.

use crate::types::*;
use chrono::NaiveDate;

/// A record stored in a registry
pub trait Record {
    fn id(&self) -> RecordId;
    fn assign_id(&mut self, id: RecordId);
}

macro_rules! impl_record {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Record for $ty {
                fn id(&self) -> RecordId {
                    self.id
                }

                fn assign_id(&mut self, id: RecordId) {
                    self.id = id;
                }
            }
        )+
    };
}

impl_record!(Service, Professional, Patient, Appointment, Exam, Prescription, Allergy);

/// A partial update for records of type `T`
pub trait Patch<T> {
    fn apply(self, record: &mut T);
}

/// Insertion-ordered collection with add/update/remove/list
#[derive(Clone, Debug)]
pub struct Registry<T> {
    items: Vec<T>,
    next_id: u64,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T: Record> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from fixture records, keeping their ids
    ///
    /// The counter starts above the largest seeded id.
    pub fn seeded(items: Vec<T>) -> Self {
        let next_id = items.iter().map(|r| r.id().0).max().unwrap_or(0) + 1;
        Self { items, next_id }
    }

    /// Append a record under a fresh id and return that id
    pub fn add(&mut self, mut record: T) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        record.assign_id(id);
        self.items.push(record);
        tracing::debug!("Added record {}", id);
        id
    }

    pub fn get(&self, id: RecordId) -> Option<&T> {
        self.items.iter().find(|r| r.id() == id)
    }

    /// Apply `patch` to the record with `id`. Returns false (and does nothing) if absent.
    pub fn update<P: Patch<T>>(&mut self, id: RecordId, patch: P) -> bool {
        match self.items.iter_mut().find(|r| r.id() == id) {
            Some(record) => {
                patch.apply(record);
                tracing::debug!("Updated record {}", id);
                true
            }
            None => {
                tracing::debug!("Update skipped, no record {}", id);
                false
            }
        }
    }

    /// Remove the record with `id`. Returns false (and does nothing) if absent.
    pub fn remove(&mut self, id: RecordId) -> bool {
        let before = self.items.len();
        self.items.retain(|r| r.id() != id);
        let removed = self.items.len() != before;
        if removed {
            tracing::debug!("Removed record {}", id);
        }
        removed
    }

    /// All records in insertion order
    pub fn list(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// Patches
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<u32>,
    pub price: Option<f64>,
    pub status: Option<ActiveStatus>,
    pub category: Option<String>,
}

impl Patch<Service> for ServicePatch {
    fn apply(self, record: &mut Service) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(duration) = self.duration_minutes {
            record.duration_minutes = duration;
        }
        if let Some(price) = self.price {
            record.price = price;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(category) = self.category {
            record.category = category;
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ProfessionalPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub crm: Option<String>,
    pub status: Option<ActiveStatus>,
}

impl Patch<Professional> for ProfessionalPatch {
    fn apply(self, record: &mut Professional) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(email) = self.email {
            record.email = email;
        }
        if let Some(phone) = self.phone {
            record.phone = phone;
        }
        if let Some(specialty) = self.specialty {
            record.specialty = specialty;
        }
        if let Some(crm) = self.crm {
            record.crm = crm;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PatientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub last_visit: Option<NaiveDate>,
}

impl Patch<Patient> for PatientPatch {
    fn apply(self, record: &mut Patient) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(email) = self.email {
            record.email = email;
        }
        if let Some(phone) = self.phone {
            record.phone = phone;
        }
        if let Some(address) = self.address {
            record.address = address;
        }
        if let Some(last_visit) = self.last_visit {
            record.last_visit = Some(last_visit);
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AppointmentPatch {
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub status: Option<AppointmentStatus>,
}

impl Patch<Appointment> for AppointmentPatch {
    fn apply(self, record: &mut Appointment) {
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(time) = self.time {
            record.time = time;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ExamPatch {
    pub status: Option<ExamStatus>,
    pub priority: Option<ExamPriority>,
    pub collected_on: Option<NaiveDate>,
    pub result: Option<ExamResult>,
    pub notes: Option<String>,
}

impl Patch<Exam> for ExamPatch {
    fn apply(self, record: &mut Exam) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(priority) = self.priority {
            record.priority = priority;
        }
        if let Some(collected_on) = self.collected_on {
            record.collected_on = Some(collected_on);
        }
        if let Some(result) = self.result {
            record.result = Some(result);
        }
        if let Some(notes) = self.notes {
            record.notes = Some(notes);
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PrescriptionPatch {
    pub status: Option<PrescriptionStatus>,
    pub diagnosis: Option<String>,
}

impl Patch<Prescription> for PrescriptionPatch {
    fn apply(self, record: &mut Prescription) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(diagnosis) = self.diagnosis {
            record.diagnosis = diagnosis;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn service(name: &str, duration: u32, price: f64) -> Service {
        Service {
            id: RecordId::default(),
            name: name.into(),
            description: String::new(),
            duration_minutes: duration,
            price,
            status: ActiveStatus::Active,
            category: "Consultas".into(),
        }
    }

    fn patient(id: u64, name: &str) -> Patient {
        Patient {
            id: RecordId(id),
            name: name.into(),
            email: String::new(),
            phone: String::new(),
            cpf: String::new(),
            birth_date: None,
            address: String::new(),
            last_visit: None,
        }
    }

    #[test]
    fn test_add_assigns_unique_ids_and_keeps_fields() {
        let mut services = Registry::seeded(vec![Service {
            id: RecordId(4),
            ..service("Exame de Rotina", 60, 200.0)
        }]);
        let before = services.len();

        let id = services.add(service("Consulta Geral", 30, 150.0));

        assert_eq!(services.len(), before + 1);
        let added = services.get(id).unwrap();
        assert_eq!(added.name, "Consulta Geral");
        assert_eq!(added.duration_minutes, 30);
        assert_eq!(added.price, 150.0);

        let ids: HashSet<_> = services.list().iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), services.len());
        assert!(id > RecordId(4));
    }

    #[test]
    fn test_rapid_adds_never_collide() {
        let mut services = Registry::new();
        let ids: HashSet<_> = (0..100)
            .map(|i| services.add(service(&format!("S{}", i), 10, 1.0)))
            .collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut patients = Registry::new();
        patients.add(patient(0, "Maria Silva"));
        patients.add(patient(0, "João Santos"));
        patients.add(patient(0, "Ana Costa"));

        let names: Vec<_> = patients.list().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Maria Silva", "João Santos", "Ana Costa"]);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut patients = Registry::seeded(vec![patient(1, "Maria Silva"), patient(2, "João Santos")]);

        assert!(!patients.remove(RecordId(99)));
        assert_eq!(patients.len(), 2);

        assert!(patients.remove(RecordId(1)));
        assert_eq!(patients.len(), 1);
        assert_eq!(patients.list()[0].name, "João Santos");
    }

    #[test]
    fn test_update_applies_only_given_fields() {
        let mut services = Registry::new();
        let id = services.add(service("Consulta Geral", 30, 150.0));

        let applied = services.update(
            id,
            ServicePatch {
                price: Some(180.0),
                ..ServicePatch::default()
            },
        );

        assert!(applied);
        let updated = services.get(id).unwrap();
        assert_eq!(updated.price, 180.0);
        assert_eq!(updated.name, "Consulta Geral");
        assert_eq!(updated.duration_minutes, 30);
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut services = Registry::new();
        services.add(service("Consulta Geral", 30, 150.0));
        let snapshot = services.list().to_vec();

        let applied = services.update(
            RecordId(42),
            ServicePatch {
                name: Some("Outro".into()),
                ..ServicePatch::default()
            },
        );

        assert!(!applied);
        assert_eq!(services.list(), snapshot.as_slice());
    }

    #[test]
    fn test_patient_patch_keeps_untouched_fields() {
        let mut patients = Registry::seeded(vec![Patient {
            email: "maria@email.com".into(),
            phone: "(11) 99999-9999".into(),
            ..patient(1, "Maria Silva")
        }]);
        let visit = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

        assert!(patients.update(
            RecordId(1),
            PatientPatch {
                phone: Some("(11) 90000-0000".into()),
                last_visit: Some(visit),
                ..PatientPatch::default()
            },
        ));

        let updated = patients.get(RecordId(1)).unwrap();
        assert_eq!(updated.phone, "(11) 90000-0000");
        assert_eq!(updated.last_visit, Some(visit));
        assert_eq!(updated.email, "maria@email.com");
        assert_eq!(updated.name, "Maria Silva");
    }

    #[test]
    fn test_professional_patch_deactivates() {
        let mut professionals = Registry::new();
        let id = professionals.add(Professional {
            id: RecordId::default(),
            name: "Dr. João Santos".into(),
            email: "joao@clinica.com".into(),
            phone: "(11) 98888-8888".into(),
            specialty: "Clínico Geral".into(),
            crm: "CRM/SP 123456".into(),
            status: ActiveStatus::Active,
        });

        professionals.update(
            id,
            ProfessionalPatch {
                status: Some(ActiveStatus::Inactive),
                ..ProfessionalPatch::default()
            },
        );

        let updated = professionals.get(id).unwrap();
        assert_eq!(updated.status, ActiveStatus::Inactive);
        assert_eq!(updated.specialty, "Clínico Geral");
        assert_eq!(updated.crm, "CRM/SP 123456");
    }

    #[test]
    fn test_appointment_patch_reschedules() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let mut appointments = Registry::new();
        let id = appointments.add(Appointment {
            id: RecordId::default(),
            patient_name: "Pedro Lima".into(),
            patient_email: "pedro@email.com".into(),
            patient_phone: "(11) 88888-8888".into(),
            service: "Exame de Rotina".into(),
            professional: "Dra. Ana Costa".into(),
            date: day,
            time: "14:00".into(),
            status: AppointmentStatus::Scheduled,
        });
        let next_day = day.succ_opt().unwrap();

        appointments.update(
            id,
            AppointmentPatch {
                date: Some(next_day),
                time: Some("10:30".into()),
                status: Some(AppointmentStatus::Confirmed),
            },
        );

        let updated = appointments.get(id).unwrap();
        assert_eq!(updated.date, next_day);
        assert_eq!(updated.time, "10:30");
        assert_eq!(updated.status, AppointmentStatus::Confirmed);
        assert_eq!(updated.patient_name, "Pedro Lima");
    }

    #[test]
    fn test_prescription_patch_changes_status_only() {
        let mut prescriptions = Registry::new();
        let id = prescriptions.add(Prescription {
            id: RecordId::default(),
            patient_id: RecordId(1),
            patient: "Maria Silva".into(),
            physician: "Dr. Carlos Silva".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            diagnosis: "Infecção respiratória".into(),
            medications: Vec::new(),
            status: PrescriptionStatus::Ativo,
        });

        assert!(prescriptions.update(
            id,
            PrescriptionPatch {
                status: Some(PrescriptionStatus::Concluido),
                ..PrescriptionPatch::default()
            },
        ));
        assert!(!prescriptions.update(RecordId(99), PrescriptionPatch::default()));

        let updated = prescriptions.get(id).unwrap();
        assert_eq!(updated.status, PrescriptionStatus::Concluido);
        assert_eq!(updated.diagnosis, "Infecção respiratória");
    }
}
