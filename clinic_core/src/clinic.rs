//! The `Clinic` aggregate: every registry plus the operations the back-office
//! pages perform on them.
//!
//! Creates validate their form first and fail with [`Error::Validation`]
//! carrying every failing field. Successful mutations raise a notification
//! in the clinic's [`NotificationLog`].

use crate::config::Config;
use crate::fixtures;
use crate::notify::{Notification, NotificationLog, Notifier};
use crate::registry::{ExamPatch, Registry, ServicePatch};
use crate::types::*;
use crate::validation::{
    NewAllergy, NewAppointment, NewExam, NewPatient, NewPrescription, NewProfessional, NewService,
};
use crate::wizard::{Blocked, BookingCatalog, BookingWizard, ConfirmedBooking};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Process-lifetime registries for one clinic
#[derive(Clone, Debug)]
pub struct Clinic {
    pub services: Registry<Service>,
    pub professionals: Registry<Professional>,
    pub patients: Registry<Patient>,
    pub appointments: Registry<Appointment>,
    pub exams: Registry<Exam>,
    pub prescriptions: Registry<Prescription>,
    pub allergies: Registry<Allergy>,
    pub bookings: Registry<ConfirmedBooking>,
    time_slots: Vec<String>,
    latency: Duration,
    notifications: NotificationLog,
}

impl Clinic {
    /// A clinic with the seed records, appointments dated `today`
    pub fn seeded(config: &Config, today: NaiveDate) -> Self {
        Self {
            services: Registry::seeded(fixtures::services()),
            professionals: Registry::seeded(fixtures::professionals()),
            patients: Registry::seeded(fixtures::patients()),
            appointments: Registry::seeded(fixtures::appointments(today)),
            exams: Registry::seeded(fixtures::exams()),
            prescriptions: Registry::seeded(fixtures::prescriptions()),
            allergies: Registry::seeded(fixtures::allergies()),
            bookings: Registry::new(),
            time_slots: config.scheduling.time_slots.clone(),
            latency: config.simulated_latency(),
            notifications: NotificationLog::new(),
        }
    }

    /// A clinic with no records at all
    pub fn empty(config: &Config) -> Self {
        Self {
            services: Registry::new(),
            professionals: Registry::new(),
            patients: Registry::new(),
            appointments: Registry::new(),
            exams: Registry::new(),
            prescriptions: Registry::new(),
            allergies: Registry::new(),
            bookings: Registry::new(),
            time_slots: config.scheduling.time_slots.clone(),
            latency: config.simulated_latency(),
            notifications: NotificationLog::new(),
        }
    }

    pub fn time_slots(&self) -> &[String] {
        &self.time_slots
    }

    pub fn notifications(&mut self) -> &mut NotificationLog {
        &mut self.notifications
    }

    fn pause(&self) {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
    }

    fn success(&mut self, message: &str) {
        self.notifications.notify(Notification::success(message));
    }

    // ========================================================================
    // Services
    // ========================================================================

    pub fn create_service(&mut self, form: NewService) -> Result<RecordId> {
        form.validate().into_result().map_err(Error::Validation)?;
        self.pause();

        let id = self.services.add(Service {
            id: RecordId::default(),
            name: form.name,
            description: form.description,
            duration_minutes: form.duration_minutes,
            price: form.price,
            status: form.status,
            category: form.category,
        });
        tracing::info!("Service {} created", id);
        self.success("Serviço cadastrado com sucesso!");
        Ok(id)
    }

    /// Flip active/inactive. Returns the new status, or `None` for an unknown id.
    pub fn toggle_service_status(&mut self, id: RecordId) -> Option<ActiveStatus> {
        let next = self.services.get(id)?.status.toggled();
        self.services.update(
            id,
            ServicePatch {
                status: Some(next),
                ..ServicePatch::default()
            },
        );
        tracing::info!("Service {} is now {}", id, next.as_str());
        self.success("Status do serviço atualizado!");
        Some(next)
    }

    pub fn remove_service(&mut self, id: RecordId) -> bool {
        let removed = self.services.remove(id);
        if removed {
            self.success("Serviço removido com sucesso!");
        }
        removed
    }

    // ========================================================================
    // Patients
    // ========================================================================

    pub fn create_patient(&mut self, form: NewPatient) -> Result<RecordId> {
        form.validate().into_result().map_err(Error::Validation)?;

        let id = self.patients.add(Patient {
            id: RecordId::default(),
            name: form.name,
            email: form.email,
            phone: form.phone,
            cpf: form.cpf,
            birth_date: form.birth_date,
            address: form.address,
            last_visit: None,
        });
        tracing::info!("Patient {} registered", id);
        self.success("Paciente cadastrado com sucesso!");
        Ok(id)
    }

    pub fn remove_patient(&mut self, id: RecordId) -> bool {
        let removed = self.patients.remove(id);
        if removed {
            self.success("Paciente removido com sucesso!");
        }
        removed
    }

    // ========================================================================
    // Professionals
    // ========================================================================

    pub fn create_professional(&mut self, form: NewProfessional) -> Result<RecordId> {
        form.validate().into_result().map_err(Error::Validation)?;

        let id = self.professionals.add(Professional {
            id: RecordId::default(),
            name: form.name,
            email: form.email,
            phone: form.phone,
            specialty: form.specialty,
            crm: form.crm,
            status: form.status,
        });
        tracing::info!("Professional {} registered", id);
        self.success("Profissional cadastrado com sucesso!");
        Ok(id)
    }

    pub fn remove_professional(&mut self, id: RecordId) -> bool {
        let removed = self.professionals.remove(id);
        if removed {
            self.success("Profissional removido com sucesso!");
        }
        removed
    }

    // ========================================================================
    // Appointments
    // ========================================================================

    /// New appointments always start as scheduled
    pub fn create_appointment(&mut self, form: NewAppointment) -> Result<RecordId> {
        form.validate(&self.time_slots)
            .into_result()
            .map_err(Error::Validation)?;

        let id = self.appointments.add(Appointment {
            id: RecordId::default(),
            patient_name: form.patient_name,
            patient_email: form.patient_email,
            patient_phone: form.patient_phone,
            service: form.service,
            professional: form.professional,
            date: form.date,
            time: form.time,
            status: AppointmentStatus::Scheduled,
        });
        tracing::info!("Appointment {} scheduled", id);
        self.success("Agendamento criado com sucesso!");
        Ok(id)
    }

    pub fn remove_appointment(&mut self, id: RecordId) -> bool {
        let removed = self.appointments.remove(id);
        if removed {
            self.success("Agendamento removido com sucesso!");
        }
        removed
    }

    /// Day view: appointments on `date`, insertion order
    pub fn appointments_on(&self, date: NaiveDate) -> Vec<Appointment> {
        self.appointments
            .list()
            .iter()
            .filter(|a| a.date == date)
            .cloned()
            .collect()
    }

    // ========================================================================
    // Exams
    // ========================================================================

    /// New exams start pending
    pub fn create_exam(&mut self, form: NewExam) -> Result<RecordId> {
        form.validate().into_result().map_err(Error::Validation)?;

        let id = self.exams.add(Exam {
            id: RecordId::default(),
            patient_id: form.patient_id,
            patient: form.patient,
            physician: form.physician,
            crm: form.crm,
            kind: form.kind,
            category: form.category,
            date: form.date,
            collected_on: None,
            status: ExamStatus::Pendente,
            priority: form.priority,
            notes: form.notes,
            preparation: form.preparation,
            result: None,
            location: form.location,
            price: form.price,
        });
        tracing::info!("Exam {} requested", id);
        self.success("Exame cadastrado com sucesso!");
        Ok(id)
    }

    /// Move an exam to `status`
    ///
    /// Concluding with non-blank `result_notes` attaches a result dated
    /// `today`. Collecting stamps `collected_on` if it is still empty.
    /// Returns false for an unknown id.
    pub fn update_exam_status(
        &mut self,
        id: RecordId,
        status: ExamStatus,
        result_notes: Option<&str>,
        reporting_physician: Option<&str>,
        today: NaiveDate,
    ) -> bool {
        let Some(exam) = self.exams.get(id) else {
            return false;
        };

        let mut patch = ExamPatch {
            status: Some(status),
            ..ExamPatch::default()
        };
        if status == ExamStatus::Coletado && exam.collected_on.is_none() {
            patch.collected_on = Some(today);
        }
        if status == ExamStatus::Concluido {
            if let Some(notes) = result_notes.map(str::trim).filter(|n| !n.is_empty()) {
                patch.result = Some(ExamResult {
                    date: today,
                    notes: notes.to_string(),
                    values: BTreeMap::new(),
                    normal: true,
                    reporting_physician: reporting_physician
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string),
                });
            }
        }

        self.exams.update(id, patch);
        tracing::info!("Exam {} moved to {}", id, status.as_str());
        self.success(&format!("Status do exame atualizado para {}", status.label()));
        true
    }

    pub fn remove_exam(&mut self, id: RecordId) -> bool {
        self.exams.remove(id)
    }

    // ========================================================================
    // Prescriptions and allergies
    // ========================================================================

    /// New prescriptions start active
    pub fn create_prescription(&mut self, form: NewPrescription) -> Result<RecordId> {
        form.validate().into_result().map_err(Error::Validation)?;

        let id = self.prescriptions.add(Prescription {
            id: RecordId::default(),
            patient_id: form.patient_id,
            patient: form.patient,
            physician: form.physician,
            date: form.date,
            diagnosis: form.diagnosis,
            medications: form.medications,
            status: PrescriptionStatus::Ativo,
        });
        tracing::info!("Prescription {} issued", id);
        self.success("Receita emitida com sucesso!");
        Ok(id)
    }

    pub fn add_allergy(&mut self, form: NewAllergy) -> Result<RecordId> {
        form.validate().into_result().map_err(Error::Validation)?;

        let id = self.allergies.add(Allergy {
            id: RecordId::default(),
            substance: form.substance,
            severity: form.severity,
            reaction: form.reaction,
        });
        tracing::info!("Allergy {} recorded", id);
        self.success("Alergia registrada com sucesso!");
        Ok(id)
    }

    // ========================================================================
    // Public booking
    // ========================================================================

    /// A fresh wizard offering this clinic's active services and professionals
    pub fn booking_wizard(&self) -> BookingWizard {
        BookingWizard::new(BookingCatalog::new(
            self.services.list(),
            self.professionals.list(),
            self.time_slots.clone(),
        ))
    }

    /// Confirm `wizard` into this clinic's booking registry
    pub fn confirm_booking(
        &mut self,
        wizard: &mut BookingWizard,
        now: DateTime<Utc>,
    ) -> std::result::Result<ConfirmedBooking, Blocked> {
        wizard.confirm(&mut self.bookings, &mut self.notifications, now)
    }
}
