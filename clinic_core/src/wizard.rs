//! Public appointment-booking wizard.
//!
//! The wizard walks a patient through four ordered steps:
//!
//! 1. **SelectServiceAndProfessional** - pick a service and a professional
//! 2. **SelectDateAndSlot** - pick a day (today or later) and a time slot
//! 3. **EnterContactInfo** - name, email and phone
//! 4. **Confirmed** - the booking has been recorded
//!
//! Forward moves are guarded by the fields of the current step. A blocked
//! move leaves the wizard untouched and reports which fields are missing.
//! Moving back never clears anything already entered.
//!
//! The only way to obtain a [`ConfirmedBooking`] is [`BookingWizard::confirm`],
//! which re-checks every step before appending to the booking registry.

use crate::notify::{Notification, Notifier};
use crate::registry::{Record, Registry};
use crate::types::{ActiveStatus, Professional, RecordId, Service};
use crate::validation::{is_plausible_email, FieldErrors};
use crate::format::{format_brl, format_date};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Shown once a booking is recorded
pub const SUCCESS_MESSAGE: &str =
    "Agendamento realizado com sucesso! Você receberá uma confirmação por e-mail.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    SelectServiceAndProfessional,
    SelectDateAndSlot,
    EnterContactInfo,
    Confirmed,
}

impl WizardStep {
    /// 1-based position shown in the progress indicator
    pub fn number(self) -> u8 {
        match self {
            WizardStep::SelectServiceAndProfessional => 1,
            WizardStep::SelectDateAndSlot => 2,
            WizardStep::EnterContactInfo => 3,
            WizardStep::Confirmed => 4,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::SelectServiceAndProfessional => "Escolha o serviço e profissional",
            WizardStep::SelectDateAndSlot => "Escolha a data e horário",
            WizardStep::EnterContactInfo => "Seus dados",
            WizardStep::Confirmed => "Agendamento Confirmado!",
        }
    }

    fn previous(self) -> Option<WizardStep> {
        match self {
            WizardStep::SelectServiceAndProfessional => None,
            WizardStep::SelectDateAndSlot => Some(WizardStep::SelectServiceAndProfessional),
            WizardStep::EnterContactInfo => Some(WizardStep::SelectDateAndSlot),
            // Nothing to return to once the booking is recorded
            WizardStep::Confirmed => None,
        }
    }
}

/// In-progress booking, filled in step by step
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BookingDraft {
    pub service_id: Option<RecordId>,
    pub professional_id: Option<RecordId>,
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
}

impl BookingDraft {
    pub fn is_empty(&self) -> bool {
        *self == BookingDraft::default()
    }

    /// Missing or invalid fields for a single step
    fn step_errors(&self, step: WizardStep) -> FieldErrors {
        let mut errors = FieldErrors::new();
        match step {
            WizardStep::SelectServiceAndProfessional => {
                if self.service_id.is_none() {
                    errors.add("service", "Selecione um serviço");
                }
                if self.professional_id.is_none() {
                    errors.add("professional", "Selecione um profissional");
                }
            }
            WizardStep::SelectDateAndSlot => {
                if self.date.is_none() {
                    errors.add("date", "Selecione uma data");
                }
                if self.time_slot.is_none() {
                    errors.add("time_slot", "Selecione um horário");
                }
            }
            WizardStep::EnterContactInfo => {
                errors.require("patient_name", &self.patient_name, "Nome é obrigatório");
                if !is_plausible_email(&self.patient_email) {
                    errors.add("patient_email", "E-mail inválido");
                }
                errors.require("patient_phone", &self.patient_phone, "Telefone é obrigatório");
            }
            WizardStep::Confirmed => {}
        }
        errors
    }
}

/// A booking recorded by the wizard. Read-only once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfirmedBooking {
    id: RecordId,
    service_id: RecordId,
    professional_id: RecordId,
    date: NaiveDate,
    time_slot: String,
    patient_name: String,
    patient_email: String,
    patient_phone: String,
    created_at: DateTime<Utc>,
}

impl ConfirmedBooking {
    /// Build from a draft that passes every step's guard
    fn from_draft(draft: &BookingDraft, created_at: DateTime<Utc>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        for step in [
            WizardStep::SelectServiceAndProfessional,
            WizardStep::SelectDateAndSlot,
            WizardStep::EnterContactInfo,
        ] {
            for (field, message) in draft.step_errors(step).iter() {
                errors.add(field, message);
            }
        }

        match (
            draft.service_id,
            draft.professional_id,
            draft.date,
            draft.time_slot.clone(),
        ) {
            (Some(service_id), Some(professional_id), Some(date), Some(time_slot))
                if errors.is_empty() =>
            {
                Ok(Self {
                    id: RecordId::default(),
                    service_id,
                    professional_id,
                    date,
                    time_slot,
                    patient_name: draft.patient_name.trim().to_string(),
                    patient_email: draft.patient_email.trim().to_string(),
                    patient_phone: draft.patient_phone.trim().to_string(),
                    created_at,
                })
            }
            _ => Err(errors),
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn service_id(&self) -> RecordId {
        self.service_id
    }

    pub fn professional_id(&self) -> RecordId {
        self.professional_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time_slot(&self) -> &str {
        &self.time_slot
    }

    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn patient_email(&self) -> &str {
        &self.patient_email
    }

    pub fn patient_phone(&self) -> &str {
        &self.patient_phone
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Record for ConfirmedBooking {
    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

/// Why a forward move did not happen
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Blocked {
    #[error("{step:?} is incomplete: {errors}")]
    Incomplete { step: WizardStep, errors: FieldErrors },

    #[error("no forward move from {0:?}")]
    NoForwardMove(WizardStep),
}

/// Why a selection was not taken into the draft
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InputRejected {
    #[error("input not accepted on step {0:?}")]
    WrongStep(WizardStep),

    #[error("Serviço {0} indisponível")]
    UnknownService(RecordId),

    #[error("Profissional {0} indisponível")]
    UnknownProfessional(RecordId),

    #[error("Data {0} já passou")]
    PastDate(NaiveDate),

    #[error("Selecione uma data para ver os horários disponíveis")]
    NoDateSelected,

    #[error("Horário {0} indisponível")]
    UnknownSlot(String),
}

/// What the wizard offers: active services and professionals, and the slot set
#[derive(Clone, Debug)]
pub struct BookingCatalog {
    services: Vec<Service>,
    professionals: Vec<Professional>,
    time_slots: Vec<String>,
}

impl BookingCatalog {
    /// Inactive services and professionals are not offered
    pub fn new(
        services: &[Service],
        professionals: &[Professional],
        time_slots: Vec<String>,
    ) -> Self {
        Self {
            services: services
                .iter()
                .filter(|s| s.status == ActiveStatus::Active)
                .cloned()
                .collect(),
            professionals: professionals
                .iter()
                .filter(|p| p.status == ActiveStatus::Active)
                .cloned()
                .collect(),
            time_slots,
        }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn professionals(&self) -> &[Professional] {
        &self.professionals
    }

    pub fn time_slots(&self) -> &[String] {
        &self.time_slots
    }

    pub fn service(&self, id: RecordId) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn professional(&self, id: RecordId) -> Option<&Professional> {
        self.professionals.iter().find(|p| p.id == id)
    }
}

/// Summary panel shown on the contact step and the confirmation screen
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BookingSummary {
    pub patient_name: String,
    pub service: Option<String>,
    pub professional: Option<String>,
    pub date: Option<String>,
    pub time_slot: Option<String>,
    pub price: Option<String>,
}

/// The booking wizard state machine
#[derive(Clone, Debug)]
pub struct BookingWizard {
    catalog: BookingCatalog,
    step: WizardStep,
    draft: BookingDraft,
    confirmed: Option<ConfirmedBooking>,
}

impl BookingWizard {
    pub fn new(catalog: BookingCatalog) -> Self {
        Self {
            catalog,
            step: WizardStep::SelectServiceAndProfessional,
            draft: BookingDraft::default(),
            confirmed: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn catalog(&self) -> &BookingCatalog {
        &self.catalog
    }

    /// The booking recorded by the last successful confirmation
    pub fn last_confirmed(&self) -> Option<&ConfirmedBooking> {
        self.confirmed.as_ref()
    }

    fn expect_step(&self, step: WizardStep) -> Result<(), InputRejected> {
        if self.step == step {
            Ok(())
        } else {
            Err(InputRejected::WrongStep(self.step))
        }
    }

    // ------------------------------------------------------------------
    // Step 1
    // ------------------------------------------------------------------

    pub fn select_service(&mut self, id: RecordId) -> Result<(), InputRejected> {
        self.expect_step(WizardStep::SelectServiceAndProfessional)?;
        if self.catalog.service(id).is_none() {
            return Err(InputRejected::UnknownService(id));
        }
        self.draft.service_id = Some(id);
        Ok(())
    }

    pub fn select_professional(&mut self, id: RecordId) -> Result<(), InputRejected> {
        self.expect_step(WizardStep::SelectServiceAndProfessional)?;
        if self.catalog.professional(id).is_none() {
            return Err(InputRejected::UnknownProfessional(id));
        }
        self.draft.professional_id = Some(id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Step 2
    // ------------------------------------------------------------------

    /// Pick a day. Days before `today` are not bookable.
    pub fn select_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<(), InputRejected> {
        self.expect_step(WizardStep::SelectDateAndSlot)?;
        if date < today {
            return Err(InputRejected::PastDate(date));
        }
        self.draft.date = Some(date);
        Ok(())
    }

    /// Slots on offer: the static slot set once a date is picked, nothing before
    pub fn available_slots(&self) -> &[String] {
        if self.draft.date.is_some() {
            self.catalog.time_slots()
        } else {
            &[]
        }
    }

    pub fn select_slot(&mut self, slot: &str) -> Result<(), InputRejected> {
        self.expect_step(WizardStep::SelectDateAndSlot)?;
        if self.draft.date.is_none() {
            return Err(InputRejected::NoDateSelected);
        }
        if !self.catalog.time_slots().iter().any(|s| s == slot) {
            return Err(InputRejected::UnknownSlot(slot.to_string()));
        }
        self.draft.time_slot = Some(slot.to_string());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Step 3
    // ------------------------------------------------------------------

    pub fn set_patient_name(&mut self, name: &str) -> Result<(), InputRejected> {
        self.expect_step(WizardStep::EnterContactInfo)?;
        self.draft.patient_name = name.to_string();
        Ok(())
    }

    pub fn set_patient_email(&mut self, email: &str) -> Result<(), InputRejected> {
        self.expect_step(WizardStep::EnterContactInfo)?;
        self.draft.patient_email = email.to_string();
        Ok(())
    }

    pub fn set_patient_phone(&mut self, phone: &str) -> Result<(), InputRejected> {
        self.expect_step(WizardStep::EnterContactInfo)?;
        self.draft.patient_phone = phone.to_string();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Errors that currently block leaving this step
    pub fn pending_errors(&self) -> FieldErrors {
        self.draft.step_errors(self.step)
    }

    /// Whether the forward control ("Próximo" / "Confirmar") should be enabled
    pub fn can_advance(&self) -> bool {
        self.step != WizardStep::Confirmed && self.pending_errors().is_empty()
    }

    /// "Próximo": step 1 → 2 → 3. Step 3 is left through [`confirm`](Self::confirm).
    pub fn next(&mut self) -> Result<WizardStep, Blocked> {
        let target = match self.step {
            WizardStep::SelectServiceAndProfessional => WizardStep::SelectDateAndSlot,
            WizardStep::SelectDateAndSlot => WizardStep::EnterContactInfo,
            other => return Err(Blocked::NoForwardMove(other)),
        };

        let errors = self.pending_errors();
        if !errors.is_empty() {
            tracing::debug!("Wizard blocked on {:?}: {}", self.step, errors);
            return Err(Blocked::Incomplete {
                step: self.step,
                errors,
            });
        }

        tracing::info!("Wizard advanced {:?} -> {:?}", self.step, target);
        self.step = target;
        Ok(target)
    }

    /// "Voltar": return to the previous step, keeping every entered value
    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.step.previous() {
            tracing::info!("Wizard back {:?} -> {:?}", self.step, previous);
            self.step = previous;
        }
        self.step
    }

    /// "Confirmar Agendamento": record the booking and notify the patient
    ///
    /// On success the booking is appended to `bookings`, a success
    /// notification is raised, the wizard moves to `Confirmed` and the draft
    /// is cleared. On failure nothing changes.
    pub fn confirm(
        &mut self,
        bookings: &mut Registry<ConfirmedBooking>,
        notifier: &mut dyn Notifier,
        now: DateTime<Utc>,
    ) -> Result<ConfirmedBooking, Blocked> {
        if self.step != WizardStep::EnterContactInfo {
            return Err(Blocked::NoForwardMove(self.step));
        }

        let mut booking = ConfirmedBooking::from_draft(&self.draft, now).map_err(|errors| {
            tracing::debug!("Wizard confirmation blocked: {}", errors);
            Blocked::Incomplete {
                step: self.step,
                errors,
            }
        })?;

        let id = bookings.add(booking.clone());
        booking.id = id;

        tracing::info!(
            "Booking {} confirmed for {} at {}",
            id,
            booking.date,
            booking.time_slot
        );
        notifier.notify(Notification::success(SUCCESS_MESSAGE));

        self.step = WizardStep::Confirmed;
        self.draft = BookingDraft::default();
        self.confirmed = Some(booking.clone());
        Ok(booking)
    }

    /// "Fazer Novo Agendamento": start again with an empty draft
    pub fn start_over(&mut self) {
        tracing::info!("Wizard reset from {:?}", self.step);
        self.step = WizardStep::SelectServiceAndProfessional;
        self.draft = BookingDraft::default();
        self.confirmed = None;
    }

    /// Summary of the current draft, or of the recorded booking once confirmed
    pub fn summary(&self) -> BookingSummary {
        let (service_id, professional_id, date, time_slot, patient_name) =
            match (&self.confirmed, self.step) {
                (Some(booking), WizardStep::Confirmed) => (
                    Some(booking.service_id),
                    Some(booking.professional_id),
                    Some(booking.date),
                    Some(booking.time_slot.clone()),
                    booking.patient_name.clone(),
                ),
                _ => (
                    self.draft.service_id,
                    self.draft.professional_id,
                    self.draft.date,
                    self.draft.time_slot.clone(),
                    self.draft.patient_name.clone(),
                ),
            };

        let service = service_id.and_then(|id| self.catalog.service(id));
        BookingSummary {
            patient_name,
            service: service.map(|s| s.name.clone()),
            professional: professional_id
                .and_then(|id| self.catalog.professional(id))
                .map(|p| p.name.clone()),
            date: date.map(format_date),
            time_slot,
            price: service.map(|s| format_brl(s.price)),
        }
    }
}
