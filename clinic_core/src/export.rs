//! CSV reports for appointments, exams and public bookings.

use crate::clinic::Clinic;
use crate::format::format_date;
use crate::types::{Appointment, Exam};
use crate::wizard::ConfirmedBooking;
use crate::Result;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

#[derive(Debug, Serialize)]
struct AppointmentRow {
    id: u64,
    date: String,
    time: String,
    patient_name: String,
    patient_email: String,
    patient_phone: String,
    service: String,
    professional: String,
    status: &'static str,
}

impl From<&Appointment> for AppointmentRow {
    fn from(a: &Appointment) -> Self {
        AppointmentRow {
            id: a.id.0,
            date: format_date(a.date),
            time: a.time.clone(),
            patient_name: a.patient_name.clone(),
            patient_email: a.patient_email.clone(),
            patient_phone: a.patient_phone.clone(),
            service: a.service.clone(),
            professional: a.professional.clone(),
            status: a.status.label(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ExamRow {
    id: u64,
    patient: String,
    physician: String,
    crm: Option<String>,
    kind: String,
    category: &'static str,
    date: String,
    status: &'static str,
    priority: &'static str,
    location: Option<String>,
    price: Option<f64>,
    result: Option<String>,
}

impl From<&Exam> for ExamRow {
    fn from(e: &Exam) -> Self {
        ExamRow {
            id: e.id.0,
            patient: e.patient.clone(),
            physician: e.physician.clone(),
            crm: e.crm.clone(),
            kind: e.kind.clone(),
            category: e.category.label(),
            date: format_date(e.date),
            status: e.status.label(),
            priority: e.priority.label(),
            location: e.location.clone(),
            price: e.price,
            result: e.result.as_ref().map(|r| r.notes.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
struct BookingRow {
    id: u64,
    date: String,
    time_slot: String,
    service: String,
    professional: String,
    patient_name: String,
    patient_email: String,
    patient_phone: String,
    created_at: String,
}

impl BookingRow {
    /// Service and professional are looked up by id; a removed one exports blank
    fn new(booking: &ConfirmedBooking, clinic: &Clinic) -> Self {
        BookingRow {
            id: booking.id().0,
            date: format_date(booking.date()),
            time_slot: booking.time_slot().to_string(),
            service: clinic
                .services
                .get(booking.service_id())
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            professional: clinic
                .professionals
                .get(booking.professional_id())
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            patient_name: booking.patient_name().to_string(),
            patient_email: booking.patient_email().to_string(),
            patient_phone: booking.patient_phone().to_string(),
            created_at: booking.created_at().to_rfc3339(),
        }
    }
}

/// Write `rows` to `path` with a header line, replacing any existing file
fn write_rows<R: Serialize>(path: &Path, rows: impl IntoIterator<Item = R>) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(file);

    let mut count = 0;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} rows to {:?}", count, path);
    Ok(count)
}

pub fn export_appointments(path: &Path, appointments: &[Appointment]) -> Result<usize> {
    write_rows(path, appointments.iter().map(AppointmentRow::from))
}

pub fn export_exams(path: &Path, exams: &[Exam]) -> Result<usize> {
    write_rows(path, exams.iter().map(ExamRow::from))
}

pub fn export_bookings(path: &Path, clinic: &Clinic) -> Result<usize> {
    write_rows(
        path,
        clinic
            .bookings
            .list()
            .iter()
            .map(|b| BookingRow::new(b, clinic)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fixtures;
    use chrono::NaiveDate;

    #[test]
    fn test_export_exams_writes_header_and_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exames.csv");

        let count = export_exams(&path, &fixtures::exams()).unwrap();
        assert_eq!(count, 3);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "id");
        assert_eq!(&headers[4], "kind");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][4], "Hemograma Completo");
        assert_eq!(&rows[0][7], "Concluído");
        assert_eq!(&rows[0][11], "Resultados dentro da normalidade.");
        assert_eq!(&rows[1][8], "Urgente");
    }

    #[test]
    fn test_export_appointments_replaces_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("reports").join("agendamentos.csv");
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let appointments = fixtures::appointments(today);

        export_appointments(&path, &appointments).unwrap();
        let count = export_appointments(&path, &appointments[..1]).unwrap();
        assert_eq!(count, 1);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("10/06/2024"));
        assert!(contents.contains("Confirmado"));
    }

    #[test]
    fn test_export_no_bookings_writes_nothing_but_succeeds() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("agendamentos_publicos.csv");
        let clinic = Clinic::empty(&Config::default());

        assert_eq!(export_bookings(&path, &clinic).unwrap(), 0);
        assert!(path.exists());
    }
}
