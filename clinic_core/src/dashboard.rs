//! Dashboard figures derived from the clinic registries.

use crate::clinic::Clinic;
use crate::types::{Appointment, AppointmentStatus, ExamStatus};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// How many appointments used one service
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ServiceShare {
    pub service: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardStats {
    pub day: NaiveDate,
    /// Internal appointments plus public bookings
    ///
    /// Always `confirmed + scheduled + cancelled`.
    pub total_appointments: usize,
    /// Internal appointments and public bookings on `day`
    pub today_appointments: usize,
    pub total_patients: usize,
    /// Confirmed internal appointments plus every public booking
    pub confirmed: usize,
    pub scheduled: usize,
    pub cancelled: usize,
    pub public_bookings: usize,
    /// Booked service prices plus concluded exam prices
    pub revenue: f64,
    /// Non-cancelled appointments on `day`, earliest first
    pub upcoming: Vec<Appointment>,
    /// Largest share first
    pub service_share: Vec<ServiceShare>,
}

impl DashboardStats {
    pub fn compute(clinic: &Clinic, day: NaiveDate) -> Self {
        let appointments = clinic.appointments.list();
        let bookings = clinic.bookings.list();

        let count_status =
            |status: AppointmentStatus| appointments.iter().filter(|a| a.status == status).count();

        let today_appointments = appointments.iter().filter(|a| a.date == day).count()
            + bookings.iter().filter(|b| b.date() == day).count();

        let booking_revenue: f64 = bookings
            .iter()
            .filter_map(|b| clinic.services.get(b.service_id()))
            .map(|s| s.price)
            .sum();
        let exam_revenue: f64 = clinic
            .exams
            .list()
            .iter()
            .filter(|e| e.status == ExamStatus::Concluido)
            .filter_map(|e| e.price)
            .sum();

        let mut upcoming: Vec<Appointment> = appointments
            .iter()
            .filter(|a| a.date == day && a.status != AppointmentStatus::Cancelled)
            .cloned()
            .collect();
        upcoming.sort_by(|a, b| a.time.cmp(&b.time));

        let stats = Self {
            day,
            total_appointments: appointments.len() + bookings.len(),
            today_appointments,
            total_patients: clinic.patients.len(),
            confirmed: count_status(AppointmentStatus::Confirmed) + bookings.len(),
            scheduled: count_status(AppointmentStatus::Scheduled),
            cancelled: count_status(AppointmentStatus::Cancelled),
            public_bookings: bookings.len(),
            revenue: booking_revenue + exam_revenue,
            upcoming,
            service_share: service_share(clinic),
        };
        tracing::debug!(
            "Dashboard for {}: {} appointments, revenue {:.2}",
            day,
            stats.total_appointments,
            stats.revenue
        );
        stats
    }
}

fn service_share(clinic: &Clinic) -> Vec<ServiceShare> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for appointment in clinic.appointments.list() {
        *counts.entry(appointment.service.clone()).or_default() += 1;
    }
    for booking in clinic.bookings.list() {
        if let Some(service) = clinic.services.get(booking.service_id()) {
            *counts.entry(service.name.clone()).or_default() += 1;
        }
    }

    let total: usize = counts.values().sum();
    let mut shares: Vec<ServiceShare> = counts
        .into_iter()
        .map(|(service, count)| ServiceShare {
            percent: if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            },
            service,
            count,
        })
        .collect();
    // Stable sort keeps names alphabetical within equal counts
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::RecordId;
    use chrono::Utc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn clinic() -> Clinic {
        let mut config = Config::default();
        config.ui.simulated_latency_ms = 0;
        Clinic::seeded(&config, today())
    }

    #[test]
    fn test_seeded_dashboard() {
        let stats = DashboardStats::compute(&clinic(), today());

        assert_eq!(stats.total_appointments, 2);
        assert_eq!(stats.today_appointments, 2);
        assert_eq!(stats.total_patients, 2);
        assert_eq!(stats.confirmed, 1);
        assert_eq!(stats.scheduled, 1);
        assert_eq!(stats.cancelled, 0);
        assert_eq!(stats.public_bookings, 0);
        assert_eq!(
            stats.confirmed + stats.scheduled + stats.cancelled,
            stats.total_appointments
        );
        // Only the concluded hemograma has a price
        assert_eq!(stats.revenue, 85.0);

        let times: Vec<_> = stats.upcoming.iter().map(|a| a.time.as_str()).collect();
        assert_eq!(times, vec!["09:00", "14:00"]);
    }

    #[test]
    fn test_other_day_has_no_upcoming() {
        let stats = DashboardStats::compute(&clinic(), today().succ_opt().unwrap());
        assert_eq!(stats.today_appointments, 0);
        assert!(stats.upcoming.is_empty());
    }

    #[test]
    fn test_public_booking_counts_toward_revenue_and_share() {
        let mut clinic = clinic();
        let mut wizard = clinic.booking_wizard();
        wizard.select_service(RecordId(1)).unwrap();
        wizard.select_professional(RecordId(1)).unwrap();
        wizard.next().unwrap();
        wizard.select_date(today(), today()).unwrap();
        wizard.select_slot("08:00").unwrap();
        wizard.next().unwrap();
        wizard.set_patient_name("Carla Souza").unwrap();
        wizard.set_patient_email("carla@email.com").unwrap();
        wizard.set_patient_phone("(11) 91234-5678").unwrap();
        clinic.confirm_booking(&mut wizard, Utc::now()).unwrap();

        let stats = DashboardStats::compute(&clinic, today());
        assert_eq!(stats.public_bookings, 1);
        assert_eq!(stats.total_appointments, 3);
        assert_eq!(stats.confirmed, 2);
        assert_eq!(
            stats.confirmed + stats.scheduled + stats.cancelled,
            stats.total_appointments
        );
        assert_eq!(stats.today_appointments, 3);
        assert_eq!(stats.revenue, 85.0 + 150.0);

        assert_eq!(stats.service_share[0].service, "Consulta Geral");
        assert_eq!(stats.service_share[0].count, 2);
        let total: f64 = stats.service_share.iter().map(|s| s.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }
}
