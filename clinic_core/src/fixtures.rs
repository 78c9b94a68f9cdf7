//! Seed records loaded into every new clinic.
//!
//! Static fixtures are built once and cloned on demand. Appointments are
//! dated relative to "today" and so are rebuilt per call.

use crate::types::*;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

static SERVICES: Lazy<Vec<Service>> = Lazy::new(build_services);
static PROFESSIONALS: Lazy<Vec<Professional>> = Lazy::new(build_professionals);
static PATIENTS: Lazy<Vec<Patient>> = Lazy::new(build_patients);
static EXAMS: Lazy<Vec<Exam>> = Lazy::new(build_exams);
static PRESCRIPTIONS: Lazy<Vec<Prescription>> = Lazy::new(build_prescriptions);
static ALLERGIES: Lazy<Vec<Allergy>> = Lazy::new(build_allergies);

pub fn services() -> Vec<Service> {
    SERVICES.clone()
}

pub fn professionals() -> Vec<Professional> {
    PROFESSIONALS.clone()
}

pub fn patients() -> Vec<Patient> {
    PATIENTS.clone()
}

pub fn exams() -> Vec<Exam> {
    EXAMS.clone()
}

pub fn prescriptions() -> Vec<Prescription> {
    PRESCRIPTIONS.clone()
}

pub fn allergies() -> Vec<Allergy> {
    ALLERGIES.clone()
}

/// Two appointments on `today`
pub fn appointments(today: NaiveDate) -> Vec<Appointment> {
    vec![
        Appointment {
            id: RecordId(1),
            patient_name: "Maria Silva".into(),
            patient_email: "maria@email.com".into(),
            patient_phone: "(11) 99999-9999".into(),
            service: "Consulta Geral".into(),
            professional: "Dr. João Santos".into(),
            date: today,
            time: "09:00".into(),
            status: AppointmentStatus::Confirmed,
        },
        Appointment {
            id: RecordId(2),
            patient_name: "Pedro Lima".into(),
            patient_email: "pedro@email.com".into(),
            patient_phone: "(11) 88888-8888".into(),
            service: "Exame".into(),
            professional: "Dra. Ana Costa".into(),
            date: today,
            time: "14:00".into(),
            status: AppointmentStatus::Scheduled,
        },
    ]
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn build_services() -> Vec<Service> {
    vec![
        Service {
            id: RecordId(1),
            name: "Consulta Geral".into(),
            description: "Consulta médica geral para avaliação e diagnóstico inicial do paciente"
                .into(),
            duration_minutes: 30,
            price: 150.0,
            status: ActiveStatus::Active,
            category: "Consultas".into(),
        },
        Service {
            id: RecordId(2),
            name: "Exame de Rotina".into(),
            description:
                "Exames laboratoriais e check-up de rotina para prevenção e acompanhamento".into(),
            duration_minutes: 60,
            price: 200.0,
            status: ActiveStatus::Active,
            category: "Exames".into(),
        },
        Service {
            id: RecordId(3),
            name: "Consulta de Retorno".into(),
            description: "Consulta de acompanhamento e reavaliação após tratamento inicial".into(),
            duration_minutes: 20,
            price: 100.0,
            status: ActiveStatus::Active,
            category: "Consultas".into(),
        },
        Service {
            id: RecordId(4),
            name: "Procedimento Cirúrgico Menor".into(),
            description: "Pequenos procedimentos cirúrgicos ambulatoriais".into(),
            duration_minutes: 45,
            price: 300.0,
            status: ActiveStatus::Inactive,
            category: "Procedimentos".into(),
        },
    ]
}

fn build_professionals() -> Vec<Professional> {
    vec![
        Professional {
            id: RecordId(1),
            name: "Dr. João Santos".into(),
            email: "joao@clinictime.com".into(),
            phone: "(11) 99999-9999".into(),
            specialty: "Clínico Geral".into(),
            crm: "CRM/SP 123456".into(),
            status: ActiveStatus::Active,
        },
        Professional {
            id: RecordId(2),
            name: "Dra. Ana Costa".into(),
            email: "ana@clinictime.com".into(),
            phone: "(11) 88888-8888".into(),
            specialty: "Cardiologista".into(),
            crm: "CRM/SP 654321".into(),
            status: ActiveStatus::Active,
        },
    ]
}

fn build_patients() -> Vec<Patient> {
    vec![
        Patient {
            id: RecordId(1),
            name: "Maria Silva".into(),
            email: "maria@email.com".into(),
            phone: "(11) 99999-9999".into(),
            cpf: "123.456.789-00".into(),
            birth_date: Some(date(1985, 3, 15)),
            address: "Rua das Flores, 123 - São Paulo/SP".into(),
            last_visit: Some(date(2024, 1, 15)),
        },
        Patient {
            id: RecordId(2),
            name: "João Santos".into(),
            email: "joao@email.com".into(),
            phone: "(11) 88888-8888".into(),
            cpf: "987.654.321-00".into(),
            birth_date: Some(date(1990, 7, 22)),
            address: "Av. Paulista, 456 - São Paulo/SP".into(),
            last_visit: Some(date(2024, 1, 10)),
        },
    ]
}

fn build_exams() -> Vec<Exam> {
    let mut values = BTreeMap::new();
    values.insert("Hemoglobina".to_string(), ResultValue::Number(14.5));
    values.insert("Leucócitos".to_string(), ResultValue::Number(7500.0));

    vec![
        Exam {
            id: RecordId(1),
            patient_id: RecordId(101),
            patient: "Maria Silva".into(),
            physician: "Dr. João Pereira".into(),
            crm: Some("SP12345".into()),
            kind: "Hemograma Completo".into(),
            category: ExamCategory::Laboratorial,
            date: date(2023, 1, 15),
            collected_on: Some(date(2023, 1, 14)),
            status: ExamStatus::Concluido,
            priority: ExamPriority::Normal,
            notes: Some("Paciente em jejum de 8h.".into()),
            preparation: None,
            result: Some(ExamResult {
                date: date(2023, 1, 16),
                notes: "Resultados dentro da normalidade.".into(),
                values,
                normal: true,
                reporting_physician: None,
            }),
            location: Some("Laboratório Central".into()),
            price: Some(85.0),
        },
        Exam {
            id: RecordId(2),
            patient_id: RecordId(102),
            patient: "Carlos Eduardo".into(),
            physician: "Dra. Ana Santos".into(),
            crm: Some("RJ98765".into()),
            kind: "Raio-X Tórax".into(),
            category: ExamCategory::Imagem,
            date: date(2023, 1, 20),
            collected_on: None,
            status: ExamStatus::Pendente,
            priority: ExamPriority::Urgente,
            notes: None,
            preparation: Some("Nenhum preparo especial necessário.".into()),
            result: None,
            location: Some("Clínica de Imagem XYZ".into()),
            price: Some(150.0),
        },
        Exam {
            id: RecordId(3),
            patient_id: RecordId(103),
            patient: "Fernanda Lima".into(),
            physician: "Dr. Ricardo Neves".into(),
            crm: Some("MG54321".into()),
            kind: "Eletrocardiograma".into(),
            category: ExamCategory::Cardiologico,
            date: date(2023, 2, 1),
            collected_on: None,
            status: ExamStatus::Processando,
            priority: ExamPriority::Normal,
            notes: Some("Dor no peito relatada.".into()),
            preparation: None,
            result: None,
            location: Some("Hospital Municipal".into()),
            price: Some(70.0),
        },
    ]
}

fn build_prescriptions() -> Vec<Prescription> {
    vec![
        Prescription {
            id: RecordId(1),
            patient_id: RecordId(1),
            patient: "Maria Silva".into(),
            physician: "Dr. Carlos Silva".into(),
            date: date(2024, 6, 10),
            diagnosis: "Hipertensão arterial e dislipidemia".into(),
            medications: vec![
                Medication {
                    name: "Losartana 50mg".into(),
                    dosage: "50mg".into(),
                    frequency: "1x ao dia".into(),
                    duration: "30 dias".into(),
                    instructions: None,
                },
                Medication {
                    name: "Sinvastatina 20mg".into(),
                    dosage: "20mg".into(),
                    frequency: "1x ao dia (noite)".into(),
                    duration: "30 dias".into(),
                    instructions: None,
                },
            ],
            status: PrescriptionStatus::Ativo,
        },
        Prescription {
            id: RecordId(2),
            patient_id: RecordId(1),
            patient: "Maria Silva".into(),
            physician: "Dra. Ana Santos".into(),
            date: date(2024, 5, 15),
            diagnosis: "Infecção respiratória".into(),
            medications: vec![Medication {
                name: "Amoxicilina 500mg".into(),
                dosage: "500mg".into(),
                frequency: "3x ao dia".into(),
                duration: "7 dias".into(),
                instructions: None,
            }],
            status: PrescriptionStatus::Concluido,
        },
    ]
}

fn build_allergies() -> Vec<Allergy> {
    vec![
        Allergy {
            id: RecordId(1),
            substance: "Penicilina".into(),
            severity: AllergySeverity::Grave,
            reaction: "Anafilaxia, erupção cutânea".into(),
        },
        Allergy {
            id: RecordId(2),
            substance: "Aspirina".into(),
            severity: AllergySeverity::Moderada,
            reaction: "Dor de estômago, náusea".into(),
        },
    ]
}
