#![forbid(unsafe_code)]

//! Core domain model and business logic for the ClinicTime system.
//!
//! This crate provides:
//! - Domain types (services, professionals, patients, appointments, exams, prescriptions)
//! - Insertion-ordered registries and the `Clinic` aggregate
//! - The public booking wizard
//! - Search and facet filtering
//! - Authentication, session persistence and route guarding
//! - Dashboard figures and CSV export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod validation;
pub mod format;
pub mod notify;
pub mod registry;
pub mod fixtures;
pub mod filter;
pub mod wizard;
pub mod clinic;
pub mod session;
pub mod auth;
pub mod routes;
pub mod dashboard;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use clinic::Clinic;
pub use registry::{Patch, Record, Registry};
pub use filter::{filter, FacetName, FacetValue, Facets, Searchable};
pub use wizard::{Blocked, BookingWizard, ConfirmedBooking, InputRejected, WizardStep};
pub use session::{FileStore, MemoryStore, Session, SessionStore};
pub use routes::{follow, menu_for, resolve, MenuItem, Page, Resolution};
pub use dashboard::DashboardStats;
