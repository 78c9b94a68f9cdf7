//! Route table, access guard and navigation menu.

use crate::session::Session;
use crate::types::Role;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Login,
    PublicBooking,
    Dashboard,
    Appointments,
    Professionals,
    Services,
    Patients,
    Exams,
    Prescription,
}

impl Page {
    pub const ALL: &'static [Page] = &[
        Page::Login,
        Page::PublicBooking,
        Page::Dashboard,
        Page::Appointments,
        Page::Professionals,
        Page::Services,
        Page::Patients,
        Page::Exams,
        Page::Prescription,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Page::Login => "/login",
            Page::PublicBooking => "/public",
            Page::Dashboard => "/dashboard",
            Page::Appointments => "/appointments",
            Page::Professionals => "/professionals",
            Page::Services => "/services",
            Page::Patients => "/patients",
            Page::Exams => "/exams",
            Page::Prescription => "/prescription",
        }
    }

    /// Whether the page needs a session
    pub fn is_protected(self) -> bool {
        !matches!(self, Page::Login | Page::PublicBooking)
    }
}

/// Outcome of navigating to a path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Resolution {
    Render(Page),
    Redirect(&'static str),
    NotFound,
}

/// Strip the query string and any trailing slash (except the root itself)
fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Resolve one navigation step for `path` given the current session
pub fn resolve(path: &str, session: &Session) -> Resolution {
    let path = normalize(path);
    if path == "/" {
        return Resolution::Redirect(Page::Dashboard.path());
    }

    match Page::ALL.iter().copied().find(|p| p.path() == path) {
        Some(page) if page.is_protected() && !session.is_authenticated() => {
            tracing::debug!("Redirecting {} to login", path);
            Resolution::Redirect(Page::Login.path())
        }
        Some(page) => Resolution::Render(page),
        None => Resolution::NotFound,
    }
}

/// Follow redirects until a page renders or nothing matches
pub fn follow(path: &str, session: &Session) -> Resolution {
    let mut current = resolve(path, session);
    // Every redirect target is a concrete page, so this settles in two hops
    for _ in 0..Page::ALL.len() {
        match current {
            Resolution::Redirect(target) => current = resolve(target, session),
            settled => return settled,
        }
    }
    current
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub path: &'static str,
    pub label: &'static str,
}

/// Navigation entries shown to `role`
pub fn menu_for(role: Role) -> Vec<MenuItem> {
    let mut items = vec![
        MenuItem {
            path: Page::Dashboard.path(),
            label: "Dashboard",
        },
        MenuItem {
            path: Page::Appointments.path(),
            label: "Agendamentos",
        },
        MenuItem {
            path: Page::Patients.path(),
            label: "Pacientes",
        },
    ];
    if role.has_admin_capability() {
        items.push(MenuItem {
            path: Page::Professionals.path(),
            label: "Profissionais",
        });
        items.push(MenuItem {
            path: Page::Services.path(),
            label: "Serviços",
        });
    }
    items
}
