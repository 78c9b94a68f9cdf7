//! Credential check against the built-in accounts.

use crate::notify::{Notification, Notifier};
use crate::session::{Session, SessionStore};
use crate::types::{Role, User};
use crate::{Error, Result};
use std::time::Duration;

struct Account {
    email: &'static str,
    password: &'static str,
    name: &'static str,
    role: Role,
}

const ACCOUNTS: &[Account] = &[
    Account {
        email: "admin@example-domain",
        password: "admin123",
        name: "Administrator",
        role: Role::Admin,
    },
    Account {
        email: "doctor@example-domain",
        password: "doctor123",
        name: "Dr. João Silva",
        role: Role::Professional,
    },
];

/// Resolve an (email, password) pair to a user
pub fn authenticate(email: &str, password: &str) -> Result<User> {
    let email = email.trim();
    ACCOUNTS
        .iter()
        .find(|a| a.email == email && a.password == password)
        .map(|a| User {
            id: "1".into(),
            email: a.email.into(),
            name: a.name.into(),
            role: a.role,
        })
        .ok_or(Error::InvalidCredentials)
}

pub const LOGIN_SUCCESS: &str = "Login realizado com sucesso!";
pub const LOGIN_FAILED: &str = "Erro ao fazer login. Verifique suas credenciais.";

/// Authenticate and start a session
///
/// `latency` is slept before the check. On failure the store is not touched
/// and an error notification is raised instead.
pub fn login(
    store: &mut dyn SessionStore,
    notifier: &mut dyn Notifier,
    email: &str,
    password: &str,
    latency: Duration,
) -> Result<Session> {
    if !latency.is_zero() {
        std::thread::sleep(latency);
    }

    match authenticate(email, password) {
        Ok(user) => {
            let session = Session::begin(store, user)?;
            notifier.notify(Notification::success(LOGIN_SUCCESS));
            Ok(session)
        }
        Err(e) => {
            tracing::warn!("Login rejected for {}", email.trim());
            notifier.notify(Notification::error(LOGIN_FAILED));
            Err(e)
        }
    }
}

/// End `session` and clear the stored entries
pub fn logout(store: &mut dyn SessionStore, session: &mut Session) -> Result<()> {
    session.end(store)
}
