//! Sesión de usuario
//!
//! El núcleo solo lee la sesión para atribuir alquileres; la verificación de
//! credenciales queda fuera de esta librería. `SessionContext` es el contrato
//! de solo lectura que la UI (o un fake en tests) inyecta donde haga falta.

use serde::{Deserialize, Serialize};

/// Rol del usuario autenticado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Customer,
}

/// Vista de solo lectura sobre la sesión actual
pub trait SessionContext: Send + Sync {
    fn username(&self) -> Option<&str>;
    fn is_admin(&self) -> bool;
    fn is_logged_in(&self) -> bool;
}

/// Sesión en memoria, construida explícitamente por el proceso que la usa
/// (sin singleton de proceso; cada instancia es independiente).
#[derive(Debug, Default)]
pub struct UserSession {
    username: Option<String>,
    role: Option<UserRole>,
}

impl UserSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inicia una sesión con el usuario y rol dados
    pub fn login(&mut self, username: impl Into<String>, role: UserRole) {
        self.username = Some(username.into());
        self.role = Some(role);
    }

    /// Cierra la sesión actual
    pub fn logout(&mut self) {
        self.username = None;
        self.role = None;
    }

    pub fn role(&self) -> Option<UserRole> {
        self.role
    }
}

impl SessionContext for UserSession {
    fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn is_admin(&self) -> bool {
        self.role == Some(UserRole::Admin)
    }

    fn is_logged_in(&self) -> bool {
        self.username.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_and_logout_cycle() {
        let mut session = UserSession::new();
        assert!(!session.is_logged_in());

        session.login("tomas", UserRole::Customer);
        assert!(session.is_logged_in());
        assert!(!session.is_admin());
        assert_eq!(session.username(), Some("tomas"));

        session.logout();
        assert!(!session.is_logged_in());
        assert_eq!(session.username(), None);
    }

    #[test]
    fn admin_role_is_reported() {
        let mut session = UserSession::new();
        session.login("admin", UserRole::Admin);
        assert!(session.is_admin());
    }
}
