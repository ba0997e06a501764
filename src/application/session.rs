// src/application/session.rs
use crate::domain::{DomainError, OwnerId};

/// Trusted source of the caller's identity.
///
/// Services ask for the user on every operation and never cache it.
pub trait SessionProvider {
    fn current_user(&self) -> Result<OwnerId, DomainError>;
}

/// Fixed identity, as configured for the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    user: Option<OwnerId>,
}

impl StaticSession {
    pub fn new(user: Option<OwnerId>) -> Self {
        Self { user }
    }

    pub fn signed_in(user: impl Into<String>) -> Self {
        Self::new(Some(OwnerId::new(user)))
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }
}

impl SessionProvider for StaticSession {
    fn current_user(&self) -> Result<OwnerId, DomainError> {
        self.user.clone().ok_or(DomainError::Unauthenticated)
    }
}

impl<S: SessionProvider + ?Sized> SessionProvider for &S {
    fn current_user(&self) -> Result<OwnerId, DomainError> {
        (**self).current_user()
    }
}
