//! Request-scoped caller context.
//!
//! The portal keeps no ambient session state; boundaries hold a
//! `RequestContext` per caller and pass it into every portal call.

use crate::model::user::{Role, User, UserId};
use serde::Serialize;

/// Authenticated identity issued by `login`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: UserId,
    pub role: Role,
}

impl Session {
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
        }
    }
}

/// Caller context for one portal request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    session: Option<Session>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Drops the session; returns whether one was present.
    pub fn clear(&mut self) -> bool {
        self.session.take().is_some()
    }
}
