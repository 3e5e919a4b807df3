//! Context types for specification evaluation.

#[cfg(feature = "auth")]
use podium_common::Role;
#[cfg(feature = "auth")]
use std::sync::Arc;
#[cfg(feature = "auth")]
use uuid::Uuid;

/// Authorization context for gateway access control.
///
/// Carries the authenticated user's identity, the division scope of the
/// request, and a database handle for rules that need to resolve entity
/// ownership asynchronously.
#[cfg(feature = "auth")]
#[derive(Clone)]
pub struct AuthContext {
    /// Current user ID
    pub user_id: Uuid,
    /// Current user's tournament role
    pub role: Role,
    /// The division the user belongs to (admins have none)
    pub user_division: Option<Uuid>,
    /// The room, table, or category the role is bound to, if any
    pub association: Option<Uuid>,
    /// Database pool for async lookups
    pub db: Arc<sqlx::PgPool>,
    /// The division named in the request path
    pub division_id: Option<Uuid>,
    /// Target judging session for session-scoped rules
    pub session_id: Option<Uuid>,
    /// Target team for team-scoped rules
    pub team_id: Option<Uuid>,
}

#[cfg(feature = "auth")]
impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("user_division", &self.user_division)
            .field("division_id", &self.division_id)
            .field("session_id", &self.session_id)
            .field("team_id", &self.team_id)
            .finish()
    }
}

#[cfg(feature = "auth")]
impl AuthContext {
    /// Create a new authorization context
    pub fn new(
        user_id: Uuid,
        role: Role,
        user_division: Option<Uuid>,
        association: Option<Uuid>,
        db: Arc<sqlx::PgPool>,
    ) -> Self {
        Self {
            user_id,
            role,
            user_division,
            association,
            db,
            division_id: None,
            session_id: None,
            team_id: None,
        }
    }

    /// Set the division scope of the request
    pub fn with_division(mut self, division_id: Uuid) -> Self {
        self.division_id = Some(division_id);
        self
    }

    /// Set the target judging session
    pub fn with_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Set the target team
    pub fn with_team(mut self, team_id: Uuid) -> Self {
        self.team_id = Some(team_id);
        self
    }
}
