//! Authorization rules for the API gateway.
//!
//! Role rules evaluate against the token alone; entity-scoped rules
//! resolve ownership through the database.

#[cfg(feature = "auth")]
use crate::context::AuthContext;
#[cfg(feature = "auth")]
use crate::specification::Specification;
#[cfg(feature = "auth")]
use async_trait::async_trait;
#[cfg(feature = "auth")]
use podium_common::Role;
#[cfg(feature = "auth")]
use uuid::Uuid;

// =============================================================================
// Role rules
// =============================================================================

/// Check if the user has the admin role.
#[cfg(feature = "auth")]
pub struct IsAdmin;

#[cfg(feature = "auth")]
#[async_trait]
impl Specification<AuthContext> for IsAdmin {
    async fn is_satisfied_by(&self, ctx: &AuthContext) -> bool {
        ctx.role == Role::Admin
    }
}

/// Check if the user has a specific role.
#[cfg(feature = "auth")]
pub struct HasRole(pub Role);

#[cfg(feature = "auth")]
#[async_trait]
impl Specification<AuthContext> for HasRole {
    async fn is_satisfied_by(&self, ctx: &AuthContext) -> bool {
        ctx.role == self.0
    }
}

/// Check if the user has any of the given roles.
#[cfg(feature = "auth")]
pub struct HasAnyRole(pub &'static [Role]);

#[cfg(feature = "auth")]
impl HasAnyRole {
    /// Roles allowed to touch judging resources.
    pub fn judging() -> Self {
        HasAnyRole(&[Role::Judge, Role::LeadJudge, Role::JudgeAdvisor])
    }

    /// Roles allowed to touch field resources.
    pub fn field() -> Self {
        HasAnyRole(&[Role::Referee, Role::HeadReferee, Role::Scorekeeper])
    }
}

#[cfg(feature = "auth")]
#[async_trait]
impl Specification<AuthContext> for HasAnyRole {
    async fn is_satisfied_by(&self, ctx: &AuthContext) -> bool {
        self.0.contains(&ctx.role)
    }
}

// =============================================================================
// Division-scoped rules
// =============================================================================

/// Check if the user belongs to the division named in the request path.
/// Requires `ctx.division_id` to be set.
#[cfg(feature = "auth")]
pub struct InDivision;

#[cfg(feature = "auth")]
#[async_trait]
impl Specification<AuthContext> for InDivision {
    async fn is_satisfied_by(&self, ctx: &AuthContext) -> bool {
        let Some(division_id) = ctx.division_id else {
            tracing::warn!("InDivision evaluated without division_id in context");
            return false;
        };
        ctx.user_division == Some(division_id)
    }
}

/// Check if the context's team belongs to the context's division.
/// Requires `ctx.division_id` and `ctx.team_id` to be set.
#[cfg(feature = "auth")]
pub struct TeamInDivision;

#[cfg(feature = "auth")]
#[async_trait]
impl Specification<AuthContext> for TeamInDivision {
    async fn is_satisfied_by(&self, ctx: &AuthContext) -> bool {
        let (Some(division_id), Some(team_id)) = (ctx.division_id, ctx.team_id) else {
            tracing::warn!("TeamInDivision evaluated without division_id/team_id in context");
            return false;
        };

        let result: Result<Option<bool>, _> = sqlx::query_scalar(
            r#"SELECT EXISTS(
                SELECT 1 FROM teams
                WHERE id = $1 AND division_id = $2
            )"#,
        )
        .bind(team_id)
        .bind(division_id)
        .fetch_one(ctx.db.as_ref())
        .await;

        result.ok().flatten().unwrap_or(false)
    }
}

/// Check if the user's role association is the room hosting the context's
/// judging session. Requires `ctx.session_id` to be set.
#[cfg(feature = "auth")]
pub struct OwnsSessionRoom;

#[cfg(feature = "auth")]
#[async_trait]
impl Specification<AuthContext> for OwnsSessionRoom {
    async fn is_satisfied_by(&self, ctx: &AuthContext) -> bool {
        let Some(session_id) = ctx.session_id else {
            tracing::warn!("OwnsSessionRoom evaluated without session_id in context");
            return false;
        };
        let Some(association) = ctx.association else {
            return false;
        };

        let result: Result<Option<Uuid>, _> =
            sqlx::query_scalar("SELECT room_id FROM judging_sessions WHERE id = $1")
                .bind(session_id)
                .fetch_optional(ctx.db.as_ref())
                .await;

        result
            .ok()
            .flatten()
            .map(|room| room == association)
            .unwrap_or(false)
    }
}
