//! Authorization helpers using podium-rules specifications.
//!
//! The composable rules live in podium-rules; this module builds the
//! evaluation context from the request and exposes the handful of
//! `require_*` checks handlers actually use.

use std::sync::Arc;

use uuid::Uuid;

use podium_rules::{
    auth_rules::{HasAnyRole, HasRole, IsAdmin, OwnsSessionRoom, TeamInDivision},
    context::AuthContext,
    operators::Spec,
    specification::Specification,
};

use podium_common::Role;

use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Build an AuthContext from the current request state and user.
pub fn build_auth_context(state: &AppState, user: &AuthUser) -> AuthContext {
    AuthContext::new(
        user.id,
        user.role,
        user.division_id,
        user.association,
        Arc::new(state.db.clone()),
    )
}

/// Build an AuthContext with division scope.
pub fn build_division_context(state: &AppState, user: &AuthUser, division_id: Uuid) -> AuthContext {
    build_auth_context(state, user).with_division(division_id)
}

// =============================================================================
// Authorization check functions
// =============================================================================

/// Check if user is an admin.
pub async fn require_admin(ctx: &AuthContext) -> ApiResult<()> {
    if !IsAdmin.is_satisfied_by(ctx).await {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

/// Check if user holds one of the judging roles (or is admin).
pub async fn require_judging_role(ctx: &AuthContext) -> ApiResult<()> {
    if IsAdmin.is_satisfied_by(ctx).await || HasAnyRole::judging().is_satisfied_by(ctx).await {
        return Ok(());
    }
    Err(ApiError::Forbidden)
}

/// Check if user holds one of the field roles (or is admin).
pub async fn require_field_role(ctx: &AuthContext) -> ApiResult<()> {
    if IsAdmin.is_satisfied_by(ctx).await || HasAnyRole::field().is_satisfied_by(ctx).await {
        return Ok(());
    }
    Err(ApiError::Forbidden)
}

/// Check if user runs the tournament (admin or tournament manager).
pub async fn require_tournament_manager(ctx: &AuthContext) -> ApiResult<()> {
    if IsAdmin.is_satisfied_by(ctx).await
        || HasRole(Role::TournamentManager).is_satisfied_by(ctx).await
    {
        return Ok(());
    }
    Err(ApiError::Forbidden)
}

/// Check if user may act on the context's judging session.
///
/// Plain judges are bound to the room hosting the session; lead judges,
/// judge advisors, and admins may act on any session. Requires
/// `ctx.session_id` to be set.
pub async fn require_session_access(ctx: &AuthContext) -> ApiResult<()> {
    let rule = Spec(IsAdmin)
        | Spec(HasRole(Role::LeadJudge))
        | Spec(HasRole(Role::JudgeAdvisor))
        | (Spec(HasRole(Role::Judge)) & Spec(OwnsSessionRoom));
    if rule.is_satisfied_by(ctx).await {
        return Ok(());
    }
    Err(ApiError::Forbidden)
}

/// Check that the context's team belongs to the context's division.
/// Requires `ctx.division_id` and `ctx.team_id` to be set.
pub async fn require_team_in_division(ctx: &AuthContext) -> ApiResult<()> {
    if TeamInDivision.is_satisfied_by(ctx).await {
        return Ok(());
    }
    Err(ApiError::NotFound("Team not found".to_string()))
}

/// Check if user may review rubrics (admin, judge advisor, or lead judge).
pub async fn require_rubric_review_access(ctx: &AuthContext) -> ApiResult<()> {
    if IsAdmin.is_satisfied_by(ctx).await {
        return Ok(());
    }
    if HasRole(Role::JudgeAdvisor).is_satisfied_by(ctx).await {
        return Ok(());
    }
    if HasRole(Role::LeadJudge).is_satisfied_by(ctx).await {
        return Ok(());
    }
    Err(ApiError::Forbidden)
}
