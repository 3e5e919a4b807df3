//! Specification Pattern implementation for composable authorization rules.
//!
//! This crate provides the single policy-evaluation point for Podium:
//! instead of role checks scattered through page views, access decisions
//! are composed from small, reusable predicates and evaluated once per
//! request.
//!
//! # Example
//!
//! ```ignore
//! use podium_rules::prelude::*;
//!
//! // Compose rules with operators
//! let can_edit = Spec(IsAdmin) | (Spec(InDivision) & Spec(HasRole(Role::TournamentManager)));
//!
//! // Evaluate
//! if can_edit.is_satisfied_by(&context).await {
//!     // Allow the mutation
//! }
//! ```
//!
//! # Features
//!
//! - `auth` - Enable authorization rules that require database access

pub mod context;
pub mod operators;
pub mod specification;

#[cfg(feature = "auth")]
pub mod auth_rules;

/// Prelude module - import everything you need with `use podium_rules::prelude::*`
pub mod prelude {
    pub use crate::operators::Spec;
    pub use crate::specification::{
        AllOf, AlwaysFalse, AlwaysTrue, And, AnyOf, BoxedSpec, Not, Or, Specification,
    };

    #[cfg(feature = "auth")]
    pub use crate::auth_rules::*;
    #[cfg(feature = "auth")]
    pub use crate::context::AuthContext;
}
