//! Core Specification trait and combinators.

use async_trait::async_trait;
use std::sync::Arc;

/// Core specification trait for composable authorization rules.
///
/// A specification is an async predicate over some evaluation context.
/// Complex policies are composed out of small predicates with `and`,
/// `or`, and `not` rather than written as one-off checks in handlers.
#[async_trait]
pub trait Specification<Ctx>: Send + Sync {
    /// Check if the specification is satisfied by the given context.
    async fn is_satisfied_by(&self, ctx: &Ctx) -> bool;

    /// Combine this specification with another using AND logic.
    fn and<S: Specification<Ctx>>(self, other: S) -> And<Self, S>
    where
        Self: Sized,
    {
        And(self, other)
    }

    /// Combine this specification with another using OR logic.
    fn or<S: Specification<Ctx>>(self, other: S) -> Or<Self, S>
    where
        Self: Sized,
    {
        Or(self, other)
    }

    /// Negate this specification.
    fn not(self) -> Not<Self>
    where
        Self: Sized,
    {
        Not(self)
    }
}

/// AND combinator for specifications.
#[derive(Clone)]
pub struct And<A, B>(pub A, pub B);

#[async_trait]
impl<Ctx, A, B> Specification<Ctx> for And<A, B>
where
    Ctx: Send + Sync,
    A: Specification<Ctx>,
    B: Specification<Ctx>,
{
    async fn is_satisfied_by(&self, ctx: &Ctx) -> bool {
        self.0.is_satisfied_by(ctx).await && self.1.is_satisfied_by(ctx).await
    }
}

/// OR combinator for specifications.
#[derive(Clone)]
pub struct Or<A, B>(pub A, pub B);

#[async_trait]
impl<Ctx, A, B> Specification<Ctx> for Or<A, B>
where
    Ctx: Send + Sync,
    A: Specification<Ctx>,
    B: Specification<Ctx>,
{
    async fn is_satisfied_by(&self, ctx: &Ctx) -> bool {
        self.0.is_satisfied_by(ctx).await || self.1.is_satisfied_by(ctx).await
    }
}

/// NOT combinator for specifications.
#[derive(Clone)]
pub struct Not<A>(pub A);

#[async_trait]
impl<Ctx, A> Specification<Ctx> for Not<A>
where
    Ctx: Send + Sync,
    A: Specification<Ctx>,
{
    async fn is_satisfied_by(&self, ctx: &Ctx) -> bool {
        !self.0.is_satisfied_by(ctx).await
    }
}

/// A specification that always returns true.
#[derive(Clone, Copy)]
pub struct AlwaysTrue;

#[async_trait]
impl<Ctx: Send + Sync> Specification<Ctx> for AlwaysTrue {
    async fn is_satisfied_by(&self, _ctx: &Ctx) -> bool {
        true
    }
}

/// A specification that always returns false.
#[derive(Clone, Copy)]
pub struct AlwaysFalse;

#[async_trait]
impl<Ctx: Send + Sync> Specification<Ctx> for AlwaysFalse {
    async fn is_satisfied_by(&self, _ctx: &Ctx) -> bool {
        false
    }
}

/// A boxed specification for dynamic dispatch.
pub type BoxedSpec<Ctx> = Arc<dyn Specification<Ctx>>;

#[async_trait]
impl<Ctx: Send + Sync> Specification<Ctx> for BoxedSpec<Ctx> {
    async fn is_satisfied_by(&self, ctx: &Ctx) -> bool {
        self.as_ref().is_satisfied_by(ctx).await
    }
}

/// All specifications in the collection must be satisfied.
pub struct AllOf<Ctx> {
    specs: Vec<BoxedSpec<Ctx>>,
}

impl<Ctx> AllOf<Ctx> {
    pub fn new(specs: Vec<BoxedSpec<Ctx>>) -> Self {
        AllOf { specs }
    }
}

#[async_trait]
impl<Ctx: Send + Sync> Specification<Ctx> for AllOf<Ctx> {
    async fn is_satisfied_by(&self, ctx: &Ctx) -> bool {
        for spec in &self.specs {
            if !spec.is_satisfied_by(ctx).await {
                return false;
            }
        }
        true
    }
}

/// Any specification in the collection must be satisfied.
pub struct AnyOf<Ctx> {
    specs: Vec<BoxedSpec<Ctx>>,
}

impl<Ctx> AnyOf<Ctx> {
    pub fn new(specs: Vec<BoxedSpec<Ctx>>) -> Self {
        AnyOf { specs }
    }
}

#[async_trait]
impl<Ctx: Send + Sync> Specification<Ctx> for AnyOf<Ctx> {
    async fn is_satisfied_by(&self, ctx: &Ctx) -> bool {
        for spec in &self.specs {
            if spec.is_satisfied_by(ctx).await {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // AlwaysTrue/AlwaysFalse implement Specification for every context,
    // so builder calls need the context pinned to a concrete type.
    fn and_spec<A: Specification<()>, B: Specification<()>>(a: A, b: B) -> And<A, B> {
        a.and(b)
    }

    fn or_spec<A: Specification<()>, B: Specification<()>>(a: A, b: B) -> Or<A, B> {
        a.or(b)
    }

    fn not_spec<A: Specification<()>>(a: A) -> Not<A> {
        a.not()
    }

    #[tokio::test]
    async fn combinators_follow_boolean_table() {
        assert!(and_spec(AlwaysTrue, AlwaysTrue).is_satisfied_by(&()).await);
        assert!(!and_spec(AlwaysTrue, AlwaysFalse).is_satisfied_by(&()).await);
        assert!(or_spec(AlwaysFalse, AlwaysTrue).is_satisfied_by(&()).await);
        assert!(!or_spec(AlwaysFalse, AlwaysFalse).is_satisfied_by(&()).await);
        assert!(not_spec(AlwaysFalse).is_satisfied_by(&()).await);
        assert!(!not_spec(AlwaysTrue).is_satisfied_by(&()).await);
    }

    #[tokio::test]
    async fn combinators_nest() {
        // (true & !false) | false
        let rule = or_spec(and_spec(AlwaysTrue, not_spec(AlwaysFalse)), AlwaysFalse);
        assert!(rule.is_satisfied_by(&()).await);
    }

    #[tokio::test]
    async fn all_of_short_circuits_on_failure() {
        let all: AllOf<()> = AllOf::new(vec![Arc::new(AlwaysTrue), Arc::new(AlwaysFalse)]);
        assert!(!all.is_satisfied_by(&()).await);

        let all: AllOf<()> = AllOf::new(vec![]);
        assert!(all.is_satisfied_by(&()).await);
    }

    #[tokio::test]
    async fn any_of_requires_one_match() {
        let any: AnyOf<()> = AnyOf::new(vec![Arc::new(AlwaysFalse), Arc::new(AlwaysTrue)]);
        assert!(any.is_satisfied_by(&()).await);

        let any: AnyOf<()> = AnyOf::new(vec![]);
        assert!(!any.is_satisfied_by(&()).await);
    }
}
