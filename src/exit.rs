//! Two-valued computation outcomes.
//!
//! An [`Exit`] is how a finished fiber reports back: either a
//! [`Success`](Exit::Success) carrying the produced value, or a
//! [`Failure`](Exit::Failure) carrying the full [`Cause`]. Combinators
//! here decide *how* two outcomes merge — sequentially (`cross_with` and
//! friends, failures composed with [`Cause::then`]) or in parallel (the
//! `*_par` family, failures composed with [`Cause::both`]) — while the
//! composition of the causes themselves is entirely the cause algebra's
//! business.

use core::fmt;

use crate::cause::Cause;
use crate::cause::Defect;

/// The result of running an effectful computation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Exit<Id, E, A> {
    /// The computation produced a value.
    Success(A),
    /// The computation failed, with the full cause.
    Failure(Cause<Id, E>),
}

impl<Id, E, A> Exit<Id, E, A> {
    /// A successful exit.
    #[must_use]
    pub const fn succeed(value: A) -> Self {
        Self::Success(value)
    }

    /// A failed exit with the given cause.
    #[must_use]
    pub const fn fail_cause(cause: Cause<Id, E>) -> Self {
        Self::Failure(cause)
    }

    /// A failed exit with a single typed failure.
    #[must_use]
    pub const fn fail(error: E) -> Self {
        Self::Failure(Cause::Fail(error))
    }

    /// A failed exit with a single defect.
    #[must_use]
    pub const fn halt(defect: Defect) -> Self {
        Self::Failure(Cause::Halt(defect))
    }

    /// A failed exit caused by interruption from the given fiber.
    #[must_use]
    pub const fn interrupt(id: Id) -> Self {
        Self::Failure(Cause::Interrupt(id))
    }

    /// True for `Success`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// True for `Failure`.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// True when this exit is a failure containing any interruption.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        match self {
            Self::Success(_) => false,
            Self::Failure(cause) => cause.interrupted(),
        }
    }

    /// Total elimination: exactly one of the two handlers runs.
    pub fn fold<B>(
        self,
        on_failure: impl FnOnce(Cause<Id, E>) -> B,
        on_success: impl FnOnce(A) -> B,
    ) -> B {
        match self {
            Self::Success(value) => on_success(value),
            Self::Failure(cause) => on_failure(cause),
        }
    }

    /// Transforms the success value.
    pub fn map<B>(self, f: impl FnOnce(A) -> B) -> Exit<Id, E, B> {
        match self {
            Self::Success(value) => Exit::Success(f(value)),
            Self::Failure(cause) => Exit::Failure(cause),
        }
    }

    /// Transforms the typed failures inside the cause. A `Success` is
    /// untouched.
    pub fn map_err<F>(self, f: impl FnMut(&E) -> F) -> Exit<Id, F, A>
    where
        Id: Clone,
    {
        match self {
            Self::Success(value) => Exit::Success(value),
            Self::Failure(cause) => Exit::Failure(cause.map(f)),
        }
    }

    /// Transforms the whole failure cause. A `Success` is untouched.
    pub fn map_err_cause<F>(
        self,
        f: impl FnOnce(Cause<Id, E>) -> Cause<Id, F>,
    ) -> Exit<Id, F, A> {
        match self {
            Self::Success(value) => Exit::Success(value),
            Self::Failure(cause) => Exit::Failure(f(cause)),
        }
    }

    /// Transforms both sides at once.
    pub fn bimap<F, B>(
        self,
        on_error: impl FnMut(&E) -> F,
        on_value: impl FnOnce(A) -> B,
    ) -> Exit<Id, F, B>
    where
        Id: Clone,
    {
        self.map(on_value).map_err(on_error)
    }

    /// The general outcome combinator.
    ///
    /// Both successes combine with `on_success`; both failures combine
    /// their causes with `on_failure` — [`Cause::then`] for sequential
    /// semantics, [`Cause::both`] for parallel semantics, the one place a
    /// caller chooses ordering. Exactly one failure wins outright and the
    /// other side's result is discarded.
    pub fn cross_with_cause<B, C>(
        self,
        that: Exit<Id, E, B>,
        on_success: impl FnOnce(A, B) -> C,
        on_failure: impl FnOnce(Cause<Id, E>, Cause<Id, E>) -> Cause<Id, E>,
    ) -> Exit<Id, E, C> {
        match (self, that) {
            (Self::Success(a), Exit::Success(b)) => Exit::Success(on_success(a, b)),
            (Self::Failure(left), Exit::Failure(right)) => {
                Exit::Failure(on_failure(left, right))
            }
            (Self::Failure(cause), Exit::Success(_)) => Exit::Failure(cause),
            (Self::Success(_), Exit::Failure(cause)) => Exit::Failure(cause),
        }
    }

    /// Sequential combination of values; failures compose with
    /// [`Cause::then`].
    pub fn cross_with<B, C>(
        self,
        that: Exit<Id, E, B>,
        on_success: impl FnOnce(A, B) -> C,
    ) -> Exit<Id, E, C> {
        self.cross_with_cause(that, on_success, Cause::then)
    }

    /// Parallel combination of values; failures compose with
    /// [`Cause::both`].
    pub fn cross_with_par<B, C>(
        self,
        that: Exit<Id, E, B>,
        on_success: impl FnOnce(A, B) -> C,
    ) -> Exit<Id, E, C> {
        self.cross_with_cause(that, on_success, Cause::both)
    }

    /// Sequential pairing.
    pub fn cross<B>(self, that: Exit<Id, E, B>) -> Exit<Id, E, (A, B)> {
        self.cross_with(that, |a, b| (a, b))
    }

    /// Sequential combination keeping the left value.
    pub fn cross_first<B>(self, that: Exit<Id, E, B>) -> Exit<Id, E, A> {
        self.cross_with(that, |a, _| a)
    }

    /// Sequential combination keeping the right value.
    pub fn cross_second<B>(self, that: Exit<Id, E, B>) -> Exit<Id, E, B> {
        self.cross_with(that, |_, b| b)
    }

    /// Parallel pairing.
    pub fn cross_par<B>(self, that: Exit<Id, E, B>) -> Exit<Id, E, (A, B)> {
        self.cross_with_par(that, |a, b| (a, b))
    }

    /// Parallel combination keeping the left value.
    pub fn cross_first_par<B>(self, that: Exit<Id, E, B>) -> Exit<Id, E, A> {
        self.cross_with_par(that, |a, _| a)
    }

    /// Parallel combination keeping the right value.
    pub fn cross_second_par<B>(self, that: Exit<Id, E, B>) -> Exit<Id, E, B> {
        self.cross_with_par(that, |_, b| b)
    }

    /// Folds a sequence of exits sequentially: all successes accumulate in
    /// input order, and any failures compose with [`Cause::then`] in input
    /// order. `None` on empty input.
    pub fn collect_all<I>(exits: I) -> Option<Exit<Id, E, Vec<A>>>
    where
        I: IntoIterator<Item = Exit<Id, E, A>>,
    {
        Self::collect_with(exits, Cause::then)
    }

    /// Folds a sequence of exits as parallel siblings: any failures
    /// compose with [`Cause::both`]. `None` on empty input.
    pub fn collect_all_par<I>(exits: I) -> Option<Exit<Id, E, Vec<A>>>
    where
        I: IntoIterator<Item = Exit<Id, E, A>>,
    {
        Self::collect_with(exits, Cause::both)
    }

    fn collect_with<I>(
        exits: I,
        combine: fn(Cause<Id, E>, Cause<Id, E>) -> Cause<Id, E>,
    ) -> Option<Exit<Id, E, Vec<A>>>
    where
        I: IntoIterator<Item = Exit<Id, E, A>>,
    {
        let mut iter = exits.into_iter();
        let mut acc = iter.next()?.map(|value| vec![value]);
        for exit in iter {
            acc = acc.cross_with_cause(
                exit,
                |mut values, value| {
                    values.push(value);
                    values
                },
                combine,
            );
        }
        Some(acc)
    }

    /// Converts to a `Result`, losing nothing: the failure side carries
    /// the full cause.
    pub fn into_result(self) -> Result<A, Cause<Id, E>> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(cause) => Err(cause),
        }
    }

    /// Returns the success value or panics.
    ///
    /// # Panics
    ///
    /// Panics if the exit is a `Failure`.
    #[track_caller]
    pub fn unwrap(self) -> A
    where
        Id: fmt::Debug,
        E: fmt::Debug,
    {
        match self {
            Self::Success(value) => value,
            Self::Failure(cause) => {
                panic!("called `Exit::unwrap()` on a `Failure` value: {cause:?}")
            }
        }
    }

    /// Returns the success value or a default.
    pub fn unwrap_or(self, default: A) -> A {
        match self {
            Self::Success(value) => value,
            Self::Failure(_) => default,
        }
    }
}

impl<Id, E, A> From<Result<A, E>> for Exit<Id, E, A> {
    fn from(result: Result<A, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::fail(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestExit = Exit<u32, &'static str, i32>;

    fn fail_cause(error: &'static str) -> Cause<u32, &'static str> {
        Cause::fail(error)
    }

    // =========================================================================
    // Constructors and predicates
    // =========================================================================

    #[test]
    fn constructors_build_expected_variants() {
        assert!(TestExit::succeed(1).is_success());
        assert!(TestExit::fail("x").is_failure());
        assert!(TestExit::halt(Defect::new("boom")).is_failure());
        assert!(TestExit::interrupt(1).is_interrupted());
        assert!(!TestExit::fail("x").is_interrupted());
    }

    #[test]
    fn from_result_round_trips() {
        let ok: TestExit = Exit::from(Ok(3));
        assert_eq!(ok.clone().into_result(), Ok(3));

        let err: TestExit = Exit::from(Err("x"));
        assert_eq!(err.into_result(), Err(fail_cause("x")));
    }

    // =========================================================================
    // cross_with_cause
    // =========================================================================

    #[test]
    fn both_successes_combine_values() {
        let exit = TestExit::succeed(1).cross_with_cause(
            Exit::succeed(2),
            |x, y| x + y,
            Cause::then,
        );
        assert_eq!(exit, Exit::succeed(3));
    }

    #[test]
    fn single_failure_wins_outright() {
        let exit = TestExit::fail("x").cross_with_cause(
            Exit::succeed(2),
            |x, y| x + y,
            Cause::both,
        );
        assert_eq!(exit, Exit::fail("x"));

        let exit = TestExit::succeed(1).cross_with_cause(
            Exit::fail("y"),
            |x, y: i32| x + y,
            Cause::both,
        );
        assert_eq!(exit, Exit::fail("y"));
    }

    #[test]
    fn two_failures_combine_causes() {
        let exit = TestExit::fail("x").cross_with_cause(
            TestExit::fail("y"),
            |x, y| x + y,
            Cause::both,
        );
        assert_eq!(
            exit,
            Exit::fail_cause(Cause::both(fail_cause("x"), fail_cause("y")))
        );

        let exit = TestExit::fail("x").cross_with(TestExit::fail("y"), |x, y| x + y);
        assert_eq!(
            exit,
            Exit::fail_cause(Cause::then(fail_cause("x"), fail_cause("y")))
        );
    }

    #[test]
    fn cross_family_projects_values() {
        let a = TestExit::succeed(1);
        let b = TestExit::succeed(2);
        assert_eq!(a.clone().cross(b.clone()), Exit::succeed((1, 2)));
        assert_eq!(a.clone().cross_first(b.clone()), Exit::succeed(1));
        assert_eq!(a.clone().cross_second(b.clone()), Exit::succeed(2));
        assert_eq!(a.clone().cross_par(b.clone()), Exit::succeed((1, 2)));
        assert_eq!(a.clone().cross_first_par(b.clone()), Exit::succeed(1));
        assert_eq!(a.cross_second_par(b), Exit::succeed(2));
    }

    // =========================================================================
    // collect_all
    // =========================================================================

    #[test]
    fn collect_all_accumulates_in_input_order() {
        let exits = vec![
            TestExit::succeed(1),
            TestExit::succeed(2),
            TestExit::succeed(3),
        ];
        assert_eq!(
            TestExit::collect_all(exits),
            Some(Exit::succeed(vec![1, 2, 3]))
        );
    }

    #[test]
    fn collect_all_combines_only_failing_causes() {
        let exits = vec![
            TestExit::succeed(1),
            TestExit::fail("x"),
            TestExit::succeed(2),
            TestExit::fail("y"),
        ];
        assert_eq!(
            TestExit::collect_all(exits),
            Some(Exit::fail_cause(Cause::then(
                fail_cause("x"),
                fail_cause("y")
            )))
        );
    }

    #[test]
    fn collect_all_par_combines_with_both() {
        let exits = vec![TestExit::fail("x"), TestExit::fail("y")];
        assert_eq!(
            TestExit::collect_all_par(exits),
            Some(Exit::fail_cause(Cause::both(
                fail_cause("x"),
                fail_cause("y")
            )))
        );
    }

    #[test]
    fn collect_all_of_empty_input_is_none() {
        assert_eq!(TestExit::collect_all(Vec::new()), None);
        assert_eq!(TestExit::collect_all_par(Vec::new()), None);
    }

    // =========================================================================
    // Transformations
    // =========================================================================

    #[test]
    fn map_touches_only_success() {
        assert_eq!(TestExit::succeed(2).map(|v| v * 10), Exit::succeed(20));
        assert_eq!(TestExit::fail("x").map(|v| v * 10), Exit::fail("x"));
    }

    #[test]
    fn map_err_touches_only_failures() {
        let mapped: Exit<u32, String, i32> =
            TestExit::fail("x").map_err(|e| format!("<{e}>"));
        assert_eq!(mapped, Exit::fail(String::from("<x>")));

        let mapped: Exit<u32, String, i32> =
            TestExit::succeed(1).map_err(|e| format!("<{e}>"));
        assert_eq!(mapped, Exit::succeed(1));
    }

    #[test]
    fn map_err_cause_replaces_the_cause() {
        let exit: Exit<u32, &'static str, i32> = TestExit::fail("x")
            .map_err_cause(|cause| Cause::then(cause, fail_cause("finalizer")));
        assert_eq!(
            exit,
            Exit::fail_cause(Cause::then(fail_cause("x"), fail_cause("finalizer")))
        );
    }

    #[test]
    fn bimap_transforms_both_sides() {
        let exit: Exit<u32, String, String> =
            TestExit::succeed(1).bimap(|e| format!("<{e}>"), |v| v.to_string());
        assert_eq!(exit, Exit::succeed(String::from("1")));

        let exit: Exit<u32, String, String> =
            TestExit::fail("x").bimap(|e| format!("<{e}>"), |v| v.to_string());
        assert_eq!(exit, Exit::fail(String::from("<x>")));
    }

    // =========================================================================
    // Elimination
    // =========================================================================

    #[test]
    fn fold_is_total() {
        let sum = TestExit::succeed(2).fold(|_| -1, |v| v);
        assert_eq!(sum, 2);
        let sum = TestExit::fail("x").fold(|_| -1, |v| v);
        assert_eq!(sum, -1);
    }

    #[test]
    fn unwrap_returns_value_on_success() {
        assert_eq!(TestExit::succeed(4).unwrap(), 4);
        assert_eq!(TestExit::fail("x").unwrap_or(0), 0);
    }

    #[test]
    #[should_panic(expected = "called `Exit::unwrap()` on a `Failure` value")]
    fn unwrap_panics_on_failure() {
        let _ = TestExit::fail("x").unwrap();
    }
}
