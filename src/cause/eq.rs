//! Law-aware cause equality.
//!
//! Two causes are equal when one can be rewritten into the other by the
//! semiring laws: identity, associativity, commutativity of `Both`, and
//! distributivity of `Then` over `Both`. `Traced` wrappers never change
//! what a cause means and are invisible here.
//!
//! Every recursive comparison is wrapped in [`Eval::defer`] and boolean
//! combination goes through the short-circuit-free [`Eval::and`]/
//! [`Eval::or`] combinators, so comparing causes of any depth is driven by
//! the trampoline's heap stack, never by native call frames.

use crate::eval::Eval;

use super::Cause;

fn deferred<'a, Id: PartialEq, E: PartialEq>(
    left: &'a Cause<Id, E>,
    right: &'a Cause<Id, E>,
) -> Eval<'a, bool> {
    Eval::defer(move || equals_step(left, right))
}

/// `l = Then(Then(a, b), c)` against `r = Then(d, Then(e, f))`, leafwise;
/// also the `Both` spelling. One rotation, applied recursively, covers the
/// associativity law.
fn associative<'a, Id: PartialEq, E: PartialEq>(
    left: &'a Cause<Id, E>,
    right: &'a Cause<Id, E>,
) -> Eval<'a, bool> {
    use Cause::{Both, Then};
    match (left, right) {
        (Then(ll, c), Then(d, rr)) => {
            if let (Then(a, b), Then(e, f)) = (&**ll, &**rr) {
                return deferred(a, d).and(deferred(b, e)).and(deferred(c, f));
            }
            Eval::now(false)
        }
        (Both(ll, c), Both(d, rr)) => {
            if let (Both(a, b), Both(e, f)) = (&**ll, &**rr) {
                return deferred(a, d).and(deferred(b, e)).and(deferred(c, f));
            }
            Eval::now(false)
        }
        _ => Eval::now(false),
    }
}

/// The two distribution shapes of `Then` over `Both`, `left` taken as the
/// factored side and `right` as the expanded side. Callers apply this
/// symmetrically, giving the four shapes of the distributivity law.
fn distributive<'a, Id: PartialEq, E: PartialEq>(
    left: &'a Cause<Id, E>,
    right: &'a Cause<Id, E>,
) -> Eval<'a, bool> {
    use Cause::{Both, Then};
    let (Then(head, tail), Both(exp_l, exp_r)) = (left, right) else {
        return Eval::now(false);
    };
    let (Then(d, e), Then(f, g)) = (&**exp_l, &**exp_r) else {
        return Eval::now(false);
    };
    // Then(a, Both(b, c)) == Both(Then(a, b), Then(a, c))
    let factored_right = if let Both(b, c) = &**tail {
        deferred(head, d)
            .and(deferred(head, f))
            .and(deferred(b, e))
            .and(deferred(c, g))
    } else {
        Eval::now(false)
    };
    // Then(Both(a, b), c) == Both(Then(a, c), Then(b, c))
    let factored_left = if let Both(a, b) = &**head {
        deferred(tail, e)
            .and(deferred(tail, g))
            .and(deferred(a, d))
            .and(deferred(b, f))
    } else {
        Eval::now(false)
    };
    factored_right.or(factored_left)
}

/// Strips a directly-constructed `Then`/`Both` node with a literal `Empty`
/// child. The check is O(1); fully-empty subtrees are handled by the
/// `Empty` arms of [`equals_step`] instead.
fn absorbed<Id, E>(cause: &Cause<Id, E>) -> Option<&Cause<Id, E>> {
    match cause {
        Cause::Then(left, right) | Cause::Both(left, right) => {
            if matches!(&**right, Cause::Empty) {
                Some(left)
            } else if matches!(&**left, Cause::Empty) {
                Some(right)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn absorb_sym<'a, Id: PartialEq, E: PartialEq>(
    left: &'a Cause<Id, E>,
    right: &'a Cause<Id, E>,
) -> Eval<'a, bool> {
    let try_left = absorbed(left).map_or(Eval::now(false), |inner| deferred(inner, right));
    let try_right = absorbed(right).map_or(Eval::now(false), |inner| deferred(left, inner));
    try_left.or(try_right)
}

pub(super) fn equals_step<'a, Id: PartialEq, E: PartialEq>(
    left: &'a Cause<Id, E>,
    right: &'a Cause<Id, E>,
) -> Eval<'a, bool> {
    use Cause::{Both, Empty, Fail, Halt, Interrupt, Then, Traced};
    if std::ptr::eq(left, right) {
        return Eval::now(true);
    }
    match (left, right) {
        (Traced(inner, _), _) => deferred(inner, right),
        (_, Traced(inner, _)) => deferred(left, inner),
        (Empty, _) => Eval::now(right.is_empty()),
        (_, Empty) => Eval::now(left.is_empty()),
        (Fail(a), Fail(b)) => Eval::now(a == b),
        (Halt(a), Halt(b)) => Eval::now(a == b),
        (Interrupt(a), Interrupt(b)) => Eval::now(a == b),
        (Then(a, b), Then(c, d)) => deferred(a, c)
            .and(deferred(b, d))
            .or(associative(left, right))
            .or(associative(right, left))
            .or(absorb_sym(left, right)),
        (Both(a, b), Both(c, d)) => deferred(a, c)
            .and(deferred(b, d))
            .or(deferred(a, d).and(deferred(b, c)))
            .or(associative(left, right))
            .or(associative(right, left))
            .or(absorb_sym(left, right)),
        (Then(..), Both(..)) | (Both(..), Then(..)) => distributive(left, right)
            .or(distributive(right, left))
            .or(absorb_sym(left, right)),
        _ => absorb_sym(left, right),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::cause::{Cause, Defect};
    use crate::trace::{Trace, TraceFrame};
    use crate::util::DetHasher;
    use std::hash::{Hash, Hasher};

    type TestCause = Cause<u32, &'static str>;

    fn fail(error: &'static str) -> TestCause {
        Cause::fail(error)
    }

    fn hash_of(cause: &TestCause) -> u64 {
        let mut hasher = DetHasher::default();
        cause.hash(&mut hasher);
        hasher.finish()
    }

    fn assert_equal_and_same_hash(left: &TestCause, right: &TestCause) {
        assert_eq!(left, right);
        assert_eq!(right, left);
        assert_eq!(hash_of(left), hash_of(right));
    }

    #[test]
    fn identical_composites_compare_equal() {
        let build = || {
            Cause::both(
                Cause::then(fail("a"), fail("b")),
                Cause::then(fail("a"), fail("b")),
            )
        };
        assert_equal_and_same_hash(&build(), &build());
    }

    #[test]
    fn leaves_compare_by_payload() {
        assert_eq!(fail("a"), fail("a"));
        assert_ne!(fail("a"), fail("b"));
        assert_eq!(
            TestCause::halt(Defect::new("boom")),
            TestCause::halt(Defect::new("boom"))
        );
        assert_ne!(TestCause::interrupt(1), TestCause::interrupt(2));
        assert_ne!(fail("a"), TestCause::interrupt(1));
    }

    #[test]
    fn then_is_associative() {
        let left = Cause::then(Cause::then(fail("a"), fail("b")), fail("c"));
        let right = Cause::then(fail("a"), Cause::then(fail("b"), fail("c")));
        assert_equal_and_same_hash(&left, &right);
    }

    #[test]
    fn both_is_associative_and_commutative() {
        let left = Cause::both(Cause::both(fail("a"), fail("b")), fail("c"));
        let right = Cause::both(fail("a"), Cause::both(fail("b"), fail("c")));
        assert_equal_and_same_hash(&left, &right);

        let ab = Cause::both(fail("a"), fail("b"));
        let ba = Cause::both(fail("b"), fail("a"));
        assert_equal_and_same_hash(&ab, &ba);
    }

    #[test]
    fn then_is_not_commutative() {
        assert_ne!(
            Cause::then(fail("a"), fail("b")),
            Cause::then(fail("b"), fail("a"))
        );
    }

    #[test]
    fn then_distributes_over_both() {
        let factored = Cause::then(fail("a"), Cause::both(fail("b"), fail("c")));
        let expanded = Cause::both(
            Cause::then(fail("a"), fail("b")),
            Cause::then(fail("a"), fail("c")),
        );
        assert_equal_and_same_hash(&factored, &expanded);

        let factored = Cause::then(Cause::both(fail("a"), fail("b")), fail("c"));
        let expanded = Cause::both(
            Cause::then(fail("a"), fail("c")),
            Cause::then(fail("b"), fail("c")),
        );
        assert_equal_and_same_hash(&factored, &expanded);
    }

    #[test]
    fn traces_are_invisible_to_equality_and_hashing() {
        let mut trace = Trace::new();
        trace
            .execution
            .push(TraceFrame::new("src/fiber.rs", 12, "join"));
        let plain = Cause::then(fail("a"), fail("b"));
        let traced = Cause::traced(plain.clone(), Arc::new(trace));
        assert_equal_and_same_hash(&plain, &traced);
    }

    #[test]
    fn empty_compares_equal_to_recursively_empty() {
        let hollow: TestCause = Cause::Then(
            Box::new(Cause::Empty),
            Box::new(Cause::Both(Box::new(Cause::Empty), Box::new(Cause::Empty))),
        );
        assert_equal_and_same_hash(&TestCause::empty(), &hollow);
    }

    #[test]
    fn directly_built_empty_child_is_absorbed() {
        let padded: TestCause = Cause::Then(Box::new(fail("a")), Box::new(Cause::Empty));
        assert_equal_and_same_hash(&padded, &fail("a"));

        let padded: TestCause = Cause::Both(Box::new(Cause::Empty), Box::new(fail("a")));
        assert_equal_and_same_hash(&padded, &fail("a"));
    }

    #[test]
    fn law_rewrites_compose_recursively() {
        // Associativity on one side, commutativity nested inside the other.
        let left = Cause::then(
            Cause::then(fail("a"), Cause::both(fail("b"), fail("c"))),
            fail("d"),
        );
        let right = Cause::then(
            fail("a"),
            Cause::then(Cause::both(fail("c"), fail("b")), fail("d")),
        );
        assert_equal_and_same_hash(&left, &right);
    }

    #[test]
    fn distinct_structures_stay_distinct() {
        // x | (y ; z) is not (x ; z) | (y ; z).
        let lone = Cause::both(fail("x"), Cause::then(fail("y"), fail("z")));
        let shared = Cause::both(
            Cause::then(fail("x"), fail("z")),
            Cause::then(fail("y"), fail("z")),
        );
        assert_ne!(lone, shared);
    }

    #[test]
    fn deep_equality_is_stack_safe() {
        let build = || {
            let mut cause = fail("seed");
            for _ in 0..50_000 {
                cause = Cause::then(fail("step"), cause);
            }
            cause
        };
        assert_eq!(build(), build());

        let wide = || {
            let mut cause = fail("seed");
            for _ in 0..50_000 {
                cause = Cause::both(fail("step"), cause);
            }
            cause
        };
        assert_eq!(wide(), wide());
    }
}
