//! Algebraic failure causes.
//!
//! A [`Cause`] is the full story of why a fiber did not succeed: zero or
//! more typed failures, defects, and interruptions, composed sequentially
//! (`Then`) and in parallel (`Both`). It specializes the
//! [`FreeSemiring`](crate::semiring::FreeSemiring) shape with richer leaves
//! and a [`Traced`](Cause::Traced) wrapper carrying best-effort diagnostic
//! traces; the duplication between the two ADTs is deliberate, because a
//! cause carries failure semantics the generic tree does not need.
//!
//! Causes are immutable values with no interior mutation: once built they
//! may be aliased by any number of owners, and combining two causes never
//! changes either input. Every traversal in this module (including `Clone`
//! and `Drop`) runs on explicit heap-allocated stacks; causes produced by
//! merging thousands of fiber outcomes must never exhaust the native call
//! stack.
//!
//! Equality and hashing are law-aware: causes related by identity,
//! associativity, `Both`-commutativity, or distributivity of `Then` over
//! `Both` compare equal and hash identically, and `Traced` wrappers are
//! invisible to both.

use core::fmt;
use core::mem;
use std::any::Any;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;

use crate::canonical::{self, Node};
use crate::trace::Trace;
use crate::util::DetHashSet;

mod eq;
mod sequence;

pub use sequence::{sequence_option, sequence_result};

/// An untyped, unexpected failure: the payload of [`Cause::Halt`].
///
/// Expected failures travel as typed `Fail` values; a defect is everything
/// else, most commonly a caught panic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Defect {
    message: String,
}

impl Defect {
    /// Creates a defect with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Converts a caught panic payload into a defect, downcasting the
    /// conventional `String`/`&str` payloads.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        if let Some(message) = payload.downcast_ref::<&str>() {
            Self::new(*message)
        } else if let Some(message) = payload.downcast_ref::<String>() {
            Self::new(message.clone())
        } else {
            Self::new("non-string panic payload")
        }
    }

    /// Returns the defect message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "defect: {}", self.message)
    }
}

/// The single most important error a cause collapses to; see
/// [`Cause::squash_with`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Squashed<E> {
    /// A typed failure was present.
    #[error("{0}")]
    Failure(E),
    /// No typed failure; the cause was an interruption.
    #[error("{0}")]
    Interrupted(String),
    /// No typed failure and no interruption; the first defect.
    #[error("{0}")]
    Defect(Defect),
}

/// Why a fiber did not succeed.
///
/// `Id` identifies interrupting fibers, `E` is the typed error. Build
/// composite causes with [`Cause::then`], [`Cause::both`] and
/// [`Cause::traced`]; the first two absorb [`Cause::Empty`] operands and
/// the last refuses information-free traces. Directly constructed nodes may
/// violate the absorption invariant, which equality tolerates but the
/// constructors never produce.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cause<Id, E> {
    /// No failure at all: the identity element.
    Empty,
    /// An expected, typed failure.
    Fail(E),
    /// An unexpected, untyped failure.
    Halt(Defect),
    /// Interruption by the identified fiber.
    Interrupt(Id),
    /// The left cause happened before the right cause.
    Then(Box<Cause<Id, E>>, Box<Cause<Id, E>>),
    /// Both causes happened concurrently, in no particular order.
    Both(Box<Cause<Id, E>>, Box<Cause<Id, E>>),
    /// The inner cause with an attached trace; never changes what the
    /// cause means.
    Traced(Box<Cause<Id, E>>, Arc<Trace>),
}

impl<Id, E> Cause<Id, E> {
    /// The empty cause.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Empty
    }

    /// A typed failure.
    #[must_use]
    pub const fn fail(error: E) -> Self {
        Self::Fail(error)
    }

    /// An untyped defect.
    #[must_use]
    pub const fn halt(defect: Defect) -> Self {
        Self::Halt(defect)
    }

    /// An interruption by the given fiber.
    #[must_use]
    pub const fn interrupt(id: Id) -> Self {
        Self::Interrupt(id)
    }

    /// Sequential composition: `left` happened, and then `right`.
    /// Absorbs `Empty` on either side.
    #[must_use]
    pub fn then(left: Self, right: Self) -> Self {
        if matches!(left, Self::Empty) {
            return right;
        }
        if matches!(right, Self::Empty) {
            return left;
        }
        Self::Then(Box::new(left), Box::new(right))
    }

    /// Parallel composition: no ordering between `left` and `right` is
    /// known or meaningful. Absorbs `Empty` on either side.
    #[must_use]
    pub fn both(left: Self, right: Self) -> Self {
        if matches!(left, Self::Empty) {
            return right;
        }
        if matches!(right, Self::Empty) {
            return left;
        }
        Self::Both(Box::new(left), Box::new(right))
    }

    /// Attaches a trace. Returns the cause unchanged when the trace
    /// carries no information, to avoid needless wrapping.
    #[must_use]
    pub fn traced(cause: Self, trace: Arc<Trace>) -> Self {
        if trace.is_empty() {
            return cause;
        }
        Self::Traced(Box::new(cause), trace)
    }

    /// True when the cause contains no `Fail`, `Halt`, or `Interrupt` leaf
    /// anywhere, however deeply wrapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let mut stack = vec![self];
        while let Some(cause) = stack.pop() {
            match cause {
                Self::Fail(_) | Self::Halt(_) | Self::Interrupt(_) => return false,
                Self::Then(left, right) | Self::Both(left, right) => {
                    stack.push(right);
                    stack.push(left);
                }
                Self::Traced(inner, _) => stack.push(inner),
                Self::Empty => {}
            }
        }
        true
    }

    /// Returns the first value `f` produces over a pre-order, left-biased
    /// walk of every node; short-circuits on the first hit.
    pub fn find<'a, T>(
        &'a self,
        mut f: impl FnMut(&'a Cause<Id, E>) -> Option<T>,
    ) -> Option<T> {
        let mut stack = vec![self];
        while let Some(cause) = stack.pop() {
            if let Some(found) = f(cause) {
                return Some(found);
            }
            match cause {
                Self::Then(left, right) | Self::Both(left, right) => {
                    stack.push(right);
                    stack.push(left);
                }
                Self::Traced(inner, _) => stack.push(inner),
                _ => {}
            }
        }
        None
    }

    /// Left-to-right accumulation over every node; leaves of a `Then`'s
    /// left subtree are visited strictly before its right subtree.
    pub fn fold_left<'a, B>(
        &'a self,
        init: B,
        mut f: impl FnMut(B, &'a Cause<Id, E>) -> B,
    ) -> B {
        let mut acc = init;
        let mut stack = vec![self];
        while let Some(cause) = stack.pop() {
            acc = f(acc, cause);
            match cause {
                Self::Then(left, right) | Self::Both(left, right) => {
                    stack.push(right);
                    stack.push(left);
                }
                Self::Traced(inner, _) => stack.push(inner),
                _ => {}
            }
        }
        acc
    }

    /// Reduces the cause bottom-up with one handler per variant.
    ///
    /// Driven by an explicit instruction stack plus an output value stack;
    /// causes of any depth reduce without native recursion.
    #[allow(clippy::too_many_arguments)]
    pub fn fold<'a, B>(
        &'a self,
        mut on_empty: impl FnMut() -> B,
        mut on_fail: impl FnMut(&'a E) -> B,
        mut on_halt: impl FnMut(&'a Defect) -> B,
        mut on_interrupt: impl FnMut(&'a Id) -> B,
        mut on_then: impl FnMut(B, B) -> B,
        mut on_both: impl FnMut(B, B) -> B,
        mut on_traced: impl FnMut(B, &'a Arc<Trace>) -> B,
    ) -> B {
        enum Instr<'a, Id, E> {
            Visit(&'a Cause<Id, E>),
            JoinThen,
            JoinBoth,
            JoinTraced(&'a Arc<Trace>),
        }

        let mut instructions = vec![Instr::Visit(self)];
        let mut output: Vec<B> = Vec::new();
        while let Some(instr) = instructions.pop() {
            match instr {
                Instr::Visit(Self::Empty) => output.push(on_empty()),
                Instr::Visit(Self::Fail(error)) => output.push(on_fail(error)),
                Instr::Visit(Self::Halt(defect)) => output.push(on_halt(defect)),
                Instr::Visit(Self::Interrupt(id)) => output.push(on_interrupt(id)),
                Instr::Visit(Self::Then(left, right)) => {
                    instructions.push(Instr::JoinThen);
                    instructions.push(Instr::Visit(right));
                    instructions.push(Instr::Visit(left));
                }
                Instr::Visit(Self::Both(left, right)) => {
                    instructions.push(Instr::JoinBoth);
                    instructions.push(Instr::Visit(right));
                    instructions.push(Instr::Visit(left));
                }
                Instr::Visit(Self::Traced(inner, trace)) => {
                    instructions.push(Instr::JoinTraced(trace));
                    instructions.push(Instr::Visit(inner));
                }
                Instr::JoinThen => {
                    let right = output.pop().expect("fold output stack underflow");
                    let left = output.pop().expect("fold output stack underflow");
                    output.push(on_then(left, right));
                }
                Instr::JoinBoth => {
                    let right = output.pop().expect("fold output stack underflow");
                    let left = output.pop().expect("fold output stack underflow");
                    output.push(on_both(left, right));
                }
                Instr::JoinTraced(trace) => {
                    let inner = output.pop().expect("fold output stack underflow");
                    output.push(on_traced(inner, trace));
                }
            }
        }
        output.pop().expect("fold must produce exactly one value")
    }

    /// The first typed failure in traversal order, if any.
    #[must_use]
    pub fn failure_option(&self) -> Option<&E> {
        self.find(|cause| match cause {
            Self::Fail(error) => Some(error),
            _ => None,
        })
    }

    /// Every typed failure, in traversal order.
    #[must_use]
    pub fn failures(&self) -> Vec<&E> {
        self.fold_left(Vec::new(), |mut acc, cause| {
            if let Self::Fail(error) = cause {
                acc.push(error);
            }
            acc
        })
    }

    /// Every defect, in traversal order.
    #[must_use]
    pub fn defects(&self) -> Vec<&Defect> {
        self.fold_left(Vec::new(), |mut acc, cause| {
            if let Self::Halt(defect) = cause {
                acc.push(defect);
            }
            acc
        })
    }

    /// True when any fiber interrupted this computation.
    #[must_use]
    pub fn interrupted(&self) -> bool {
        self.find(|cause| match cause {
            Self::Interrupt(_) => Some(()),
            _ => None,
        })
        .is_some()
    }

    /// True when every leaf is an interruption. Vacuously true for the
    /// empty cause.
    #[must_use]
    pub fn interrupted_only(&self) -> bool {
        self.find(|cause| match cause {
            Self::Fail(_) | Self::Halt(_) => Some(()),
            _ => None,
        })
        .is_none()
    }

    /// The set of interrupting fiber ids.
    #[must_use]
    pub fn interruptors(&self) -> DetHashSet<&Id>
    where
        Id: Eq + Hash,
    {
        self.fold_left(DetHashSet::default(), |mut acc, cause| {
            if let Self::Interrupt(id) = cause {
                acc.insert(id);
            }
            acc
        })
    }

    /// Interrupting fiber ids in traversal order, deduplicated.
    fn interruptors_ordered(&self) -> Vec<&Id>
    where
        Id: PartialEq,
    {
        self.fold_left(Vec::new(), |mut acc: Vec<&Id>, cause| {
            if let Self::Interrupt(id) = cause {
                if !acc.contains(&id) {
                    acc.push(id);
                }
            }
            acc
        })
    }

    /// Keeps only `Halt` leaves, re-composed with the original combinators.
    /// `None` when the cause contains no defect.
    #[must_use]
    pub fn keep_defects(&self) -> Option<Self> {
        self.filter_defects(|_| true)
    }

    /// Keeps only `Halt` leaves satisfying the predicate. `None` when
    /// nothing survives.
    #[must_use]
    pub fn filter_defects(&self, mut predicate: impl FnMut(&Defect) -> bool) -> Option<Self> {
        self.fold(
            || None,
            |_| None,
            |defect| {
                if predicate(defect) {
                    Some(Self::halt(defect.clone()))
                } else {
                    None
                }
            },
            |_| None,
            recompose(Self::then),
            recompose(Self::both),
            retrace,
        )
    }

    /// Removes every typed failure, keeping defects and interruptions.
    /// `None` when nothing survives.
    #[must_use]
    pub fn strip_failures(&self) -> Option<Self>
    where
        Id: Clone,
    {
        self.fold(
            || None,
            |_| None,
            |defect| Some(Self::halt(defect.clone())),
            |id| Some(Self::interrupt(id.clone())),
            recompose(Self::then),
            recompose(Self::both),
            retrace,
        )
    }

    /// Removes every interruption, keeping typed failures and defects.
    /// `None` when nothing survives.
    #[must_use]
    pub fn strip_interrupts(&self) -> Option<Self>
    where
        E: Clone,
    {
        self.fold(
            || None,
            |error| Some(Self::fail(error.clone())),
            |defect| Some(Self::halt(defect.clone())),
            |_| None,
            recompose(Self::then),
            recompose(Self::both),
            retrace,
        )
    }

    /// Transforms every typed failure, preserving composition shape and
    /// traces.
    pub fn map<F>(&self, mut f: impl FnMut(&E) -> F) -> Cause<Id, F>
    where
        Id: Clone,
    {
        self.fold(
            || Cause::Empty,
            |error| Cause::Fail(f(error)),
            |defect| Cause::Halt(defect.clone()),
            |id| Cause::Interrupt(id.clone()),
            Cause::then,
            Cause::both,
            |inner, trace| Cause::traced(inner, Arc::clone(trace)),
        )
    }

    /// Collapses the cause to its single most important error: a typed
    /// failure first, then an interruption summary naming the interruptor
    /// ids (rendered with `show`), then the first defect, else a generic
    /// interrupted error.
    pub fn squash_with(&self, show: impl Fn(&Id) -> String) -> Squashed<E>
    where
        Id: PartialEq,
        E: Clone,
    {
        if let Some(error) = self.failure_option() {
            return Squashed::Failure(error.clone());
        }
        let interruptors = self.interruptors_ordered();
        if !interruptors.is_empty() {
            let ids = interruptors
                .into_iter()
                .map(|id| show(id))
                .collect::<Vec<_>>()
                .join(", ");
            return Squashed::Interrupted(format!("interrupted by fibers: {ids}"));
        }
        if let Some(defect) = self.defects().first() {
            return Squashed::Defect((*defect).clone());
        }
        Squashed::Interrupted(String::from("interrupted"))
    }

    /// [`Cause::squash_with`] using the ids' `Display` rendering.
    pub fn squash(&self) -> Squashed<E>
    where
        Id: PartialEq + fmt::Display,
        E: Clone,
    {
        self.squash_with(ToString::to_string)
    }

    fn to_node(&self) -> Rc<Node<&Self>> {
        enum Instr<'a, Id, E> {
            Visit(&'a Cause<Id, E>),
            JoinThen,
            JoinBoth,
        }

        let mut instructions = vec![Instr::Visit(self)];
        let mut output: Vec<Rc<Node<&Self>>> = Vec::new();
        while let Some(instr) = instructions.pop() {
            match instr {
                Instr::Visit(Self::Empty) => output.push(Rc::new(Node::Empty)),
                Instr::Visit(
                    leaf @ (Self::Fail(_) | Self::Halt(_) | Self::Interrupt(_)),
                ) => output.push(Rc::new(Node::Leaf(leaf))),
                Instr::Visit(Self::Traced(inner, _)) => {
                    instructions.push(Instr::Visit(inner));
                }
                Instr::Visit(Self::Then(left, right)) => {
                    instructions.push(Instr::JoinThen);
                    instructions.push(Instr::Visit(right));
                    instructions.push(Instr::Visit(left));
                }
                Instr::Visit(Self::Both(left, right)) => {
                    instructions.push(Instr::JoinBoth);
                    instructions.push(Instr::Visit(right));
                    instructions.push(Instr::Visit(left));
                }
                Instr::JoinThen => {
                    let right = output.pop().expect("node build stack underflow");
                    let left = output.pop().expect("node build stack underflow");
                    output.push(Rc::new(Node::Then(left, right)));
                }
                Instr::JoinBoth => {
                    let right = output.pop().expect("node build stack underflow");
                    let left = output.pop().expect("node build stack underflow");
                    output.push(Rc::new(Node::Both(left, right)));
                }
            }
        }
        output.pop().expect("node build must produce exactly one node")
    }
}

/// Handler combining two optionally-surviving subtrees with the given
/// constructor; absorption falls out of the constructors themselves.
fn recompose<Id, E>(
    combine: fn(Cause<Id, E>, Cause<Id, E>) -> Cause<Id, E>,
) -> impl FnMut(Option<Cause<Id, E>>, Option<Cause<Id, E>>) -> Option<Cause<Id, E>> {
    move |left, right| match (left, right) {
        (None, None) => None,
        (left, right) => Some(combine(
            left.unwrap_or(Cause::Empty),
            right.unwrap_or(Cause::Empty),
        )),
    }
}

/// Handler re-attaching a trace to a surviving subtree.
fn retrace<Id, E>(
    inner: Option<Cause<Id, E>>,
    trace: &Arc<Trace>,
) -> Option<Cause<Id, E>> {
    inner.map(|cause| Cause::traced(cause, Arc::clone(trace)))
}

impl<Id: Clone, E: Clone> Clone for Cause<Id, E> {
    fn clone(&self) -> Self {
        // Structure is reproduced exactly (raw nodes, not the absorbing
        // constructors): clone must be the identity on shape.
        self.fold(
            || Self::Empty,
            |error| Self::Fail(error.clone()),
            |defect| Self::Halt(defect.clone()),
            |id| Self::Interrupt(id.clone()),
            |left, right| Self::Then(Box::new(left), Box::new(right)),
            |left, right| Self::Both(Box::new(left), Box::new(right)),
            |inner, trace| Self::Traced(Box::new(inner), Arc::clone(trace)),
        )
    }
}

impl<Id, E> Drop for Cause<Id, E> {
    fn drop(&mut self) {
        fn detach<Id, E>(cause: &mut Cause<Id, E>, stack: &mut Vec<Cause<Id, E>>) {
            match cause {
                Cause::Then(left, right) | Cause::Both(left, right) => {
                    stack.push(mem::replace(&mut **left, Cause::Empty));
                    stack.push(mem::replace(&mut **right, Cause::Empty));
                }
                Cause::Traced(inner, _) => {
                    stack.push(mem::replace(&mut **inner, Cause::Empty));
                }
                Cause::Empty | Cause::Fail(_) | Cause::Halt(_) | Cause::Interrupt(_) => {}
            }
        }

        let mut stack = Vec::new();
        detach(self, &mut stack);
        while let Some(mut cause) = stack.pop() {
            detach(&mut cause, &mut stack);
            // `cause` drops here with empty children; recursion stays flat.
        }
    }
}

impl<Id: PartialEq, E: PartialEq> PartialEq for Cause<Id, E> {
    /// Law-aware equality: causes related by identity, associativity,
    /// `Both`-commutativity, or distributivity compare equal; `Traced`
    /// wrappers are ignored.
    fn eq(&self, other: &Self) -> bool {
        eq::equals_step(self, other).run()
    }
}

impl<Id: Eq, E: Eq> Eq for Cause<Id, E> {}

impl<Id: Eq + Hash, E: Eq + Hash> Hash for Cause<Id, E> {
    /// Canonicalizing hash, consistent with the law-aware [`PartialEq`]:
    /// the cause is normalized to ordered parallel stages of leaves before
    /// hashing, so law-equivalent causes of arbitrarily different shapes
    /// hash identically.
    fn hash<H: Hasher>(&self, state: &mut H) {
        let stages = canonical::flatten(self.to_node());
        canonical::hash_stages(&stages, &hash_leaf, state);
    }
}

/// Writes one leaf cause into a hasher: discriminant byte plus payload.
fn hash_leaf<Id: Hash, E: Hash>(leaf: &Cause<Id, E>, mut state: &mut dyn Hasher) {
    match leaf {
        Cause::Fail(error) => {
            state.write_u8(1);
            error.hash(&mut state);
        }
        Cause::Halt(defect) => {
            state.write_u8(2);
            defect.hash(&mut state);
        }
        Cause::Interrupt(id) => {
            state.write_u8(3);
            id.hash(&mut state);
        }
        _ => unreachable!("canonical stages contain only leaf causes"),
    }
}
