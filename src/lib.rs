//! Aftermath: algebraic failure causes and exit values for fiber runtimes.
//!
//! # Overview
//!
//! Aftermath is the failure-representation algebra a fiber-based effect
//! runtime needs when computations finish: a [`Cause`] records *why* a
//! fiber did not succeed — typed failures, defects, interruptions,
//! composed sequentially and in parallel — and an [`Exit`] pairs that with
//! the success case. The crate is pure data and pure functions over it: it
//! performs no I/O, schedules nothing, and never decides when to interrupt
//! anything. A scheduler builds causes with [`Cause::then`]/[`Cause::both`]
//! as fibers fail, and interrogates the result to decide reporting and
//! retry behavior.
//!
//! # Core Guarantees
//!
//! - **Law-aware equality**: causes related by identity, associativity,
//!   `Both`-commutativity, or distributivity of `Then` over `Both` compare
//!   equal — and hash identically, via canonicalization to layers of
//!   parallel leaf-sets.
//! - **Stack safety**: every traversal — folds, queries, equality,
//!   hashing, the sequence machines, even `Clone` and `Drop` — runs on
//!   explicit heap-allocated stacks. Causes built by merging thousands of
//!   fiber outcomes cannot exhaust the native call stack.
//! - **Value semantics**: causes and exits are immutable once built,
//!   freely shareable across owners with no synchronization, and combining
//!   two values never mutates either input.
//! - **Order discipline**: `Then` preserves happened-before order;
//!   `Both` promises none, and no consumer may depend on operand order.
//!
//! # Module Structure
//!
//! - [`semiring`]: the generic `Empty`/`Single`/`Then`/`Both` tree algebra
//! - [`cause`]: the `Cause` specialization with failure semantics
//! - [`exit`]: the `Success`/`Failure` outcome type and its combinators
//! - [`trace`]: the opaque diagnostic traces carried by `Cause::Traced`
//! - [`eval`]: the trampolined deferred-computation driver
//! - [`util`]: deterministic hashing support

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod cause;
pub mod eval;
pub mod exit;
pub mod semiring;
pub mod trace;
pub mod util;

mod canonical;

pub use cause::{sequence_option, sequence_result, Cause, Defect, Squashed};
pub use eval::Eval;
pub use exit::Exit;
pub use semiring::FreeSemiring;
pub use trace::{Trace, TraceFrame};
