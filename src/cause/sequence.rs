//! Per-leaf case splits pushed up through a cause.
//!
//! [`sequence_result`] and [`sequence_option`] resolve every `Fail` leaf to
//! either a success or a failure and propagate the split through the tree:
//! if any leaf of a `Then`/`Both` node resolves to success, the whole node
//! resolves to that success (first one found, left-biased); otherwise the
//! surviving failures recombine with the same combinator as the original
//! node. Combined failure results are always kept and re-wrapped; they are
//! never discarded in favor of "absent".
//!
//! The traversal is a hand-written continuation-stack machine: an explicit
//! frame enum plus a driver loop performing a post-order walk with
//! result-passing, the CPS transform of the obvious recursive function.
//! That shape is the stack-safety mechanism itself — the machine's depth is
//! bounded by heap, not native call frames — and is kept as such on
//! purpose.

use std::sync::Arc;

use crate::trace::Trace;

use super::Cause;

/// One machine frame: either a subtree still to visit, or a pending
/// combination of results already on the output stack.
enum Frame<'a, Id, In> {
    Visit(&'a Cause<Id, In>),
    CombineThen,
    CombineBoth,
    Wrap(&'a Arc<Trace>),
}

/// Drives the case split. `resolve` maps each `Fail` payload to the
/// success side or a rebuilt failure payload.
///
/// # Panics
///
/// Panics if the machine exhausts its frames without exactly one result;
/// that is a broken traversal invariant (an internal bug), which no caller
/// can meaningfully recover from.
fn sequence_with<'a, Id, In, E, A>(
    cause: &'a Cause<Id, In>,
    resolve: impl Fn(&'a In) -> Result<A, E>,
) -> Result<A, Cause<Id, E>>
where
    Id: Clone,
{
    let mut frames = vec![Frame::Visit(cause)];
    let mut results: Vec<Result<A, Cause<Id, E>>> = Vec::new();
    while let Some(frame) = frames.pop() {
        match frame {
            Frame::Visit(Cause::Empty) => results.push(Err(Cause::Empty)),
            Frame::Visit(Cause::Fail(payload)) => {
                results.push(resolve(payload).map_err(Cause::fail));
            }
            Frame::Visit(Cause::Halt(defect)) => {
                results.push(Err(Cause::halt(defect.clone())));
            }
            Frame::Visit(Cause::Interrupt(id)) => {
                results.push(Err(Cause::interrupt(id.clone())));
            }
            Frame::Visit(Cause::Traced(inner, trace)) => {
                frames.push(Frame::Wrap(trace));
                frames.push(Frame::Visit(inner));
            }
            Frame::Visit(Cause::Then(left, right)) => {
                frames.push(Frame::CombineThen);
                frames.push(Frame::Visit(right));
                frames.push(Frame::Visit(left));
            }
            Frame::Visit(Cause::Both(left, right)) => {
                frames.push(Frame::CombineBoth);
                frames.push(Frame::Visit(right));
                frames.push(Frame::Visit(left));
            }
            Frame::CombineThen => {
                let right = results.pop().expect("combine frame missing right result");
                let left = results.pop().expect("combine frame missing left result");
                results.push(combine(left, right, Cause::then));
            }
            Frame::CombineBoth => {
                let right = results.pop().expect("combine frame missing right result");
                let left = results.pop().expect("combine frame missing left result");
                results.push(combine(left, right, Cause::both));
            }
            Frame::Wrap(trace) => {
                let inner = results.pop().expect("wrap frame missing inner result");
                results.push(inner.map_err(|c| Cause::traced(c, Arc::clone(trace))));
            }
        }
    }
    let result = results
        .pop()
        .unwrap_or_else(|| unreachable!("sequence machine finished without a result"));
    assert!(
        results.is_empty(),
        "sequence machine finished with residual results"
    );
    result
}

/// A success on either side wins (left-biased); two failures recombine
/// with the node's own combinator.
fn combine<Id, E, A>(
    left: Result<A, Cause<Id, E>>,
    right: Result<A, Cause<Id, E>>,
    recombine: fn(Cause<Id, E>, Cause<Id, E>) -> Cause<Id, E>,
) -> Result<A, Cause<Id, E>> {
    match (left, right) {
        (Ok(value), _) => Ok(value),
        (_, Ok(value)) => Ok(value),
        (Err(left), Err(right)) => Err(recombine(left, right)),
    }
}

/// Pushes a per-leaf `Result` split up through the cause: `Ok` payloads
/// are successes, `Err` payloads remain typed failures.
///
/// Returns the first success found (left-biased) if any leaf succeeded,
/// otherwise the cause rebuilt over the `Err` payloads.
pub fn sequence_result<Id, E, A>(
    cause: &Cause<Id, Result<A, E>>,
) -> Result<A, Cause<Id, E>>
where
    Id: Clone,
    E: Clone,
    A: Clone,
{
    sequence_with(cause, |payload| match payload {
        Ok(value) => Ok(value.clone()),
        Err(error) => Err(error.clone()),
    })
}

/// The `Option` analogue of [`sequence_result`]: a `None` payload means
/// "no error here", and one such leaf dissolves the whole cause to `None`;
/// otherwise the cause is rebuilt over the `Some` payloads.
pub fn sequence_option<Id, E>(cause: &Cause<Id, Option<E>>) -> Option<Cause<Id, E>>
where
    Id: Clone,
    E: Clone,
{
    sequence_with(cause, |payload| match payload {
        None => Ok(()),
        Some(error) => Err(error.clone()),
    })
    .err()
}
