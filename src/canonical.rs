//! Shared normalize-then-hash engine.
//!
//! Law-equivalent trees can have arbitrarily different shapes, so hashing
//! cannot walk the tree as-is. Both ADTs instead normalize to *layers of
//! parallel leaf-sets separated by sequential steps*: [`step`] consumes one
//! `Then`/`Both` spine, eagerly applying the associativity and
//! distributivity rewrites (left-leaning `Then` rotated right, `Both`
//! distributed past `Then`) until it yields a flat set of mutually parallel
//! leaves plus a sequential continuation; [`flatten`] repeats `step` to
//! produce the ordered stage list. Hashing that normal form makes
//! associativity/commutativity/distributivity-equivalent trees hash
//! identically.
//!
//! Rewrites synthesize fresh interior nodes, so the engine works on an
//! [`Rc`]-shared [`Node`] view (leaves borrowed from the source tree);
//! sharing makes each rewrite O(1) and the whole traversal heap-bounded.

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::util::{DetHasher, DetHashSet};

/// Internal tree view: original leaves by reference, interior structure
/// re-buildable during rewriting.
pub(crate) enum Node<L> {
    Empty,
    Leaf(L),
    Then(Rc<Node<L>>, Rc<Node<L>>),
    Both(Rc<Node<L>>, Rc<Node<L>>),
}

/// One layer of mutually parallel leaves.
pub(crate) type Stage<L> = DetHashSet<L>;

/// Consumes one sequential spine starting at `start`: leaves that are
/// mutually parallel with it land in `parallel`, everything sequenced after
/// it lands in `sequential` for the next round.
fn step<L: Copy + Eq + Hash>(
    start: Rc<Node<L>>,
    parallel: &mut Stage<L>,
    sequential: &mut Vec<Rc<Node<L>>>,
) {
    let mut stack: Vec<Rc<Node<L>>> = Vec::new();
    let mut current = start;
    loop {
        let next = match &*current {
            Node::Then(left, right) => match &**left {
                Node::Empty => Some(Rc::clone(right)),
                // Rotate a left-leaning `Then` to the right.
                Node::Then(a, b) => Some(Rc::new(Node::Then(
                    Rc::clone(a),
                    Rc::new(Node::Then(Rc::clone(b), Rc::clone(right))),
                ))),
                // Distribute a parallel left branch over the sequential tail.
                Node::Both(a, b) => Some(Rc::new(Node::Both(
                    Rc::new(Node::Then(Rc::clone(a), Rc::clone(right))),
                    Rc::new(Node::Then(Rc::clone(b), Rc::clone(right))),
                ))),
                Node::Leaf(leaf) => {
                    parallel.insert(*leaf);
                    sequential.push(Rc::clone(right));
                    None
                }
            },
            Node::Both(left, right) => {
                stack.push(Rc::clone(right));
                Some(Rc::clone(left))
            }
            Node::Leaf(leaf) => {
                parallel.insert(*leaf);
                None
            }
            Node::Empty => None,
        };
        match next {
            Some(node) => current = node,
            None => match stack.pop() {
                Some(node) => current = node,
                None => return,
            },
        }
    }
}

/// Normalizes a tree to its ordered list of parallel stages. Empty stages
/// are dropped; a tree with no leaves normalizes to zero stages.
pub(crate) fn flatten<L: Copy + Eq + Hash>(root: Rc<Node<L>>) -> Vec<Stage<L>> {
    let mut stages = Vec::new();
    let mut pending = vec![root];
    while !pending.is_empty() {
        let mut parallel = Stage::default();
        let mut sequential = Vec::new();
        for node in pending {
            step(node, &mut parallel, &mut sequential);
        }
        if !parallel.is_empty() {
            stages.push(parallel);
        }
        pending = sequential;
    }
    stages
}

/// Hash written for a tree with no leaves at all.
const EMPTY_TREE_HASH: u64 = 0x7c96_d64b_8f42_a911;

/// Hashes a normalized stage list into `state`.
///
/// Zero stages write a fixed constant; a single singleton stage writes the
/// leaf's own hash (via `hash_leaf`, *not* the ADT's `Hash` impl, which
/// would re-enter this function); otherwise the ordered sequence of
/// stage-hashes is written, each stage combined commutatively with a
/// wrapping sum over fixed-seed per-leaf hashes.
pub(crate) fn hash_stages<L: Copy + Eq + Hash, H: Hasher>(
    stages: &[Stage<L>],
    hash_leaf: &dyn Fn(L, &mut dyn Hasher),
    state: &mut H,
) {
    if stages.is_empty() {
        state.write_u64(EMPTY_TREE_HASH);
        return;
    }
    if stages.len() == 1 && stages[0].len() == 1 {
        let leaf = *stages[0]
            .iter()
            .next()
            .expect("singleton stage must yield its element");
        hash_leaf(leaf, state);
        return;
    }
    state.write_usize(stages.len());
    for stage in stages {
        let mut sum = 0u64;
        for &leaf in stage {
            let mut hasher = DetHasher::default();
            hash_leaf(leaf, &mut hasher);
            sum = sum.wrapping_add(hasher.finish());
        }
        state.write_usize(stage.len());
        state.write_u64(sum);
    }
}
