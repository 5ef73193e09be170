//! Trampolined deferred computations.
//!
//! The equality engine compares trees whose depth is bounded only by how
//! many fiber outcomes were merged into them, so it cannot recurse natively.
//! [`Eval`] expresses "compare the children" as a deferred step instead: the
//! recursive call is wrapped in a thunk, boolean combination goes through
//! [`Eval::zip_with`] rather than `&&`/`||`, and [`Eval::run`] drives the
//! whole computation with an explicit continuation stack. Depth is bounded
//! by heap, never by native call frames.
//!
//! Combination stays within a single value type (`A -> A -> A`), which is
//! all the equality engine needs and keeps the representation free of type
//! erasure.

/// A deferred computation producing an `A`.
pub enum Eval<'a, A> {
    /// An already-computed value.
    Now(A),
    /// A suspended step; forced by the [`Eval::run`] driver, not at
    /// construction time.
    Defer(Box<dyn FnOnce() -> Eval<'a, A> + 'a>),
    /// Sequencing: run the inner computation, then feed its result to the
    /// continuation.
    AndThen(
        Box<Eval<'a, A>>,
        Box<dyn FnOnce(A) -> Eval<'a, A> + 'a>,
    ),
}

impl<'a, A: 'a> Eval<'a, A> {
    /// Lifts a value.
    pub const fn now(value: A) -> Self {
        Self::Now(value)
    }

    /// Suspends a computation. The closure is not invoked until the driver
    /// reaches it.
    pub fn defer(f: impl FnOnce() -> Eval<'a, A> + 'a) -> Self {
        Self::Defer(Box::new(f))
    }

    /// Transforms the eventual result.
    pub fn map(self, f: impl FnOnce(A) -> A + 'a) -> Self {
        self.and_then(move |a| Self::Now(f(a)))
    }

    /// Sequences a dependent computation after this one.
    pub fn and_then(self, f: impl FnOnce(A) -> Eval<'a, A> + 'a) -> Self {
        Self::AndThen(Box::new(self), Box::new(f))
    }

    /// Combines two deferred computations with a function. Both sides are
    /// evaluated; there is no short-circuiting.
    pub fn zip_with(self, other: Self, f: impl FnOnce(A, A) -> A + 'a) -> Self {
        self.and_then(move |a| other.map(move |b| f(a, b)))
    }

    /// Exhausts the trampoline and returns the final value.
    ///
    /// Pending continuations live on an explicit heap-allocated stack, so
    /// arbitrarily deep `defer`/`and_then` chains cannot overflow the native
    /// call stack.
    pub fn run(self) -> A {
        let mut stack: Vec<Box<dyn FnOnce(A) -> Eval<'a, A> + 'a>> = Vec::new();
        let mut current = self;
        loop {
            match current {
                Self::Now(value) => match stack.pop() {
                    Some(cont) => current = cont(value),
                    None => return value,
                },
                Self::Defer(thunk) => current = thunk(),
                Self::AndThen(inner, cont) => {
                    stack.push(cont);
                    current = *inner;
                }
            }
        }
    }
}

impl<'a> Eval<'a, bool> {
    /// Both computations must hold. Short-circuit-free.
    pub fn and(self, other: Self) -> Self {
        self.zip_with(other, |a, b| a && b)
    }

    /// Either computation must hold. Short-circuit-free.
    pub fn or(self, other: Self) -> Self {
        self.zip_with(other, |a, b| a || b)
    }
}
