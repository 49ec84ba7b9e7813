//! Stack growth for the recursive parser and evaluator.
//!
//! The evaluator's depth ceiling is the intended recursion limit, so the host
//! stack is grown on demand rather than overflowing first.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
