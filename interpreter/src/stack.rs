// Parsing and evaluation recurse once per nesting level of the program, and the depth of that
// nesting is up to the script. Recursive entry points run through `ensure_sufficient_stack`,
// which moves onto a freshly allocated segment once the current one runs low.

/// Space left on the current segment below which a new one is allocated.
const RED_ZONE: usize = 128 * 1024;

/// Size of every additional segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
