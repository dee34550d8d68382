//! Stack growth for deep recursion
//!
//! Left-nested operator chains are not bounded by the parser's depth limit,
//! so every recursive walk over the tree goes through
//! [`ensure_sufficient_stack`].

/// Minimum stack space to keep available (100KB red zone)
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB)
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, growing the stack first if less than the red zone remains
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack
#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
