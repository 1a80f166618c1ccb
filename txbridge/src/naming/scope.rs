// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Per-thread lookup scope
//!
//! Names are resolved against a scope: the process-wide `Global` scope where
//! transactional resources are bound, or a narrower per-application scope.
//! The current scope belongs to the calling thread. Switching it is only
//! possible through [`ScopeGuard`], which puts the previous scope back when
//! dropped, including during unwinding.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;

thread_local! {
    static CURRENT_SCOPE: RefCell<LookupScope> = const { RefCell::new(LookupScope::Global) };
}

/// Naming scope used to resolve a binding
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum LookupScope {
    /// Process-wide scope owned by the host
    #[default]
    Global,

    /// Scope of a single hosted application
    Application(String),
}

impl LookupScope {
    pub fn application(name: impl Into<String>) -> Self {
        LookupScope::Application(name.into())
    }

    /// The enclosing scope. `Global` is its own parent.
    pub fn parent(&self) -> LookupScope {
        match self {
            LookupScope::Global => LookupScope::Global,
            LookupScope::Application(_) => LookupScope::Global,
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, LookupScope::Global)
    }
}

impl fmt::Display for LookupScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupScope::Global => write!(f, "global"),
            LookupScope::Application(name) => write!(f, "application:{}", name),
        }
    }
}

/// Scope in effect on the calling thread
pub fn current() -> LookupScope {
    CURRENT_SCOPE.with(|scope| scope.borrow().clone())
}

/// Switches the calling thread's lookup scope until dropped
///
/// The guard is `!Send`: it restores the slot of the thread that created it.
#[must_use = "the previous scope is restored as soon as the guard is dropped"]
pub struct ScopeGuard {
    previous: Option<LookupScope>,
    _not_send: PhantomData<*const ()>,
}

impl ScopeGuard {
    /// Make `scope` current and remember the scope it replaces
    pub fn enter(scope: LookupScope) -> Self {
        let previous = CURRENT_SCOPE.with(|slot| slot.replace(scope));
        Self {
            previous: Some(previous),
            _not_send: PhantomData,
        }
    }

    /// Scope that will be restored on drop
    pub fn previous(&self) -> Option<&LookupScope> {
        self.previous.as_ref()
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            CURRENT_SCOPE.with(|slot| {
                *slot.borrow_mut() = previous;
            });
        }
    }
}

/// Run `f` with `scope` current, restoring the previous scope afterwards
pub fn with_scope<R>(scope: LookupScope, f: impl FnOnce() -> R) -> R {
    let _guard = ScopeGuard::enter(scope);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn test_default_scope_is_global() {
        assert_eq!(current(), LookupScope::Global);
    }

    #[test]
    fn test_parent_of_application_is_global() {
        assert_eq!(LookupScope::application("shop").parent(), LookupScope::Global);
        assert_eq!(LookupScope::Global.parent(), LookupScope::Global);
    }

    #[test]
    fn test_guard_restores_previous_scope() {
        let _app = ScopeGuard::enter(LookupScope::application("shop"));
        {
            let guard = ScopeGuard::enter(LookupScope::Global);
            assert_eq!(guard.previous(), Some(&LookupScope::application("shop")));
            assert_eq!(current(), LookupScope::Global);
        }
        assert_eq!(current(), LookupScope::application("shop"));
    }

    #[test]
    fn test_guard_restores_on_unwind() {
        let _app = ScopeGuard::enter(LookupScope::application("shop"));
        let result = catch_unwind(AssertUnwindSafe(|| {
            with_scope(LookupScope::Global, || panic!("lookup aborted"))
        }));
        assert!(result.is_err());
        assert_eq!(current(), LookupScope::application("shop"));
    }

    #[test]
    fn test_scope_is_per_thread() {
        let _app = ScopeGuard::enter(LookupScope::application("shop"));
        let other = std::thread::spawn(current).join().unwrap();
        assert_eq!(other, LookupScope::Global);
        assert_eq!(current(), LookupScope::application("shop"));
    }

    #[test]
    fn test_display() {
        assert_eq!(LookupScope::Global.to_string(), "global");
        assert_eq!(LookupScope::application("shop").to_string(), "application:shop");
    }
}
