// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Thread-local active-scope stack
//!
//! Which defaults apply is a property of where in the code we currently are,
//! so the stack is per-thread: scopes entered on one thread never leak into
//! resolution on another. Entry hands back a [`ScopeGuard`] whose drop pops
//! exactly the scope it pushed, so the stack unwinds correctly on early
//! returns and panics alike.

use crate::scope::{Scope, ScopeId};
use crate::{RegistryError, RegistryResult};
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error};

static NEXT_ENTRY: AtomicU64 = AtomicU64::new(1);

/// One stack entry: the entered scope plus a token unique to this entry.
/// The same scope may be entered more than once, so guards track the entry
/// token rather than the scope id.
struct Entry {
    token: u64,
    scope: Scope,
}

thread_local! {
    static ACTIVE: RefCell<Vec<Entry>> = const { RefCell::new(Vec::new()) };
}

/// Push `scope` onto this thread's active stack.
///
/// The returned guard pops the scope when dropped. For balance checking on
/// the happy path, prefer consuming the guard with [`ScopeGuard::exit`].
pub fn enter(scope: &Scope) -> ScopeGuard {
    let token = NEXT_ENTRY.fetch_add(1, Ordering::Relaxed);
    ACTIVE.with(|stack| {
        stack.borrow_mut().push(Entry {
            token,
            scope: scope.clone(),
        })
    });
    debug!(scope = %scope.id(), depth = depth(), "scope entered");
    ScopeGuard {
        id: scope.id(),
        token,
        released: false,
    }
}

/// Number of scopes currently entered on this thread.
pub fn depth() -> usize {
    ACTIVE.with(|stack| stack.borrow().len())
}

/// True when no scope is entered on this thread. Callers tearing down a
/// simulation can assert this; an unbalanced stack at teardown means a guard
/// was leaked somewhere.
pub fn is_clean() -> bool {
    depth() == 0
}

/// Innermost-first snapshot of the active stack, for resolution and
/// introspection. Read-only.
pub(crate) fn active_innermost_first() -> Vec<Scope> {
    ACTIVE.with(|stack| stack.borrow().iter().rev().map(|e| e.scope.clone()).collect())
}

/// RAII cursor for one entered scope.
///
/// Dropping the guard releases the scope unconditionally. An out-of-order
/// drop (the guarded entry is no longer on top) still removes only its own
/// entry and reports the corruption through `tracing::error!`, since `Drop`
/// cannot return an error.
#[derive(Debug)]
pub struct ScopeGuard {
    id: ScopeId,
    token: u64,
    released: bool,
}

impl ScopeGuard {
    /// The entered scope's identity.
    pub fn scope_id(&self) -> ScopeId {
        self.id
    }

    /// Checked release: pops the guarded scope, which must be top-of-stack.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ScopeStackCorruption` if another scope is on
    /// top (exit order does not match enter order). The stack is left
    /// untouched in that case; the guard is consumed either way, and its
    /// scope is removed on drop.
    pub fn exit(mut self) -> RegistryResult<()> {
        let top = ACTIVE.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| (entry.token, entry.scope.id()))
        });
        match top {
            Some((token, _)) if token == self.token => {
                ACTIVE.with(|stack| {
                    stack.borrow_mut().pop();
                });
                self.released = true;
                debug!(scope = %self.id, depth = depth(), "scope exited");
                Ok(())
            }
            Some((_, id)) => Err(RegistryError::ScopeStackCorruption {
                expected: self.id.to_string(),
                found: id.to_string(),
            }),
            None => Err(RegistryError::ScopeStackCorruption {
                expected: self.id.to_string(),
                found: "empty stack".to_string(),
            }),
        }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        ACTIVE.with(|stack| {
            let mut stack = stack.borrow_mut();
            match stack.last().map(|entry| entry.token) {
                Some(token) if token == self.token => {
                    stack.pop();
                }
                _ => {
                    // Unwind out of order: remove only this guard's entry,
                    // so other entries for a re-entered scope stay active
                    error!(scope = %self.id, "scope guard dropped out of order");
                    if let Some(idx) = stack.iter().position(|e| e.token == self.token) {
                        stack.remove(idx);
                    }
                }
            }
        });
    }
}
