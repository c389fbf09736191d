//! Stack of evaluation contexts searched for late-bound names.
//!
//! The root context sits below every pushed scope and stays reachable from
//! all of them. Plain names are searched from the innermost scope outward,
//! stopping at the first isolated scope (a function call) before falling
//! back to the root:
//!
//! ```text
//! x      innermost -> ... -> isolated call scope -> root
//! :x     innermost only
//! `x     root only
//! ```

use std::fmt;

use super::Arg;
use super::context::{ContextRef, LocalFunc};
use crate::ast::VarScope;

struct Scope<'a> {
    context: ContextRef<'a>,
    isolated: bool,
}

pub struct ContextChain<'a> {
    root: ContextRef<'a>,
    scopes: Vec<Scope<'a>>,
}

impl<'a> ContextChain<'a> {
    pub fn new(root: ContextRef<'a>) -> Self {
        Self {
            root,
            scopes: Vec::new(),
        }
    }

    pub fn root(&self) -> &ContextRef<'a> {
        &self.root
    }

    /// Innermost context, the root when nothing is pushed.
    pub fn current(&self) -> &ContextRef<'a> {
        self.scopes.last().map_or(&self.root, |scope| &scope.context)
    }

    /// Number of pushed scopes, not counting the root.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Pushes a scope. An isolated scope hides everything between it and the
    /// root from plain lookups.
    pub fn push(&mut self, context: ContextRef<'a>, isolated: bool) {
        self.scopes.push(Scope { context, isolated });
    }

    pub fn pop(&mut self) -> Result<ContextRef<'a>, PopError> {
        self.scopes
            .pop()
            .map(|scope| scope.context)
            .ok_or(PopError::EmptyStack)
    }

    /// Contexts a plain name is searched in, innermost first.
    fn visible(&self) -> impl Iterator<Item = &ContextRef<'a>> {
        let hidden = self
            .scopes
            .iter()
            .rposition(|scope| scope.isolated)
            .unwrap_or(0);
        self.scopes[hidden..]
            .iter()
            .rev()
            .map(|scope| &scope.context)
            .chain(std::iter::once(&self.root))
    }

    fn find(&self, scope: VarScope, name: &str) -> Option<(&ContextRef<'a>, Arg<'a>)> {
        match scope {
            VarScope::Root => self.root.borrow().lookup_arg(name).map(|v| (&self.root, v)),
            VarScope::Local => {
                let current = self.current();
                current.borrow().lookup_arg(name).map(|v| (current, v))
            }
            VarScope::Normal => self
                .visible()
                .find_map(|ctx| ctx.borrow().lookup_arg(name).map(|v| (ctx, v))),
        }
    }

    pub fn lookup(&self, scope: VarScope, name: &str) -> Option<Arg<'a>> {
        self.find(scope, name).map(|(_, value)| value)
    }

    /// Writes `value`. An existing variable is updated in the context that
    /// holds it; a missing one is created (when `force` is set) in the
    /// innermost context, or the root for root-scoped names. Returns whether
    /// the variable existed.
    pub fn set(&self, scope: VarScope, name: &str, value: Arg<'a>, force: bool) -> bool {
        let target = match self.find(scope, name) {
            Some((ctx, _)) => ctx,
            None if scope == VarScope::Root => &self.root,
            None => self.current(),
        };
        target.borrow_mut().set_arg(name, value, force)
    }

    /// Functions are visible through every scope, isolated or not.
    pub fn lookup_func(&self, name: &str) -> Option<LocalFunc<'a>> {
        self.scopes
            .iter()
            .rev()
            .map(|scope| &scope.context)
            .chain(std::iter::once(&self.root))
            .find_map(|ctx| ctx.borrow().lookup_func(name))
    }

    pub fn set_func(&self, func: LocalFunc<'a>) {
        self.current().borrow_mut().set_func(func);
    }
}

/// Error when popping from the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    /// Only the root is left.
    EmptyStack,
}

impl fmt::Display for PopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopError::EmptyStack => write!(f, "Cannot pop the root context"),
        }
    }
}

impl std::error::Error for PopError {}
