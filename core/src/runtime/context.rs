//! Variable and function storage for one scope.
//!
//! Two backends with identical behavior: [`LargeEvaluateContext`] hashes
//! names and suits long-lived scopes such as the root, while
//! [`CompactEvaluateContext`] keeps a flat list over one string buffer and
//! is what function calls and nested blocks get.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use hashbrown::HashMap;

use super::Arg;
use crate::ast::Block;

/// A function defined by a script through `@DefFunc`.
#[derive(Debug, Clone)]
pub struct LocalFunc<'a> {
    pub name: &'a str,
    pub body: &'a Block<'a>,
    pub params: &'a [&'a str],
    /// Values bound by `@Capture` when the function was defined; they are
    /// set in the call scope before the parameters.
    pub captures: Rc<[(&'a str, Arg<'a>)]>,
}

pub trait EvaluateContext<'a> {
    fn lookup_arg(&self, name: &str) -> Option<Arg<'a>>;

    /// Stores `value` under `name` and reports whether the name existed.
    /// A missing name is only created when `force` is set. Storing
    /// [`Arg::Empty`] removes the name.
    fn set_arg(&mut self, name: &str, value: Arg<'a>, force: bool) -> bool;

    fn lookup_func(&self, name: &str) -> Option<LocalFunc<'a>>;

    /// Defines or replaces a function.
    fn set_func(&mut self, func: LocalFunc<'a>);

    fn arg_count(&self) -> usize;

    fn func_count(&self) -> usize;

    /// Snapshot of all variables, sorted by name.
    fn args(&self) -> Vec<(String, Arg<'a>)>;
}

/// Shared handle to a context; the chain and the frame that pushed it both
/// hold one.
pub type ContextRef<'a> = Rc<RefCell<dyn EvaluateContext<'a> + 'a>>;

pub fn large_context<'a>() -> ContextRef<'a> {
    Rc::new(RefCell::new(LargeEvaluateContext::default()))
}

pub fn compact_context<'a>() -> ContextRef<'a> {
    Rc::new(RefCell::new(CompactEvaluateContext::default()))
}

#[derive(Default)]
pub struct LargeEvaluateContext<'a> {
    args: HashMap<String, Arg<'a>>,
    funcs: HashMap<String, LocalFunc<'a>>,
}

impl<'a> EvaluateContext<'a> for LargeEvaluateContext<'a> {
    fn lookup_arg(&self, name: &str) -> Option<Arg<'a>> {
        self.args.get(name).cloned()
    }

    fn set_arg(&mut self, name: &str, value: Arg<'a>, force: bool) -> bool {
        if value.is_empty() {
            return self.args.remove(name).is_some();
        }
        match self.args.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => {
                if force {
                    self.args.insert(name.to_string(), value);
                }
                false
            }
        }
    }

    fn lookup_func(&self, name: &str) -> Option<LocalFunc<'a>> {
        self.funcs.get(name).cloned()
    }

    fn set_func(&mut self, func: LocalFunc<'a>) {
        self.funcs.insert(func.name.to_string(), func);
    }

    fn arg_count(&self) -> usize {
        self.args.len()
    }

    fn func_count(&self) -> usize {
        self.funcs.len()
    }

    fn args(&self) -> Vec<(String, Arg<'a>)> {
        let mut args: Vec<_> = self.args.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        args.sort_by(|a, b| a.0.cmp(&b.0));
        args
    }
}

/// Names live in one growing buffer; entries refer to them by range.
#[derive(Default)]
pub struct CompactEvaluateContext<'a> {
    names: String,
    args: Vec<(Range<usize>, Arg<'a>)>,
    funcs: Vec<LocalFunc<'a>>,
}

impl<'a> CompactEvaluateContext<'a> {
    fn position(&self, name: &str) -> Option<usize> {
        self.args.iter().position(|(range, _)| &self.names[range.clone()] == name)
    }

    fn intern(&mut self, name: &str) -> Range<usize> {
        if let Some(start) = self.names.find(name) {
            return start..start + name.len();
        }
        let start = self.names.len();
        self.names.push_str(name);
        start..self.names.len()
    }
}

impl<'a> EvaluateContext<'a> for CompactEvaluateContext<'a> {
    fn lookup_arg(&self, name: &str) -> Option<Arg<'a>> {
        self.position(name).map(|idx| self.args[idx].1.clone())
    }

    fn set_arg(&mut self, name: &str, value: Arg<'a>, force: bool) -> bool {
        match self.position(name) {
            Some(idx) if value.is_empty() => {
                self.args.swap_remove(idx);
                true
            }
            Some(idx) => {
                self.args[idx].1 = value;
                true
            }
            None => {
                if force && !value.is_empty() {
                    let range = self.intern(name);
                    self.args.push((range, value));
                }
                false
            }
        }
    }

    fn lookup_func(&self, name: &str) -> Option<LocalFunc<'a>> {
        self.funcs.iter().find(|f| f.name == name).cloned()
    }

    fn set_func(&mut self, func: LocalFunc<'a>) {
        match self.funcs.iter_mut().find(|f| f.name == func.name) {
            Some(slot) => *slot = func,
            None => self.funcs.push(func),
        }
    }

    fn arg_count(&self) -> usize {
        self.args.len()
    }

    fn func_count(&self) -> usize {
        self.funcs.len()
    }

    fn args(&self) -> Vec<(String, Arg<'a>)> {
        let mut args: Vec<_> = self
            .args
            .iter()
            .map(|(range, v)| (self.names[range.clone()].to_string(), v.clone()))
            .collect();
        args.sort_by(|a, b| a.0.cmp(&b.0));
        args
    }
}
