//! Reflection-style handler built from per-member accessor closures.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use super::{AssignOutcome, CustomVar, CustomVarHandler, Query, QueryError, TypeDescriptor, VarFlags, VarSlot, bidir_index};
use crate::runtime::Arg;

type Getter<T> = Box<dyn Fn(&T) -> Arg<'static>>;
type Setter<T> = Box<dyn Fn(&mut T, Arg<'static>) -> bool>;

/// How a member is read and written.
pub enum Accessor<T> {
    /// Yields a nested custom variable, e.g. a sub-object or an array of
    /// host objects.
    Auto(Box<dyn Fn(&T) -> CustomVar>),
    /// Read through `get`, written through `set` when present. A setter
    /// returning `false` rejects the value.
    Proxy { get: Getter<T>, set: Option<Setter<T>> },
    /// Read-only native value.
    Direct(Getter<T>),
}

struct Member<T> {
    name: String,
    accessor: Accessor<T>,
    is_const: bool,
}

/// Handler for host type `T`, exposed either as single objects held in
/// `Rc<RefCell<T>>` or as arrays held in `Rc<RefCell<Vec<T>>>`.
pub struct AutoVarHandler<T> {
    type_name: String,
    members: Vec<Member<T>>,
    assigner: Option<Box<dyn Fn(&mut T, Arg<'static>) -> Result<(), String>>>,
    extend_indexer: Option<Box<dyn Fn(&[T], &Arg<'_>) -> Option<usize>>>,
}

/// Returned by the `add_*_member` methods to tweak the member just added.
pub struct AccessorBuilder<'h, T> {
    member: &'h mut Member<T>,
}

impl<T> AccessorBuilder<'_, T> {
    /// Const members refuse assignment even on mutable handles.
    pub fn set_const(self, is_const: bool) -> Self {
        self.member.is_const = is_const;
        self
    }
}

impl<T: 'static> AutoVarHandler<T> {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            members: Vec::new(),
            assigner: None,
            extend_indexer: None,
        }
    }

    fn add_member(&mut self, name: &str, accessor: Accessor<T>) -> AccessorBuilder<'_, T> {
        self.members.retain(|m| m.name != name);
        self.members.push(Member {
            name: name.to_string(),
            accessor,
            is_const: false,
        });
        let last = self.members.len() - 1;
        AccessorBuilder {
            member: &mut self.members[last],
        }
    }

    pub fn add_auto_member(&mut self, name: &str, get: impl Fn(&T) -> CustomVar + 'static) -> AccessorBuilder<'_, T> {
        self.add_member(name, Accessor::Auto(Box::new(get)))
    }

    pub fn add_proxy_member(
        &mut self,
        name: &str,
        get: impl Fn(&T) -> Arg<'static> + 'static,
        set: impl Fn(&mut T, Arg<'static>) -> bool + 'static,
    ) -> AccessorBuilder<'_, T> {
        self.add_member(
            name,
            Accessor::Proxy {
                get: Box::new(get),
                set: Some(Box::new(set)),
            },
        )
    }

    pub fn add_direct_member(&mut self, name: &str, get: impl Fn(&T) -> Arg<'static> + 'static) -> AccessorBuilder<'_, T> {
        self.add_member(name, Accessor::Direct(Box::new(get)))
    }

    /// Callback used when a script assigns to the object itself.
    pub fn set_assigner(&mut self, assigner: impl Fn(&mut T, Arg<'static>) -> Result<(), String> + 'static) {
        self.assigner = Some(Box::new(assigner));
    }

    /// Lookup tried before positional indexing on arrays, e.g. to find an
    /// element by name. Returning `None` falls back to positional indexing.
    pub fn set_extend_indexer(&mut self, indexer: impl Fn(&[T], &Arg<'_>) -> Option<usize> + 'static) {
        self.extend_indexer = Some(Box::new(indexer));
    }

    pub fn create_var(self: &Rc<Self>, object: &Rc<RefCell<T>>) -> CustomVar {
        self.make_var(object.clone(), VarFlags { array: false, mutable: true })
    }

    pub fn create_const_var(self: &Rc<Self>, object: &Rc<RefCell<T>>) -> CustomVar {
        self.make_var(object.clone(), VarFlags { array: false, mutable: false })
    }

    pub fn create_array_var(self: &Rc<Self>, items: &Rc<RefCell<Vec<T>>>) -> CustomVar {
        self.make_var(items.clone(), VarFlags { array: true, mutable: true })
    }

    fn make_var(self: &Rc<Self>, target: Rc<dyn Any>, flags: VarFlags) -> CustomVar {
        let handler: Rc<dyn CustomVarHandler> = self.clone();
        CustomVar::new(handler, Rc::downgrade(&target), flags)
    }

    fn find(&self, name: &str) -> Option<&Member<T>> {
        self.members.iter().find(|m| m.name == name)
    }

    fn no_member(&self, member: &str) -> QueryError {
        QueryError::NoMember {
            type_name: self.type_name.clone(),
            member: member.to_string(),
        }
    }

    fn items(&self, var: &CustomVar) -> Result<Rc<RefCell<Vec<T>>>, QueryError> {
        var.target()?
            .downcast::<RefCell<Vec<T>>>()
            .map_err(|_| QueryError::TypeMismatch(self.type_name.clone()))
    }

    fn object(&self, var: &CustomVar) -> Result<Rc<RefCell<T>>, QueryError> {
        var.target()?
            .downcast::<RefCell<T>>()
            .map_err(|_| QueryError::TypeMismatch(self.type_name.clone()))
    }

    fn read<R>(&self, var: &CustomVar, f: impl FnOnce(&T) -> R) -> Result<R, QueryError> {
        match var.slot {
            VarSlot::Whole => {
                let cell = self.object(var)?;
                let object = cell.try_borrow().map_err(|_| QueryError::Busy)?;
                Ok(f(&object))
            }
            VarSlot::Element(index) => {
                let cell = self.items(var)?;
                let items = cell.try_borrow().map_err(|_| QueryError::Busy)?;
                let len = items.len();
                let object = items.get(index).ok_or(QueryError::IndexOutOfBound {
                    index: index as i128,
                    len,
                })?;
                Ok(f(object))
            }
        }
    }

    fn write<R>(&self, var: &CustomVar, f: impl FnOnce(&mut T) -> R) -> Result<R, QueryError> {
        match var.slot {
            VarSlot::Whole => {
                let cell = self.object(var)?;
                let mut object = cell.try_borrow_mut().map_err(|_| QueryError::Busy)?;
                Ok(f(&mut object))
            }
            VarSlot::Element(index) => {
                let cell = self.items(var)?;
                let mut items = cell.try_borrow_mut().map_err(|_| QueryError::Busy)?;
                let len = items.len();
                let object = items.get_mut(index).ok_or(QueryError::IndexOutOfBound {
                    index: index as i128,
                    len,
                })?;
                Ok(f(object))
            }
        }
    }

    fn query_array(&self, var: &CustomVar, query: Query<'_, '_>) -> Result<Option<Arg<'static>>, QueryError> {
        let cell = self.items(var)?;
        let items = cell.try_borrow().map_err(|_| QueryError::Busy)?;
        match query {
            Query::Member("Length") => Ok(Some(Arg::Uint(items.len() as u64))),
            Query::Member(_) => Ok(None),
            Query::Index(index) => {
                let extended = self.extend_indexer.as_ref().and_then(|indexer| indexer(items.as_slice(), index));
                let position = match extended {
                    Some(position) if position < items.len() => position,
                    Some(position) => {
                        return Err(QueryError::IndexOutOfBound {
                            index: position as i128,
                            len: items.len(),
                        });
                    }
                    None => bidir_index(items.len(), index)?,
                };
                Ok(Some(Arg::Custom(var.element(position))))
            }
        }
    }
}

impl<T: 'static> CustomVarHandler for AutoVarHandler<T> {
    fn describe_type(&self) -> TypeDescriptor<'_> {
        TypeDescriptor {
            name: &self.type_name,
            size: std::mem::size_of::<T>(),
        }
    }

    fn query(&self, var: &CustomVar, query: Query<'_, '_>) -> Result<Option<Arg<'static>>, QueryError> {
        if var.is_whole_array() {
            return self.query_array(var, query);
        }
        let Query::Member(name) = query else {
            return Ok(None);
        };
        let Some(member) = self.find(name) else {
            return Ok(None);
        };
        self.read(var, |object| match &member.accessor {
            Accessor::Auto(get) => Arg::Custom(get(object)),
            Accessor::Proxy { get, .. } | Accessor::Direct(get) => get(object),
        })
        .map(Some)
    }

    fn assign_member(&self, var: &CustomVar, name: &str, value: Arg<'static>) -> Result<AssignOutcome, QueryError> {
        if var.is_whole_array() {
            return Err(QueryError::ArrayAssign);
        }
        let member = self.find(name).ok_or_else(|| self.no_member(name))?;
        match &member.accessor {
            Accessor::Auto(get) => {
                let nested = self.read(var, |object| get(object))?;
                nested.assign(value)
            }
            Accessor::Proxy { set: Some(set), .. } if var.flags.mutable && !member.is_const => {
                if self.write(var, |object| set(object, value))? {
                    Ok(AssignOutcome::Assigned)
                } else {
                    Err(QueryError::Rejected(name.to_string()))
                }
            }
            _ => Err(QueryError::NotAssignable(format!("{}.{name}", self.type_name))),
        }
    }

    fn assign(&self, var: &CustomVar, value: Arg<'static>) -> Result<AssignOutcome, QueryError> {
        if var.is_whole_array() {
            return Err(QueryError::ArrayAssign);
        }
        let Some(assigner) = &self.assigner else {
            tracing::warn!(type_name = %self.type_name, "assignment ignored, no assigner registered");
            return Ok(AssignOutcome::NotSupported);
        };
        if !var.flags.mutable {
            return Err(QueryError::NotAssignable(self.type_name.clone()));
        }
        self.write(var, |object| assigner(object, value))?
            .map_err(QueryError::Host)?;
        Ok(AssignOutcome::Assigned)
    }

    fn to_display_string(&self, var: &CustomVar) -> String {
        if var.is_whole_array() {
            let len = self
                .items(var)
                .ok()
                .and_then(|cell| cell.try_borrow().ok().map(|items| items.len()))
                .unwrap_or(0);
            return format!("[{}; {len}]", self.type_name);
        }
        format!("[{}]", self.type_name)
    }
}
