// MetaClass Members - functions, accessors and frozen member tables
//
// A member table is assembled once through `MemberTableBuilder` and frozen;
// descriptors only ever hand out the frozen form.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::context::{CallKind, DispatchContext};
use crate::error::MetaResult;
use crate::runtime::Runtime;
use crate::symbol::SymbolId;
use crate::types::{TypeId, Value};

/// Signature of every native member body: runtime, receiver, arguments.
pub type NativeFn = dyn Fn(&mut Runtime, &Value, &[Value]) -> MetaResult<Value>;

/// A callable member body, optionally tagged by the trampoline.
#[derive(Clone)]
pub struct Function {
    body: Rc<NativeFn>,
    context: Option<DispatchContext>,
}

impl Function {
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&mut Runtime, &Value, &[Value]) -> MetaResult<Value> + 'static,
    {
        Self {
            body: Rc::new(body),
            context: None,
        }
    }

    /// Dispatch context installed while this function runs, if it is wrapped.
    pub fn context(&self) -> Option<DispatchContext> {
        self.context
    }

    pub fn is_wrapped(&self) -> bool {
        self.context.is_some()
    }

    /// Whether both functions share one underlying body.
    pub fn same_body(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.body, &other.body)
    }

    pub(crate) fn body(&self) -> Rc<NativeFn> {
        Rc::clone(&self.body)
    }

    /// Trampoline wrapping. Re-wrapping an already wrapped function retags the
    /// original body instead of nesting wrappers.
    pub(crate) fn wrap(&self, name: SymbolId, owner: TypeId, kind: CallKind) -> Function {
        Function {
            body: Rc::clone(&self.body),
            context: Some(DispatchContext::new(name, owner, kind)),
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.same_body(other) && self.context == other.context
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// A computed property
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Accessor {
    pub get: Option<Function>,
    pub set: Option<Function>,
}

/// A member table entry
#[derive(Clone, Debug, PartialEq)]
pub enum Member {
    /// Plain value; `Value::Function` entries are methods
    Value(Value),
    Accessor(Accessor),
    /// Placeholder that an implementing type must override
    Abstract,
}

impl Member {
    pub fn method<F>(body: F) -> Self
    where
        F: Fn(&mut Runtime, &Value, &[Value]) -> MetaResult<Value> + 'static,
    {
        Member::Value(Value::Function(Function::new(body)))
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, Member::Abstract)
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Member::Value(Value::Function(f)) => Some(f),
            _ => None,
        }
    }

    /// Apply the trampoline to every function this entry holds.
    pub(crate) fn wrap_for(&self, name: SymbolId, owner: TypeId) -> Member {
        match self {
            Member::Value(Value::Function(f)) => {
                Member::Value(Value::Function(f.wrap(name, owner, CallKind::Method)))
            }
            Member::Accessor(accessor) => Member::Accessor(Accessor {
                get: accessor
                    .get
                    .as_ref()
                    .map(|f| f.wrap(name, owner, CallKind::Getter)),
                set: accessor
                    .set
                    .as_ref()
                    .map(|f| f.wrap(name, owner, CallKind::Setter)),
            }),
            other => other.clone(),
        }
    }
}

impl From<Value> for Member {
    fn from(v: Value) -> Self {
        Member::Value(v)
    }
}

/// A frozen, insertion-ordered member table
#[derive(Clone, Debug, Default)]
pub struct MemberTable {
    entries: Vec<(SymbolId, Member)>,
    index: HashMap<SymbolId, usize>,
}

impl MemberTable {
    pub fn get(&self, name: SymbolId) -> Option<&Member> {
        self.index.get(&name).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, name: SymbolId) -> bool {
        self.index.contains_key(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Member)> + '_ {
        self.entries.iter().map(|(name, member)| (*name, member))
    }

    pub fn names(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mutable staging area for a member table under construction
#[derive(Debug, Default)]
pub(crate) struct MemberTableBuilder {
    entries: Vec<(SymbolId, Member)>,
    index: HashMap<SymbolId, usize>,
}

impl MemberTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: SymbolId) -> Option<&Member> {
        self.index.get(&name).map(|&i| &self.entries[i].1)
    }

    /// Insert or overwrite. An overwritten entry keeps its original position.
    pub fn insert(&mut self, name: SymbolId, member: Member) {
        if let Some(&i) = self.index.get(&name) {
            self.entries[i].1 = member;
        } else {
            self.index.insert(name, self.entries.len());
            self.entries.push((name, member));
        }
    }

    pub fn freeze(self) -> MemberTable {
        MemberTable {
            entries: self.entries,
            index: self.index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(n: i64) -> Function {
        Function::new(move |_, _, _| Ok(Value::Integer(n)))
    }

    #[test]
    fn wrap_retags_the_original_body() {
        let f = constant(1);
        let once = f.wrap(SymbolId(0), TypeId(1), CallKind::Method);
        let twice = once.wrap(SymbolId(0), TypeId(2), CallKind::Method);
        assert!(twice.same_body(&f));
        assert_eq!(twice.context().map(|c| c.owner), Some(TypeId(2)));
        assert!(!f.is_wrapped());
        assert_ne!(once, twice);
    }

    #[test]
    fn accessor_functions_are_wrapped_by_kind() {
        let member = Member::Accessor(Accessor {
            get: Some(constant(1)),
            set: Some(constant(2)),
        });
        let Member::Accessor(wrapped) = member.wrap_for(SymbolId(3), TypeId(4)) else {
            panic!("accessor expected");
        };
        assert_eq!(wrapped.get.unwrap().context().unwrap().kind, CallKind::Getter);
        assert_eq!(wrapped.set.unwrap().context().unwrap().kind, CallKind::Setter);
    }

    #[test]
    fn builder_overwrite_keeps_position() {
        let mut builder = MemberTableBuilder::new();
        builder.insert(SymbolId(1), Member::Value(Value::Integer(1)));
        builder.insert(SymbolId(2), Member::Abstract);
        builder.insert(SymbolId(1), Member::Value(Value::Integer(3)));
        let table = builder.freeze();
        let names: Vec<_> = table.names().collect();
        assert_eq!(names, vec![SymbolId(1), SymbolId(2)]);
        assert_eq!(table.get(SymbolId(1)), Some(&Member::Value(Value::Integer(3))));
        assert!(table.get(SymbolId(2)).unwrap().is_abstract());
    }
}
