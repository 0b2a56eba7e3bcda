// MetaClass Interfaces - named bundles of member defaults and placeholders
//
// Interfaces have no ancestor chain. Their members are copied into
// implementing types and can also be called generically against any
// receiver.

use smallvec::SmallVec;
use tracing::debug;

use crate::error::{DeclKind, DispatchError, MetaError, MetaResult};
use crate::member::{Accessor, Function, Member, MemberTable, MemberTableBuilder};
use crate::runtime::Runtime;
use crate::types::{InterfaceId, MetaTypeId, TypeId, Value};

/// Something an interface requires of its implementors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prerequisite {
    /// Must be attached earlier in the type's list, or inherited
    Interface(InterfaceId),
    /// The implementing type must descend from this type
    Type(TypeId),
}

impl From<InterfaceId> for Prerequisite {
    fn from(id: InterfaceId) -> Self {
        Prerequisite::Interface(id)
    }
}

impl From<TypeId> for Prerequisite {
    fn from(id: TypeId) -> Self {
        Prerequisite::Type(id)
    }
}

/// Declarative record for an interface
#[derive(Clone, Debug, Default)]
pub struct InterfaceSpec {
    name: Option<String>,
    prerequisites: Vec<Prerequisite>,
    meta_type: Option<MetaTypeId>,
    members: Vec<(String, Member)>,
}

impl InterfaceSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn requires(mut self, prerequisite: impl Into<Prerequisite>) -> Self {
        self.prerequisites.push(prerequisite.into());
        self
    }

    pub fn meta_type(mut self, meta: MetaTypeId) -> Self {
        self.meta_type = Some(meta);
        self
    }

    pub fn member(mut self, name: impl Into<String>, member: Member) -> Self {
        self.members.push((name.into(), member));
        self
    }

    pub fn method<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Runtime, &Value, &[Value]) -> MetaResult<Value> + 'static,
    {
        self.member(name, Member::method(body))
    }

    pub fn value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.member(name, Member::Value(value.into()))
    }

    pub fn accessor(
        self,
        name: impl Into<String>,
        get: Option<Function>,
        set: Option<Function>,
    ) -> Self {
        self.member(name, Member::Accessor(Accessor { get, set }))
    }

    /// Declare a member implementors must override.
    pub fn abstract_member(self, name: impl Into<String>) -> Self {
        self.member(name, Member::Abstract)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn prerequisites(&self) -> &[Prerequisite] {
        &self.prerequisites
    }

    pub fn requested_meta(&self) -> Option<MetaTypeId> {
        self.meta_type
    }
}

/// A ready, immutable interface
#[derive(Clone, Debug)]
pub struct InterfaceDescriptor {
    pub(crate) id: InterfaceId,
    pub(crate) name: String,
    pub(crate) prerequisites: SmallVec<[Prerequisite; 4]>,
    pub(crate) members: MemberTable,
    pub(crate) meta: MetaTypeId,
}

impl InterfaceDescriptor {
    pub fn id(&self) -> InterfaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prerequisites(&self) -> &[Prerequisite] {
        &self.prerequisites
    }

    pub fn members(&self) -> &MemberTable {
        &self.members
    }

    pub fn meta(&self) -> MetaTypeId {
        self.meta
    }
}

impl Runtime {
    /// Construction run by the standard interface meta-type.
    pub fn construct_interface(
        &mut self,
        meta: MetaTypeId,
        spec: InterfaceSpec,
    ) -> MetaResult<InterfaceId> {
        let InterfaceSpec {
            name,
            prerequisites,
            members,
            ..
        } = spec;
        let name = name
            .filter(|n| !n.is_empty())
            .ok_or(MetaError::Naming(DeclKind::Interface))?;

        for prerequisite in &prerequisites {
            match *prerequisite {
                Prerequisite::Interface(iface) => {
                    self.interface_ref(iface)?;
                }
                Prerequisite::Type(ty) => {
                    self.type_ref(ty)?;
                }
            }
        }

        // Functions stay untagged here; the implementing type wraps its copies.
        let mut builder = MemberTableBuilder::new();
        for (member_name, member) in members {
            let sym = self.symbols.intern(&member_name);
            builder.insert(sym, member);
        }
        let members = builder.freeze();

        let id = InterfaceId(self.interfaces.len() as u32);
        debug!(
            iface = %name,
            id = id.0,
            meta = meta.0,
            prerequisites = prerequisites.len(),
            abstract_members = members.iter().filter(|(_, m)| m.is_abstract()).count(),
            "interface declared"
        );
        self.interface_names.insert(name.clone(), id);
        self.interfaces.push(InterfaceDescriptor {
            id,
            name,
            prerequisites: prerequisites.into_iter().collect(),
            members,
            meta,
        });
        Ok(id)
    }

    /// Call an interface member with `this` as an explicit receiver, whether
    /// or not the receiver's type attaches the interface.
    pub fn call_interface(
        &mut self,
        iface: InterfaceId,
        name: &str,
        this: &Value,
        args: &[Value],
    ) -> MetaResult<Value> {
        let descriptor = self.interface_ref(iface)?;
        let no_such_member = || DispatchError::NoSuchMember {
            member: name.to_string(),
            owner: descriptor.name.clone(),
        };
        let sym = self.symbols.find(name).ok_or_else(no_such_member)?;
        let function = match descriptor.members.get(sym).ok_or_else(no_such_member)? {
            Member::Value(Value::Function(f)) => f.clone(),
            Member::Abstract => {
                return Err(DispatchError::NotImplemented {
                    member: name.to_string(),
                }
                .into())
            }
            _ => {
                return Err(DispatchError::NotCallable {
                    member: name.to_string(),
                    owner: descriptor.name.clone(),
                }
                .into())
            }
        };
        self.invoke(&function, this, args)
    }

    /// A standalone function for an interface member: the first argument is
    /// the receiver, the rest are passed through.
    pub fn interface_function(&self, iface: InterfaceId, name: &str) -> MetaResult<Function> {
        let descriptor = self.interface_ref(iface)?;
        let known = self
            .symbols
            .find(name)
            .is_some_and(|sym| descriptor.members.contains(sym));
        if !known {
            return Err(DispatchError::NoSuchMember {
                member: name.to_string(),
                owner: descriptor.name.clone(),
            }
            .into());
        }
        let name = name.to_string();
        Ok(Function::new(move |rt, _this, args| {
            match args.split_first() {
                Some((target, rest)) => rt.call_interface(iface, &name, target, rest),
                None => rt.call_interface(iface, &name, &Value::Nil, &[]),
            }
        }))
    }
}
