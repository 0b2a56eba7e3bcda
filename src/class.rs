// MetaClass Types - declarative type specs and the construction protocol
//
// A type owns a flattened member table plus the interfaces it attaches.
// Interface members are copied in at construction; only the ancestor link is
// chained for lookup.

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::conformance::Candidate;
use crate::error::{DeclKind, MetaError, MetaResult};
use crate::member::{Accessor, Function, Member, MemberTable, MemberTableBuilder};
use crate::runtime::Runtime;
use crate::symbol::SymbolId;
use crate::types::{InterfaceId, MetaTypeId, TypeId, Value};

/// Declarative record for a type
#[derive(Clone, Debug, Default)]
pub struct TypeSpec {
    name: Option<String>,
    ancestor: Option<TypeId>,
    is_abstract: bool,
    meta_type: Option<MetaTypeId>,
    implements: Vec<InterfaceId>,
    members: Vec<(String, Member)>,
}

impl TypeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A spec without identity; declaring it fails with a naming error.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn extends(mut self, ancestor: TypeId) -> Self {
        self.ancestor = Some(ancestor);
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn meta_type(mut self, meta: MetaTypeId) -> Self {
        self.meta_type = Some(meta);
        self
    }

    /// Attach an interface. Order is significant for prerequisite checks.
    pub fn implements(mut self, iface: InterfaceId) -> Self {
        self.implements.push(iface);
        self
    }

    /// Declare a member. A later declaration of the same name wins.
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

    pub fn abstract_member(self, name: impl Into<String>) -> Self {
        self.member(name, Member::Abstract)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn ancestor(&self) -> Option<TypeId> {
        self.ancestor
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn requested_meta(&self) -> Option<MetaTypeId> {
        self.meta_type
    }

    pub fn interfaces(&self) -> &[InterfaceId] {
        &self.implements
    }
}

/// A ready, immutable type
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    pub(crate) id: TypeId,
    pub(crate) name: String,
    pub(crate) ancestor: Option<TypeId>,
    pub(crate) is_abstract: bool,
    /// Interfaces attached here (inherited ones excluded), in declaration order
    pub(crate) interfaces: SmallVec<[InterfaceId; 4]>,
    pub(crate) members: MemberTable,
    pub(crate) meta: MetaTypeId,
    /// This type followed by its ancestors, ending at the root
    pub(crate) lineage: Vec<TypeId>,
}

impl TypeDescriptor {
    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` only for the root type.
    pub fn ancestor(&self) -> Option<TypeId> {
        self.ancestor
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn interfaces(&self) -> &[InterfaceId] {
        &self.interfaces
    }

    pub fn members(&self) -> &MemberTable {
        &self.members
    }

    pub fn meta(&self) -> MetaTypeId {
        self.meta
    }

    pub fn lineage(&self) -> &[TypeId] {
        &self.lineage
    }
}

impl Runtime {
    /// The construction protocol run by the standard class meta-type.
    ///
    /// Nothing is registered unless every attached interface conforms.
    pub fn construct_type(&mut self, meta: MetaTypeId, spec: TypeSpec) -> MetaResult<TypeId> {
        let TypeSpec {
            name,
            ancestor,
            is_abstract,
            implements,
            members,
            ..
        } = spec;
        let name = name
            .filter(|n| !n.is_empty())
            .ok_or(MetaError::Naming(DeclKind::Type))?;

        let ancestor = ancestor.unwrap_or(self.root);
        let mut lineage = self.type_ref(ancestor)?.lineage.clone();
        for &iface in &implements {
            self.interface_ref(iface)?;
        }

        let id = TypeId(self.types.len() as u32);
        lineage.insert(0, id);
        let attached = self.attach_list(ancestor, &implements);

        let mut builder = MemberTableBuilder::new();
        for &iface in &attached {
            let descriptor = self.interface_ref(iface)?;
            for (sym, member) in descriptor.members.iter() {
                if builder.get(sym).is_some_and(|m| !m.is_abstract()) {
                    continue;
                }
                if self
                    .lookup_member(ancestor, sym)
                    .is_some_and(|(_, m)| !m.is_abstract())
                {
                    continue;
                }
                builder.insert(sym, member.wrap_for(sym, id));
            }
        }
        for (member_name, member) in &members {
            let sym = self.symbols.intern(member_name);
            builder.insert(sym, member.wrap_for(sym, id));
        }
        let members = builder.freeze();
        trace!(ty = %name, members = members.len(), "member table frozen");

        let candidate = Candidate {
            name: &name,
            ancestor,
            members: &members,
            interfaces: attached.as_slice(),
        };
        for &iface in &attached {
            self.check_conformance(&candidate, iface)?;
        }

        debug!(
            ty = %name,
            id = id.0,
            ancestor = ancestor.0,
            meta = meta.0,
            interfaces = attached.len(),
            "type declared"
        );
        self.type_names.insert(name.clone(), id);
        self.types.push(TypeDescriptor {
            id,
            name,
            ancestor: Some(ancestor),
            is_abstract,
            interfaces: attached,
            members,
            meta,
            lineage,
        });
        Ok(id)
    }

    /// Requested interfaces minus those the ancestor already implements, first
    /// occurrence kept.
    fn attach_list(&self, ancestor: TypeId, requested: &[InterfaceId]) -> SmallVec<[InterfaceId; 4]> {
        let mut attached: SmallVec<[InterfaceId; 4]> = SmallVec::new();
        for &iface in requested {
            if self.implements(ancestor, iface) {
                trace!(iface = iface.0, "inherited from ancestor, not re-attached");
                continue;
            }
            if !attached.contains(&iface) {
                attached.push(iface);
            }
        }
        attached
    }

    /// Find a member along the lineage of `ty`, returning the type that owns it.
    pub fn lookup_member(&self, ty: TypeId, name: SymbolId) -> Option<(TypeId, &Member)> {
        let descriptor = self.get_type(ty)?;
        descriptor.lineage.iter().find_map(|&t| {
            self.get_type(t)
                .and_then(|d| d.members.get(name))
                .map(|member| (t, member))
        })
    }

    /// Whether `ty` is `ancestor` or descends from it.
    pub fn descends_from(&self, ty: TypeId, ancestor: TypeId) -> bool {
        self.get_type(ty)
            .map(|d| d.lineage.contains(&ancestor))
            .unwrap_or(false)
    }
}
