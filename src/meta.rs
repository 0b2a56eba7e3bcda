// MetaClass Meta-Types - pluggable construction machinery
//
// Every descriptor is built by a meta-type. A declaration names one
// explicitly, inherits its ancestor's, or falls back to the meta-type that
// received the request. Meta-types are declared through specs of their own
// and form ancestor chains, the same way the types they build do.

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::class::TypeSpec;
use crate::error::{DeclKind, MetaError, MetaResult};
use crate::interface::{InterfaceSpec, Prerequisite};
use crate::runtime::Runtime;
use crate::types::{InterfaceId, MetaTypeId, TypeId, Value};

/// What a meta-type builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKind {
    Type,
    Interface,
}

impl fmt::Display for MetaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaKind::Type => write!(f, "type"),
            MetaKind::Interface => write!(f, "interface"),
        }
    }
}

/// Construction strategy. The defaults run the standard protocol; embedding
/// environments override a hook and usually delegate back to the runtime.
pub trait MetaType {
    fn build_type(&self, rt: &mut Runtime, meta: MetaTypeId, spec: TypeSpec) -> MetaResult<TypeId> {
        rt.construct_type(meta, spec)
    }

    fn build_interface(
        &self,
        rt: &mut Runtime,
        meta: MetaTypeId,
        spec: InterfaceSpec,
    ) -> MetaResult<InterfaceId> {
        rt.construct_interface(meta, spec)
    }

    fn instantiate(&self, rt: &mut Runtime, ty: TypeId, args: &[Value]) -> MetaResult<Value> {
        rt.construct_instance(ty, args)
    }
}

/// The default type meta-type
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardClass;

impl MetaType for StandardClass {}

/// The default interface meta-type
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardInterface;

impl MetaType for StandardInterface {}

/// Declarative record for a new meta-type
pub struct MetaTypeSpec {
    name: Option<String>,
    kind: MetaKind,
    extends: Option<MetaTypeId>,
    standalone: bool,
    meta_interface: Option<MetaTypeId>,
    imp: Rc<dyn MetaType>,
}

impl MetaTypeSpec {
    pub fn new(name: impl Into<String>, kind: MetaKind, imp: impl MetaType + 'static) -> Self {
        Self {
            name: Some(name.into()),
            kind,
            extends: None,
            standalone: false,
            meta_interface: None,
            imp: Rc::new(imp),
        }
    }

    pub fn anonymous(kind: MetaKind, imp: impl MetaType + 'static) -> Self {
        Self {
            name: None,
            ..Self::new(String::new(), kind, imp)
        }
    }

    /// Extend another meta-type of the same kind instead of the standard one.
    pub fn extends(mut self, ancestor: MetaTypeId) -> Self {
        self.extends = Some(ancestor);
        self
    }

    /// Start a new meta-type chain with no ancestor (and so no inherited
    /// meta-interface).
    pub fn standalone(mut self) -> Self {
        self.standalone = true;
        self
    }

    /// Interface meta-type used for interfaces that require types built here.
    pub fn meta_interface(mut self, meta: MetaTypeId) -> Self {
        self.meta_interface = Some(meta);
        self
    }
}

/// A registered meta-type
#[derive(Clone)]
pub struct MetaTypeDescriptor {
    id: MetaTypeId,
    name: String,
    kind: MetaKind,
    ancestor: Option<MetaTypeId>,
    meta_interface: Option<MetaTypeId>,
    imp: Rc<dyn MetaType>,
}

impl MetaTypeDescriptor {
    pub(crate) fn bootstrap(
        id: MetaTypeId,
        name: String,
        kind: MetaKind,
        meta_interface: Option<MetaTypeId>,
        imp: Rc<dyn MetaType>,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            ancestor: None,
            meta_interface,
            imp,
        }
    }

    pub fn id(&self) -> MetaTypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MetaKind {
        self.kind
    }

    pub fn ancestor(&self) -> Option<MetaTypeId> {
        self.ancestor
    }

    pub fn meta_interface(&self) -> Option<MetaTypeId> {
        self.meta_interface
    }

    pub(crate) fn imp(&self) -> Rc<dyn MetaType> {
        Rc::clone(&self.imp)
    }
}

impl fmt::Debug for MetaTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaTypeDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("ancestor", &self.ancestor)
            .field("meta_interface", &self.meta_interface)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// Register a new meta-type.
    pub fn define_meta_type(&mut self, spec: MetaTypeSpec) -> MetaResult<MetaTypeId> {
        let name = spec
            .name
            .filter(|n| !n.is_empty())
            .ok_or(MetaError::Naming(DeclKind::MetaType))?;

        let ancestor = if spec.standalone {
            None
        } else {
            Some(spec.extends.unwrap_or(match spec.kind {
                MetaKind::Type => self.class_meta,
                MetaKind::Interface => self.interface_meta,
            }))
        };
        if let Some(ancestor) = ancestor {
            self.expect_meta_kind(ancestor, spec.kind)?;
        }
        if let Some(meta_interface) = spec.meta_interface {
            self.expect_meta_kind(meta_interface, MetaKind::Interface)?;
        }

        let meta_interface = match (spec.kind, spec.meta_interface) {
            (MetaKind::Interface, _) => None,
            (MetaKind::Type, Some(explicit)) => Some(explicit),
            (MetaKind::Type, None) => match ancestor {
                Some(ancestor) => self.meta_ref(ancestor)?.meta_interface,
                None => None,
            },
        };

        let id = MetaTypeId(self.metas.len() as u32);
        debug!(meta = %name, kind = %spec.kind, ?ancestor, ?meta_interface, "meta-type defined");
        self.meta_names.insert(name.clone(), id);
        self.metas.push(MetaTypeDescriptor {
            id,
            name,
            kind: spec.kind,
            ancestor,
            meta_interface,
            imp: spec.imp,
        });
        Ok(id)
    }

    /// Whether `meta` is `ancestor` or extends it.
    pub fn meta_descends_from(&self, meta: MetaTypeId, ancestor: MetaTypeId) -> bool {
        let mut current = Some(meta);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get_meta_type(id).and_then(|m| m.ancestor);
        }
        false
    }

    pub(crate) fn expect_meta_kind(&self, meta: MetaTypeId, expected: MetaKind) -> MetaResult<()> {
        let descriptor = self.meta_ref(meta)?;
        if descriptor.kind != expected {
            return Err(MetaError::MetaKindMismatch {
                meta: descriptor.name.clone(),
                expected,
                actual: descriptor.kind,
            });
        }
        Ok(())
    }

    /// Explicit override, then the ancestor's meta-type, then `handler`.
    pub(crate) fn resolve_type_meta(
        &self,
        spec: &TypeSpec,
        handler: MetaTypeId,
    ) -> MetaResult<MetaTypeId> {
        if let Some(explicit) = spec.requested_meta() {
            return Ok(explicit);
        }
        if let Some(ancestor) = spec.ancestor() {
            return Ok(self.type_ref(ancestor)?.meta());
        }
        Ok(handler)
    }

    /// Explicit override, then the most derived meta-interface contributed by
    /// the prerequisites, then `handler`.
    pub(crate) fn resolve_interface_meta(
        &self,
        spec: &InterfaceSpec,
        handler: MetaTypeId,
    ) -> MetaResult<MetaTypeId> {
        if let Some(explicit) = spec.requested_meta() {
            return Ok(explicit);
        }
        if spec.prerequisites().is_empty() {
            return Ok(handler);
        }

        let mut best: Option<MetaTypeId> = None;
        for prerequisite in spec.prerequisites() {
            let candidate = match *prerequisite {
                Prerequisite::Interface(iface) => Some(self.interface_ref(iface)?.meta()),
                Prerequisite::Type(ty) => self.meta_ref(self.type_ref(ty)?.meta())?.meta_interface,
            };
            best = match (best, candidate) {
                (None, candidate) => candidate,
                (best, None) => best,
                (Some(best), Some(candidate)) => {
                    if self.meta_descends_from(candidate, best) {
                        Some(candidate)
                    } else {
                        Some(best)
                    }
                }
            };
        }

        best.ok_or_else(|| MetaError::UnknownMetaInterface {
            name: spec.name().unwrap_or("<anonymous>").to_string(),
        })
    }
}
