// MetaClass Runtime - the descriptor registry
//
// Owns every type, interface, meta-type and instance. Descriptors are
// addressed by index handles and are immutable once registered; only
// instances carry mutable state (fields and the live dispatch context).

use std::collections::HashMap;
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::{debug, info};

use crate::class::{TypeDescriptor, TypeSpec};
use crate::config::Config;
use crate::context::DispatchContext;
use crate::error::{DeclKind, MetaError, MetaResult};
use crate::interface::{InterfaceDescriptor, InterfaceSpec};
use crate::member::{Member, MemberTableBuilder};
use crate::meta::{MetaKind, MetaTypeDescriptor, StandardClass, StandardInterface};
use crate::symbol::{SymbolId, SymbolTable};
use crate::types::{InstanceId, InterfaceId, MetaTypeId, TypeId, Value};

/// A live object
#[derive(Debug, Clone)]
pub struct Instance {
    pub(crate) ty: TypeId,
    pub(crate) fields: HashMap<SymbolId, Value>,
    /// Set only while a wrapped member runs on this instance
    pub(crate) dispatch: Option<DispatchContext>,
}

impl Instance {
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    pub fn field(&self, name: SymbolId) -> Option<&Value> {
        self.fields.get(&name)
    }

    pub fn dispatch(&self) -> Option<DispatchContext> {
        self.dispatch
    }
}

/// The metaobject registry
pub struct Runtime {
    pub(crate) config: Config,
    pub(crate) symbols: SymbolTable,
    pub(crate) types: Vec<TypeDescriptor>,
    pub(crate) type_names: HashMap<String, TypeId>,
    pub(crate) interfaces: Vec<InterfaceDescriptor>,
    pub(crate) interface_names: HashMap<String, InterfaceId>,
    pub(crate) metas: Vec<MetaTypeDescriptor>,
    pub(crate) meta_names: HashMap<String, MetaTypeId>,
    pub(crate) instances: Vec<Instance>,
    /// Current nesting of trampoline invocations
    pub(crate) depth: usize,
    pub(crate) root: TypeId,
    pub(crate) class_meta: MetaTypeId,
    pub(crate) interface_meta: MetaTypeId,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut rt = Self {
            config,
            symbols: SymbolTable::new(),
            types: Vec::new(),
            type_names: HashMap::new(),
            interfaces: Vec::new(),
            interface_names: HashMap::new(),
            metas: Vec::new(),
            meta_names: HashMap::new(),
            instances: Vec::new(),
            depth: 0,
            root: TypeId(0),
            class_meta: MetaTypeId(0),
            interface_meta: MetaTypeId(1),
        };
        rt.bootstrap();
        rt
    }

    fn bootstrap(&mut self) {
        let class_name = self.config.class_meta_name.clone();
        let interface_name = self.config.interface_meta_name.clone();
        self.meta_names.insert(class_name.clone(), self.class_meta);
        self.metas.push(MetaTypeDescriptor::bootstrap(
            self.class_meta,
            class_name,
            MetaKind::Type,
            Some(self.interface_meta),
            Rc::new(StandardClass),
        ));
        self.meta_names.insert(interface_name.clone(), self.interface_meta);
        self.metas.push(MetaTypeDescriptor::bootstrap(
            self.interface_meta,
            interface_name,
            MetaKind::Interface,
            None,
            Rc::new(StandardInterface),
        ));

        let root = self.root;
        let init = self.symbols.intern_reserved("_init");
        let to_string = self.symbols.intern_reserved("toString");
        let mut builder = MemberTableBuilder::new();
        builder.insert(
            init,
            Member::method(|_, _, _| Ok(Value::Nil)).wrap_for(init, root),
        );
        builder.insert(
            to_string,
            Member::method(|rt, this, _| {
                let text = match this.as_instance() {
                    Some(id) => rt.instance_tag(id),
                    None => crate::printer::prin1_to_string(rt, this),
                };
                Ok(Value::String(text))
            })
            .wrap_for(to_string, root),
        );
        let implements = self.symbols.intern_reserved("implements");
        builder.insert(
            implements,
            Member::method(|rt, this, args| {
                let ty = this
                    .as_instance()
                    .and_then(|id| rt.get_instance(id))
                    .map(Instance::ty);
                let answer = match (ty, args.first()) {
                    (Some(ty), Some(Value::Interface(iface))) => rt.implements(ty, *iface),
                    _ => false,
                };
                Ok(Value::Bool(answer))
            })
            .wrap_for(implements, root),
        );

        let name = self.config.root_type_name.clone();
        self.type_names.insert(name.clone(), root);
        self.types.push(TypeDescriptor {
            id: root,
            name,
            ancestor: None,
            is_abstract: true,
            interfaces: SmallVec::new(),
            members: builder.freeze(),
            meta: self.class_meta,
            lineage: vec![root],
        });
        info!(
            root = %self.config.root_type_name,
            class_meta = %self.config.class_meta_name,
            interface_meta = %self.config.interface_meta_name,
            "runtime bootstrapped"
        );
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The abstract root every ancestor chain ends at
    pub fn root(&self) -> TypeId {
        self.root
    }

    /// The standard meta-type for types
    pub fn class_meta(&self) -> MetaTypeId {
        self.class_meta
    }

    /// The standard meta-type for interfaces
    pub fn interface_meta(&self) -> MetaTypeId {
        self.interface_meta
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn get_type(&self, id: TypeId) -> Option<&TypeDescriptor> {
        self.types.get(id.0 as usize)
    }

    pub fn get_interface(&self, id: InterfaceId) -> Option<&InterfaceDescriptor> {
        self.interfaces.get(id.0 as usize)
    }

    pub fn get_meta_type(&self, id: MetaTypeId) -> Option<&MetaTypeDescriptor> {
        self.metas.get(id.0 as usize)
    }

    pub fn get_instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(id.0 as usize)
    }

    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        self.type_names.get(name).copied()
    }

    pub fn find_interface(&self, name: &str) -> Option<InterfaceId> {
        self.interface_names.get(name).copied()
    }

    pub fn find_meta_type(&self, name: &str) -> Option<MetaTypeId> {
        self.meta_names.get(name).copied()
    }

    pub(crate) fn type_ref(&self, id: TypeId) -> MetaResult<&TypeDescriptor> {
        self.get_type(id).ok_or(MetaError::UnknownHandle {
            kind: "type",
            index: id.0,
        })
    }

    pub(crate) fn interface_ref(&self, id: InterfaceId) -> MetaResult<&InterfaceDescriptor> {
        self.get_interface(id).ok_or(MetaError::UnknownHandle {
            kind: "interface",
            index: id.0,
        })
    }

    pub(crate) fn meta_ref(&self, id: MetaTypeId) -> MetaResult<&MetaTypeDescriptor> {
        self.get_meta_type(id).ok_or(MetaError::UnknownHandle {
            kind: "meta-type",
            index: id.0,
        })
    }

    pub(crate) fn instance_ref(&self, id: InstanceId) -> MetaResult<&Instance> {
        self.get_instance(id).ok_or(MetaError::UnknownHandle {
            kind: "instance",
            index: id.0,
        })
    }

    pub(crate) fn instance_mut(&mut self, id: InstanceId) -> MetaResult<&mut Instance> {
        self.instances
            .get_mut(id.0 as usize)
            .ok_or(MetaError::UnknownHandle {
                kind: "instance",
                index: id.0,
            })
    }

    // ========================================================================
    // Declaration
    // ========================================================================

    /// Declare a type through the standard class meta-type.
    pub fn declare_type(&mut self, spec: TypeSpec) -> MetaResult<TypeId> {
        self.declare_type_with(self.class_meta, spec)
    }

    /// Declare a type with `handler` receiving the request. The spec's own
    /// meta-type, or its ancestor's, takes over when present.
    pub fn declare_type_with(&mut self, handler: MetaTypeId, spec: TypeSpec) -> MetaResult<TypeId> {
        if spec.name().map_or(true, str::is_empty) {
            return Err(MetaError::Naming(DeclKind::Type));
        }
        let meta = self.resolve_type_meta(&spec, handler)?;
        if meta != handler {
            debug!(ty = ?spec.name(), from = handler.0, to = meta.0, "meta-type hand-off");
        }
        self.expect_meta_kind(meta, MetaKind::Type)?;
        let imp = self.meta_ref(meta)?.imp();
        imp.build_type(self, meta, spec)
    }

    /// Declare an interface through the standard interface meta-type.
    pub fn declare_interface(&mut self, spec: InterfaceSpec) -> MetaResult<InterfaceId> {
        self.declare_interface_with(self.interface_meta, spec)
    }

    /// Declare an interface with `handler` receiving the request. Without an
    /// explicit meta-type, the prerequisites decide.
    pub fn declare_interface_with(
        &mut self,
        handler: MetaTypeId,
        spec: InterfaceSpec,
    ) -> MetaResult<InterfaceId> {
        if spec.name().map_or(true, str::is_empty) {
            return Err(MetaError::Naming(DeclKind::Interface));
        }
        let meta = self.resolve_interface_meta(&spec, handler)?;
        if meta != handler {
            debug!(iface = ?spec.name(), from = handler.0, to = meta.0, "meta-type hand-off");
        }
        self.expect_meta_kind(meta, MetaKind::Interface)?;
        let imp = self.meta_ref(meta)?.imp();
        imp.build_interface(self, meta, spec)
    }

    // ========================================================================
    // Instances
    // ========================================================================

    /// Create an instance through the type's meta-type. Abstract types are
    /// rejected before any meta-type hook runs.
    pub fn instantiate(&mut self, ty: TypeId, args: &[Value]) -> MetaResult<Value> {
        let descriptor = self.type_ref(ty)?;
        if descriptor.is_abstract {
            return Err(MetaError::AbstractInstantiation {
                name: descriptor.name.clone(),
            });
        }
        let meta = descriptor.meta;
        let imp = self.meta_ref(meta)?.imp();
        imp.instantiate(self, ty, args)
    }

    /// Standard instance creation: allocate, then run `_init` with `args`.
    pub fn construct_instance(&mut self, ty: TypeId, args: &[Value]) -> MetaResult<Value> {
        let descriptor = self.type_ref(ty)?;
        if descriptor.is_abstract {
            return Err(MetaError::AbstractInstantiation {
                name: descriptor.name.clone(),
            });
        }
        let id = InstanceId(self.instances.len() as u32);
        self.instances.push(Instance {
            ty,
            fields: HashMap::new(),
            dispatch: None,
        });
        let this = Value::Instance(id);
        self.call_method(&this, "_init", args)?;
        Ok(this)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_registers_standard_descriptors() {
        let rt = Runtime::new();
        assert_eq!(rt.find_type("Object"), Some(rt.root()));
        assert_eq!(rt.find_meta_type("Class"), Some(rt.class_meta()));
        assert_eq!(rt.find_meta_type("Interface"), Some(rt.interface_meta()));
        let root = rt.get_type(rt.root()).unwrap();
        assert!(root.is_abstract());
        assert_eq!(root.ancestor(), None);
        let init = rt.symbols().find("_init").unwrap();
        assert!(rt.symbols().is_reserved(init));
        assert!(root.members().get(init).unwrap().as_function().unwrap().is_wrapped());
    }

    #[test]
    fn root_cannot_be_instantiated() {
        let mut rt = Runtime::new();
        let root = rt.root();
        let err = rt.instantiate(root, &[]).unwrap_err();
        assert!(matches!(err, MetaError::AbstractInstantiation { ref name } if name == "Object"));
    }

    #[test]
    fn configured_names_are_used() {
        let config = Config {
            root_type_name: "Base".to_string(),
            class_meta_name: "Meta".to_string(),
            ..Config::default()
        };
        let rt = Runtime::with_config(config);
        assert_eq!(rt.find_type("Base"), Some(rt.root()));
        assert_eq!(rt.type_to_string(rt.root()), "[object Meta for Base]");
    }

    #[test]
    fn init_receives_arguments() {
        let mut rt = Runtime::new();
        let point = rt
            .declare_type(TypeSpec::new("Point").method("_init", |rt, this, args| {
                rt.set(this, "x", args.first().cloned().unwrap_or(Value::Nil))?;
                Ok(Value::Nil)
            }))
            .unwrap();
        let p = rt.instantiate(point, &[Value::Integer(7)]).unwrap();
        assert_eq!(rt.get(&p, "x").unwrap(), Value::Integer(7));
        assert_eq!(rt.get_instance(p.as_instance().unwrap()).unwrap().ty(), point);
    }

    #[test]
    fn unknown_handles_are_reported() {
        let mut rt = Runtime::new();
        let err = rt.instantiate(TypeId(99), &[]).unwrap_err();
        assert!(matches!(err, MetaError::UnknownHandle { kind: "type", index: 99 }));
    }
}
