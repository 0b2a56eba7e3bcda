// MetaClass Dispatch - trampoline invocation and super dispatch
//
// A wrapped function installs its dispatch context on the receiving instance
// for the duration of its body and restores the previous one afterwards, on
// success and on error alike. Super dispatch only ever reads the live
// context, so recursion and re-entry resolve against the innermost call.

use tracing::trace;

use crate::context::{CallKind, DispatchContext};
use crate::error::{DispatchError, MetaResult};
use crate::member::{Function, Member};
use crate::runtime::Runtime;
use crate::types::{InstanceId, Value};

impl Runtime {
    /// Invoke a function through the trampoline.
    pub fn invoke(&mut self, function: &Function, this: &Value, args: &[Value]) -> MetaResult<Value> {
        let limit = self.config.max_call_depth;
        if self.depth >= limit {
            return Err(DispatchError::CallDepthExceeded { limit }.into());
        }
        self.depth += 1;
        let result = self.invoke_body(function, this, args);
        self.depth -= 1;
        result
    }

    fn invoke_body(&mut self, function: &Function, this: &Value, args: &[Value]) -> MetaResult<Value> {
        let body = function.body();
        let (Some(context), Value::Instance(id)) = (function.context(), this) else {
            return (*body)(self, this, args);
        };

        let previous = self.swap_dispatch(*id, Some(context))?;
        trace!(
            instance = id.0,
            method = %self.symbols.name(context.name),
            owner = context.owner.0,
            depth = self.depth,
            "enter"
        );
        let result = (*body)(self, this, args);
        self.swap_dispatch(*id, previous)?;
        result
    }

    fn swap_dispatch(
        &mut self,
        id: InstanceId,
        context: Option<DispatchContext>,
    ) -> MetaResult<Option<DispatchContext>> {
        let instance = self.instance_mut(id)?;
        Ok(std::mem::replace(&mut instance.dispatch, context))
    }

    /// The context of the wrapped call currently executing on `this`.
    pub fn dispatch_context(&self, this: &Value) -> Option<DispatchContext> {
        this.as_instance()
            .and_then(|id| self.get_instance(id))
            .and_then(|instance| instance.dispatch)
    }

    /// Call the ancestor implementation of the member currently executing on
    /// `this`, with the same receiver.
    pub fn call_super(&mut self, this: &Value, args: &[Value]) -> MetaResult<Value> {
        let context = self
            .dispatch_context(this)
            .ok_or(DispatchError::NoActiveContext)?;
        let method = self.symbols.name(context.name).to_string();
        let owner = self.type_ref(context.owner)?;
        let Some(ancestor) = owner.ancestor else {
            return Err(DispatchError::NoAncestor {
                method,
                owner: owner.name.clone(),
            }
            .into());
        };

        let Some((found_on, member)) = self.lookup_member(ancestor, context.name) else {
            return Err(DispatchError::MissingAncestorMember {
                method,
                ancestor: self.type_ref(ancestor)?.name.clone(),
            }
            .into());
        };
        let found_name = || self.get_type(found_on).map(|d| d.name.clone()).unwrap_or_default();

        let function = match (member, context.kind) {
            (Member::Value(Value::Function(f)), CallKind::Method) => f.clone(),
            (Member::Accessor(accessor), CallKind::Getter) => {
                accessor.get.clone().ok_or_else(|| DispatchError::NotCallable {
                    member: method.clone(),
                    owner: found_name(),
                })?
            }
            (Member::Accessor(accessor), CallKind::Setter) => {
                accessor.set.clone().ok_or_else(|| DispatchError::ReadOnly {
                    member: method.clone(),
                    owner: found_name(),
                })?
            }
            (Member::Abstract, _) => {
                return Err(DispatchError::NotImplemented { member: method }.into());
            }
            _ => {
                return Err(DispatchError::NotCallable {
                    member: method,
                    owner: found_name(),
                }
                .into());
            }
        };

        trace!(method = %method, from = context.owner.0, to = found_on.0, "super");
        self.invoke(&function, this, args)
    }

    /// Read a property: own field, then member value or getter.
    pub fn get(&mut self, this: &Value, name: &str) -> MetaResult<Value> {
        let id = expect_instance(this)?;
        let ty = self.instance_ref(id)?.ty;
        let no_such_member = |rt: &Runtime| DispatchError::NoSuchMember {
            member: name.to_string(),
            owner: rt.get_type(ty).map(|d| d.name.clone()).unwrap_or_default(),
        };
        let Some(sym) = self.symbols.find(name) else {
            return Err(no_such_member(self).into());
        };
        if let Some(value) = self.instance_ref(id)?.fields.get(&sym) {
            return Ok(value.clone());
        }

        let getter = match self.lookup_member(ty, sym) {
            Some((_, Member::Value(value))) => return Ok(value.clone()),
            Some((_, Member::Accessor(accessor))) => accessor.get.clone(),
            Some((_, Member::Abstract)) => {
                return Err(DispatchError::NotImplemented {
                    member: name.to_string(),
                }
                .into())
            }
            None => return Err(no_such_member(self).into()),
        };
        match getter {
            Some(getter) => self.invoke(&getter, this, &[]),
            None => Ok(Value::Nil),
        }
    }

    /// Write a property: setter when the member is an accessor, own field
    /// otherwise.
    pub fn set(&mut self, this: &Value, name: &str, value: Value) -> MetaResult<()> {
        let id = expect_instance(this)?;
        let ty = self.instance_ref(id)?.ty;
        let sym = self.symbols.intern(name);

        if let Some((owner, Member::Accessor(accessor))) = self.lookup_member(ty, sym) {
            let Some(setter) = accessor.set.clone() else {
                return Err(DispatchError::ReadOnly {
                    member: name.to_string(),
                    owner: self.type_ref(owner)?.name.clone(),
                }
                .into());
            };
            self.invoke(&setter, this, &[value])?;
            return Ok(());
        }

        self.instance_mut(id)?.fields.insert(sym, value);
        Ok(())
    }

    /// Call a method: a function in an own field, else a member function.
    pub fn call_method(&mut self, this: &Value, name: &str, args: &[Value]) -> MetaResult<Value> {
        let id = expect_instance(this)?;
        let ty = self.instance_ref(id)?.ty;
        let owner_name = |rt: &Runtime| rt.get_type(ty).map(|d| d.name.clone()).unwrap_or_default();
        let Some(sym) = self.symbols.find(name) else {
            return Err(DispatchError::NoSuchMember {
                member: name.to_string(),
                owner: owner_name(self),
            }
            .into());
        };

        let function = match self.instance_ref(id)?.fields.get(&sym) {
            Some(Value::Function(f)) => f.clone(),
            Some(_) => {
                return Err(DispatchError::NotCallable {
                    member: name.to_string(),
                    owner: owner_name(self),
                }
                .into())
            }
            None => match self.lookup_member(ty, sym) {
                Some((_, Member::Value(Value::Function(f)))) => f.clone(),
                Some((_, Member::Abstract)) => {
                    return Err(DispatchError::NotImplemented {
                        member: name.to_string(),
                    }
                    .into())
                }
                Some(_) => {
                    return Err(DispatchError::NotCallable {
                        member: name.to_string(),
                        owner: owner_name(self),
                    }
                    .into())
                }
                None => {
                    return Err(DispatchError::NoSuchMember {
                        member: name.to_string(),
                        owner: owner_name(self),
                    }
                    .into())
                }
            },
        };
        self.invoke(&function, this, args)
    }
}

fn expect_instance(this: &Value) -> Result<InstanceId, DispatchError> {
    this.as_instance().ok_or(DispatchError::NotAnInstance {
        found: this.type_name(),
    })
}
