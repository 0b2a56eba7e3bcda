// MetaClass: Runtime Metaobject System
// This crate turns declarative type and interface specifications into live
// descriptors with single inheritance, interface composition, super dispatch
// and pluggable meta-types.

pub mod symbol;
pub mod types;
pub mod error;
pub mod config;
pub mod context;
pub mod member;
pub mod meta;
pub mod class;
pub mod interface;
pub mod conformance;
pub mod dispatch;
pub mod printer;
pub mod runtime;

pub use class::{TypeDescriptor, TypeSpec};
pub use config::Config;
pub use context::{CallKind, DispatchContext};
pub use error::{ConformanceError, DeclKind, DispatchError, MetaError, MetaResult};
pub use interface::{InterfaceDescriptor, InterfaceSpec, Prerequisite};
pub use member::{Accessor, Function, Member, MemberTable};
pub use meta::{MetaKind, MetaType, MetaTypeDescriptor, MetaTypeSpec, StandardClass, StandardInterface};
pub use printer::{prin1_to_string, PrintOptions, Printer};
pub use runtime::{Instance, Runtime};
pub use symbol::{SymbolId, SymbolTable};
pub use types::{InstanceId, InterfaceId, MetaTypeId, TypeId, Value};
