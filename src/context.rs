use crate::symbol::SymbolId;
use crate::types::TypeId;

/// How a trampoline-wrapped function was installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Method,
    Getter,
    Setter,
}

/// The per-call record super dispatch resolves against.
///
/// A wrapped function carries the context it installs; the instance holds the
/// live one only while that function's body runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchContext {
    /// Declared member name
    pub name: SymbolId,
    /// Type whose member table the function was installed into
    pub owner: TypeId,
    pub kind: CallKind,
}

impl DispatchContext {
    pub fn new(name: SymbolId, owner: TypeId, kind: CallKind) -> Self {
        Self { name, owner, kind }
    }
}
