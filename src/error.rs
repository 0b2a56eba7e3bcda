// MetaClass Errors
//
// Construction and dispatch failures. All of them are synchronous and
// leave previously built descriptors untouched.

use std::fmt;

use thiserror::Error;

use crate::meta::MetaKind;

pub type MetaResult<T> = Result<T, MetaError>;

/// Which kind of declaration an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Type,
    Interface,
    MetaType,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclKind::Type => write!(f, "type"),
            DeclKind::Interface => write!(f, "interface"),
            DeclKind::MetaType => write!(f, "meta-type"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MetaError {
    #[error("{0} declarations require an explicit name")]
    Naming(DeclKind),

    #[error("cannot instantiate abstract type {name}")]
    AbstractInstantiation { name: String },

    #[error(transparent)]
    Conformance(#[from] ConformanceError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("meta-type {meta} builds {actual} declarations, not {expected} declarations")]
    MetaKindMismatch {
        meta: String,
        expected: MetaKind,
        actual: MetaKind,
    },

    #[error("cannot determine the meta-interface of {name}: none of its prerequisites provides one")]
    UnknownMetaInterface { name: String },

    #[error("unknown {kind} handle {index}")]
    UnknownHandle { kind: &'static str, index: u32 },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Failure raised by a native member body
    #[error("{0}")]
    Raised(String),
}

impl MetaError {
    pub fn raised(message: impl Into<String>) -> Self {
        MetaError::Raised(message.into())
    }

    pub fn as_conformance(&self) -> Option<&ConformanceError> {
        match self {
            MetaError::Conformance(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_dispatch(&self) -> Option<&DispatchError> {
        match self {
            MetaError::Dispatch(err) => Some(err),
            _ => None,
        }
    }
}

/// An interface that a type failed to conform to. Both lists are complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformanceError {
    pub type_name: String,
    pub interface: String,
    pub unmet_prerequisites: Vec<String>,
    pub unimplemented: Vec<String>,
}

impl fmt::Display for ConformanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        if !self.unmet_prerequisites.is_empty() {
            write!(
                f,
                "{}: the following interfaces must be implemented before {}: {}",
                self.type_name,
                self.interface,
                self.unmet_prerequisites.join(", ")
            )?;
            first = false;
        }
        if !self.unimplemented.is_empty() {
            if first {
                write!(f, "{}: ", self.type_name)?;
            } else {
                write!(f, "; ")?;
            }
            write!(
                f,
                "the following members of {} are not implemented yet: {}",
                self.interface,
                self.unimplemented.join(", ")
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for ConformanceError {}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("super dispatch is only available inside a method body")]
    NoActiveContext,

    #[error("the method '{method}' is not on the ancestor {ancestor}")]
    MissingAncestorMember { method: String, ancestor: String },

    #[error("{owner} has no ancestor to dispatch '{method}' to")]
    NoAncestor { method: String, owner: String },

    #[error("member '{member}' is not implemented")]
    NotImplemented { member: String },

    #[error("member '{member}' of {owner} is not callable")]
    NotCallable { member: String, owner: String },

    #[error("{owner} has no member '{member}'")]
    NoSuchMember { member: String, owner: String },

    #[error("member '{member}' of {owner} is read-only")]
    ReadOnly { member: String, owner: String },

    #[error("receiver is a {found}, not an instance")]
    NotAnInstance { found: &'static str },

    #[error("call depth exceeded the configured limit of {limit}")]
    CallDepthExceeded { limit: usize },
}
