// MetaClass Conformance - prerequisite ordering and abstract member checks
//
// Runs against a type that is built but not yet registered, so a failure
// leaves no trace in the runtime.

use tracing::debug;

use crate::error::{ConformanceError, MetaResult};
use crate::interface::Prerequisite;
use crate::member::MemberTable;
use crate::runtime::Runtime;
use crate::symbol::SymbolId;
use crate::types::{InterfaceId, TypeId};

/// A type under construction as the checker sees it
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate<'a> {
    pub name: &'a str,
    pub ancestor: TypeId,
    pub members: &'a MemberTable,
    /// Interfaces attached by the candidate itself, in declaration order
    pub interfaces: &'a [InterfaceId],
}

impl Runtime {
    /// Check one attached interface. Reports every unmet prerequisite and
    /// every unimplemented placeholder at once.
    pub(crate) fn check_conformance(
        &self,
        candidate: &Candidate<'_>,
        iface: InterfaceId,
    ) -> MetaResult<()> {
        let descriptor = self.interface_ref(iface)?;
        let position = candidate.interfaces.iter().position(|&i| i == iface);

        let unmet_prerequisites: Vec<String> = descriptor
            .prerequisites
            .iter()
            .filter(|&&req| !self.prerequisite_met(candidate, position, req))
            .map(|&req| self.prerequisite_name(req))
            .collect();

        let unimplemented: Vec<String> = descriptor
            .members
            .iter()
            .filter(|(_, member)| member.is_abstract())
            .filter(|&(name, _)| !self.candidate_implements(candidate, name))
            .map(|(name, _)| self.symbols.name(name).to_string())
            .collect();

        if unmet_prerequisites.is_empty() && unimplemented.is_empty() {
            debug!(ty = %candidate.name, iface = %descriptor.name, "conforms");
            return Ok(());
        }
        debug!(
            ty = %candidate.name,
            iface = %descriptor.name,
            unmet = unmet_prerequisites.len(),
            unimplemented = unimplemented.len(),
            "conformance failed"
        );
        Err(ConformanceError {
            type_name: candidate.name.to_string(),
            interface: descriptor.name.clone(),
            unmet_prerequisites,
            unimplemented,
        }
        .into())
    }

    fn prerequisite_met(
        &self,
        candidate: &Candidate<'_>,
        position: Option<usize>,
        prerequisite: Prerequisite,
    ) -> bool {
        match prerequisite {
            // The candidate is not registered yet, so only its ancestor chain
            // can contain the required type.
            Prerequisite::Type(required) => self.descends_from(candidate.ancestor, required),
            Prerequisite::Interface(required) => {
                match candidate.interfaces.iter().position(|&i| i == required) {
                    Some(at) => position.map_or(true, |own| at < own),
                    None => self.implements(candidate.ancestor, required),
                }
            }
        }
    }

    fn prerequisite_name(&self, prerequisite: Prerequisite) -> String {
        match prerequisite {
            Prerequisite::Interface(id) => self
                .get_interface(id)
                .map(|d| d.name.clone())
                .unwrap_or_else(|| format!("#<interface {}>", id.0)),
            Prerequisite::Type(id) => self
                .get_type(id)
                .map(|d| d.name.clone())
                .unwrap_or_else(|| format!("#<type {}>", id.0)),
        }
    }

    /// Whether `name` resolves to a non-placeholder on the candidate.
    fn candidate_implements(&self, candidate: &Candidate<'_>, name: SymbolId) -> bool {
        match candidate.members.get(name) {
            Some(member) => !member.is_abstract(),
            None => self
                .lookup_member(candidate.ancestor, name)
                .is_some_and(|(_, member)| !member.is_abstract()),
        }
    }

    /// Whether `ty` or one of its ancestors attached `iface`.
    pub fn implements(&self, ty: TypeId, iface: InterfaceId) -> bool {
        let Some(descriptor) = self.get_type(ty) else {
            return false;
        };
        descriptor.lineage.iter().any(|&t| {
            self.get_type(t)
                .is_some_and(|d| d.interfaces.contains(&iface))
        })
    }

    /// Public conformance query. Satisfaction inherited from an ancestor is
    /// not re-validated.
    pub fn conforms_to(&self, ty: TypeId, iface: InterfaceId) -> bool {
        self.implements(ty, iface)
    }
}

#[cfg(test)]
mod tests {
    use crate::class::TypeSpec;
    use crate::interface::InterfaceSpec;
    use crate::runtime::Runtime;
    use crate::types::Value;

    #[test]
    fn own_member_satisfies_placeholder() {
        let mut rt = Runtime::new();
        let sized = rt
            .declare_interface(InterfaceSpec::new("Sized").abstract_member("size"))
            .unwrap();
        let list = rt
            .declare_type(
                TypeSpec::new("List")
                    .implements(sized)
                    .method("size", |_, _, _| Ok(Value::Integer(0))),
            )
            .unwrap();
        assert!(rt.conforms_to(list, sized));
    }

    #[test]
    fn both_failures_are_reported_together() {
        let mut rt = Runtime::new();
        let a = rt.declare_interface(InterfaceSpec::new("A")).unwrap();
        let b = rt
            .declare_interface(
                InterfaceSpec::new("B")
                    .requires(a)
                    .abstract_member("x")
                    .abstract_member("y"),
            )
            .unwrap();
        let err = rt
            .declare_type(TypeSpec::new("T").implements(b).value("y", 1))
            .unwrap_err();
        let conformance = err.as_conformance().unwrap();
        assert_eq!(conformance.unmet_prerequisites, vec!["A".to_string()]);
        assert_eq!(conformance.unimplemented, vec!["x".to_string()]);
        assert!(rt.find_type("T").is_none());
    }

    #[test]
    fn type_prerequisite_needs_descent() {
        let mut rt = Runtime::new();
        let widget = rt.declare_type(TypeSpec::new("Widget")).unwrap();
        let focusable = rt
            .declare_interface(InterfaceSpec::new("Focusable").requires(widget))
            .unwrap();

        let err = rt
            .declare_type(TypeSpec::new("Label").implements(focusable))
            .unwrap_err();
        assert_eq!(
            err.as_conformance().unwrap().unmet_prerequisites,
            vec!["Widget".to_string()]
        );

        let button = rt
            .declare_type(TypeSpec::new("Button").extends(widget).implements(focusable))
            .unwrap();
        assert!(rt.conforms_to(button, focusable));
    }
}
