//! Typed relations between types.
//!
//! A [`Relation`] records one reason why a source type depends on a target type: a base
//! type, a declared interface, a field type, a parameter, an instruction that constructs
//! or calls into another type, and so on. The reason is a [`RelationKind`].

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use bitflags::bitflags;

use crate::metadata::{
    method::{Instruction, MethodDefRc, MethodRefRc},
    typesystem::TypeRefRc,
};

/// A vector of relations
pub type RelationList = Vec<Relation>;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    /// Classification of a [`Relation`].
    ///
    /// Extraction sets exactly one flag per relation; combined values can be used to
    /// describe aggregated edges.
    pub struct RelationKind: u32 {
        /// The target is constructed (`newobj` of a constructor)
        const CONSTRUCTION = 0x0001;
        /// The target type is mentioned by a field type or a type operand
        const TYPE_REFERENCE = 0x0002;
        /// A method of the target is called that may change its state
        const MUTABLE_ACCESS = 0x0004;
        /// A property getter of the target is called
        const IMMUTABLE_ACCESS = 0x0008;
        /// A method of the target is called that could not be resolved
        const UNKNOWN = 0x0010;
        /// The source declares the target interface
        const INTERFACE = 0x0020;
        /// The target implements the source interface
        const INTERFACE_IMPLEMENTATION = 0x0040;
        /// The target is the type of a method parameter
        const METHOD_PARAMETER = 0x0080;
        /// The target is a generic parameter of a method, not produced by extraction
        const METHOD_GENERIC_PARAMETER = 0x0100;
        /// The target is the return type of a method
        const METHOD_RETURN_TYPE = 0x0200;
        /// The target is the base type
        const BASE_TYPE = 0x0400;
        /// The target is a nested type
        const NESTED_TYPE = 0x0800;
        /// The target is a constraint of a generic parameter
        const GENERIC_CONSTRAINT = 0x1000;
        /// The target is the generic definition of an instantiation
        const GENERIC_DEFINITION = 0x2000;
        /// The target is a generic argument of an instantiation
        const GENERIC_PARAMETER = 0x4000;
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }

        let names = self.iter_names().map(|(name, _)| name).collect::<Vec<_>>();
        f.write_str(&names.join(" | "))
    }
}

/// The identity of a relation.
///
/// Two relations with the same identity are duplicates, whatever instruction instance or
/// source method they carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationKey {
    /// Full name of the source type
    pub source: String,
    /// Full name of the target type
    pub target: Option<String>,
    /// Full name of the target method
    pub target_method: Option<String>,
    /// Kind of the relation
    pub kind: RelationKind,
    /// Instruction offset, 0 for declarative relations
    pub offset: u32,
}

/// One typed, directed dependency between two types
#[derive(Debug, Clone)]
pub struct Relation {
    source: TypeRefRc,
    source_method: Option<MethodDefRc>,
    target: Option<TypeRefRc>,
    target_method: Option<MethodRefRc>,
    kind: RelationKind,
    instruction: Option<Instruction>,
    offset: u32,
}

impl Relation {
    /// Create a declarative relation between two types
    ///
    /// ## Arguments
    /// * 'source' - The depending type
    /// * 'target' - The type depended upon
    /// * 'kind'   - Why the source depends on the target
    pub fn new(source: TypeRefRc, target: TypeRefRc, kind: RelationKind) -> Self {
        Relation {
            source,
            source_method: None,
            target: Some(target),
            target_method: None,
            kind,
            instruction: None,
            offset: 0,
        }
    }

    /// Create a relation without a target type
    pub fn untargeted(source: TypeRefRc, kind: RelationKind) -> Self {
        Relation {
            source,
            source_method: None,
            target: None,
            target_method: None,
            kind,
            instruction: None,
            offset: 0,
        }
    }

    /// Attach the method the relation was found in
    #[must_use]
    pub fn in_method(mut self, method: MethodDefRc) -> Self {
        self.source_method = Some(method);
        self
    }

    /// Attach the method of the target that is used
    #[must_use]
    pub fn with_target_method(mut self, method: MethodRefRc) -> Self {
        self.target_method = Some(method);
        self
    }

    /// Attach the instruction the relation was found at, taking over its offset
    #[must_use]
    pub fn at(mut self, instruction: Instruction) -> Self {
        self.offset = instruction.offset;
        self.instruction = Some(instruction);
        self
    }

    /// The depending type
    pub fn source(&self) -> &TypeRefRc {
        &self.source
    }

    /// The method the relation was found in
    pub fn source_method(&self) -> Option<&MethodDefRc> {
        self.source_method.as_ref()
    }

    /// The type depended upon
    pub fn target(&self) -> Option<&TypeRefRc> {
        self.target.as_ref()
    }

    /// The method of the target that is used
    pub fn target_method(&self) -> Option<&MethodRefRc> {
        self.target_method.as_ref()
    }

    /// Why the source depends on the target
    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    /// The instruction the relation was found at
    pub fn instruction(&self) -> Option<&Instruction> {
        self.instruction.as_ref()
    }

    /// Offset of the instruction, 0 for declarative relations
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// The identity of this relation
    pub fn key(&self) -> RelationKey {
        RelationKey {
            source: self.source.full_name().to_string(),
            target: self.target.as_ref().map(|t| t.full_name().to_string()),
            target_method: self.target_method.as_ref().map(|m| m.full_name()),
            kind: self.kind,
            offset: self.offset,
        }
    }
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Relation {}

impl Hash for Relation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = self
            .target
            .as_ref()
            .map_or_else(|| "?".to_string(), |t| t.short_name());
        write!(f, "[{}] -> [{}] as {}", self.source.short_name(), target, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::metadata::{
        method::{MethodRef, Operand},
        typesystem::TypeRef,
    };

    #[test]
    fn kind_display() {
        assert_eq!(RelationKind::BASE_TYPE.to_string(), "BASE_TYPE");
        assert_eq!(
            (RelationKind::CONSTRUCTION | RelationKind::TYPE_REFERENCE).to_string(),
            "CONSTRUCTION | TYPE_REFERENCE"
        );
        assert_eq!(RelationKind::empty().to_string(), "NONE");
    }

    #[test]
    fn identity() {
        let controller = TypeRef::parse("App.Controller", "App");
        let service = TypeRef::parse("App.Service", "App");
        let ctor = MethodRef::new(service.clone(), ".ctor", TypeRef::void(), vec![]);

        let first = Relation::new(controller.clone(), service.clone(), RelationKind::CONSTRUCTION)
            .with_target_method(ctor.clone())
            .at(Instruction::new(4, "newobj", Operand::Method(ctor.clone())));
        let same = Relation::new(
            TypeRef::parse("App.Controller", "App"),
            TypeRef::parse("App.Service", "App"),
            RelationKind::CONSTRUCTION,
        )
        .with_target_method(ctor.clone())
        .at(Instruction::new(4, "newobj", Operand::Method(ctor.clone())));
        let elsewhere = first.clone().at(Instruction::new(12, "newobj", Operand::Method(ctor)));

        assert_eq!(first, same);
        assert_ne!(first, elsewhere);
        assert_eq!(elsewhere.offset(), 12);

        let set: HashSet<Relation> = [first, same, elsewhere].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_uses_short_names() {
        let repository = TypeRef::generic_instance(
            TypeRef::parse("App.Data.Repository`1", "App"),
            vec![TypeRef::parse("App.Model.Order", "App")],
        );
        let relation = Relation::new(
            TypeRef::parse("App.Services.OrderService", "App"),
            repository,
            RelationKind::TYPE_REFERENCE,
        );

        assert_eq!(
            relation.to_string(),
            "[OrderService] -> [Repository<Order>] as TYPE_REFERENCE"
        );
    }
}
