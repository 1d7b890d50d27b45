//! Grouping of relations into one aggregated entry per (source, target) pair.

use std::collections::HashMap;

use crate::analysis::{Relation, RelationKind, RelationList};

/// All relations between one ordered pair of types
#[derive(Debug, Clone)]
pub struct CompactedRelation {
    /// Full name of the source type
    pub source: String,
    /// Full name of the target type
    pub target: String,
    /// The contributing relations, in input order
    pub relations: RelationList,
}

impl CompactedRelation {
    /// Number of contributing relations
    pub fn weight(&self) -> usize {
        self.relations.len()
    }

    /// Union of the contributing kinds
    pub fn kinds(&self) -> RelationKind {
        self.relations
            .iter()
            .fold(RelationKind::empty(), |kinds, relation| kinds | relation.kind())
    }
}

/// Group relations by (source, target) full name.
///
/// Groups appear in the order their first relation appears; relations without a target
/// are dropped.
pub fn compact<I>(relations: I) -> Vec<CompactedRelation>
where
    I: IntoIterator<Item = Relation>,
{
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut groups: Vec<CompactedRelation> = Vec::new();

    for relation in relations {
        let Some(target) = relation.target() else {
            continue;
        };

        let key = (
            relation.source().full_name().to_string(),
            target.full_name().to_string(),
        );
        match index.get(&key) {
            Some(&position) => groups[position].relations.push(relation),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(CompactedRelation {
                    source: key.0,
                    target: key.1,
                    relations: vec![relation],
                });
            }
        }
    }

    groups
}
