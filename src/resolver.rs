//! Relationship resolution on resources.
//!
//! Targets are converted eagerly and depth-first; their full bodies go into
//! the includes registry while the owning resource keeps identifiers only.

use crate::convert::ToResource;
use crate::document::{Relationship, RelationshipData, Resource};
use crate::includes::Includes;

impl Resource {
    /// Set (or replace) the to-one relationship `name`.
    ///
    /// The relationship is always present. It stays unresolved (`null` data)
    /// when there is no target or the target has no id.
    pub fn set_one_relationship(
        &mut self,
        name: &str,
        related: Option<&dyn ToResource>,
        includes: &mut Includes,
    ) -> &Relationship {
        let mut relationship = Relationship::to_one();
        relationship.links.related = name.to_string();

        if let Some(related) = related {
            let target = related.to_resource(includes);
            if target.is_addressable() {
                relationship.links.self_ = format!("/{}/{}", name, self.id);
                relationship.data = RelationshipData::one(target.identifier());
                includes.insert(target);
            } else {
                tracing::debug!(
                    relationship = name,
                    owner = %self.id,
                    "to-one target has no id, leaving relationship unresolved"
                );
            }
        }

        self.relationships.insert(name.to_string(), relationship);
        &self.relationships[name]
    }

    /// Set (or replace) the to-many relationship `name`.
    ///
    /// Every target is converted, registered and listed, whether or not it
    /// has an id yet. Identifiers keep the order of `related`; the self link
    /// is built from the type of the last target.
    pub fn set_many_relationship<'a, I>(
        &mut self,
        name: &str,
        related: I,
        includes: &mut Includes,
    ) -> &Relationship
    where
        I: IntoIterator<Item = &'a dyn ToResource>,
    {
        let mut relationship = Relationship::to_many();
        relationship.links.related = name.to_string();

        let mut identifiers = Vec::new();
        let mut last_type = None;
        for item in related {
            let target = item.to_resource(includes);
            identifiers.push(target.identifier());
            last_type = Some(target.resource_type.clone());
            includes.insert(target);
        }

        if let Some(resource_type) = last_type {
            relationship.links.self_ = format!("/{}", resource_type);
        }
        relationship.data = RelationshipData::many(identifiers);

        self.relationships.insert(name.to_string(), relationship);
        &self.relationships[name]
    }
}
