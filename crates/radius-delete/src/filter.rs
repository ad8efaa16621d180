//! Inclusion rules for resolved roots.
//!
//! Rules are evaluated in a fixed order and the first match decides:
//!
//! 1. already marked for deletion → excluded
//! 2. more than `depth_offset` below the query surface → excluded
//! 3. marker / ghost → excluded
//! 4. ground surface → included iff `SURFACES` and not owned by a building
//! 5. owned → included iff an extension and `BUILDINGS`
//! 6. building / tree / plant / prop → included iff its bit is set
//! 7. network edge or node → included iff `NETWORKS`
//! 8. anything else → excluded

use std::fmt;

use radius_world::{Category, Entity, EntityFlags, EntityGraph, Vec3};

use crate::{deletion_set::DeletionSet, filters::DeleteFilters};

/// Why an entity was left alone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Exclusion {
    /// The host no longer has the entity.
    Stale,
    AlreadyDeleted,
    BelowDepth { elevation: f32, floor: f32 },
    Marker,
    BuildingOwnedSurface,
    /// Owned by something and not a removable extension.
    OwnedLeaf,
    CategoryDisabled(Category),
    UnknownType,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stale => f.write_str("entity no longer exists"),
            Self::AlreadyDeleted => f.write_str("already marked for deletion"),
            Self::BelowDepth { elevation, floor } => {
                write!(f, "elevation {elevation:.1} below floor {floor:.1}")
            }
            Self::Marker => f.write_str("marker object"),
            Self::BuildingOwnedSurface => f.write_str("surface owned by a building"),
            Self::OwnedLeaf => f.write_str("owned by another entity"),
            Self::CategoryDisabled(category) => write!(f, "{category} filter disabled"),
            Self::UnknownType => f.write_str("unknown type"),
        }
    }
}

/// Outcome of [`TypeFilter::evaluate`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verdict {
    Included,
    Excluded(Exclusion),
}

impl Verdict {
    #[must_use]
    pub const fn is_included(&self) -> bool {
        matches!(self, Self::Included)
    }
}

/// Pure inclusion decision for one invocation.
#[derive(Clone, Copy, Debug)]
pub struct TypeFilter {
    pub filters: DeleteFilters,
    /// Height of the surface the query was issued on.
    pub surface_height: f32,
    pub depth_offset: f32,
}

impl TypeFilter {
    #[must_use]
    pub const fn new(filters: DeleteFilters, surface_height: f32, depth_offset: f32) -> Self {
        Self {
            filters,
            surface_height,
            depth_offset,
        }
    }

    /// Lowest elevation still eligible.
    #[must_use]
    pub fn floor(&self) -> f32 {
        self.surface_height - self.depth_offset
    }

    /// Decide whether `entity` is removed.
    ///
    /// `fallback` stands in for the elevation of entities that expose
    /// neither a position nor bounds.
    pub fn evaluate<G>(&self, graph: &G, entity: Entity, fallback: Vec3, set: &DeletionSet) -> Verdict
    where
        G: EntityGraph + ?Sized,
    {
        if !graph.exists(entity) {
            return Verdict::Excluded(Exclusion::Stale);
        }

        if set.contains(entity) || graph.has_flag(entity, EntityFlags::DELETED) {
            return Verdict::Excluded(Exclusion::AlreadyDeleted);
        }

        let elevation = graph.anchor(entity).unwrap_or(fallback).y;
        let floor = self.floor();
        if elevation < floor {
            return Verdict::Excluded(Exclusion::BelowDepth { elevation, floor });
        }

        if graph.has_flag(entity, EntityFlags::MARKER) {
            return Verdict::Excluded(Exclusion::Marker);
        }

        let category = graph.category(entity);
        let owner = graph.owner(entity);

        if category == Category::Surface {
            if !self.filters.contains(DeleteFilters::SURFACES) {
                return Verdict::Excluded(Exclusion::CategoryDisabled(Category::Surface));
            }
            if owner.is_some_and(|o| graph.category(o) == Category::Building) {
                return Verdict::Excluded(Exclusion::BuildingOwnedSurface);
            }
            return Verdict::Included;
        }

        if owner.is_some() {
            let removable = graph.has_flag(entity, EntityFlags::EXTENSION)
                && self.filters.contains(DeleteFilters::BUILDINGS);
            return if removable {
                Verdict::Included
            } else {
                Verdict::Excluded(Exclusion::OwnedLeaf)
            };
        }

        match category {
            Category::Building | Category::Tree | Category::Plant | Category::Prop | Category::Network => {
                if self.filters.allows(category) {
                    Verdict::Included
                } else {
                    Verdict::Excluded(Exclusion::CategoryDisabled(category))
                }
            }
            Category::Surface | Category::Unknown => Verdict::Excluded(Exclusion::UnknownType),
        }
    }
}
