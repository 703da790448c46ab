//! Placeable item catalog and placement bounding volumes.
//!
//! The protocol exchanges only string item identifiers; every participant
//! resolves them against an identical local catalog. The authority uses the
//! resolved collider shape to arbitrate placement legality.

use crate::math::{Aabb, Vec3};
use crate::PLACEMENT_SHRINK;
use std::collections::HashMap;

/// Declared primary collider of a placeable item.
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Anything else falls back to its precomputed world-space bounds.
    Computed { bounds: Aabb },
}

/// A placeable item type as registered in the local asset catalog.
#[derive(Debug, Clone)]
pub struct ItemDef {
    pub id: String,
    pub collider: Option<ColliderShape>,
    pub world_scale: Vec3,
}

impl ItemDef {
    pub fn boxed(id: &str, half_extents: Vec3) -> Self {
        Self {
            id: id.to_string(),
            collider: Some(ColliderShape::Box { half_extents }),
            world_scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn sphere(id: &str, radius: f32) -> Self {
        Self {
            id: id.to_string(),
            collider: Some(ColliderShape::Sphere { radius }),
            world_scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    /// The item's placement volume centered at `position`, shrunk to avoid
    /// edge-adjacency false positives. Returns None when the item has no
    /// collider, in which case placement is always legal.
    pub fn placement_bounds(&self, position: Vec3) -> Option<Aabb> {
        let half_extents = match self.collider.as_ref()? {
            ColliderShape::Box { half_extents } => Vec3::new(
                half_extents.x * self.world_scale.x,
                half_extents.y * self.world_scale.y,
                half_extents.z * self.world_scale.z,
            ),
            ColliderShape::Sphere { radius } => {
                let scale = self
                    .world_scale
                    .x
                    .max(self.world_scale.y)
                    .max(self.world_scale.z);
                let r = radius * scale;
                Vec3::new(r, r, r)
            }
            ColliderShape::Computed { bounds } => bounds.half_extents,
        };

        Some(Aabb::new(position, half_extents).shrunk(PLACEMENT_SHRINK))
    }
}

/// Item types keyed by identifier, built identically on every participant.
#[derive(Debug, Default)]
pub struct ItemCatalog {
    items: HashMap<String, ItemDef>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
        }
    }

    /// The stock catalog shared by all participants of a session.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        catalog.register(ItemDef::boxed("Cannon", Vec3::new(0.75, 0.5, 0.5)));
        catalog.register(ItemDef::boxed("SpikeTrap", Vec3::new(0.5, 0.25, 0.5)));
        catalog.register(ItemDef::boxed("Platform", Vec3::new(1.0, 0.125, 0.5)));
        catalog.register(ItemDef::sphere("BouncePad", 0.5));
        catalog.register(ItemDef::boxed("Sawblade", Vec3::new(0.5, 0.5, 0.1)));
        catalog
    }

    pub fn register(&mut self, def: ItemDef) {
        self.items.insert(def.id.clone(), def);
    }

    pub fn resolve(&self, item_id: &str) -> Option<&ItemDef> {
        self.items.get(item_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
