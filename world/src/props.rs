use emberfall_core::{DecorationTypeId, EntityId, WallTypeId};
use glam::Vec2;

use crate::{LootTable, WorldEntity};

/// Impassable static block.
#[derive(Clone, Debug, PartialEq)]
pub struct Wall {
    wall_type: WallTypeId,
    entity: WorldEntity,
}

impl Wall {
    /// Creates a wall of `wall_type` occupying `entity`.
    #[must_use]
    pub fn new(wall_type: WallTypeId, entity: WorldEntity) -> Self {
        Self { wall_type, entity }
    }

    /// Sprite family of the wall.
    #[must_use]
    pub fn wall_type(&self) -> WallTypeId {
        self.wall_type
    }

    /// Positioned rectangle of the wall.
    #[must_use]
    pub fn entity(&self) -> &WorldEntity {
        &self.entity
    }
}

/// Purely visual floor decoration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decoration {
    decoration_type: DecorationTypeId,
    position: Vec2,
}

impl Decoration {
    /// Places a decoration of `decoration_type` at `position`.
    #[must_use]
    pub fn new(decoration_type: DecorationTypeId, position: Vec2) -> Self {
        Self {
            decoration_type,
            position,
        }
    }

    /// Sprite family of the decoration.
    #[must_use]
    pub fn decoration_type(&self) -> DecorationTypeId {
        self.decoration_type
    }

    /// Upper-left corner of the decoration.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }
}

/// Gateway that may lead to another portal.
#[derive(Clone, Debug, PartialEq)]
pub struct Portal {
    entity: WorldEntity,
    enabled: bool,
    leads_to: Option<EntityId>,
}

impl Portal {
    /// Creates a portal.
    #[must_use]
    pub fn new(entity: WorldEntity, enabled: bool, leads_to: Option<EntityId>) -> Self {
        Self {
            entity,
            enabled,
            leads_to,
        }
    }

    /// Positioned rectangle of the portal.
    #[must_use]
    pub fn entity(&self) -> &WorldEntity {
        &self.entity
    }

    /// Whether the portal can be used.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Destination portal.
    #[must_use]
    pub fn leads_to(&self) -> Option<EntityId> {
        self.leads_to
    }

    /// Enables the portal.
    pub fn activate(&mut self) {
        self.enabled = true;
    }
}

/// Teleport destination placed by the player.
#[derive(Clone, Debug, PartialEq)]
pub struct WarpPoint {
    entity: WorldEntity,
}

impl WarpPoint {
    /// Creates a warp point occupying `entity`.
    #[must_use]
    pub fn new(entity: WorldEntity) -> Self {
        Self { entity }
    }

    /// Positioned rectangle of the warp point.
    #[must_use]
    pub fn entity(&self) -> &WorldEntity {
        &self.entity
    }

    /// Shows the warp point.
    pub fn make_visible(&mut self) {
        self.entity.set_visible(true);
    }
}

/// Container that spills loot when opened.
#[derive(Debug)]
pub struct Chest {
    entity: WorldEntity,
    loot_table: Box<dyn LootTable>,
}

impl Chest {
    /// Creates a chest rolling `loot_table` when opened.
    #[must_use]
    pub fn new(entity: WorldEntity, loot_table: Box<dyn LootTable>) -> Self {
        Self { entity, loot_table }
    }

    /// Positioned rectangle of the chest.
    #[must_use]
    pub fn entity(&self) -> &WorldEntity {
        &self.entity
    }

    /// Loot rolled when the chest opens.
    #[must_use]
    pub fn loot_table(&self) -> &dyn LootTable {
        self.loot_table.as_ref()
    }
}
