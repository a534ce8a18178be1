use std::{fmt, time::Duration};

use emberfall_core::EntityId;

use crate::{World, WorldEntity, WorldError};

/// Result of advancing a projectile's controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectileLifetime {
    /// The projectile keeps flying.
    Alive,
    /// The projectile expired and is dropped this frame.
    Expired,
}

/// Behavior of a projectile.
///
/// Collision hooks return whether the projectile should be removed. They must
/// not add or remove world entities other than through the world's regular
/// mutators; removals are applied in one batch after the collision pass.
pub trait ProjectileController: fmt::Debug {
    /// Advances timers and reports whether the projectile expired.
    fn notify_time_passed(
        &mut self,
        world: &mut World,
        projectile: &mut WorldEntity,
        dt: Duration,
    ) -> Result<ProjectileLifetime, WorldError>;

    /// The projectile overlaps the enemy `enemy`.
    fn apply_enemy_collision(&mut self, _world: &mut World, _enemy: EntityId) -> Result<bool, WorldError> {
        Ok(false)
    }

    /// The projectile overlaps the player summon `summon`.
    fn apply_player_summon_collision(
        &mut self,
        _world: &mut World,
        _summon: EntityId,
    ) -> Result<bool, WorldError> {
        Ok(false)
    }

    /// The projectile overlaps the player.
    fn apply_player_collision(&mut self, _world: &mut World) -> Result<bool, WorldError> {
        Ok(false)
    }

    /// The projectile overlaps a wall.
    fn apply_wall_collision(&mut self, _world: &mut World) -> Result<bool, WorldError> {
        Ok(false)
    }
}

/// Moving entity driven by a controller.
#[derive(Debug)]
pub struct Projectile {
    id: EntityId,
    entity: WorldEntity,
    controller: Box<dyn ProjectileController>,
    expired: bool,
    collided: bool,
}

impl Projectile {
    pub(crate) fn new(id: EntityId, entity: WorldEntity, controller: Box<dyn ProjectileController>) -> Self {
        Self {
            id,
            entity,
            controller,
            expired: false,
            collided: false,
        }
    }

    /// Identifier assigned when the projectile was spawned.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Positioned rectangle of the projectile.
    #[must_use]
    pub fn entity(&self) -> &WorldEntity {
        &self.entity
    }

    /// Mutable access to the positioned rectangle.
    pub fn entity_mut(&mut self) -> &mut WorldEntity {
        &mut self.entity
    }

    /// Controller together with the entity it steers.
    pub fn parts_mut(&mut self) -> (&mut dyn ProjectileController, &mut WorldEntity) {
        (self.controller.as_mut(), &mut self.entity)
    }

    /// Mutable access to the controller.
    pub fn controller_mut(&mut self) -> &mut dyn ProjectileController {
        self.controller.as_mut()
    }

    /// Whether the controller reported expiry.
    #[must_use]
    pub fn has_expired(&self) -> bool {
        self.expired
    }

    /// Marks the projectile as expired.
    pub fn mark_expired(&mut self) {
        self.expired = true;
    }

    /// Whether a collision hook asked for removal.
    #[must_use]
    pub fn has_collided(&self) -> bool {
        self.collided
    }

    /// Marks the projectile as destroyed by a collision.
    pub fn mark_collided(&mut self) {
        self.collided = true;
    }
}
