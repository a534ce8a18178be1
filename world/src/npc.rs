use std::{fmt, time::Duration};

use emberfall_core::{within_axis_distance, EntityId, NpcCategory, NpcTypeId, SoundId};
use glam::Vec2;

use crate::{BuffList, LootTable, ResourceGauge, StunStatus, World, WorldEntity, WorldError};

/// Decision-making strategy of an NPC.
pub trait NpcMind: fmt::Debug {
    /// Steers the NPC identified by `npc` for one frame.
    ///
    /// `player` is a snapshot of the player's entity taken just before the call.
    fn control(
        &mut self,
        world: &mut World,
        npc: EntityId,
        player: &WorldEntity,
        player_is_invisible: bool,
        dt: Duration,
    ) -> Result<(), WorldError>;
}

/// Non-player character placed in the world.
#[derive(Debug)]
pub struct Npc {
    npc_type: NpcTypeId,
    entity: WorldEntity,
    health: ResourceGauge,
    mind: Option<Box<dyn NpcMind>>,
    buffs: BuffList,
    stun: StunStatus,
    category: NpcCategory,
    loot_table: Option<Box<dyn LootTable>>,
    death_sound: Option<SoundId>,
    start_position: Vec2,
    leash: Option<f32>,
    exp_reward: u32,
    invulnerable: bool,
}

impl Npc {
    /// Creates an NPC; its current position becomes its immutable start position.
    #[must_use]
    pub fn new(
        npc_type: NpcTypeId,
        entity: WorldEntity,
        health: ResourceGauge,
        category: NpcCategory,
    ) -> Self {
        Self {
            npc_type,
            start_position: entity.position(),
            entity,
            health,
            mind: None,
            buffs: BuffList::default(),
            stun: StunStatus::default(),
            category,
            loot_table: None,
            death_sound: None,
            leash: None,
            exp_reward: 0,
            invulnerable: false,
        }
    }

    /// Attaches a decision-making strategy.
    #[must_use]
    pub fn with_mind(mut self, mind: Box<dyn NpcMind>) -> Self {
        self.mind = Some(mind);
        self
    }

    /// Attaches a loot table rolled when the NPC dies.
    #[must_use]
    pub fn with_loot_table(mut self, loot_table: Box<dyn LootTable>) -> Self {
        self.loot_table = Some(loot_table);
        self
    }

    /// Overrides the default death sound.
    #[must_use]
    pub fn with_death_sound(mut self, sound: SoundId) -> Self {
        self.death_sound = Some(sound);
        self
    }

    /// Limits how far, per axis, the NPC may wander from its start position.
    #[must_use]
    pub fn with_leash(mut self, distance: f32) -> Self {
        self.leash = Some(distance);
        self
    }

    /// Experience awarded when the NPC dies as an enemy.
    #[must_use]
    pub fn with_exp_reward(mut self, exp: u32) -> Self {
        self.exp_reward = exp;
        self
    }

    /// Archetype of the NPC.
    #[must_use]
    pub fn npc_type(&self) -> NpcTypeId {
        self.npc_type
    }

    /// Positioned rectangle of the NPC.
    #[must_use]
    pub fn entity(&self) -> &WorldEntity {
        &self.entity
    }

    /// Mutable access to the positioned rectangle.
    pub fn entity_mut(&mut self) -> &mut WorldEntity {
        &mut self.entity
    }

    /// Health gauge.
    #[must_use]
    pub fn health(&self) -> &ResourceGauge {
        &self.health
    }

    /// Mutable access to the health gauge.
    pub fn health_mut(&mut self) -> &mut ResourceGauge {
        &mut self.health
    }

    /// Active buffs.
    #[must_use]
    pub fn buffs(&self) -> &BuffList {
        &self.buffs
    }

    /// Mutable access to the active buffs.
    pub fn buffs_mut(&mut self) -> &mut BuffList {
        &mut self.buffs
    }

    /// Stun status.
    #[must_use]
    pub fn stun(&self) -> &StunStatus {
        &self.stun
    }

    /// Mutable access to the stun status.
    pub fn stun_mut(&mut self) -> &mut StunStatus {
        &mut self.stun
    }

    /// Whether any stun source is active.
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.stun.is_stunned()
    }

    /// Allegiance of the NPC.
    #[must_use]
    pub fn category(&self) -> NpcCategory {
        self.category
    }

    /// Whether the NPC is hostile.
    #[must_use]
    pub fn is_enemy(&self) -> bool {
        self.category == NpcCategory::Enemy
    }

    /// Loot table rolled on death.
    #[must_use]
    pub fn loot_table(&self) -> Option<&dyn LootTable> {
        self.loot_table.as_deref()
    }

    /// Content-specific death sound.
    #[must_use]
    pub fn death_sound(&self) -> Option<SoundId> {
        self.death_sound
    }

    /// Position the NPC was placed at.
    #[must_use]
    pub fn start_position(&self) -> Vec2 {
        self.start_position
    }

    /// Maximum per-axis distance from the start position.
    #[must_use]
    pub fn leash(&self) -> Option<f32> {
        self.leash
    }

    /// Whether `candidate` respects the leash; always true without one.
    #[must_use]
    pub fn is_within_leash(&self, candidate: Vec2) -> bool {
        self.leash
            .map_or(true, |leash| within_axis_distance(self.start_position, candidate, leash))
    }

    /// Experience awarded on death.
    #[must_use]
    pub fn exp_reward(&self) -> u32 {
        self.exp_reward
    }

    /// Whether incoming damage should be ignored.
    #[must_use]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable
    }

    /// Toggles invulnerability.
    pub fn set_invulnerable(&mut self, invulnerable: bool) {
        self.invulnerable = invulnerable;
    }

    pub(crate) fn take_mind(&mut self) -> Option<Box<dyn NpcMind>> {
        self.mind.take()
    }

    pub(crate) fn restore_mind(&mut self, mind: Box<dyn NpcMind>) {
        if self.mind.is_none() {
            self.mind = Some(mind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skeleton(position: Vec2) -> Npc {
        Npc::new(
            NpcTypeId::new("skeleton"),
            WorldEntity::new(position, Vec2::splat(30.0)),
            ResourceGauge::new(10, 0.0),
            NpcCategory::Enemy,
        )
    }

    #[test]
    fn start_position_survives_movement() {
        let mut npc = skeleton(Vec2::new(200.0, 200.0));
        npc.entity_mut().set_position(Vec2::new(400.0, 200.0));
        assert_eq!(npc.start_position(), Vec2::new(200.0, 200.0));
    }

    #[test]
    fn leash_is_measured_per_axis() {
        let npc = skeleton(Vec2::new(200.0, 200.0)).with_leash(100.0);
        assert!(npc.is_within_leash(Vec2::new(300.0, 100.0)));
        assert!(!npc.is_within_leash(Vec2::new(200.0, 301.0)));
        assert!(skeleton(Vec2::ZERO).is_within_leash(Vec2::splat(10_000.0)));
    }
}
