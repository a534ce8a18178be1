use std::fmt;

use emberfall_core::{ConsumableTypeId, ItemTypeId};
use glam::Vec2;
use rand::{Rng, RngCore};

use crate::WorldEntity;

/// Size of item and consumable piles on the ground.
pub const GROUND_LOOT_SIZE: Vec2 = Vec2::new(30.0, 30.0);

/// Size of money piles on the ground.
pub const MONEY_PILE_SIZE: Vec2 = Vec2::new(30.0, 30.0);

/// One rolled reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LootEntry {
    /// Coins.
    Money(u32),
    /// An equippable item.
    Item(ItemTypeId),
    /// A consumable.
    Consumable(ConsumableTypeId),
}

/// Source of rewards dropped by enemies and chests.
pub trait LootTable: fmt::Debug {
    /// Rolls the rewards of one drop.
    fn generate(&self, rng: &mut dyn RngCore) -> Vec<LootEntry>;
}

/// Loot table that rolls each entry independently against its drop chance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChanceLootTable {
    entries: Vec<(LootEntry, f32)>,
}

impl ChanceLootTable {
    /// Creates a table without entries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry`, dropped with probability `chance` in `[0, 1]`.
    #[must_use]
    pub fn with_entry(mut self, entry: LootEntry, chance: f32) -> Self {
        self.entries.push((entry, chance));
        self
    }
}

impl LootTable for ChanceLootTable {
    fn generate(&self, rng: &mut dyn RngCore) -> Vec<LootEntry> {
        self.entries
            .iter()
            .filter(|(_, chance)| rng.gen::<f32>() < *chance)
            .map(|(entry, _)| *entry)
            .collect()
    }
}

/// Kind of a pickable pile on the ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroundLootKind {
    /// An item waiting for a free item slot.
    Item(ItemTypeId),
    /// A consumable waiting for consumable space.
    Consumable(ConsumableTypeId),
}

/// Item or consumable lying in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundLoot {
    kind: GroundLootKind,
    entity: WorldEntity,
}

impl GroundLoot {
    /// Places loot of `kind` at `position`.
    #[must_use]
    pub fn new(kind: GroundLootKind, position: Vec2) -> Self {
        Self {
            kind,
            entity: WorldEntity::new(position, GROUND_LOOT_SIZE),
        }
    }

    /// Kind of the loot.
    #[must_use]
    pub fn kind(&self) -> GroundLootKind {
        self.kind
    }

    /// Positioned rectangle of the loot.
    #[must_use]
    pub fn entity(&self) -> &WorldEntity {
        &self.entity
    }
}

/// Coins lying in the world, picked up on contact.
#[derive(Clone, Debug, PartialEq)]
pub struct MoneyPile {
    amount: u32,
    entity: WorldEntity,
}

impl MoneyPile {
    /// Places `amount` coins at `position`.
    #[must_use]
    pub fn new(amount: u32, position: Vec2) -> Self {
        Self {
            amount,
            entity: WorldEntity::new(position, MONEY_PILE_SIZE),
        }
    }

    /// Number of coins.
    #[must_use]
    pub fn amount(&self) -> u32 {
        self.amount
    }

    /// Positioned rectangle of the pile.
    #[must_use]
    pub fn entity(&self) -> &WorldEntity {
        &self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn certain_entries_always_drop_and_impossible_never() {
        let table = ChanceLootTable::new()
            .with_entry(LootEntry::Money(5), 1.0)
            .with_entry(LootEntry::Item(ItemTypeId::new("royal_sword")), 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for _ in 0..20 {
            assert_eq!(table.generate(&mut rng), vec![LootEntry::Money(5)]);
        }
    }
}
