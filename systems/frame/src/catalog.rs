use std::{fmt, time::Duration};

use emberfall_core::{AbilityId, ConsumableTypeId, ItemTypeId};
use emberfall_world::{ItemEffect, World, WorldError};

/// Whether an ability or consumable took effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EffectOutcome {
    /// The effect happened; costs are paid.
    Applied,
    /// The effect could not happen; `reason` is shown to the player.
    Refused {
        /// Message explaining the refusal.
        reason: String,
    },
}

/// Mechanics of a player ability.
pub trait AbilityEffect: fmt::Debug {
    /// Mana spent on a successful use.
    fn mana_cost(&self) -> u32;

    /// Cooldown armed on a successful use.
    fn cooldown(&self) -> Duration;

    /// Performs the ability.
    fn apply(&self, world: &mut World) -> Result<EffectOutcome, WorldError>;
}

/// Mechanics of a consumable.
pub trait ConsumableEffect: fmt::Debug {
    /// Consumes the consumable; it leaves the inventory only when applied.
    fn apply(&self, world: &mut World) -> Result<EffectOutcome, WorldError>;
}

/// Resolves content keys to their mechanics.
pub trait ContentCatalog: fmt::Debug {
    /// Creates a fresh effect instance for an item being equipped.
    fn create_item(&self, item: ItemTypeId) -> Option<Box<dyn ItemEffect>>;

    /// Mechanics of `consumable`.
    fn consumable(&self, consumable: ConsumableTypeId) -> Option<&dyn ConsumableEffect>;

    /// Mechanics of `ability`.
    fn ability(&self, ability: AbilityId) -> Option<&dyn AbilityEffect>;
}
