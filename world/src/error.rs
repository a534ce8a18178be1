use emberfall_core::{AbilityId, ConsumableTypeId, ItemTypeId};
use thiserror::Error;

/// Fatal consistency violations raised by the world and its strategies.
///
/// None of these are recovered from inside the simulation; they abort the
/// frame that raised them.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum WorldError {
    /// A stun was removed more times than it was added.
    #[error("stun status went below zero; a stun source was removed twice")]
    StunUnderflow,
    /// The movement resolver was asked to evaluate an unclamped position.
    #[error("position ({x}, {y}) lies outside the game world")]
    PositionOutsideWorld {
        /// Horizontal coordinate of the rejected position.
        x: f32,
        /// Vertical coordinate of the rejected position.
        y: f32,
    },
    /// A static entity was placed outside the bucket grid.
    #[error("position ({x}, {y}) lies outside the bucket grid")]
    OutsideBucketGrid {
        /// Horizontal coordinate of the rejected position.
        x: f32,
        /// Vertical coordinate of the rejected position.
        y: f32,
    },
    /// No item effect is registered for the item kind.
    #[error("no item effect registered for `{}`", .0.name())]
    UnknownItem(ItemTypeId),
    /// No consumable effect is registered for the consumable kind.
    #[error("no consumable effect registered for `{}`", .0.name())]
    UnknownConsumable(ConsumableTypeId),
    /// No ability effect is registered for the ability.
    #[error("no ability effect registered for `{}`", .0.name())]
    UnknownAbility(AbilityId),
    /// A talent was picked for a level whose choice is not open.
    #[error("no talent choice is open for level {level}")]
    TalentNotUnlocked {
        /// Level the pick was made for.
        level: u32,
    },
}
