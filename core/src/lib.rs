#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Emberfall simulation.
//!
//! This crate defines the vocabulary that connects adapters, the authoritative
//! world, and the per-frame systems. Adapters submit [`Command`] values that
//! express player intents, the frame orchestrator applies them to the world,
//! and pluggable content reacts to [`GameEvent`] values dispatched by the core.
//! Presentation layers never borrow world state; they subscribe to typed
//! [`Publisher`] channels instead.

mod channel;
mod geometry;

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use channel::{Publisher, SUBSCRIBER_BACKLOG};
pub use crossbeam_channel::Receiver;
pub use geometry::{position_from_center, within_axis_distance, Direction, Rect};

/// Canonical banner emitted when the simulation boots.
pub const WELCOME_BANNER: &str = "Welcome to Emberfall.";

/// Unique identifier assigned to every dynamic or static entity placed in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Owner of buffs, stun status and health: either the player or a specific NPC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Actor {
    /// The player-controlled hero.
    Player,
    /// A non-player character identified by its entity id.
    Npc(EntityId),
}

/// RGB color used by visual effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

impl Color {
    /// Creates a new color from its RGB channels.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red channel intensity.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green channel intensity.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue channel intensity.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

macro_rules! content_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(&'static str);

        impl $name {
            /// Creates a key from its stable textual name.
            #[must_use]
            pub const fn new(name: &'static str) -> Self {
                Self(name)
            }

            /// Stable textual name of the key.
            #[must_use]
            pub const fn name(&self) -> &'static str {
                self.0
            }
        }
    };
}

content_key!(
    /// Identifies a kind of buff; buffs of the same kind never stack on one owner.
    BuffTypeId
);
content_key!(
    /// Identifies an equippable item kind.
    ItemTypeId
);
content_key!(
    /// Identifies a consumable kind.
    ConsumableTypeId
);
content_key!(
    /// Identifies a player ability.
    AbilityId
);
content_key!(
    /// Identifies an NPC archetype.
    NpcTypeId
);
content_key!(
    /// Identifies a wall sprite family.
    WallTypeId
);
content_key!(
    /// Identifies a decoration sprite family.
    DecorationTypeId
);
content_key!(
    /// Identifies a sound asset chosen by content.
    SoundId
);
content_key!(
    /// Identifies a talent option offered at a talent level.
    TalentId
);
content_key!(
    /// Identifies a permanent hero upgrade granted by talents or content.
    UpgradeId
);

/// Allegiance of a non-player character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcCategory {
    /// Hostile to the player; awards experience and loot when killed.
    Enemy,
    /// Ignored by combat.
    Neutral,
    /// Fights on the player's side.
    PlayerSummon,
}

/// Audio cue selected by the core; playback is external.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// An item or consumable was picked up.
    PickedUpItem,
    /// Money was picked up.
    PickedUpMoney,
    /// Default sound for an enemy that died without a specific sound.
    EnemyDied,
    /// The player reached a new level.
    PlayerLeveledUp,
    /// The player's health dropped to zero.
    PlayerDied,
    /// Content-specific sound.
    Custom(SoundId),
}

/// Hero statistic that items, buffs and talents may modify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeroStat {
    /// Maximum health, in whole points.
    MaxHealth,
    /// Health regenerated per second.
    HealthRegen,
    /// Maximum mana, in whole points.
    MaxMana,
    /// Mana regenerated per second.
    ManaRegen,
    /// Flat armor.
    Armor,
    /// Bonus applied to all damage.
    Damage,
    /// Bonus applied to physical damage.
    PhysicalDamage,
    /// Bonus applied to magic damage.
    MagicDamage,
    /// Share of dealt damage returned as health.
    LifeSteal,
    /// Damage absorbed by a successful block.
    BlockAmount,
    /// Chance to avoid an incoming attack.
    DodgeChance,
    /// Additive movement speed multiplier.
    MovementSpeed,
}

/// World events dispatched to the player's buffs and equipped items.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GameEvent {
    /// An enemy NPC was reaped.
    EnemyDied,
    /// The player activated an ability.
    PlayerUsedAbility {
        /// Ability that was activated.
        ability: AbilityId,
    },
    /// The player lost health to an attack.
    PlayerLostHealth {
        /// Health points lost.
        amount: u32,
        /// NPC responsible, when known.
        attacker: Option<EntityId>,
    },
    /// The player blocked an attack.
    PlayerBlocked {
        /// NPC whose attack was blocked, when known.
        attacker: Option<EntityId>,
    },
    /// The player was targeted by an attack, whether or not it landed.
    PlayerWasAttacked {
        /// NPC that attacked, when known.
        attacker: Option<EntityId>,
    },
    /// The player damaged an enemy.
    PlayerDamagedEnemy {
        /// Enemy that took damage.
        enemy: EntityId,
        /// Damage dealt.
        amount: u32,
    },
}

/// Reaction of a buff to a dispatched [`GameEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuffEventOutcome {
    /// Adds time to the buff, capped at its total duration.
    ExtendDuration(Duration),
    /// Removes time from the buff.
    ShortenDuration(Duration),
    /// Force-cancels the buff; its end hook fires on the next lifecycle pass.
    Cancel,
}

/// Progression milestones reported by the player's experience gain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The player reached the given level.
    LeveledUp {
        /// Newly reached level.
        level: u32,
    },
    /// The player learned a new ability when reaching a level.
    LearnedAbility {
        /// Ability granted.
        ability: AbilityId,
    },
    /// A talent choice became available at the given level.
    UnlockedTalent {
        /// Level that unlocked the talent.
        level: u32,
    },
}

/// Player intents submitted by input adapters.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Starts moving the player in the given direction.
    MoveInDirection {
        /// Requested direction of travel.
        direction: Direction,
    },
    /// Stops the player's movement.
    StopMoving,
    /// Activates one of the player's abilities.
    UseAbility {
        /// Ability to activate.
        ability: AbilityId,
    },
    /// Consumes the consumable stored in a slot.
    UseConsumable {
        /// Zero-based consumable slot.
        slot: usize,
    },
    /// Swaps the contents of two item slots.
    SwitchItemSlots {
        /// Slot the drag started from.
        from: usize,
        /// Slot the drag ended on.
        to: usize,
    },
    /// Moves a consumable between consumable slots.
    DragConsumable {
        /// Slot the drag started from.
        from: usize,
        /// Slot the drag ended on.
        to: usize,
    },
    /// Drops an equipped item onto the ground.
    DropItem {
        /// Item slot to empty.
        slot: usize,
        /// World position where the item lands.
        position: Vec2,
    },
    /// Drops a consumable onto the ground.
    DropConsumable {
        /// Consumable slot to take from.
        slot: usize,
        /// World position where the consumable lands.
        position: Vec2,
    },
    /// Picks up a ground loot entry.
    PickUpLoot {
        /// Identifier of the ground loot.
        loot: EntityId,
    },
    /// Opens a chest, spilling its loot.
    OpenChest {
        /// Identifier of the chest.
        chest: EntityId,
    },
    /// Picks a talent for a level whose talent choice is unlocked.
    ChooseTalent {
        /// Level that unlocked the choice.
        level: u32,
        /// Talent picked.
        talent: TalentId,
        /// Upgrade the talent grants.
        upgrade: UpgradeId,
    },
}

/// Snapshot of a resource gauge published after every mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GaugeReading {
    /// Current integer value.
    pub value: u32,
    /// Current integer maximum.
    pub max: u32,
}

/// Experience progress published whenever experience or level changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpProgress {
    /// Current level.
    pub level: u32,
    /// Experience accumulated toward the next level.
    pub exp: u32,
    /// Experience required for the next level.
    pub max_exp: u32,
}

/// Combat statistics published when any hero stat changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatsSnapshot {
    /// Flat armor including bonuses.
    pub armor: f32,
    /// Dodge chance in `[0, 1]`.
    pub dodge_chance: f32,
    /// Block chance in `[0, 1]`.
    pub block_chance: f32,
    /// Damage absorbed by a block.
    pub block_amount: f32,
    /// Physical damage modifier including the generic bonus.
    pub physical_damage_modifier: f32,
    /// Magic damage modifier including the generic bonus.
    pub magic_damage_modifier: f32,
    /// Life steal ratio.
    pub life_steal_ratio: f32,
    /// Additive movement speed bonus granted by items and talents.
    pub movement_speed_bonus: f32,
}

/// Cooldown state for one ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CooldownReading {
    /// Ability on cooldown.
    pub ability: AbilityId,
    /// Time left before the ability can be used again.
    pub remaining: Duration,
}

/// Display summary for one active buff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuffSummary {
    /// Kind of buff.
    pub buff_type: BuffTypeId,
    /// Share of the total duration still remaining; `None` for unbounded buffs.
    pub ratio_remaining: Option<f32>,
}
