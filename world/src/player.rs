use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use emberfall_core::{
    AbilityId, BuffSummary, CooldownReading, ExpProgress, HeroStat, ProgressEvent, Publisher,
    Receiver, StatsSnapshot, TalentId, UpgradeId,
};
use glam::Vec2;
use serde::Deserialize;

use crate::{BuffList, ConsumableInventory, ItemSlots, ResourceGauge, StunStatus, WorldError};

/// Experience required to leave level one.
pub const FIRST_LEVEL_EXP: u32 = 50;

const EXP_GROWTH_PER_LEVEL: f32 = 1.6;
const DAMAGE_GROWTH_PER_LEVEL: f32 = 1.1;

/// Stat increases granted on every level-up.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct LevelBonus {
    /// Added to maximum health.
    pub health: u32,
    /// Added to maximum mana.
    pub mana: u32,
    /// Added to base armor.
    pub armor: f32,
}

/// Initial configuration of the hero.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerSetup {
    /// Upper-left corner where the hero spawns and respawns.
    pub spawn_position: Vec2,
    /// Collision size of the hero.
    pub size: Vec2,
    /// Base speed in world units per millisecond.
    pub speed: f32,
    /// Starting maximum health.
    pub health: u32,
    /// Health regenerated per second.
    pub health_regen: f32,
    /// Starting maximum mana.
    pub mana: u32,
    /// Mana regenerated per second.
    pub mana_regen: f32,
    /// Base armor.
    pub armor: f32,
    /// Base dodge chance.
    pub dodge_chance: f32,
    /// Block chance.
    pub block_chance: f32,
    /// Per-level stat increases.
    pub level_bonus: LevelBonus,
    /// Abilities known from the start.
    #[serde(skip)]
    pub abilities: Vec<AbilityId>,
    /// Abilities learned on reaching specific levels.
    #[serde(skip)]
    pub new_level_abilities: BTreeMap<u32, AbilityId>,
    /// Levels at which a talent choice unlocks.
    pub talent_levels: BTreeSet<u32>,
    /// Number of equipment slots.
    pub item_slots: usize,
    /// Number of consumable slots.
    pub consumable_slots: usize,
}

impl Default for PlayerSetup {
    fn default() -> Self {
        Self {
            spawn_position: Vec2::new(100.0, 100.0),
            size: Vec2::new(30.0, 30.0),
            speed: 0.105,
            health: 60,
            health_regen: 0.0,
            mana: 30,
            mana_regen: 2.0,
            armor: 3.0,
            dodge_chance: 0.05,
            block_chance: 0.2,
            level_bonus: LevelBonus {
                health: 15,
                mana: 5,
                armor: 1.5,
            },
            abilities: vec![AbilityId::new("sword_slash")],
            new_level_abilities: BTreeMap::from([
                (2, AbilityId::new("charge")),
                (5, AbilityId::new("bloodlust")),
                (7, AbilityId::new("stomp")),
            ]),
            talent_levels: (3..=7).collect(),
            item_slots: 8,
            consumable_slots: 5,
        }
    }
}

/// Mutable progression and combat state of the hero.
#[derive(Debug)]
pub struct PlayerState {
    health: ResourceGauge,
    mana: ResourceGauge,
    buffs: BuffList,
    stun: StunStatus,
    items: ItemSlots,
    consumables: ConsumableInventory,
    abilities: Vec<AbilityId>,
    cooldowns: BTreeMap<AbilityId, Duration>,
    invisible: bool,
    exp: u32,
    level: u32,
    max_exp: u32,
    new_level_abilities: BTreeMap<u32, AbilityId>,
    talent_levels: BTreeSet<u32>,
    unlocked_talents: Vec<u32>,
    picked_talents: BTreeMap<u32, TalentId>,
    upgrades: BTreeSet<UpgradeId>,
    money: i64,
    level_bonus: LevelBonus,
    base_physical_damage: f32,
    physical_damage_bonus: f32,
    base_magic_damage: f32,
    magic_damage_bonus: f32,
    base_armor: f32,
    armor_bonus: f32,
    base_dodge_chance: f32,
    dodge_chance_bonus: f32,
    block_chance: f32,
    block_amount: f32,
    life_steal_ratio: f32,
    movement_speed_bonus: f32,
    stats_channel: Publisher<StatsSnapshot>,
    exp_channel: Publisher<ExpProgress>,
    money_channel: Publisher<i64>,
    cooldown_channel: Publisher<Vec<CooldownReading>>,
    buff_channel: Publisher<Vec<BuffSummary>>,
}

impl PlayerState {
    /// Builds a level-one hero from `setup`.
    #[must_use]
    pub fn new(setup: &PlayerSetup) -> Self {
        Self {
            health: ResourceGauge::new(setup.health, setup.health_regen),
            mana: ResourceGauge::new(setup.mana, setup.mana_regen),
            buffs: BuffList::default(),
            stun: StunStatus::default(),
            items: ItemSlots::with_capacity(setup.item_slots),
            consumables: ConsumableInventory::with_capacity(setup.consumable_slots),
            cooldowns: setup
                .abilities
                .iter()
                .map(|ability| (*ability, Duration::ZERO))
                .collect(),
            abilities: setup.abilities.clone(),
            invisible: false,
            exp: 0,
            level: 1,
            max_exp: FIRST_LEVEL_EXP,
            new_level_abilities: setup.new_level_abilities.clone(),
            talent_levels: setup.talent_levels.clone(),
            unlocked_talents: Vec::new(),
            picked_talents: BTreeMap::new(),
            upgrades: BTreeSet::new(),
            money: 0,
            level_bonus: setup.level_bonus,
            base_physical_damage: 1.0,
            physical_damage_bonus: 0.0,
            base_magic_damage: 1.0,
            magic_damage_bonus: 0.0,
            base_armor: setup.armor,
            armor_bonus: 0.0,
            base_dodge_chance: setup.dodge_chance,
            dodge_chance_bonus: 0.0,
            block_chance: setup.block_chance,
            block_amount: 0.0,
            life_steal_ratio: 0.0,
            movement_speed_bonus: 0.0,
            stats_channel: Publisher::new(),
            exp_channel: Publisher::new(),
            money_channel: Publisher::new(),
            cooldown_channel: Publisher::new(),
            buff_channel: Publisher::new(),
        }
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

    /// Mana gauge.
    #[must_use]
    pub fn mana(&self) -> &ResourceGauge {
        &self.mana
    }

    /// Mutable access to the mana gauge.
    pub fn mana_mut(&mut self) -> &mut ResourceGauge {
        &mut self.mana
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

    /// Equipment slots.
    #[must_use]
    pub fn items(&self) -> &ItemSlots {
        &self.items
    }

    /// Mutable access to the equipment slots.
    pub fn items_mut(&mut self) -> &mut ItemSlots {
        &mut self.items
    }

    pub(crate) fn replace_items(&mut self, items: ItemSlots) -> ItemSlots {
        std::mem::replace(&mut self.items, items)
    }

    /// Consumable slots.
    #[must_use]
    pub fn consumables(&self) -> &ConsumableInventory {
        &self.consumables
    }

    /// Mutable access to the consumable slots.
    pub fn consumables_mut(&mut self) -> &mut ConsumableInventory {
        &mut self.consumables
    }

    /// Whether NPC minds should ignore the hero.
    #[must_use]
    pub fn is_invisible(&self) -> bool {
        self.invisible
    }

    /// Toggles invisibility.
    pub fn set_invisible(&mut self, invisible: bool) {
        self.invisible = invisible;
    }

    /// Known abilities in the order they were learned.
    #[must_use]
    pub fn abilities(&self) -> &[AbilityId] {
        &self.abilities
    }

    /// Whether `ability` has been learned.
    #[must_use]
    pub fn has_ability(&self, ability: AbilityId) -> bool {
        self.abilities.contains(&ability)
    }

    /// Time before `ability` can be used again.
    #[must_use]
    pub fn cooldown(&self, ability: AbilityId) -> Duration {
        self.cooldowns.get(&ability).copied().unwrap_or_default()
    }

    /// Arms the cooldown of `ability`.
    pub fn add_to_cooldown(&mut self, ability: AbilityId, amount: Duration) {
        let remaining = self.cooldowns.entry(ability).or_default();
        *remaining = remaining.saturating_add(amount);
        self.publish_cooldowns();
    }

    /// Counts `dt` against every running cooldown.
    pub fn recharge_cooldowns(&mut self, dt: Duration) {
        let mut updated = false;
        for remaining in self.cooldowns.values_mut() {
            if !remaining.is_zero() {
                *remaining = remaining.saturating_sub(dt);
                updated = true;
            }
        }
        if updated {
            self.publish_cooldowns();
        }
    }

    /// Learns `ability` with no cooldown.
    pub fn gain_ability(&mut self, ability: AbilityId) {
        if !self.has_ability(ability) {
            self.abilities.push(ability);
        }
        let _ = self.cooldowns.insert(ability, Duration::ZERO);
        self.publish_cooldowns();
    }

    /// Regenerates health and mana over `dt`.
    pub fn regenerate(&mut self, dt: Duration) {
        self.health.regenerate(dt);
        self.mana.regenerate(dt);
    }

    /// Current level.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Experience collected toward the next level.
    #[must_use]
    pub fn exp(&self) -> u32 {
        self.exp
    }

    /// Experience needed for the next level.
    #[must_use]
    pub fn max_exp(&self) -> u32 {
        self.max_exp
    }

    /// Levels whose talent choice is unlocked and not yet picked.
    #[must_use]
    pub fn unlocked_talents(&self) -> &[u32] {
        &self.unlocked_talents
    }

    /// Whether any unlocked talent choice is still waiting for a pick.
    #[must_use]
    pub fn has_unpicked_talents(&self) -> bool {
        !self.unlocked_talents.is_empty()
    }

    /// Talents picked so far, keyed by the level that offered them.
    #[must_use]
    pub fn picked_talents(&self) -> &BTreeMap<u32, TalentId> {
        &self.picked_talents
    }

    /// Picks `talent` for the open choice at `level` and gains its `upgrade`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::TalentNotUnlocked`] when no choice is open at
    /// `level`, including when it was already picked.
    pub fn choose_talent(
        &mut self,
        level: u32,
        talent: TalentId,
        upgrade: UpgradeId,
    ) -> Result<(), WorldError> {
        let Some(index) = self.unlocked_talents.iter().position(|open| *open == level) else {
            return Err(WorldError::TalentNotUnlocked { level });
        };
        let _ = self.unlocked_talents.remove(index);
        let _ = self.picked_talents.insert(level, talent);
        self.gain_upgrade(upgrade);
        Ok(())
    }

    /// Grants a permanent upgrade.
    pub fn gain_upgrade(&mut self, upgrade: UpgradeId) {
        let _ = self.upgrades.insert(upgrade);
    }

    /// Whether `upgrade` has been granted.
    #[must_use]
    pub fn has_upgrade(&self, upgrade: UpgradeId) -> bool {
        self.upgrades.contains(&upgrade)
    }

    /// Adds exactly the experience needed to climb `levels` levels.
    pub fn gain_exp_worth_n_levels(&mut self, levels: u32) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        for _ in 0..levels {
            let missing = self.max_exp - self.exp;
            events.extend(self.gain_exp(missing));
        }
        events
    }

    /// Adds experience, applying every level-up it pays for before returning.
    ///
    /// One [`ProgressEvent::LeveledUp`] is reported per level gained, and stats
    /// are recomputed after each individual level.
    pub fn gain_exp(&mut self, amount: u32) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        self.exp = self.exp.saturating_add(amount);
        while self.exp >= self.max_exp {
            self.exp -= self.max_exp;
            self.level += 1;
            self.apply_level_bonus();
            events.push(ProgressEvent::LeveledUp { level: self.level });

            if let Some(ability) = self.new_level_abilities.get(&self.level).copied() {
                self.gain_ability(ability);
                events.push(ProgressEvent::LearnedAbility { ability });
            }
            if self.talent_levels.contains(&self.level) {
                self.unlocked_talents.push(self.level);
                events.push(ProgressEvent::UnlockedTalent { level: self.level });
            }
        }
        self.publish_exp();
        events
    }

    /// Loses `ratio` of the current level's requirement, never going below zero.
    pub fn lose_exp_from_death(&mut self, ratio: f32) {
        let penalty = (self.max_exp as f32 * ratio) as u32;
        self.exp = self.exp.saturating_sub(penalty);
        self.publish_exp();
    }

    /// Current experience snapshot.
    #[must_use]
    pub fn exp_progress(&self) -> ExpProgress {
        ExpProgress {
            level: self.level,
            exp: self.exp,
            max_exp: self.max_exp,
        }
    }

    /// Coins carried.
    #[must_use]
    pub fn money(&self) -> i64 {
        self.money
    }

    /// Adds `delta` coins; negative values spend.
    pub fn modify_money(&mut self, delta: i64) {
        self.money += delta;
        self.money_channel.publish(self.money);
    }

    /// Applies a stat change.
    ///
    /// Movement speed is only recorded here; the world applies it to the hero's entity.
    pub fn modify_stat(&mut self, stat: HeroStat, delta: f32) {
        match stat {
            HeroStat::MaxHealth => adjust_max(&mut self.health, delta),
            HeroStat::HealthRegen => self.health.add_regen_bonus(delta),
            HeroStat::MaxMana => adjust_max(&mut self.mana, delta),
            HeroStat::ManaRegen => self.mana.add_regen_bonus(delta),
            HeroStat::Armor => self.armor_bonus += delta,
            HeroStat::Damage => {
                self.physical_damage_bonus += delta;
                self.magic_damage_bonus += delta;
            }
            HeroStat::PhysicalDamage => self.physical_damage_bonus += delta,
            HeroStat::MagicDamage => self.magic_damage_bonus += delta,
            HeroStat::LifeSteal => self.life_steal_ratio += delta,
            HeroStat::BlockAmount => self.block_amount += delta,
            HeroStat::DodgeChance => self.dodge_chance_bonus += delta,
            HeroStat::MovementSpeed => self.movement_speed_bonus += delta,
        }
        self.publish_stats();
    }

    /// Armor including bonuses.
    #[must_use]
    pub fn armor(&self) -> f32 {
        self.base_armor + self.armor_bonus
    }

    /// Physical damage multiplier including bonuses.
    #[must_use]
    pub fn physical_damage_modifier(&self) -> f32 {
        self.base_physical_damage + self.physical_damage_bonus
    }

    /// Magic damage multiplier including bonuses.
    #[must_use]
    pub fn magic_damage_modifier(&self) -> f32 {
        self.base_magic_damage + self.magic_damage_bonus
    }

    /// Dodge chance including bonuses.
    #[must_use]
    pub fn dodge_chance(&self) -> f32 {
        self.base_dodge_chance + self.dodge_chance_bonus
    }

    /// Combat statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            armor: self.armor(),
            dodge_chance: self.dodge_chance(),
            block_chance: self.block_chance,
            block_amount: self.block_amount,
            physical_damage_modifier: self.physical_damage_modifier(),
            magic_damage_modifier: self.magic_damage_modifier(),
            life_steal_ratio: self.life_steal_ratio,
            movement_speed_bonus: self.movement_speed_bonus,
        }
    }

    /// Subscribes to stat snapshots.
    pub fn subscribe_stats(&mut self) -> Receiver<StatsSnapshot> {
        self.stats_channel.subscribe()
    }

    /// Subscribes to experience progress.
    pub fn subscribe_exp(&mut self) -> Receiver<ExpProgress> {
        self.exp_channel.subscribe()
    }

    /// Subscribes to money changes.
    pub fn subscribe_money(&mut self) -> Receiver<i64> {
        self.money_channel.subscribe()
    }

    /// Subscribes to cooldown changes.
    pub fn subscribe_cooldowns(&mut self) -> Receiver<Vec<CooldownReading>> {
        self.cooldown_channel.subscribe()
    }

    /// Subscribes to active buff summaries.
    pub fn subscribe_buffs(&mut self) -> Receiver<Vec<BuffSummary>> {
        self.buff_channel.subscribe()
    }

    /// Publishes the current buff summaries.
    pub fn publish_buffs(&mut self) {
        let summaries = self.buffs.summaries();
        self.buff_channel.publish(summaries);
    }

    fn publish_cooldowns(&mut self) {
        let readings = self
            .cooldowns
            .iter()
            .map(|(ability, remaining)| CooldownReading {
                ability: *ability,
                remaining: *remaining,
            })
            .collect();
        self.cooldown_channel.publish(readings);
    }

    fn publish_exp(&mut self) {
        let progress = self.exp_progress();
        self.exp_channel.publish(progress);
    }

    fn publish_stats(&mut self) {
        let stats = self.stats();
        self.stats_channel.publish(stats);
    }

    fn apply_level_bonus(&mut self) {
        self.health.increase_max(self.level_bonus.health);
        let _ = self.health.gain_to_max();
        self.mana.increase_max(self.level_bonus.mana);
        let _ = self.mana.gain_to_max();
        self.max_exp = (self.max_exp as f32 * EXP_GROWTH_PER_LEVEL) as u32;
        self.base_physical_damage *= DAMAGE_GROWTH_PER_LEVEL;
        self.base_magic_damage *= DAMAGE_GROWTH_PER_LEVEL;
        self.base_armor += self.level_bonus.armor;
        self.publish_stats();
    }
}

fn adjust_max(gauge: &mut ResourceGauge, delta: f32) {
    let magnitude = delta.abs().round() as u32;
    if delta >= 0.0 {
        gauge.increase_max(magnitude);
    } else {
        gauge.decrease_max(magnitude);
    }
}
