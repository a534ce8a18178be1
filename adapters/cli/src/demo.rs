//! Sample content used by the headless driver.

use std::time::Duration;

use emberfall_core::{
    position_from_center, within_axis_distance, AbilityId, Actor, BuffTypeId, Command,
    ConsumableTypeId, DecorationTypeId, Direction, EntityId, GameEvent, HeroStat, ItemTypeId,
    NpcCategory, NpcTypeId, Rect, SoundId, TalentId, UpgradeId, WallTypeId,
};
use emberfall_system_frame::{AbilityEffect, ConsumableEffect, ContentCatalog, EffectOutcome};
use emberfall_world::{
    BuffEffect, ChanceLootTable, Chest, GroundLootKind, ItemEffect, LootEntry, Npc, NpcMind,
    ProjectileController, ProjectileLifetime, ResourceGauge, StatModifyingItem, World,
    WorldEntity, WorldError,
};
use glam::Vec2;
use rand::Rng;

pub(crate) const SWORD_SLASH: AbilityId = AbilityId::new("sword_slash");
pub(crate) const FIREBALL: AbilityId = AbilityId::new("fireball");

const HEALTH_POTION: ConsumableTypeId = ConsumableTypeId::new("health_potion");
const ROYAL_SWORD: ItemTypeId = ItemTypeId::new("royal_sword");
const WINGED_BOOTS: ItemTypeId = ItemTypeId::new("winged_boots");
const HEALING_OVER_TIME: BuffTypeId = BuffTypeId::new("healing_over_time");
const STUNNED: BuffTypeId = BuffTypeId::new("stunned");

const TILE: f32 = 50.0;
const AGGRO_DISTANCE: f32 = 300.0;
const MELEE_REACH: f32 = 40.0;
const CHEST_REACH: f32 = 80.0;

/// Catalog of the demo's abilities, consumables and items.
#[derive(Debug, Default)]
pub(crate) struct DemoCatalog {
    slash: SwordSlash,
    fireball: Fireball,
    potion: HealthPotion,
}

impl ContentCatalog for DemoCatalog {
    fn create_item(&self, item: ItemTypeId) -> Option<Box<dyn ItemEffect>> {
        let modifiers = match item {
            ROYAL_SWORD => vec![(HeroStat::PhysicalDamage, 0.15), (HeroStat::Armor, 1.0)],
            WINGED_BOOTS => vec![(HeroStat::MovementSpeed, 0.2)],
            _ => return None,
        };
        Some(Box::new(StatModifyingItem::new(item, modifiers)))
    }

    fn consumable(&self, consumable: ConsumableTypeId) -> Option<&dyn ConsumableEffect> {
        (consumable == HEALTH_POTION).then_some(&self.potion as &dyn ConsumableEffect)
    }

    fn ability(&self, ability: AbilityId) -> Option<&dyn AbilityEffect> {
        match ability {
            SWORD_SLASH => Some(&self.slash),
            FIREBALL => Some(&self.fireball),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct SwordSlash;

impl AbilityEffect for SwordSlash {
    fn mana_cost(&self) -> u32 {
        5
    }

    fn cooldown(&self) -> Duration {
        Duration::from_millis(700)
    }

    fn apply(&self, world: &mut World) -> Result<EffectOutcome, WorldError> {
        let hero = world.player_entity();
        let reach = Vec2::splat(40.0);
        let center = hero.center() + hero.direction().unit_vector() * 30.0;
        let area = Rect::from_position_and_size(position_from_center(center, reach), reach);
        let damage = 6.0 * world.player().physical_damage_modifier();

        for enemy in world.enemies_intersecting(&area) {
            let Some(npc) = world.npc_mut(enemy) else {
                continue;
            };
            if npc.is_invulnerable() {
                continue;
            }
            let amount = npc.health_mut().lose(damage);
            world.notify_player_about_event(GameEvent::PlayerDamagedEnemy { enemy, amount })?;
        }
        Ok(EffectOutcome::Applied)
    }
}

#[derive(Debug, Default)]
struct Fireball;

impl AbilityEffect for Fireball {
    fn mana_cost(&self) -> u32 {
        10
    }

    fn cooldown(&self) -> Duration {
        Duration::from_millis(1500)
    }

    fn apply(&self, world: &mut World) -> Result<EffectOutcome, WorldError> {
        let hero = world.player_entity();
        let size = Vec2::splat(20.0);
        let direction = hero.direction();
        let center = hero.center() + direction.unit_vector() * 25.0;
        let entity = WorldEntity::new(position_from_center(center, size), size)
            .with_speed(0.3)
            .moving_in(direction);
        let _ = world.spawn_projectile(
            entity,
            Box::new(FireballFlight {
                remaining: Duration::from_millis(1500),
                damage: 8.0,
            }),
        );
        Ok(EffectOutcome::Applied)
    }
}

#[derive(Debug)]
struct FireballFlight {
    remaining: Duration,
    damage: f32,
}

impl ProjectileController for FireballFlight {
    fn notify_time_passed(
        &mut self,
        _world: &mut World,
        _projectile: &mut WorldEntity,
        dt: Duration,
    ) -> Result<ProjectileLifetime, WorldError> {
        self.remaining = self.remaining.saturating_sub(dt);
        if self.remaining.is_zero() {
            return Ok(ProjectileLifetime::Expired);
        }
        Ok(ProjectileLifetime::Alive)
    }

    fn apply_enemy_collision(&mut self, world: &mut World, enemy: EntityId) -> Result<bool, WorldError> {
        let damage = self.damage * world.player().magic_damage_modifier();
        let Some(npc) = world.npc_mut(enemy) else {
            return Ok(true);
        };
        let amount = npc.health_mut().lose(damage);
        world.notify_player_about_event(GameEvent::PlayerDamagedEnemy { enemy, amount })?;
        Ok(true)
    }

    fn apply_wall_collision(&mut self, _world: &mut World) -> Result<bool, WorldError> {
        Ok(true)
    }
}

#[derive(Debug, Default)]
struct HealthPotion;

impl ConsumableEffect for HealthPotion {
    fn apply(&self, world: &mut World) -> Result<EffectOutcome, WorldError> {
        if world.player().health().is_at_max() {
            return Ok(EffectOutcome::Refused {
                reason: "You're already at full health".to_owned(),
            });
        }
        let _ = world.gain_buff(
            Actor::Player,
            Box::new(HealingOverTime { per_second: 8.0 }),
            Some(Duration::from_secs(3)),
        );
        Ok(EffectOutcome::Applied)
    }
}

#[derive(Debug)]
struct HealingOverTime {
    per_second: f32,
}

impl BuffEffect for HealingOverTime {
    fn buff_type(&self) -> BuffTypeId {
        HEALING_OVER_TIME
    }

    fn apply_middle(&mut self, world: &mut World, owner: Actor, dt: Duration) -> Result<bool, WorldError> {
        if let Some(health) = world.health_mut(owner) {
            let _ = health.gain(self.per_second * dt.as_secs_f32());
        }
        Ok(false)
    }
}

#[derive(Debug)]
struct Stunned;

impl BuffEffect for Stunned {
    fn buff_type(&self) -> BuffTypeId {
        STUNNED
    }

    fn apply_start(&mut self, world: &mut World, owner: Actor) -> Result<(), WorldError> {
        if let Some(stun) = world.stun_mut(owner) {
            stun.add_one();
        }
        Ok(())
    }

    fn apply_end(&mut self, world: &mut World, owner: Actor) -> Result<(), WorldError> {
        match world.stun_mut(owner) {
            Some(stun) => stun.remove_one(),
            None => Ok(()),
        }
    }
}

/// Walks toward a visible player and strikes when adjacent.
#[derive(Debug, Default)]
struct GoblinMind {
    attack_cooldown: Duration,
}

impl NpcMind for GoblinMind {
    fn control(
        &mut self,
        world: &mut World,
        npc: EntityId,
        player: &WorldEntity,
        player_is_invisible: bool,
        dt: Duration,
    ) -> Result<(), WorldError> {
        self.attack_cooldown = self.attack_cooldown.saturating_sub(dt);
        let Some(goblin) = world.npc_mut(npc) else {
            return Ok(());
        };
        let entity = goblin.entity_mut();
        let offset = player.center() - entity.center();

        if player_is_invisible || offset.length() > AGGRO_DISTANCE {
            entity.set_not_moving();
            return Ok(());
        }
        if !within_axis_distance(player.center(), entity.center(), MELEE_REACH) {
            entity.set_moving_in_direction(direction_toward(offset));
            return Ok(());
        }

        entity.set_not_moving();
        if !self.attack_cooldown.is_zero() {
            return Ok(());
        }
        self.attack_cooldown = Duration::from_millis(900);
        strike_player(world, npc)
    }
}

fn direction_toward(offset: Vec2) -> Direction {
    if offset.x.abs() > offset.y.abs() {
        if offset.x > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if offset.y > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

fn strike_player(world: &mut World, attacker: EntityId) -> Result<(), WorldError> {
    world.notify_player_about_event(GameEvent::PlayerWasAttacked {
        attacker: Some(attacker),
    })?;
    let dodge = world.player().dodge_chance();
    if world.rng().gen_bool(f64::from(dodge.clamp(0.0, 1.0))) {
        world.show_message("Dodged!");
        return Ok(());
    }

    let damage = (5.0 - world.player().armor() * 0.25).max(1.0);
    let amount = world.player_mut().health_mut().lose(damage);
    world.notify_player_about_event(GameEvent::PlayerLostHealth {
        amount,
        attacker: Some(attacker),
    })?;
    if world.rng().gen_bool(0.1) {
        let _ = world.gain_buff(Actor::Player, Box::new(Stunned), Some(Duration::from_millis(400)));
    }
    Ok(())
}

/// Fills the world with walls, decorations, goblins, a chest and some loot.
pub(crate) fn populate(world: &mut World) -> Result<(), WorldError> {
    world.player_mut().gain_ability(FIREBALL);

    let bounds = world.bounds();
    for column in 0..(bounds.width() / TILE) as u32 {
        let x = bounds.x() + column as f32 * TILE;
        for y in [bounds.y(), bounds.bottom() - TILE] {
            let _ = world.add_wall(
                WallTypeId::new("stone"),
                WorldEntity::new(Vec2::new(x, y), Vec2::splat(TILE)),
            )?;
        }
    }
    for row in 4..9 {
        let _ = world.add_wall(
            WallTypeId::new("stone"),
            WorldEntity::new(Vec2::new(650.0, row as f32 * TILE), Vec2::splat(TILE)),
        )?;
    }
    for index in 0..12 {
        let spot = Vec2::new(120.0 + index as f32 * 140.0, 200.0 + (index % 4) as f32 * 90.0);
        let _ = world.add_decoration(DecorationTypeId::new("grass"), spot)?;
    }

    let goblins = [
        Vec2::new(450.0, 120.0),
        Vec2::new(520.0, 380.0),
        Vec2::new(300.0, 480.0),
        Vec2::new(1400.0, 1200.0),
    ];
    for spot in goblins {
        let loot = ChanceLootTable::new()
            .with_entry(LootEntry::Money(4), 0.8)
            .with_entry(LootEntry::Consumable(HEALTH_POTION), 0.3)
            .with_entry(LootEntry::Item(WINGED_BOOTS), 0.1);
        let _ = world.spawn_npc(
            Npc::new(
                NpcTypeId::new("goblin"),
                WorldEntity::new(spot, Vec2::splat(30.0)).with_speed(0.06),
                ResourceGauge::new(18, 0.5),
                NpcCategory::Enemy,
            )
            .with_mind(Box::<GoblinMind>::default())
            .with_loot_table(Box::new(loot))
            .with_leash(400.0)
            .with_exp_reward(20)
            .with_death_sound(SoundId::new("goblin_death")),
        );
    }

    let _ = world.add_chest(Chest::new(
        WorldEntity::new(Vec2::new(200.0, 240.0), Vec2::splat(35.0)),
        Box::new(
            ChanceLootTable::new()
                .with_entry(LootEntry::Item(ROYAL_SWORD), 1.0)
                .with_entry(LootEntry::Money(25), 1.0),
        ),
    ));
    let _ = world.add_ground_loot(
        GroundLootKind::Consumable(HEALTH_POTION),
        Vec2::new(160.0, 100.0),
    );
    Ok(())
}

/// Scripted intents issued at the start of `frame`.
pub(crate) fn scripted_commands(world: &World, frame: u64) -> Vec<Command> {
    let mut commands: Vec<Command> = world
        .ground_loot_iter()
        .filter(|(_, loot)| loot.entity().rect().intersects(&world.player_entity().rect()))
        .map(|(loot, _)| Command::PickUpLoot { loot })
        .collect();

    match frame % 240 {
        0 => commands.push(Command::MoveInDirection {
            direction: Direction::Right,
        }),
        60 => commands.push(Command::MoveInDirection {
            direction: Direction::Down,
        }),
        120 => commands.push(Command::MoveInDirection {
            direction: Direction::Left,
        }),
        180 => commands.push(Command::MoveInDirection {
            direction: Direction::Up,
        }),
        _ => {}
    }
    if frame % 20 == 0 {
        commands.push(Command::UseAbility {
            ability: SWORD_SLASH,
        });
    }
    if frame % 90 == 45 {
        commands.push(Command::UseAbility { ability: FIREBALL });
    }
    if world.player().health().ratio() < 0.5 {
        commands.push(Command::UseConsumable { slot: 0 });
    }
    if let Some(&level) = world.player().unlocked_talents().first() {
        commands.push(Command::ChooseTalent {
            level,
            talent: TalentId::new("battle_hardened"),
            upgrade: UpgradeId::new("armor_per_level"),
        });
    }
    let hero = world.player_entity().center();
    commands.extend(
        world
            .chests()
            .filter(|(_, chest)| within_axis_distance(chest.entity().center(), hero, CHEST_REACH))
            .map(|(chest, _)| Command::OpenChest { chest }),
    );
    commands
}
