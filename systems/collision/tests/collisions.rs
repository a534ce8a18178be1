use std::{cell::RefCell, rc::Rc, time::Duration};

use emberfall_core::{AudioCue, EntityId, NpcCategory, NpcTypeId, WallTypeId};
use emberfall_system_collision::resolve_collisions;
use emberfall_world::{
    Npc, PlayerSetup, ProjectileController, ProjectileLifetime, ResourceGauge, World, WorldConfig,
    WorldEntity, WorldError,
};
use glam::Vec2;

type Hits = Rc<RefCell<Vec<(&'static str, Option<EntityId>)>>>;

/// Deals damage to whatever it touches and records every hook call.
#[derive(Debug)]
struct Bolt {
    hits: Hits,
    damage: f32,
    removed_on_hit: bool,
}

impl Bolt {
    fn boxed(hits: &Hits, removed_on_hit: bool) -> Box<Self> {
        Box::new(Self {
            hits: Rc::clone(hits),
            damage: 6.0,
            removed_on_hit,
        })
    }
}

impl ProjectileController for Bolt {
    fn notify_time_passed(
        &mut self,
        _world: &mut World,
        _projectile: &mut WorldEntity,
        _dt: Duration,
    ) -> Result<ProjectileLifetime, WorldError> {
        Ok(ProjectileLifetime::Alive)
    }

    fn apply_enemy_collision(&mut self, world: &mut World, enemy: EntityId) -> Result<bool, WorldError> {
        self.hits.borrow_mut().push(("enemy", Some(enemy)));
        if let Some(npc) = world.npc_mut(enemy) {
            let _ = npc.health_mut().lose(self.damage);
        }
        Ok(self.removed_on_hit)
    }

    fn apply_player_summon_collision(
        &mut self,
        _world: &mut World,
        summon: EntityId,
    ) -> Result<bool, WorldError> {
        self.hits.borrow_mut().push(("summon", Some(summon)));
        Ok(self.removed_on_hit)
    }

    fn apply_player_collision(&mut self, world: &mut World) -> Result<bool, WorldError> {
        self.hits.borrow_mut().push(("player", None));
        let _ = world.player_mut().health_mut().lose(self.damage);
        Ok(self.removed_on_hit)
    }

    fn apply_wall_collision(&mut self, _world: &mut World) -> Result<bool, WorldError> {
        self.hits.borrow_mut().push(("wall", None));
        Ok(true)
    }
}

fn world() -> World {
    World::new(WorldConfig::default(), &PlayerSetup::default())
}

fn npc(position: Vec2, category: NpcCategory) -> Npc {
    Npc::new(
        NpcTypeId::new("imp"),
        WorldEntity::new(position, Vec2::splat(30.0)),
        ResourceGauge::new(10, 0.0),
        category,
    )
}

fn bolt_at(position: Vec2) -> WorldEntity {
    WorldEntity::new(position, Vec2::splat(10.0))
}

#[test]
fn both_projectiles_hit_before_either_is_removed() {
    let mut world = world();
    let enemy = world.spawn_npc(npc(Vec2::new(400.0, 400.0), NpcCategory::Enemy));
    let hits = Hits::default();
    let first = world.spawn_projectile(bolt_at(Vec2::new(405.0, 405.0)), Bolt::boxed(&hits, true));
    let second = world.spawn_projectile(bolt_at(Vec2::new(410.0, 410.0)), Bolt::boxed(&hits, true));

    let outcome = resolve_collisions(&mut world).unwrap();

    assert_eq!(
        hits.borrow().as_slice(),
        &[("enemy", Some(enemy)), ("enemy", Some(enemy))]
    );
    assert_eq!(world.npc(enemy).unwrap().health().value(), 0);
    assert!(outcome.removed.contains(&first) && outcome.removed.contains(&second));
    assert!(world.projectiles().is_empty());
}

#[test]
fn projectiles_that_stay_keep_flying() {
    let mut world = world();
    let _ = world.spawn_npc(npc(Vec2::new(400.0, 400.0), NpcCategory::Enemy));
    let hits = Hits::default();
    let piercing = world.spawn_projectile(bolt_at(Vec2::new(405.0, 405.0)), Bolt::boxed(&hits, false));

    let outcome = resolve_collisions(&mut world).unwrap();

    assert!(outcome.removed.is_empty());
    assert_eq!(world.projectiles()[0].id(), piercing);
}

#[test]
fn hooks_run_in_pass_order() {
    let mut world = world();
    let summon = world.spawn_npc(npc(Vec2::new(700.0, 700.0), NpcCategory::PlayerSummon));
    let enemy = world.spawn_npc(npc(Vec2::new(400.0, 400.0), NpcCategory::Enemy));
    let _ = world.spawn_npc(npc(Vec2::new(1000.0, 1000.0), NpcCategory::Neutral));
    let _ = world
        .add_wall(
            WallTypeId::new("stone"),
            WorldEntity::new(Vec2::new(1500.0, 1500.0), Vec2::splat(50.0)),
        )
        .unwrap();
    let hits = Hits::default();
    let _ = world.spawn_projectile(bolt_at(Vec2::new(1510.0, 1510.0)), Bolt::boxed(&hits, false));
    let _ = world.spawn_projectile(bolt_at(Vec2::new(105.0, 105.0)), Bolt::boxed(&hits, false));
    let _ = world.spawn_projectile(bolt_at(Vec2::new(705.0, 705.0)), Bolt::boxed(&hits, false));
    let _ = world.spawn_projectile(bolt_at(Vec2::new(1005.0, 1005.0)), Bolt::boxed(&hits, false));
    let _ = world.spawn_projectile(bolt_at(Vec2::new(405.0, 405.0)), Bolt::boxed(&hits, false));

    let outcome = resolve_collisions(&mut world).unwrap();

    assert_eq!(
        hits.borrow().as_slice(),
        &[
            ("enemy", Some(enemy)),
            ("summon", Some(summon)),
            ("player", None),
            ("wall", None),
        ]
    );
    assert_eq!(outcome.removed.len(), 1);
    assert_eq!(world.projectiles().len(), 4);
    assert_eq!(world.player().health().value(), 54);
}

#[test]
fn touching_money_is_collected_once() {
    let mut world = world();
    let audio = world.subscribe_audio();
    let _ = world.add_money_pile(12, Vec2::new(110.0, 110.0));
    let _ = world.add_money_pile(5, Vec2::new(900.0, 900.0));

    let outcome = resolve_collisions(&mut world).unwrap();
    assert_eq!(outcome.money_collected, 12);
    assert_eq!(world.player().money(), 12);
    assert_eq!(audio.try_recv(), Ok(AudioCue::PickedUpMoney));
    assert_eq!(world.money_piles().count(), 1);

    let again = resolve_collisions(&mut world).unwrap();
    assert_eq!(again.money_collected, 0);
    assert_eq!(world.player().money(), 12);
}
