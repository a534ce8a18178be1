use std::time::Duration;

use emberfall_core::{Actor, Direction, NpcCategory, NpcTypeId, Rect, WallTypeId};
use emberfall_system_movement::{advance_projectiles, move_npc, move_player, would_collide, MoveOutcome};
use emberfall_world::{
    Npc, PlayerSetup, ProjectileController, ProjectileLifetime, ResourceGauge, World, WorldConfig,
    WorldEntity, WorldError,
};
use glam::Vec2;
use proptest::prelude::*;

const FRAME: Duration = Duration::from_millis(100);

fn world() -> World {
    World::new(WorldConfig::default(), &PlayerSetup::default())
}

fn walking_npc(position: Vec2, direction: Direction) -> Npc {
    Npc::new(
        NpcTypeId::new("wolf"),
        WorldEntity::new(position, Vec2::splat(30.0))
            .with_speed(0.1)
            .moving_in(direction),
        ResourceGauge::new(10, 0.0),
        NpcCategory::Enemy,
    )
}

#[test]
fn free_move_commits_candidate() {
    let mut world = world();
    world
        .player_entity_mut()
        .set_moving_in_direction(Direction::Right);

    assert_eq!(move_player(&mut world, FRAME).unwrap(), MoveOutcome::Moved);
    let position = world.player_entity().position();
    assert!((position.x - 110.5).abs() < 1e-3);
    assert_eq!(position.y, 100.0);
}

#[test]
fn stationary_player_is_idle() {
    let mut world = world();
    assert_eq!(move_player(&mut world, FRAME).unwrap(), MoveOutcome::Idle);
    assert_eq!(world.player_entity().position(), Vec2::new(100.0, 100.0));
}

#[test]
fn wall_in_the_way_blocks_the_player() {
    let mut world = world();
    let _ = world
        .add_wall(
            WallTypeId::new("stone"),
            WorldEntity::new(Vec2::new(135.0, 100.0), Vec2::splat(40.0)),
        )
        .unwrap();
    world
        .player_entity_mut()
        .set_moving_in_direction(Direction::Right);

    assert_eq!(move_player(&mut world, FRAME).unwrap(), MoveOutcome::Blocked);
    assert_eq!(world.player_entity().position(), Vec2::new(100.0, 100.0));
}

#[test]
fn npc_does_not_collide_with_itself_but_stops_at_the_player() {
    let mut world = world();
    let lone = world.spawn_npc(walking_npc(Vec2::new(600.0, 600.0), Direction::Up));
    assert_eq!(move_npc(&mut world, lone, FRAME).unwrap(), MoveOutcome::Moved);

    let chaser = world.spawn_npc(walking_npc(Vec2::new(135.0, 100.0), Direction::Left));
    assert_eq!(move_npc(&mut world, chaser, FRAME).unwrap(), MoveOutcome::Blocked);
    assert_eq!(
        world.npc(chaser).unwrap().entity().position(),
        Vec2::new(135.0, 100.0)
    );
}

#[test]
fn leash_rejects_moves_regardless_of_collisions() {
    let mut world = world();
    let npc = world.spawn_npc(
        walking_npc(Vec2::new(600.0, 600.0), Direction::Right).with_leash(15.0),
    );

    assert_eq!(move_npc(&mut world, npc, FRAME).unwrap(), MoveOutcome::Moved);
    assert_eq!(move_npc(&mut world, npc, FRAME).unwrap(), MoveOutcome::Leashed);
    assert_eq!(
        world.npc(npc).unwrap().entity().position(),
        Vec2::new(610.0, 600.0)
    );
}

#[test]
fn candidate_is_clamped_into_the_world() {
    let mut world = world();
    world.player_entity_mut().set_position(Vec2::new(3.0, 500.0));
    world
        .player_entity_mut()
        .set_moving_in_direction(Direction::Left);

    assert_eq!(move_player(&mut world, FRAME).unwrap(), MoveOutcome::Moved);
    assert_eq!(world.player_entity().position(), Vec2::new(0.0, 500.0));
}

#[test]
fn unclamped_positions_are_rejected() {
    let world = world();
    let outcome = would_collide(&world, Actor::Player, &Rect::new(-10.0, 10.0, 5.0, 5.0));
    assert!(matches!(
        outcome,
        Err(WorldError::PositionOutsideWorld { .. })
    ));
}

#[test]
fn projectiles_move_without_collision_checks() {
    #[derive(Debug)]
    struct Arrow;

    impl ProjectileController for Arrow {
        fn notify_time_passed(
            &mut self,
            _world: &mut World,
            _projectile: &mut WorldEntity,
            _dt: Duration,
        ) -> Result<ProjectileLifetime, WorldError> {
            Ok(ProjectileLifetime::Alive)
        }
    }

    let mut world = world();
    let _ = world.spawn_projectile(
        WorldEntity::new(Vec2::new(60.0, 100.0), Vec2::splat(10.0))
            .with_speed(0.5)
            .moving_in(Direction::Right),
        Box::new(Arrow),
    );

    advance_projectiles(&mut world, FRAME);

    assert_eq!(
        world.projectiles()[0].entity().position(),
        Vec2::new(110.0, 100.0)
    );
}

proptest! {
    #[test]
    fn blocked_moves_leave_the_mover_in_place(
        offset_x in 31.0f32..40.0,
        offset_y in -29.0f32..29.0,
    ) {
        let mut world = world();
        let start = Vec2::new(500.0, 500.0);
        let _ = world.spawn_npc(walking_npc(start + Vec2::new(offset_x, offset_y), Direction::Down));
        world.player_entity_mut().set_position(start);
        world.player_entity_mut().set_moving_in_direction(Direction::Right);

        let outcome = move_player(&mut world, FRAME).unwrap();

        prop_assert_eq!(outcome, MoveOutcome::Blocked);
        prop_assert_eq!(world.player_entity().position(), start);
    }
}
