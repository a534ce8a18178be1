#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame orchestrator that advances the Emberfall world one step at a time.
//!
//! [`FrameOrchestrator::run_frame`] runs the whole per-frame pipeline to
//! completion: NPC minds, timers and projectile controllers, reaping, buff
//! lifecycles, item ticks, regeneration, movement, collisions, camera and
//! respawn. [`FrameOrchestrator::apply`] turns player intents into world
//! mutations between frames.

mod catalog;
mod intents;

use std::time::Duration;

use emberfall_core::{Actor, AudioCue, EntityId, GameEvent, ProgressEvent};
use emberfall_system_buffs::run_buff_lifecycle;
use emberfall_system_collision::{resolve_collisions, CollisionOutcome};
use emberfall_system_movement::{advance_projectiles, move_npc, move_player};
use emberfall_world::{exp_text, respawn_effects, Npc, ProjectileLifetime, World, WorldError};
use tracing::{debug, info, trace};

pub use catalog::{AbilityEffect, ConsumableEffect, ContentCatalog, EffectOutcome};

/// What happened during one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Zero-based index of the frame.
    pub frame: u64,
    /// NPCs removed because their health ran out.
    pub reaped: Vec<EntityId>,
    /// Experience awarded for reaped enemies.
    pub exp_gained: u32,
    /// Progression milestones reached this frame.
    pub progress: Vec<ProgressEvent>,
    /// Outcome of the collision pass.
    pub collisions: CollisionOutcome,
    /// Whether the player died and respawned.
    pub respawned: bool,
}

/// Sequences every system that touches the world during a frame.
#[derive(Debug)]
pub struct FrameOrchestrator {
    catalog: Box<dyn ContentCatalog>,
    frame: u64,
}

impl FrameOrchestrator {
    /// Creates an orchestrator resolving content through `catalog`.
    #[must_use]
    pub fn new(catalog: Box<dyn ContentCatalog>) -> Self {
        Self { catalog, frame: 0 }
    }

    /// Number of frames run so far.
    #[must_use]
    pub fn frames_run(&self) -> u64 {
        self.frame
    }

    /// Fires the start hook of every item the player begins with.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by item start hooks.
    pub fn initialize(&mut self, world: &mut World) -> Result<(), WorldError> {
        world.with_equipped_items(|item, world| item.apply_start(world))
    }

    /// Advances `world` by `dt`.
    ///
    /// NPCs outside the camera window widened by the activity margin neither
    /// think nor move. Stunned NPCs neither think nor move; a stunned player
    /// keeps moving in the direction committed before the stun.
    ///
    /// # Errors
    ///
    /// Any [`WorldError`] raised by a system or content hook aborts the frame.
    pub fn run_frame(&mut self, world: &mut World, dt: Duration) -> Result<FrameReport, WorldError> {
        let mut report = FrameReport {
            frame: self.frame,
            ..FrameReport::default()
        };
        self.frame += 1;

        run_npc_minds(world, dt)?;

        world.advance_camera(dt);
        world.advance_visual_effects(dt);
        advance_projectile_controllers(world, dt)?;

        reap_dead_npcs(world, &mut report)?;

        world.remove_expired_projectiles();
        world.remove_expired_visual_effects();

        run_buff_lifecycle(world, Actor::Player, dt)?;
        for npc in world.npc_ids() {
            if let Some(npc) = world.npc_mut(npc) {
                npc.health_mut().regenerate(dt);
            }
            run_buff_lifecycle(world, Actor::Npc(npc), dt)?;
        }

        world.with_equipped_items(|item, world| item.apply_middle(world, dt))?;

        world.player_mut().regenerate(dt);
        world.player_mut().recharge_cooldowns(dt);

        world.player_entity_mut().update_movement_animation(dt);
        for (_, npc) in world.npcs_mut() {
            npc.entity_mut().update_movement_animation(dt);
        }
        for projectile in world.projectiles_mut() {
            projectile.entity_mut().update_movement_animation(dt);
        }

        for npc in world.npc_ids() {
            if is_npc_active(world, npc) {
                let _ = move_npc(world, npc, dt)?;
            }
        }
        let _ = move_player(world, dt)?;
        advance_projectiles(world, dt);

        world.update_attached_visual_effects();

        report.collisions = resolve_collisions(world)?;

        world.center_camera_on_player();

        if world.player().health().is_at_or_below_zero() {
            respawn_player(world);
            report.respawned = true;
        }

        trace!(frame = report.frame, "frame_completed");
        Ok(report)
    }
}

fn is_npc_active(world: &World, npc: EntityId) -> bool {
    world
        .npc(npc)
        .is_some_and(|npc| !npc.is_stunned() && world.is_in_activity_range(&npc.entity().rect()))
}

fn run_npc_minds(world: &mut World, dt: Duration) -> Result<(), WorldError> {
    for npc in world.npc_ids() {
        if !is_npc_active(world, npc) {
            continue;
        }
        let Some(mut mind) = world.take_npc_mind(npc) else {
            continue;
        };
        let player = world.player_entity().clone();
        let player_is_invisible = world.player().is_invisible();
        let outcome = mind.control(world, npc, &player, player_is_invisible, dt);
        world.restore_npc_mind(npc, mind);
        outcome?;
    }
    Ok(())
}

fn advance_projectile_controllers(world: &mut World, dt: Duration) -> Result<(), WorldError> {
    let mut projectiles = world.take_projectiles();
    let mut outcome = Ok(());
    for projectile in &mut projectiles {
        let (controller, entity) = projectile.parts_mut();
        match controller.notify_time_passed(world, entity, dt) {
            Ok(ProjectileLifetime::Alive) => {}
            Ok(ProjectileLifetime::Expired) => projectile.mark_expired(),
            Err(error) => {
                outcome = Err(error);
                break;
            }
        }
    }
    world.restore_projectiles(projectiles);
    outcome
}

fn reap_dead_npcs(world: &mut World, report: &mut FrameReport) -> Result<(), WorldError> {
    let dead = world.remove_dead_npcs();
    report.reaped = dead.iter().map(|(id, _)| *id).collect();
    let enemies: Vec<(EntityId, Npc)> = dead.into_iter().filter(|(_, npc)| npc.is_enemy()).collect();
    if enemies.is_empty() {
        return Ok(());
    }

    let exp: u32 = enemies.iter().map(|(_, npc)| npc.exp_reward()).sum();
    report.exp_gained = exp;
    let center = world.player_entity().center();
    world.add_visual_effect(exp_text(center, exp));

    let progress = world.player_mut().gain_exp(exp);
    if progress
        .iter()
        .any(|event| matches!(event, ProgressEvent::LeveledUp { .. }))
    {
        let level = world.player().level();
        info!(level, "player_leveled_up");
        world.play_sound(AudioCue::PlayerLeveledUp);
        world.show_message(format!("You reached level {level}"));
    }
    report.progress = progress;

    for (id, enemy) in enemies {
        debug!(npc = id.get(), npc_type = enemy.npc_type().name(), "npc_reaped");
        let cue = enemy
            .death_sound()
            .map_or(AudioCue::EnemyDied, AudioCue::Custom);
        world.play_sound(cue);
        if let Some(table) = enemy.loot_table() {
            let loot = world.generate_loot(table);
            let _ = world.place_loot(enemy.entity().position(), &loot);
        }
        world.notify_player_about_event(GameEvent::EnemyDied)?;
    }
    Ok(())
}

fn respawn_player(world: &mut World) {
    let spawn = world.player_spawn_position();
    let health_ratio = world.config().respawn_health_ratio;
    let exp_loss = world.config().death_exp_loss_ratio;

    world.player_entity_mut().set_position(spawn);
    world.player_mut().health_mut().set_to_partial_of_max(health_ratio);
    world.player_mut().lose_exp_from_death(exp_loss);
    world.show_message("Lost exp from dying");
    world.play_sound(AudioCue::PlayerDied);
    let center = world.player_entity().center();
    for effect in respawn_effects(center) {
        world.add_visual_effect(effect);
    }
    info!(x = spawn.x, y = spawn.y, "player_respawned");
}
