#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Broad-phase collision pass run once per frame after movement.
//!
//! The pass visits, in order: the player against money piles, every enemy
//! against overlapping projectiles, every player summon against overlapping
//! projectiles, the player against overlapping projectiles and finally every
//! projectile against walls. Hooks only flag entities; flagged entities are
//! removed in one batch once every hook has run.

use std::collections::BTreeSet;

use emberfall_core::{AudioCue, EntityId, NpcCategory, Rect};
use emberfall_world::{Projectile, World, WorldError};
use tracing::debug;

/// Summary of one collision pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionOutcome {
    /// Coins picked up from money piles.
    pub money_collected: u32,
    /// Entities removed at the end of the pass.
    pub removed: BTreeSet<EntityId>,
}

/// Runs the collision pass and removes every flagged entity.
///
/// # Errors
///
/// Propagates the first error raised by a projectile collision hook. Nothing
/// is removed in that case; projectiles are reattached to the world first.
pub fn resolve_collisions(world: &mut World) -> Result<CollisionOutcome, WorldError> {
    let mut outcome = CollisionOutcome::default();
    pick_up_money(world, &mut outcome);

    let mut projectiles = world.take_projectiles();
    let hooks = run_projectile_hooks(world, &mut projectiles, &mut outcome.removed);
    world.restore_projectiles(projectiles);
    hooks?;

    if !outcome.removed.is_empty() {
        debug!(count = outcome.removed.len(), "collision_removals");
    }
    world.remove_entities(&outcome.removed);
    Ok(outcome)
}

fn pick_up_money(world: &mut World, outcome: &mut CollisionOutcome) {
    let player = world.player_entity().rect();
    let touched: Vec<(EntityId, u32)> = world
        .money_piles()
        .filter(|(_, pile)| pile.entity().rect().intersects(&player))
        .map(|(id, pile)| (id, pile.amount()))
        .collect();

    for (id, amount) in touched {
        world.play_sound(AudioCue::PickedUpMoney);
        world.player_mut().modify_money(i64::from(amount));
        outcome.money_collected += amount;
        let _ = outcome.removed.insert(id);
    }
}

fn npcs_of(world: &World, category: NpcCategory) -> Vec<EntityId> {
    world
        .npcs()
        .filter(|(_, npc)| npc.category() == category)
        .map(|(id, _)| id)
        .collect()
}

fn run_projectile_hooks(
    world: &mut World,
    projectiles: &mut [Projectile],
    flagged: &mut BTreeSet<EntityId>,
) -> Result<(), WorldError> {
    for enemy in npcs_of(world, NpcCategory::Enemy) {
        let Some(rect) = world.npc(enemy).map(|npc| npc.entity().rect()) else {
            continue;
        };
        for projectile in overlapping(projectiles, &rect) {
            if projectile.controller_mut().apply_enemy_collision(world, enemy)? {
                flag(projectile, flagged);
            }
        }
    }

    for summon in npcs_of(world, NpcCategory::PlayerSummon) {
        let Some(rect) = world.npc(summon).map(|npc| npc.entity().rect()) else {
            continue;
        };
        for projectile in overlapping(projectiles, &rect) {
            if projectile
                .controller_mut()
                .apply_player_summon_collision(world, summon)?
            {
                flag(projectile, flagged);
            }
        }
    }

    let player = world.player_entity().rect();
    for projectile in overlapping(projectiles, &player) {
        if projectile.controller_mut().apply_player_collision(world)? {
            flag(projectile, flagged);
        }
    }

    for projectile in projectiles.iter_mut() {
        if world.rect_intersects_wall(&projectile.entity().rect())
            && projectile.controller_mut().apply_wall_collision(world)?
        {
            flag(projectile, flagged);
        }
    }
    Ok(())
}

fn overlapping<'a>(
    projectiles: &'a mut [Projectile],
    rect: &'a Rect,
) -> impl Iterator<Item = &'a mut Projectile> {
    projectiles
        .iter_mut()
        .filter(move |projectile| projectile.entity().rect().intersects(rect))
}

fn flag(projectile: &mut Projectile, flagged: &mut BTreeSet<EntityId>) {
    projectile.mark_collided();
    let _ = flagged.insert(projectile.id());
}
