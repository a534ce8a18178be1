#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tentative-move resolver for the player, NPCs and projectiles.
//!
//! A mover computes a candidate position from its direction and effective
//! speed, clamps it into the world, tests the candidate rectangle against
//! everything solid and either commits or stays put. There is no sweep: a move
//! can tunnel through an obstacle thinner than the distance travelled in one
//! frame, so callers must keep frame deltas small relative to entity sizes.

use std::time::Duration;

use emberfall_core::{Actor, EntityId, Rect};
use emberfall_world::{World, WorldError};
use tracing::trace;

/// Result of resolving one mover for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The mover is not moving or does not exist.
    Idle,
    /// The candidate position was committed.
    Moved,
    /// The candidate overlapped something solid.
    Blocked,
    /// The candidate lay beyond the NPC's leash.
    Leashed,
}

/// Resolves the player's movement.
///
/// # Errors
///
/// Returns [`WorldError::PositionOutsideWorld`] when the clamped candidate is
/// still outside the world.
pub fn move_player(world: &mut World, dt: Duration) -> Result<MoveOutcome, WorldError> {
    resolve(world, Actor::Player, dt)
}

/// Resolves the movement of NPC `npc`, honouring its leash.
///
/// # Errors
///
/// Returns [`WorldError::PositionOutsideWorld`] when the clamped candidate is
/// still outside the world.
pub fn move_npc(world: &mut World, npc: EntityId, dt: Duration) -> Result<MoveOutcome, WorldError> {
    resolve(world, Actor::Npc(npc), dt)
}

/// Moves every moving projectile along its direction without collision checks.
pub fn advance_projectiles(world: &mut World, dt: Duration) {
    for projectile in world.projectiles_mut() {
        let entity = projectile.entity_mut();
        if let Some(candidate) = entity.candidate_position(dt) {
            entity.set_position(candidate);
        }
    }
}

/// Whether `rect` overlaps any NPC other than `mover`, the player unless it is
/// the mover, a nearby wall, a portal, a warp point or a chest.
///
/// # Errors
///
/// Returns [`WorldError::PositionOutsideWorld`] when the upper-left corner of
/// `rect` lies outside the world; callers clamp before asking.
pub fn would_collide(world: &World, mover: Actor, rect: &Rect) -> Result<bool, WorldError> {
    let position = rect.top_left();
    if !world.is_within_world(position) {
        return Err(WorldError::PositionOutsideWorld {
            x: position.x,
            y: position.y,
        });
    }

    let hits_npc = world
        .npcs()
        .any(|(id, npc)| mover != Actor::Npc(id) && npc.entity().rect().intersects(rect));
    let hits_player =
        mover != Actor::Player && world.player_entity().rect().intersects(rect);

    Ok(hits_npc
        || hits_player
        || world.rect_intersects_wall(rect)
        || world.portals().any(|portal| portal.entity().rect().intersects(rect))
        || world
            .warp_points()
            .any(|warp| warp.entity().rect().intersects(rect))
        || world.chests().any(|(_, chest)| chest.entity().rect().intersects(rect)))
}

fn resolve(world: &mut World, mover: Actor, dt: Duration) -> Result<MoveOutcome, WorldError> {
    let Some(entity) = world.entity(mover) else {
        return Ok(MoveOutcome::Idle);
    };
    let Some(candidate) = entity.candidate_position(dt) else {
        return Ok(MoveOutcome::Idle);
    };
    let size = entity.size();
    let candidate = world.clamp_to_world(candidate, size);

    if let Actor::Npc(id) = mover {
        if world.npc(id).is_some_and(|npc| !npc.is_within_leash(candidate)) {
            trace!(npc = id.get(), "npc_leashed");
            return Ok(MoveOutcome::Leashed);
        }
    }

    let rect = Rect::from_position_and_size(candidate, size);
    if would_collide(world, mover, &rect)? {
        trace!(?mover, "move_blocked");
        return Ok(MoveOutcome::Blocked);
    }

    if let Some(entity) = world.entity_mut(mover) {
        entity.set_position(candidate);
    }
    Ok(MoveOutcome::Moved)
}
