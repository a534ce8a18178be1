#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Buff lifecycle engine shared by the player and every NPC.
//!
//! [`advance_buffs`] is the pure state machine: it advances timers, marks new
//! buffs started and pulls ended buffs out of the list. [`run_buff_lifecycle`]
//! detaches an owner's list from the world, runs the engine and fires the
//! start, middle and end hooks with world access.

use std::time::Duration;

use emberfall_core::{Actor, BuffTypeId};
use emberfall_world::{BuffList, BuffWithDuration, World, WorldError};
use tracing::trace;

/// Classification of one owner's buffs after a lifecycle pass.
///
/// The three lists are disjoint. Ended buffs have already been removed from
/// the owner's list and are handed over so their end hook can fire.
#[derive(Debug, Default)]
pub struct BuffsUpdate {
    /// Buffs seen for the first time this pass.
    pub started: Vec<BuffTypeId>,
    /// Buffs that keep running.
    pub active: Vec<BuffTypeId>,
    /// Buffs that ran out or were cancelled.
    pub ended: Vec<BuffWithDuration>,
}

impl BuffsUpdate {
    /// Whether the pass changed nothing worth reporting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.active.is_empty() && self.ended.is_empty()
    }
}

/// Advances every buff in `buffs` by `dt` and classifies it.
///
/// A buff is started on its first pass, ended on a later pass once it expired
/// or was cancelled, and active otherwise. Only buffs present when the call
/// begins are visited.
pub fn advance_buffs(buffs: &mut BuffList, dt: Duration) -> BuffsUpdate {
    let mut update = BuffsUpdate::default();
    let mut ending = Vec::new();

    for buff in buffs.iter_mut() {
        buff.notify_time_passed(dt);
        if !buff.has_started() {
            buff.mark_started();
            update.started.push(buff.buff_type());
        } else if buff.has_expired() {
            ending.push(buff.buff_type());
        } else {
            update.active.push(buff.buff_type());
        }
    }

    update.ended = ending
        .into_iter()
        .filter_map(|buff_type| buffs.remove(buff_type))
        .collect();
    update
}

/// Runs one lifecycle pass over the buffs of `owner` and fires their hooks.
///
/// Hooks run in order: start hooks, then middle hooks (a middle hook returning
/// `true` cancels its buff, which ends on the next pass), then end hooks.
/// Buffs granted by a hook join the owner's list after the pass and start on
/// the next one. Player events dispatched by a hook reach the owner's other
/// buffs once the list is reattached. Owners that no longer exist are skipped.
///
/// # Errors
///
/// Propagates the first error raised by a hook. The owner's buffs are
/// reattached before the error is returned.
pub fn run_buff_lifecycle(world: &mut World, owner: Actor, dt: Duration) -> Result<(), WorldError> {
    let Some(mut buffs) = world.take_buffs(owner) else {
        return Ok(());
    };
    let update = advance_buffs(&mut buffs, dt);
    if !update.is_empty() {
        trace!(
            ?owner,
            started = update.started.len(),
            active = update.active.len(),
            ended = update.ended.len(),
            "buffs_advanced"
        );
    }
    let outcome = fire_hooks(world, owner, &mut buffs, update, dt);
    world.restore_buffs(owner, buffs);
    outcome
}

fn fire_hooks(
    world: &mut World,
    owner: Actor,
    buffs: &mut BuffList,
    update: BuffsUpdate,
    dt: Duration,
) -> Result<(), WorldError> {
    for buff_type in update.started {
        if let Some(buff) = buffs.get_mut(buff_type) {
            buff.effect_mut().apply_start(world, owner)?;
        }
    }

    for buff_type in update.active {
        if let Some(buff) = buffs.get_mut(buff_type) {
            if buff.effect_mut().apply_middle(world, owner, dt)? {
                buff.force_cancel();
            }
        }
    }

    for mut buff in update.ended {
        buff.effect_mut().apply_end(world, owner)?;
    }
    Ok(())
}
