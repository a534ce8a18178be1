use std::{fmt, time::Duration};

use emberfall_core::{Actor, BuffEventOutcome, BuffSummary, BuffTypeId, GameEvent};

use crate::{World, WorldError};

/// Pluggable mechanics of a buff.
///
/// The world decides when the hooks fire; the effect decides what they do.
/// Hooks receive the world and the buff's owner on every call and must not
/// retain either.
pub trait BuffEffect: fmt::Debug {
    /// Kind of buff; at most one buff of each kind is active per owner.
    fn buff_type(&self) -> BuffTypeId;

    /// Fires once, on the first lifecycle pass after the buff was granted.
    fn apply_start(&mut self, _world: &mut World, _owner: Actor) -> Result<(), WorldError> {
        Ok(())
    }

    /// Fires on every later pass while the buff is active.
    ///
    /// Returning `true` force-cancels the buff.
    fn apply_middle(
        &mut self,
        _world: &mut World,
        _owner: Actor,
        _dt: Duration,
    ) -> Result<bool, WorldError> {
        Ok(false)
    }

    /// Fires once, on the pass that removes the buff.
    fn apply_end(&mut self, _world: &mut World, _owner: Actor) -> Result<(), WorldError> {
        Ok(())
    }

    /// Reacts to an event dispatched to the player.
    fn handle_event(&mut self, _event: &GameEvent) -> Option<BuffEventOutcome> {
        None
    }
}

/// A buff effect together with its remaining lifetime.
#[derive(Debug)]
pub struct BuffWithDuration {
    effect: Box<dyn BuffEffect>,
    remaining: Option<Duration>,
    total: Option<Duration>,
    force_cancelled: bool,
    started: bool,
}

impl BuffWithDuration {
    /// Wraps `effect`; a `duration` of `None` never expires on its own.
    #[must_use]
    pub fn new(effect: Box<dyn BuffEffect>, duration: Option<Duration>) -> Self {
        Self {
            effect,
            remaining: duration,
            total: duration,
            force_cancelled: false,
            started: false,
        }
    }

    /// Kind of the wrapped effect.
    #[must_use]
    pub fn buff_type(&self) -> BuffTypeId {
        self.effect.buff_type()
    }

    /// Mutable access to the wrapped effect.
    pub fn effect_mut(&mut self) -> &mut dyn BuffEffect {
        self.effect.as_mut()
    }

    /// Time left before expiry, `None` for unbounded buffs.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.remaining
    }

    /// Duration the buff was granted with.
    #[must_use]
    pub fn total(&self) -> Option<Duration> {
        self.total
    }

    /// Whether the start hook has been scheduled.
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Records that the start hook has been scheduled.
    pub fn mark_started(&mut self) {
        self.started = true;
    }

    /// Whether the buff was cancelled before its time ran out.
    #[must_use]
    pub fn is_force_cancelled(&self) -> bool {
        self.force_cancelled
    }

    /// Cancels the buff; it ends on the next lifecycle pass.
    pub fn force_cancel(&mut self) {
        self.force_cancelled = true;
        self.remaining = Some(Duration::ZERO);
    }

    /// Counts `dt` against the remaining time.
    pub fn notify_time_passed(&mut self, dt: Duration) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(dt);
        }
    }

    /// Whether the buff ran out of time or was cancelled.
    #[must_use]
    pub fn has_expired(&self) -> bool {
        self.force_cancelled || self.remaining == Some(Duration::ZERO)
    }

    /// Replaces the remaining time, leaving the total unchanged.
    pub fn set_remaining(&mut self, remaining: Option<Duration>) {
        self.remaining = remaining;
    }

    /// Adds time, never exceeding the total duration.
    pub fn extend(&mut self, delta: Duration) {
        if let (Some(remaining), Some(total)) = (self.remaining.as_mut(), self.total) {
            *remaining = remaining.saturating_add(delta).min(total);
        }
    }

    /// Removes time; a buff shortened to zero ends on the next pass.
    pub fn shorten(&mut self, delta: Duration) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(delta);
        }
    }

    /// Share of the total duration left, `None` for unbounded buffs.
    #[must_use]
    pub fn ratio_remaining(&self) -> Option<f32> {
        let remaining = self.remaining?;
        let total = self.total?;
        if total.is_zero() {
            return Some(0.0);
        }
        Some(remaining.as_secs_f32() / total.as_secs_f32())
    }

    /// Whether the buff lasts long enough to be drawn above NPCs.
    #[must_use]
    pub fn should_be_visualized_on_npcs(&self) -> bool {
        self.total.is_some_and(|total| total > Duration::from_secs(1))
    }

    /// Applies an event reaction produced by the effect.
    pub fn apply_outcome(&mut self, outcome: BuffEventOutcome) {
        match outcome {
            BuffEventOutcome::ExtendDuration(delta) => self.extend(delta),
            BuffEventOutcome::ShortenDuration(delta) => self.shorten(delta),
            BuffEventOutcome::Cancel => self.force_cancel(),
        }
    }

    fn summary(&self) -> BuffSummary {
        BuffSummary {
            buff_type: self.buff_type(),
            ratio_remaining: self.ratio_remaining(),
        }
    }
}

/// Active buffs of one owner, keyed by buff type.
#[derive(Debug, Default)]
pub struct BuffList {
    buffs: Vec<BuffWithDuration>,
}

impl BuffList {
    /// Grants a buff, refreshing the remaining time if one of the same type is active.
    pub fn gain(&mut self, effect: Box<dyn BuffEffect>, duration: Option<Duration>) {
        self.insert(BuffWithDuration::new(effect, duration));
    }

    /// Number of active buffs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffs.len()
    }

    /// Whether no buffs are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffs.is_empty()
    }

    /// Whether a buff of `buff_type` is active.
    #[must_use]
    pub fn has(&self, buff_type: BuffTypeId) -> bool {
        self.buffs.iter().any(|buff| buff.buff_type() == buff_type)
    }

    /// Active buff of `buff_type`.
    #[must_use]
    pub fn get(&self, buff_type: BuffTypeId) -> Option<&BuffWithDuration> {
        self.buffs.iter().find(|buff| buff.buff_type() == buff_type)
    }

    /// Mutable access to the active buff of `buff_type`.
    pub fn get_mut(&mut self, buff_type: BuffTypeId) -> Option<&mut BuffWithDuration> {
        self.buffs
            .iter_mut()
            .find(|buff| buff.buff_type() == buff_type)
    }

    /// Iterator over active buffs in the order they were granted.
    pub fn iter(&self) -> impl Iterator<Item = &BuffWithDuration> {
        self.buffs.iter()
    }

    /// Mutable iterator over active buffs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BuffWithDuration> {
        self.buffs.iter_mut()
    }

    /// Force-cancels every active buff.
    pub fn force_cancel_all(&mut self) {
        for buff in &mut self.buffs {
            buff.force_cancel();
        }
    }

    /// Removes and returns the buff of `buff_type`.
    pub fn remove(&mut self, buff_type: BuffTypeId) -> Option<BuffWithDuration> {
        let index = self
            .buffs
            .iter()
            .position(|buff| buff.buff_type() == buff_type)?;
        Some(self.buffs.remove(index))
    }

    /// Display summaries of the active buffs.
    #[must_use]
    pub fn summaries(&self) -> Vec<BuffSummary> {
        self.buffs.iter().map(BuffWithDuration::summary).collect()
    }

    /// Folds buffs granted while this list was detached from its owner back in.
    ///
    /// Buffs of a type already present refresh that entry's remaining time.
    pub fn absorb(&mut self, granted: BuffList) {
        for buff in granted.buffs {
            self.insert(buff);
        }
    }

    fn insert(&mut self, buff: BuffWithDuration) {
        match self.get_mut(buff.buff_type()) {
            Some(existing) => existing.set_remaining(buff.remaining),
            None => self.buffs.push(buff),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Marker(BuffTypeId);

    impl BuffEffect for Marker {
        fn buff_type(&self) -> BuffTypeId {
            self.0
        }
    }

    const HASTE: BuffTypeId = BuffTypeId::new("haste");
    const SHIELD: BuffTypeId = BuffTypeId::new("shield");

    #[test]
    fn regaining_refreshes_instead_of_stacking() {
        let mut list = BuffList::default();
        list.gain(Box::new(Marker(HASTE)), Some(Duration::from_millis(500)));
        list.get_mut(HASTE).unwrap().notify_time_passed(Duration::from_millis(400));

        list.gain(Box::new(Marker(HASTE)), Some(Duration::from_millis(2000)));

        assert_eq!(list.len(), 1);
        assert_eq!(list.get(HASTE).unwrap().remaining(), Some(Duration::from_millis(2000)));
    }

    #[test]
    fn extension_is_capped_at_total() {
        let mut buff = BuffWithDuration::new(Box::new(Marker(SHIELD)), Some(Duration::from_secs(3)));
        buff.notify_time_passed(Duration::from_secs(2));
        buff.apply_outcome(BuffEventOutcome::ExtendDuration(Duration::from_secs(5)));
        assert_eq!(buff.remaining(), Some(Duration::from_secs(3)));
        assert_eq!(buff.ratio_remaining(), Some(1.0));
    }

    #[test]
    fn cancel_expires_unbounded_buff() {
        let mut buff = BuffWithDuration::new(Box::new(Marker(SHIELD)), None);
        buff.notify_time_passed(Duration::from_secs(60));
        assert!(!buff.has_expired());

        buff.apply_outcome(BuffEventOutcome::Cancel);

        assert!(buff.has_expired());
        assert!(buff.is_force_cancelled());
    }

    #[test]
    fn absorbing_merges_by_type() {
        let mut list = BuffList::default();
        list.gain(Box::new(Marker(HASTE)), Some(Duration::from_millis(100)));

        let mut granted = BuffList::default();
        granted.gain(Box::new(Marker(HASTE)), Some(Duration::from_millis(900)));
        granted.gain(Box::new(Marker(SHIELD)), None);
        list.absorb(granted);

        assert_eq!(list.len(), 2);
        assert_eq!(list.get(HASTE).unwrap().remaining(), Some(Duration::from_millis(900)));
        assert!(list.has(SHIELD));
    }

    #[test]
    fn only_long_buffs_are_visualized_on_npcs() {
        let short = BuffWithDuration::new(Box::new(Marker(HASTE)), Some(Duration::from_millis(1000)));
        let long = BuffWithDuration::new(Box::new(Marker(HASTE)), Some(Duration::from_millis(1001)));
        assert!(!short.should_be_visualized_on_npcs());
        assert!(long.should_be_visualized_on_npcs());
    }
}
