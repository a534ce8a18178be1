use std::time::Duration;

use emberfall_core::{GaugeReading, Publisher, Receiver};

/// Health or mana counter backed by a floating-point accumulator.
///
/// The accumulator lets fractional regeneration add up across frames while the
/// integer snapshot, obtained by flooring, is what gameplay and UI observe.
/// Every mutation publishes the resulting [`GaugeReading`].
#[derive(Debug)]
pub struct ResourceGauge {
    accumulator: f32,
    value: u32,
    max: u32,
    base_regen: f32,
    regen_bonus: f32,
    changes: Publisher<GaugeReading>,
}

impl ResourceGauge {
    /// Creates a full gauge regenerating `base_regen` points per second.
    #[must_use]
    pub fn new(max: u32, base_regen: f32) -> Self {
        Self {
            accumulator: max as f32,
            value: max,
            max,
            base_regen,
            regen_bonus: 0.0,
            changes: Publisher::new(),
        }
    }

    /// Current integer value.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Current integer maximum.
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Regeneration before bonuses, in points per second.
    #[must_use]
    pub fn base_regen(&self) -> f32 {
        self.base_regen
    }

    /// Regeneration including bonuses, in points per second.
    #[must_use]
    pub fn effective_regen(&self) -> f32 {
        self.base_regen + self.regen_bonus
    }

    /// Current value and maximum.
    #[must_use]
    pub fn reading(&self) -> GaugeReading {
        GaugeReading {
            value: self.value,
            max: self.max,
        }
    }

    /// Share of the maximum currently held, `0.0` for an empty maximum.
    #[must_use]
    pub fn ratio(&self) -> f32 {
        if self.max == 0 {
            return 0.0;
        }
        self.value as f32 / self.max as f32
    }

    /// Whether the gauge is full.
    #[must_use]
    pub fn is_at_max(&self) -> bool {
        self.value == self.max
    }

    /// Whether the gauge is depleted.
    #[must_use]
    pub fn is_at_or_below_zero(&self) -> bool {
        self.value == 0
    }

    /// Subscribes to readings published after each mutation.
    pub fn subscribe(&mut self) -> Receiver<GaugeReading> {
        self.changes.subscribe()
    }

    /// Adds `amount` and returns how many whole points were gained.
    pub fn gain(&mut self, amount: f32) -> u32 {
        let before = self.value;
        self.store(self.accumulator + amount);
        self.value.saturating_sub(before)
    }

    /// Removes `amount` and returns how many whole points were lost.
    pub fn lose(&mut self, amount: f32) -> u32 {
        let before = self.value;
        self.store(self.accumulator - amount);
        before.saturating_sub(self.value)
    }

    /// Sets the value to `ratio` of the maximum.
    pub fn set_to_partial_of_max(&mut self, ratio: f32) {
        self.store(ratio * self.max as f32);
    }

    /// Fills the gauge and returns how many whole points were gained.
    pub fn gain_to_max(&mut self) -> u32 {
        let before = self.value;
        self.store(self.max as f32);
        self.max.saturating_sub(before)
    }

    /// Empties the gauge.
    pub fn set_zero(&mut self) {
        self.store(0.0);
    }

    /// Raises the maximum without changing the current value.
    pub fn increase_max(&mut self, delta: u32) {
        self.max = self.max.saturating_add(delta);
        self.store(self.accumulator);
    }

    /// Lowers the maximum, pulling the current value down if it no longer fits.
    pub fn decrease_max(&mut self, delta: u32) {
        self.max = self.max.saturating_sub(delta);
        self.store(self.accumulator);
    }

    /// Adds `delta` points per second to the regeneration rate.
    pub fn add_regen_bonus(&mut self, delta: f32) {
        self.regen_bonus += delta;
    }

    /// Regenerates the amount accrued over `dt`.
    pub fn regenerate(&mut self, dt: Duration) {
        let _ = self.gain(self.effective_regen() * dt.as_secs_f32());
    }

    fn store(&mut self, accumulator: f32) {
        self.accumulator = accumulator.clamp(0.0, self.max as f32);
        self.value = self.accumulator.floor() as u32;
        self.changes.publish(self.reading());
    }
}
