use std::time::Duration;

use emberfall_core::{position_from_center, Rect};
use glam::Vec2;
use rand::{Rng, RngCore};

/// Timed camera jitter that re-rolls its offset every period.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraShake {
    period: Duration,
    since_roll: Duration,
    time_left: Duration,
    max_offset: u32,
    offset: Vec2,
}

impl CameraShake {
    /// Shakes for `duration`, picking a new offset of at most `max_offset` every `period`.
    #[must_use]
    pub fn new(period: Duration, duration: Duration, max_offset: u32) -> Self {
        Self {
            period,
            since_roll: Duration::ZERO,
            time_left: duration,
            max_offset,
            offset: Vec2::ZERO,
        }
    }

    /// Current offset applied to the camera window.
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Whether the shake is still running.
    #[must_use]
    pub fn has_time_left(&self) -> bool {
        !self.time_left.is_zero()
    }

    fn notify_time_passed(&mut self, dt: Duration, rng: &mut dyn RngCore) {
        self.time_left = self.time_left.saturating_sub(dt);
        self.since_roll += dt;
        if self.since_roll >= self.period {
            self.since_roll = Duration::ZERO;
            let max = i64::from(self.max_offset);
            let x = rng.gen_range(-max..=max);
            let y = rng.gen_range(-max..=max);
            self.offset = Vec2::new(x as f32, y as f32);
        }
    }
}

/// Window of the world shown to the player.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    area: Rect,
    shake: Option<CameraShake>,
}

impl Camera {
    /// Creates a camera of `size` anchored at the world origin `origin`.
    #[must_use]
    pub fn new(origin: Vec2, size: Vec2) -> Self {
        Self {
            area: Rect::from_position_and_size(origin, size),
            shake: None,
        }
    }

    /// Window without shake.
    #[must_use]
    pub fn area(&self) -> Rect {
        self.area
    }

    /// Window including the current shake offset.
    #[must_use]
    pub fn area_with_shake(&self) -> Rect {
        match &self.shake {
            Some(shake) => self.area.moved_to(self.area.top_left() + shake.offset()),
            None => self.area,
        }
    }

    /// Whether a shake is running.
    #[must_use]
    pub fn is_shaking(&self) -> bool {
        self.shake.is_some()
    }

    /// Starts a shake, replacing any running one.
    pub fn start_shake(&mut self, shake: CameraShake) {
        self.shake = Some(shake);
    }

    /// Advances the shake timer.
    pub fn notify_time_passed(&mut self, dt: Duration, rng: &mut dyn RngCore) {
        if let Some(shake) = self.shake.as_mut() {
            shake.notify_time_passed(dt, rng);
            if !shake.has_time_left() {
                self.shake = None;
            }
        }
    }

    /// Centers the window on `center` without leaving `bounds`.
    pub fn center_on(&mut self, center: Vec2, bounds: &Rect) {
        let size = self.area.size();
        let position = bounds.clamp_position(position_from_center(center, size), size);
        self.area = self.area.moved_to(position);
    }

    /// Moves the window by `translation` without leaving `bounds`.
    pub fn translate(&mut self, translation: Vec2, bounds: &Rect) {
        let size = self.area.size();
        let position = bounds.clamp_position(self.area.top_left() + translation, size);
        self.area = self.area.moved_to(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn centering_stays_inside_world() {
        let bounds = Rect::new(0.0, 0.0, 1000.0, 1000.0);
        let mut camera = Camera::new(Vec2::ZERO, Vec2::new(400.0, 300.0));

        camera.center_on(Vec2::new(500.0, 500.0), &bounds);
        assert_eq!(camera.area().top_left(), Vec2::new(300.0, 350.0));

        camera.center_on(Vec2::new(20.0, 990.0), &bounds);
        assert_eq!(camera.area().top_left(), Vec2::new(0.0, 700.0));
    }

    #[test]
    fn shake_offsets_window_until_it_runs_out() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut camera = Camera::new(Vec2::ZERO, Vec2::new(100.0, 100.0));
        camera.start_shake(CameraShake::new(Duration::from_millis(10), Duration::from_millis(50), 4));

        camera.notify_time_passed(Duration::from_millis(20), &mut rng);
        let shaken = camera.area_with_shake().top_left();
        assert!(shaken.x.abs() <= 4.0 && shaken.y.abs() <= 4.0);

        camera.notify_time_passed(Duration::from_millis(40), &mut rng);
        assert!(!camera.is_shaking());
        assert_eq!(camera.area_with_shake(), camera.area());
    }

    #[test]
    fn still_shake_keeps_window_in_place() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut camera = Camera::new(Vec2::ZERO, Vec2::new(100.0, 100.0));
        camera.start_shake(CameraShake::new(Duration::from_millis(10), Duration::from_millis(100), 0));

        camera.notify_time_passed(Duration::from_millis(20), &mut rng);
        assert!(camera.is_shaking());
        assert_eq!(camera.area_with_shake(), camera.area());
    }
}
