use std::time::Duration;

use emberfall_core::{Direction, Rect};
use glam::Vec2;

/// Positioned rectangle shared by the player, NPCs, projectiles, loot and props.
///
/// Speeds are expressed in world units per millisecond.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldEntity {
    position: Vec2,
    size: Vec2,
    direction: Direction,
    base_speed: f32,
    speed_multiplier: f32,
    moving: bool,
    animation_progress: f32,
    visible: bool,
    view_z: i32,
}

impl WorldEntity {
    /// Creates a stationary entity facing left.
    #[must_use]
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            direction: Direction::Left,
            base_speed: 0.0,
            speed_multiplier: 1.0,
            moving: false,
            animation_progress: 0.0,
            visible: true,
            view_z: 0,
        }
    }

    /// Sets the base speed in world units per millisecond.
    #[must_use]
    pub fn with_speed(mut self, base_speed: f32) -> Self {
        self.base_speed = base_speed;
        self
    }

    /// Starts the entity moving in `direction`.
    #[must_use]
    pub fn moving_in(mut self, direction: Direction) -> Self {
        self.set_moving_in_direction(direction);
        self
    }

    /// Sets the render-depth hint.
    #[must_use]
    pub fn with_view_z(mut self, view_z: i32) -> Self {
        self.view_z = view_z;
        self
    }

    /// Upper-left corner.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Width and height.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Collision rectangle.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_position_and_size(self.position, self.size)
    }

    /// Center of the collision rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.position + self.size / 2.0
    }

    /// Current facing direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the entity advances along its direction each frame.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Phase of the movement animation in `[0, 1)`.
    #[must_use]
    pub fn animation_progress(&self) -> f32 {
        self.animation_progress
    }

    /// Whether renderers should draw the entity.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Render-depth hint; larger values are further into the screen.
    #[must_use]
    pub fn view_z(&self) -> i32 {
        self.view_z
    }

    /// Speed before modifiers.
    #[must_use]
    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }

    /// Accumulated multiplier applied to the base speed.
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    /// Base speed scaled by the speed multiplier.
    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        self.base_speed * self.speed_multiplier
    }

    /// Moves the upper-left corner to `position`.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Moves the entity so that its center lies at `center`.
    pub fn set_center(&mut self, center: Vec2) {
        self.position = center - self.size / 2.0;
    }

    /// Turns the entity toward `direction` and starts moving.
    pub fn set_moving_in_direction(&mut self, direction: Direction) {
        self.direction = direction;
        self.moving = true;
    }

    /// Stops the entity without changing its facing.
    pub fn set_not_moving(&mut self) {
        self.moving = false;
    }

    /// Turns the entity without affecting its movement state.
    pub fn face(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Quarter turn clockwise.
    pub fn rotate_right(&mut self) {
        self.direction = self.direction.rotated_right();
    }

    /// Quarter turn counter-clockwise.
    pub fn rotate_left(&mut self) {
        self.direction = self.direction.rotated_left();
    }

    /// Shows or hides the entity.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Adds `amount` to the speed multiplier.
    ///
    /// Speed modifiers must be applied and reverted in pairs so the multiplier
    /// returns to its prior value.
    pub fn add_to_speed_multiplier(&mut self, amount: f32) {
        self.speed_multiplier += amount;
    }

    /// Position the entity would reach after `dt` along its direction.
    ///
    /// Returns `None` when the entity is not moving.
    #[must_use]
    pub fn candidate_position(&self, dt: Duration) -> Option<Vec2> {
        if !self.moving {
            return None;
        }
        Some(self.position_after(self.direction, dt))
    }

    /// Position reached after travelling `dt` toward `direction`, moving or not.
    #[must_use]
    pub fn position_after(&self, direction: Direction, dt: Duration) -> Vec2 {
        let distance = self.effective_speed() * millis(dt);
        self.position + direction.unit_vector() * distance
    }

    /// Advances the movement animation when the entity is moving.
    pub fn update_movement_animation(&mut self, dt: Duration) {
        if self.moving {
            self.update_animation(dt);
        }
    }

    /// Advances the animation phase by one unit per second, wrapping at one.
    pub fn update_animation(&mut self, dt: Duration) {
        self.animation_progress = (self.animation_progress + dt.as_secs_f32()).fract();
    }
}

pub(crate) fn millis(dt: Duration) -> f32 {
    dt.as_secs_f32() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stationary_entity_has_no_candidate() {
        let entity = WorldEntity::new(Vec2::ZERO, Vec2::splat(10.0)).with_speed(0.1);
        assert_eq!(entity.candidate_position(Duration::from_millis(100)), None);
    }

    #[test]
    fn candidate_uses_effective_speed() {
        let mut entity = WorldEntity::new(Vec2::new(50.0, 50.0), Vec2::splat(10.0))
            .with_speed(0.1)
            .moving_in(Direction::Down);
        entity.add_to_speed_multiplier(1.0);

        let candidate = entity.candidate_position(Duration::from_millis(100));

        assert_eq!(candidate, Some(Vec2::new(50.0, 70.0)));
    }

    #[test]
    fn paired_multiplier_changes_cancel_out() {
        let mut entity = WorldEntity::new(Vec2::ZERO, Vec2::ONE).with_speed(0.2);
        entity.add_to_speed_multiplier(1.0);
        entity.add_to_speed_multiplier(-1.0);
        assert_eq!(entity.effective_speed(), 0.2);
    }

    #[test]
    fn animation_wraps_and_only_runs_while_moving() {
        let mut entity = WorldEntity::new(Vec2::ZERO, Vec2::ONE);
        entity.update_movement_animation(Duration::from_millis(400));
        assert_eq!(entity.animation_progress(), 0.0);

        entity.set_moving_in_direction(Direction::Up);
        entity.update_movement_animation(Duration::from_millis(750));
        entity.update_movement_animation(Duration::from_millis(500));
        assert!((entity.animation_progress() - 0.25).abs() < 1e-5);
    }
}
