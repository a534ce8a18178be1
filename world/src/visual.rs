use std::time::Duration;

use emberfall_core::{Actor, Color};
use glam::Vec2;

/// Shape of a short-lived visual effect.
#[derive(Clone, Debug, PartialEq)]
pub enum VisualEffectKind {
    /// Floating text.
    Text {
        /// Text to draw.
        text: String,
        /// Text color.
        color: Color,
    },
    /// Circle outline growing from one radius to another.
    Circle {
        /// Outline color.
        color: Color,
        /// Radius at the start of the effect.
        start_radius: f32,
        /// Radius at the end of the effect.
        end_radius: f32,
        /// Outline width.
        line_width: u32,
    },
    /// Square outline growing from one side length to another.
    Rect {
        /// Outline color.
        color: Color,
        /// Side length at the start of the effect.
        start_size: f32,
        /// Side length at the end of the effect.
        end_size: f32,
        /// Outline width.
        line_width: u32,
    },
}

/// Short-lived effect drawn on top of the world.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualEffect {
    kind: VisualEffectKind,
    center: Vec2,
    age: Duration,
    max_age: Duration,
    attached_to: Option<Actor>,
    expired: bool,
}

impl VisualEffect {
    /// Creates an effect centered on `center` lasting `max_age`.
    #[must_use]
    pub fn new(kind: VisualEffectKind, center: Vec2, max_age: Duration) -> Self {
        Self {
            kind,
            center,
            age: Duration::ZERO,
            max_age,
            attached_to: None,
            expired: false,
        }
    }

    /// Makes the effect follow `actor`; it expires once the actor is gone.
    #[must_use]
    pub fn attached_to(mut self, actor: Actor) -> Self {
        self.attached_to = Some(actor);
        self
    }

    /// Shape of the effect.
    #[must_use]
    pub fn kind(&self) -> &VisualEffectKind {
        &self.kind
    }

    /// Current center.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Actor the effect follows.
    #[must_use]
    pub fn attachment(&self) -> Option<Actor> {
        self.attached_to
    }

    /// Share of the lifetime elapsed, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.max_age.is_zero() {
            return 1.0;
        }
        (self.age.as_secs_f32() / self.max_age.as_secs_f32()).min(1.0)
    }

    /// Radius or side length at the current age; `None` for text.
    #[must_use]
    pub fn current_extent(&self) -> Option<f32> {
        let (start, end) = match self.kind {
            VisualEffectKind::Text { .. } => return None,
            VisualEffectKind::Circle {
                start_radius,
                end_radius,
                ..
            } => (start_radius, end_radius),
            VisualEffectKind::Rect {
                start_size,
                end_size,
                ..
            } => (start_size, end_size),
        };
        Some(start + (end - start) * self.progress())
    }

    /// Whether the effect should be dropped.
    #[must_use]
    pub fn has_expired(&self) -> bool {
        self.expired
    }

    /// Ages the effect, expiring it once it outlives its lifetime.
    pub fn notify_time_passed(&mut self, dt: Duration) {
        self.age = self.age.saturating_add(dt);
        if self.age >= self.max_age {
            self.expired = true;
        }
    }

    /// Moves the effect onto the followed actor's center.
    pub fn follow(&mut self, center: Vec2) {
        self.center = center;
    }

    /// Expires the effect immediately.
    pub fn expire(&mut self) {
        self.expired = true;
    }
}

/// Floating text announcing gained experience, attached to the player.
#[must_use]
pub fn exp_text(center: Vec2, exp: u32) -> VisualEffect {
    VisualEffect::new(
        VisualEffectKind::Text {
            text: format!("{exp} exp"),
            color: Color::from_rgb(255, 255, 255),
        },
        center,
        Duration::from_millis(800),
    )
    .attached_to(Actor::Player)
}

/// Rings drawn around the player when it respawns.
#[must_use]
pub fn respawn_effects(center: Vec2) -> [VisualEffect; 3] {
    let color = Color::from_rgb(140, 140, 230);
    [
        VisualEffect::new(
            VisualEffectKind::Circle {
                color,
                start_radius: 17.0,
                end_radius: 35.0,
                line_width: 1,
            },
            center,
            Duration::from_millis(150),
        ),
        VisualEffect::new(
            VisualEffectKind::Rect {
                color,
                start_size: 37.0,
                end_size: 50.0,
                line_width: 1,
            },
            center,
            Duration::from_millis(150),
        ),
        VisualEffect::new(
            VisualEffectKind::Circle {
                color,
                start_radius: 25.0,
                end_radius: 50.0,
                line_width: 2,
            },
            center,
            Duration::from_millis(300),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_grows_over_its_lifetime() {
        let [mut ring, _, _] = respawn_effects(Vec2::ZERO);
        ring.notify_time_passed(Duration::from_millis(75));
        let radius = ring.current_extent().unwrap_or_default();
        assert!((radius - 26.0).abs() < 1e-3);
        assert!(!ring.has_expired());

        ring.notify_time_passed(Duration::from_millis(75));
        assert!(ring.has_expired());
    }

    #[test]
    fn exp_text_follows_player() {
        let text = exp_text(Vec2::new(10.0, 10.0), 25);
        assert_eq!(text.attachment(), Some(Actor::Player));
        assert_eq!(text.current_extent(), None);
    }
}
