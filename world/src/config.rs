use emberfall_core::Rect;
use glam::Vec2;
use serde::Deserialize;

/// Tunable parameters of a world instance.
///
/// Every field has a default so partial configuration files stay valid.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Left edge of the playable area.
    pub origin_x: f32,
    /// Top edge of the playable area.
    pub origin_y: f32,
    /// Width of the playable area in world units.
    pub width: f32,
    /// Height of the playable area in world units.
    pub height: f32,
    /// Width of the camera window.
    pub camera_width: f32,
    /// Height of the camera window.
    pub camera_height: f32,
    /// Seed for loot rolls, loot scatter and camera shake.
    pub seed: u64,
    /// Distance beyond the camera window within which NPCs stay active.
    pub npc_activity_margin: f32,
    /// Maximum per-axis offset applied to loot when several entries drop at once.
    pub loot_scatter: f32,
    /// Share of maximum health restored when the player respawns.
    pub respawn_health_ratio: f32,
    /// Share of the current level's experience requirement lost on death.
    pub death_exp_loss_ratio: f32,
}

impl WorldConfig {
    /// Rectangle covering the playable area.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.origin_x, self.origin_y, self.width, self.height)
    }

    /// Dimensions of the camera window.
    #[must_use]
    pub fn camera_size(&self) -> Vec2 {
        Vec2::new(self.camera_width, self.camera_height)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            width: 2000.0,
            height: 2000.0,
            camera_width: 800.0,
            camera_height: 600.0,
            seed: 0x5eed_f1a3,
            npc_activity_margin: 100.0,
            loot_scatter: 20.0,
            respawn_health_ratio: 0.5,
            death_exp_loss_ratio: 0.5,
        }
    }
}
