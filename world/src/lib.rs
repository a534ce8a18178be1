#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Emberfall.
//!
//! The [`World`] owns every entity collection, the static bucket indices, the
//! camera window and the pathing grid. Systems borrow it for the duration of a
//! single frame. Pluggable content ([`BuffEffect`], [`ItemEffect`],
//! [`NpcMind`], [`ProjectileController`], [`LootTable`]) receives the world as
//! a parameter on every call instead of holding a reference to it; while a
//! strategy runs, the collection that stores it is detached from the world and
//! reattached afterwards.

mod buckets;
mod buff;
mod camera;
mod config;
mod entity;
mod error;
mod gauge;
mod inventory;
mod loot;
mod npc;
mod pathing;
mod player;
mod projectile;
mod props;
mod stun;
mod visual;

use std::collections::{BTreeMap, BTreeSet};

use emberfall_core::{
    within_axis_distance, Actor, AudioCue, DecorationTypeId, EntityId, GameEvent, HeroStat,
    NpcCategory, Publisher, Receiver, Rect, WallTypeId, WELCOME_BANNER,
};
use glam::Vec2;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

pub use buckets::{BucketIndex, BUCKET_SIZE};
pub use buff::{BuffEffect, BuffList, BuffWithDuration};
pub use camera::{Camera, CameraShake};
pub use config::WorldConfig;
pub use entity::WorldEntity;
pub use error::WorldError;
pub use gauge::ResourceGauge;
pub use inventory::{ConsumableInventory, ItemEffect, ItemSlots, StatModifyingItem};
pub use loot::{
    ChanceLootTable, GroundLoot, GroundLootKind, LootEntry, LootTable, MoneyPile, GROUND_LOOT_SIZE,
    MONEY_PILE_SIZE,
};
pub use npc::{Npc, NpcMind};
pub use pathing::{PathingGrid, PATHING_CELL_SIZE};
pub use player::{LevelBonus, PlayerSetup, PlayerState, FIRST_LEVEL_EXP};
pub use projectile::{Projectile, ProjectileController, ProjectileLifetime};
pub use props::{Chest, Decoration, Portal, WarpPoint, Wall};
pub use stun::StunStatus;
pub use visual::{exp_text, respawn_effects, VisualEffect, VisualEffectKind};

/// Represents the authoritative Emberfall world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: WorldConfig,
    bounds: Rect,
    next_id: u32,
    player_entity: WorldEntity,
    player: PlayerState,
    player_spawn: Vec2,
    npcs: BTreeMap<EntityId, Npc>,
    projectiles: Vec<Projectile>,
    ground_loot: BTreeMap<EntityId, GroundLoot>,
    money_piles: BTreeMap<EntityId, MoneyPile>,
    walls: BTreeMap<EntityId, Wall>,
    wall_buckets: BucketIndex<EntityId>,
    decorations: BTreeMap<EntityId, Decoration>,
    decoration_buckets: BucketIndex<EntityId>,
    portals: BTreeMap<EntityId, Portal>,
    warp_points: BTreeMap<EntityId, WarpPoint>,
    chests: BTreeMap<EntityId, Chest>,
    visual_effects: Vec<VisualEffect>,
    camera: Camera,
    pathing: PathingGrid,
    rng: ChaCha8Rng,
    audio_channel: Publisher<AudioCue>,
    message_channel: Publisher<String>,
    movement_speed_channel: Publisher<f32>,
    player_events_while_detached: Option<Vec<GameEvent>>,
}

impl World {
    /// Creates a world with the hero described by `setup` standing at its spawn position.
    #[must_use]
    pub fn new(config: WorldConfig, setup: &PlayerSetup) -> Self {
        let bounds = config.bounds();
        let player_entity =
            WorldEntity::new(setup.spawn_position, setup.size).with_speed(setup.speed);
        let mut world = Self {
            banner: WELCOME_BANNER,
            bounds,
            next_id: 1,
            player_spawn: setup.spawn_position,
            player: PlayerState::new(setup),
            player_entity,
            npcs: BTreeMap::new(),
            projectiles: Vec::new(),
            ground_loot: BTreeMap::new(),
            money_piles: BTreeMap::new(),
            walls: BTreeMap::new(),
            wall_buckets: BucketIndex::new(bounds),
            decorations: BTreeMap::new(),
            decoration_buckets: BucketIndex::new(bounds),
            portals: BTreeMap::new(),
            warp_points: BTreeMap::new(),
            chests: BTreeMap::new(),
            visual_effects: Vec::new(),
            camera: Camera::new(bounds.top_left(), config.camera_size()),
            pathing: PathingGrid::new(&bounds),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            audio_channel: Publisher::new(),
            message_channel: Publisher::new(),
            movement_speed_channel: Publisher::new(),
            player_events_while_detached: None,
            config,
        };
        world.center_camera_on_player();
        world
    }

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Playable area.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Clamps an upper-left `position` of something of `size` into the playable area.
    #[must_use]
    pub fn clamp_to_world(&self, position: Vec2, size: Vec2) -> Vec2 {
        self.bounds.clamp_position(position, size)
    }

    /// Whether `position` lies within the playable area, far edges included.
    #[must_use]
    pub fn is_within_world(&self, position: Vec2) -> bool {
        self.bounds.contains_point(position)
    }

    /// Source of randomness shared by loot rolls and effects.
    pub fn rng(&mut self) -> &mut dyn RngCore {
        &mut self.rng
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Positioned rectangle of the hero.
    #[must_use]
    pub fn player_entity(&self) -> &WorldEntity {
        &self.player_entity
    }

    /// Mutable access to the hero's rectangle.
    pub fn player_entity_mut(&mut self) -> &mut WorldEntity {
        &mut self.player_entity
    }

    /// Progression and combat state of the hero.
    #[must_use]
    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    /// Mutable access to the hero's state.
    pub fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }

    /// Position the hero respawns at.
    #[must_use]
    pub fn player_spawn_position(&self) -> Vec2 {
        self.player_spawn
    }

    /// Positioned rectangle of `actor`, if it exists.
    #[must_use]
    pub fn entity(&self, actor: Actor) -> Option<&WorldEntity> {
        match actor {
            Actor::Player => Some(&self.player_entity),
            Actor::Npc(id) => self.npcs.get(&id).map(Npc::entity),
        }
    }

    /// Mutable access to the rectangle of `actor`.
    pub fn entity_mut(&mut self, actor: Actor) -> Option<&mut WorldEntity> {
        match actor {
            Actor::Player => Some(&mut self.player_entity),
            Actor::Npc(id) => self.npcs.get_mut(&id).map(Npc::entity_mut),
        }
    }

    /// Health gauge of `actor`.
    pub fn health_mut(&mut self, actor: Actor) -> Option<&mut ResourceGauge> {
        match actor {
            Actor::Player => Some(self.player.health_mut()),
            Actor::Npc(id) => self.npcs.get_mut(&id).map(Npc::health_mut),
        }
    }

    /// Stun status of `actor`.
    pub fn stun_mut(&mut self, actor: Actor) -> Option<&mut StunStatus> {
        match actor {
            Actor::Player => Some(self.player.stun_mut()),
            Actor::Npc(id) => self.npcs.get_mut(&id).map(Npc::stun_mut),
        }
    }

    /// Whether `actor` is stunned; missing actors are not.
    #[must_use]
    pub fn is_stunned(&self, actor: Actor) -> bool {
        match actor {
            Actor::Player => self.player.is_stunned(),
            Actor::Npc(id) => self.npcs.get(&id).is_some_and(Npc::is_stunned),
        }
    }

    /// Active buffs of `actor`.
    pub fn buffs_mut(&mut self, actor: Actor) -> Option<&mut BuffList> {
        match actor {
            Actor::Player => Some(self.player.buffs_mut()),
            Actor::Npc(id) => self.npcs.get_mut(&id).map(Npc::buffs_mut),
        }
    }

    /// Grants a buff to `actor`, refreshing an active buff of the same type.
    ///
    /// Returns `false` when the actor does not exist.
    pub fn gain_buff(
        &mut self,
        actor: Actor,
        effect: Box<dyn BuffEffect>,
        duration: Option<std::time::Duration>,
    ) -> bool {
        let Some(buffs) = self.buffs_mut(actor) else {
            return false;
        };
        buffs.gain(effect, duration);
        if actor == Actor::Player {
            self.player.publish_buffs();
        }
        true
    }

    /// Detaches the buff list of `actor` so its hooks can borrow the world.
    ///
    /// Events dispatched to the player while its list is detached are queued
    /// and replayed by [`World::restore_buffs`].
    pub fn take_buffs(&mut self, actor: Actor) -> Option<BuffList> {
        let buffs = std::mem::take(self.buffs_mut(actor)?);
        if actor == Actor::Player {
            self.player_events_while_detached = Some(Vec::new());
        }
        Some(buffs)
    }

    /// Reattaches a detached buff list, folding in buffs granted meanwhile.
    ///
    /// Player events queued while the list was away reach its buffs first.
    /// The list is dropped when its owner no longer exists.
    pub fn restore_buffs(&mut self, actor: Actor, mut detached: BuffList) {
        if actor == Actor::Player {
            for event in self.player_events_while_detached.take().unwrap_or_default() {
                let _ = react_to_event(&mut detached, &event);
            }
        }
        let Some(current) = self.buffs_mut(actor) else {
            return;
        };
        detached.absorb(std::mem::take(current));
        *current = detached;
        if actor == Actor::Player {
            self.player.publish_buffs();
        }
    }

    /// Adds an NPC and returns its identifier.
    pub fn spawn_npc(&mut self, npc: Npc) -> EntityId {
        let id = self.allocate_id();
        debug!(npc = id.get(), npc_type = npc.npc_type().name(), "npc_spawned");
        let _ = self.npcs.insert(id, npc);
        id
    }

    /// NPC identified by `id`.
    #[must_use]
    pub fn npc(&self, id: EntityId) -> Option<&Npc> {
        self.npcs.get(&id)
    }

    /// Mutable access to the NPC identified by `id`.
    pub fn npc_mut(&mut self, id: EntityId) -> Option<&mut Npc> {
        self.npcs.get_mut(&id)
    }

    /// NPCs in identifier order.
    pub fn npcs(&self) -> impl Iterator<Item = (EntityId, &Npc)> {
        self.npcs.iter().map(|(id, npc)| (*id, npc))
    }

    /// Mutable iterator over NPCs in identifier order.
    pub fn npcs_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut Npc)> {
        self.npcs.iter_mut().map(|(id, npc)| (*id, npc))
    }

    /// Identifiers of every NPC, snapshotted so the world can be mutated while iterating.
    #[must_use]
    pub fn npc_ids(&self) -> Vec<EntityId> {
        self.npcs.keys().copied().collect()
    }

    /// Detaches the mind of NPC `id` so it can steer the NPC with world access.
    pub fn take_npc_mind(&mut self, id: EntityId) -> Option<Box<dyn NpcMind>> {
        self.npcs.get_mut(&id)?.take_mind()
    }

    /// Reattaches a mind taken with [`World::take_npc_mind`].
    pub fn restore_npc_mind(&mut self, id: EntityId, mind: Box<dyn NpcMind>) {
        if let Some(npc) = self.npcs.get_mut(&id) {
            npc.restore_mind(mind);
        }
    }

    /// Removes NPC `id`.
    pub fn remove_npc(&mut self, id: EntityId) -> Option<Npc> {
        self.npcs.remove(&id)
    }

    /// Removes and returns every NPC whose health is depleted.
    pub fn remove_dead_npcs(&mut self) -> Vec<(EntityId, Npc)> {
        let dead: Vec<EntityId> = self
            .npcs
            .iter()
            .filter(|(_, npc)| npc.health().is_at_or_below_zero())
            .map(|(id, _)| *id)
            .collect();
        dead.into_iter()
            .filter_map(|id| self.npcs.remove(&id).map(|npc| (id, npc)))
            .collect()
    }

    /// Removes every NPC fighting on the player's side.
    pub fn remove_all_player_summons(&mut self) {
        self.npcs
            .retain(|_, npc| npc.category() != NpcCategory::PlayerSummon);
    }

    /// Enemies whose rectangle overlaps `rect`.
    #[must_use]
    pub fn enemies_intersecting(&self, rect: &Rect) -> Vec<EntityId> {
        self.npcs
            .iter()
            .filter(|(_, npc)| npc.is_enemy() && npc.entity().rect().intersects(rect))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Enemies whose center lies within `distance` of `position` on both axes.
    #[must_use]
    pub fn enemies_within_distance(&self, position: Vec2, distance: f32) -> Vec<EntityId> {
        self.npcs
            .iter()
            .filter(|(_, npc)| {
                npc.is_enemy() && within_axis_distance(npc.entity().center(), position, distance)
            })
            .map(|(id, _)| *id)
            .collect()
    }

    /// Whether `rect` lies within the camera window widened by the NPC activity margin.
    #[must_use]
    pub fn is_in_activity_range(&self, rect: &Rect) -> bool {
        self.camera
            .area()
            .expanded(self.config.npc_activity_margin)
            .intersects(rect)
    }

    /// Adds a projectile and returns its identifier.
    pub fn spawn_projectile(
        &mut self,
        entity: WorldEntity,
        controller: Box<dyn ProjectileController>,
    ) -> EntityId {
        let id = self.allocate_id();
        trace!(projectile = id.get(), "projectile_spawned");
        self.projectiles.push(Projectile::new(id, entity, controller));
        id
    }

    /// Projectiles in spawn order.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Mutable access to projectiles.
    pub fn projectiles_mut(&mut self) -> &mut [Projectile] {
        &mut self.projectiles
    }

    /// Detaches all projectiles so their controllers can borrow the world.
    pub fn take_projectiles(&mut self) -> Vec<Projectile> {
        std::mem::take(&mut self.projectiles)
    }

    /// Reattaches detached projectiles ahead of any spawned meanwhile.
    pub fn restore_projectiles(&mut self, mut detached: Vec<Projectile>) {
        detached.append(&mut self.projectiles);
        self.projectiles = detached;
    }

    /// Drops projectiles whose controller reported expiry.
    pub fn remove_expired_projectiles(&mut self) {
        self.projectiles.retain(|projectile| !projectile.has_expired());
    }

    /// Projectiles whose rectangle overlaps `rect`.
    #[must_use]
    pub fn projectiles_intersecting(&self, rect: &Rect) -> Vec<EntityId> {
        self.projectiles
            .iter()
            .filter(|projectile| projectile.entity().rect().intersects(rect))
            .map(Projectile::id)
            .collect()
    }

    /// Places an item or consumable on the ground.
    pub fn add_ground_loot(&mut self, kind: GroundLootKind, position: Vec2) -> EntityId {
        let id = self.allocate_id();
        let _ = self.ground_loot.insert(id, GroundLoot::new(kind, position));
        id
    }

    /// Ground loot identified by `id`.
    #[must_use]
    pub fn ground_loot(&self, id: EntityId) -> Option<&GroundLoot> {
        self.ground_loot.get(&id)
    }

    /// Ground loot in identifier order.
    pub fn ground_loot_iter(&self) -> impl Iterator<Item = (EntityId, &GroundLoot)> {
        self.ground_loot.iter().map(|(id, loot)| (*id, loot))
    }

    /// Places coins on the ground.
    pub fn add_money_pile(&mut self, amount: u32, position: Vec2) -> EntityId {
        let id = self.allocate_id();
        let _ = self.money_piles.insert(id, MoneyPile::new(amount, position));
        id
    }

    /// Money piles in identifier order.
    pub fn money_piles(&self) -> impl Iterator<Item = (EntityId, &MoneyPile)> {
        self.money_piles.iter().map(|(id, pile)| (*id, pile))
    }

    /// Rolls `table` with the world's random source.
    pub fn generate_loot(&mut self, table: &dyn LootTable) -> Vec<LootEntry> {
        table.generate(&mut self.rng)
    }

    /// Spawns `entries` at `position`, scattering them when more than one drops.
    pub fn place_loot(&mut self, position: Vec2, entries: &[LootEntry]) -> Vec<EntityId> {
        let scatter = self.config.loot_scatter.abs();
        let mut placed = Vec::with_capacity(entries.len());
        for entry in entries {
            let offset = if entries.len() > 1 {
                Vec2::new(
                    self.rng.gen_range(-scatter..=scatter),
                    self.rng.gen_range(-scatter..=scatter),
                )
            } else {
                Vec2::ZERO
            };
            let spot = position + offset;
            let id = match *entry {
                LootEntry::Money(amount) => self.add_money_pile(amount, spot),
                LootEntry::Item(item) => self.add_ground_loot(GroundLootKind::Item(item), spot),
                LootEntry::Consumable(consumable) => {
                    self.add_ground_loot(GroundLootKind::Consumable(consumable), spot)
                }
            };
            placed.push(id);
        }
        placed
    }

    /// Adds a wall.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutsideBucketGrid`] when the wall lies outside the world.
    pub fn add_wall(&mut self, wall_type: WallTypeId, entity: WorldEntity) -> Result<EntityId, WorldError> {
        let position = entity.position();
        let id = self.allocate_id();
        self.wall_buckets.add(id, position)?;
        self.pathing.block(position);
        let _ = self.walls.insert(id, Wall::new(wall_type, entity));
        Ok(id)
    }

    /// Removes a wall, clearing its pathing cell unless another wall shares it.
    pub fn remove_wall(&mut self, id: EntityId) -> Option<Wall> {
        let wall = self.walls.remove(&id)?;
        let position = wall.entity().position();
        let _ = self.wall_buckets.remove(id, position);
        let cell = self.pathing.cell_of(position);
        let shared = self
            .walls_near(position)
            .iter()
            .any(|other| self.pathing.cell_of(other.entity().position()) == cell);
        if !shared {
            self.pathing.unblock(position);
        }
        Some(wall)
    }

    /// Wall identified by `id`.
    #[must_use]
    pub fn wall(&self, id: EntityId) -> Option<&Wall> {
        self.walls.get(&id)
    }

    /// Walls in the 3×3 bucket neighborhood of `position`.
    #[must_use]
    pub fn walls_near(&self, position: Vec2) -> Vec<&Wall> {
        self.wall_buckets
            .near_position(position)
            .into_iter()
            .filter_map(|id| self.walls.get(&id))
            .collect()
    }

    /// Whether `rect` overlaps a wall near its upper-left corner.
    #[must_use]
    pub fn rect_intersects_wall(&self, rect: &Rect) -> bool {
        self.walls_near(rect.top_left())
            .iter()
            .any(|wall| wall.entity().rect().intersects(rect))
    }

    /// Adds a decoration.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutsideBucketGrid`] when the decoration lies outside the world.
    pub fn add_decoration(
        &mut self,
        decoration_type: DecorationTypeId,
        position: Vec2,
    ) -> Result<EntityId, WorldError> {
        let id = self.allocate_id();
        self.decoration_buckets.add(id, position)?;
        let _ = self
            .decorations
            .insert(id, Decoration::new(decoration_type, position));
        Ok(id)
    }

    /// Removes a decoration.
    pub fn remove_decoration(&mut self, id: EntityId) -> Option<Decoration> {
        let decoration = self.decorations.remove(&id)?;
        let _ = self.decoration_buckets.remove(id, decoration.position());
        Some(decoration)
    }

    /// Adds a portal.
    pub fn add_portal(&mut self, portal: Portal) -> EntityId {
        let id = self.allocate_id();
        let _ = self.portals.insert(id, portal);
        id
    }

    /// Mutable access to portal `id`.
    pub fn portal_mut(&mut self, id: EntityId) -> Option<&mut Portal> {
        self.portals.get_mut(&id)
    }

    /// Portals in identifier order.
    pub fn portals(&self) -> impl Iterator<Item = &Portal> {
        self.portals.values()
    }

    /// Adds a warp point.
    pub fn add_warp_point(&mut self, warp_point: WarpPoint) -> EntityId {
        let id = self.allocate_id();
        let _ = self.warp_points.insert(id, warp_point);
        id
    }

    /// Warp points in identifier order.
    pub fn warp_points(&self) -> impl Iterator<Item = &WarpPoint> {
        self.warp_points.values()
    }

    /// Adds a chest.
    pub fn add_chest(&mut self, chest: Chest) -> EntityId {
        let id = self.allocate_id();
        let _ = self.chests.insert(id, chest);
        id
    }

    /// Chest identified by `id`.
    #[must_use]
    pub fn chest(&self, id: EntityId) -> Option<&Chest> {
        self.chests.get(&id)
    }

    /// Chests in identifier order.
    pub fn chests(&self) -> impl Iterator<Item = (EntityId, &Chest)> {
        self.chests.iter().map(|(id, chest)| (*id, chest))
    }

    /// Removes chest `id`, typically because it was opened.
    pub fn remove_chest(&mut self, id: EntityId) -> Option<Chest> {
        self.chests.remove(&id)
    }

    /// Removes ground loot `id`, typically because it was picked up.
    pub fn remove_ground_loot(&mut self, id: EntityId) -> Option<GroundLoot> {
        self.ground_loot.remove(&id)
    }

    /// Removes every entity listed in `ids` from the collections that contain it.
    pub fn remove_entities(&mut self, ids: &BTreeSet<EntityId>) {
        if ids.is_empty() {
            return;
        }
        self.projectiles
            .retain(|projectile| !ids.contains(&projectile.id()));
        self.money_piles.retain(|id, _| !ids.contains(id));
        self.ground_loot.retain(|id, _| !ids.contains(id));
        self.chests.retain(|id, _| !ids.contains(id));
        self.warp_points.retain(|id, _| !ids.contains(id));
        trace!(count = ids.len(), "entities_removed");
    }

    /// Adds a visual effect.
    pub fn add_visual_effect(&mut self, effect: VisualEffect) {
        self.visual_effects.push(effect);
    }

    /// Active visual effects.
    #[must_use]
    pub fn visual_effects(&self) -> &[VisualEffect] {
        &self.visual_effects
    }

    /// Ages every visual effect by `dt`.
    pub fn advance_visual_effects(&mut self, dt: std::time::Duration) {
        for effect in &mut self.visual_effects {
            effect.notify_time_passed(dt);
        }
    }

    /// Moves attached effects onto their actor, expiring those whose actor is gone.
    pub fn update_attached_visual_effects(&mut self) {
        let Self {
            visual_effects,
            npcs,
            player_entity,
            ..
        } = self;
        for effect in visual_effects.iter_mut() {
            let Some(actor) = effect.attachment() else {
                continue;
            };
            let center = match actor {
                Actor::Player => Some(player_entity.center()),
                Actor::Npc(id) => npcs.get(&id).map(|npc| npc.entity().center()),
            };
            match center {
                Some(center) => effect.follow(center),
                None => effect.expire(),
            }
        }
    }

    /// Drops expired visual effects.
    pub fn remove_expired_visual_effects(&mut self) {
        self.visual_effects.retain(|effect| !effect.has_expired());
    }

    /// Camera window.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Starts a camera shake.
    pub fn shake_camera(&mut self, shake: CameraShake) {
        self.camera.start_shake(shake);
    }

    /// Advances camera timers such as a running shake.
    pub fn advance_camera(&mut self, dt: std::time::Duration) {
        self.camera.notify_time_passed(dt, &mut self.rng);
    }

    /// Centers the camera on the hero without leaving the world.
    pub fn center_camera_on_player(&mut self) {
        let center = self.player_entity.center();
        self.camera.center_on(center, &self.bounds);
    }

    /// Moves the camera by `translation` without leaving the world.
    pub fn translate_camera(&mut self, translation: Vec2) {
        self.camera.translate(translation, &self.bounds);
    }

    /// Walkability grid for pathfinding.
    #[must_use]
    pub fn pathing(&self) -> &PathingGrid {
        &self.pathing
    }

    /// Applies a hero stat change, including movement speed on the hero's rectangle.
    pub fn modify_hero_stat(&mut self, stat: HeroStat, delta: f32) {
        self.player.modify_stat(stat, delta);
        if stat == HeroStat::MovementSpeed {
            self.player_entity.add_to_speed_multiplier(delta);
            self.movement_speed_channel
                .publish(self.player_entity.speed_multiplier());
        }
    }

    /// Runs `visit` for each equipped item while the item slots are detached.
    ///
    /// Items equipped by a hook during the visit join the reattached slots.
    /// Those that find no free slot are unequipped and dropped at the hero's
    /// feet.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error raised by `visit`; the slots are reattached either way.
    pub fn with_equipped_items<F>(&mut self, mut visit: F) -> Result<(), WorldError>
    where
        F: FnMut(&mut dyn ItemEffect, &mut World) -> Result<(), WorldError>,
    {
        let capacity = self.player.items().capacity();
        let mut items = self.player.replace_items(ItemSlots::with_capacity(capacity));
        let mut outcome = Ok(());
        for item in items.equipped_mut() {
            outcome = visit(item.as_mut(), self);
            if outcome.is_err() {
                break;
            }
        }
        let granted = self.player.replace_items(items);
        for mut item in self.player.items_mut().absorb(granted) {
            let item_type = item.item_type();
            let position = self.player_entity.position();
            let _ = self.add_ground_loot(GroundLootKind::Item(item_type), position);
            self.show_message(format!("No space for {}", item_type.name()));
            let dropped = item.apply_end(self);
            if outcome.is_ok() {
                outcome = dropped;
            }
        }
        outcome
    }

    /// Lets the hero's buffs and equipped items react to `event`.
    ///
    /// While the hero's buff list is detached for a lifecycle pass, those buffs
    /// see the event once the list is restored.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by item event hooks.
    pub fn notify_player_about_event(&mut self, event: GameEvent) -> Result<(), WorldError> {
        if let Some(queued) = self.player_events_while_detached.as_mut() {
            queued.push(event);
        }
        if react_to_event(self.player.buffs_mut(), &event) {
            self.player.publish_buffs();
        }
        self.with_equipped_items(|item, world| item.handle_event(world, &event))
    }

    /// Selects an audio cue for playback.
    pub fn play_sound(&mut self, cue: AudioCue) {
        self.audio_channel.publish(cue);
    }

    /// Shows a message to the player.
    pub fn show_message(&mut self, message: impl Into<String>) {
        self.message_channel.publish(message.into());
    }

    /// Subscribes to selected audio cues.
    pub fn subscribe_audio(&mut self) -> Receiver<AudioCue> {
        self.audio_channel.subscribe()
    }

    /// Subscribes to player-facing messages.
    pub fn subscribe_messages(&mut self) -> Receiver<String> {
        self.message_channel.subscribe()
    }

    /// Subscribes to the hero's speed multiplier.
    pub fn subscribe_movement_speed(&mut self) -> Receiver<f32> {
        self.movement_speed_channel.subscribe()
    }
}

fn react_to_event(buffs: &mut BuffList, event: &GameEvent) -> bool {
    let mut changed = false;
    for buff in buffs.iter_mut() {
        if let Some(outcome) = buff.effect_mut().handle_event(event) {
            buff.apply_outcome(outcome);
            changed = true;
        }
    }
    changed
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Decoration, World, WorldEntity};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Entities to draw this frame: walls near the camera followed by every dynamic entity.
    #[must_use]
    pub fn renderables(world: &World) -> Vec<&WorldEntity> {
        let camera = world.camera.area();
        let mut entities: Vec<&WorldEntity> = world
            .wall_buckets
            .overlapping(&camera)
            .into_iter()
            .filter_map(|id| world.walls.get(&id))
            .map(|wall| wall.entity())
            .collect();
        entities.push(&world.player_entity);
        entities.extend(world.ground_loot.values().map(|loot| loot.entity()));
        entities.extend(world.money_piles.values().map(|pile| pile.entity()));
        entities.extend(world.npcs.values().map(|npc| npc.entity()));
        entities.extend(world.projectiles.iter().map(|projectile| projectile.entity()));
        entities.extend(world.portals.values().map(|portal| portal.entity()));
        entities.extend(world.warp_points.values().map(|warp| warp.entity()));
        entities.extend(world.chests.values().map(|chest| chest.entity()));
        entities
    }

    /// Decorations in the buckets around the camera window.
    #[must_use]
    pub fn decorations_in_camera(world: &World) -> Vec<&Decoration> {
        world
            .decoration_buckets
            .overlapping(&world.camera.area())
            .into_iter()
            .filter_map(|id| world.decorations.get(&id))
            .collect()
    }

    /// Number of live NPCs.
    #[must_use]
    pub fn npc_count(world: &World) -> usize {
        world.npcs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberfall_core::{BuffEventOutcome, BuffTypeId, Direction, ItemTypeId, NpcTypeId};
    use std::{cell::RefCell, rc::Rc, time::Duration};

    fn world() -> World {
        World::new(WorldConfig::default(), &PlayerSetup::default())
    }

    fn goblin(position: Vec2) -> Npc {
        Npc::new(
            NpcTypeId::new("goblin"),
            WorldEntity::new(position, Vec2::splat(30.0)),
            ResourceGauge::new(10, 0.0),
            NpcCategory::Enemy,
        )
    }

    #[derive(Debug)]
    struct Reacting {
        outcome: BuffEventOutcome,
    }

    impl BuffEffect for Reacting {
        fn buff_type(&self) -> BuffTypeId {
            BuffTypeId::new("reacting")
        }

        fn handle_event(&mut self, event: &GameEvent) -> Option<BuffEventOutcome> {
            matches!(event, GameEvent::EnemyDied).then_some(self.outcome)
        }
    }

    #[derive(Debug)]
    struct EventLog {
        seen: Rc<RefCell<Vec<GameEvent>>>,
    }

    impl ItemEffect for EventLog {
        fn item_type(&self) -> ItemTypeId {
            ItemTypeId::new("event_log")
        }

        fn handle_event(&mut self, _world: &mut World, event: &GameEvent) -> Result<(), WorldError> {
            self.seen.borrow_mut().push(*event);
            Ok(())
        }
    }

    #[test]
    fn camera_starts_centered_on_player() {
        let world = world();
        let camera = world.camera().area();
        assert_eq!(camera.top_left(), Vec2::ZERO);
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
    }

    #[test]
    fn dead_npcs_are_reaped_once() {
        let mut world = world();
        let healthy = world.spawn_npc(goblin(Vec2::new(300.0, 300.0)));
        let doomed = world.spawn_npc(goblin(Vec2::new(400.0, 300.0)));
        let _ = world.npc_mut(doomed).unwrap().health_mut().lose(10.0);

        let reaped = world.remove_dead_npcs();

        assert_eq!(reaped.len(), 1);
        assert_eq!(reaped[0].0, doomed);
        assert!(world.npc(healthy).is_some());
        assert!(world.remove_dead_npcs().is_empty());
    }

    #[test]
    fn single_loot_entry_lands_on_death_position() {
        let mut world = world();
        let spot = Vec2::new(500.0, 500.0);

        let placed = world.place_loot(spot, &[LootEntry::Money(7)]);

        assert_eq!(placed.len(), 1);
        let (_, pile) = world.money_piles().next().unwrap();
        assert_eq!(pile.entity().position(), spot);
        assert_eq!(pile.amount(), 7);
    }

    #[test]
    fn multiple_loot_entries_scatter_within_range() {
        let mut world = world();
        let spot = Vec2::new(500.0, 500.0);
        let entries = [
            LootEntry::Money(3),
            LootEntry::Item(ItemTypeId::new("royal_sword")),
            LootEntry::Consumable(emberfall_core::ConsumableTypeId::new("health_potion")),
        ];

        let placed = world.place_loot(spot, &entries);

        assert_eq!(placed.len(), 3);
        for (_, loot) in world.ground_loot_iter() {
            let offset = loot.entity().position() - spot;
            assert!(offset.x.abs() <= 20.0 && offset.y.abs() <= 20.0);
        }
    }

    #[test]
    fn walls_are_found_through_buckets() {
        let mut world = world();
        let wall = world
            .add_wall(WallTypeId::new("stone"), WorldEntity::new(Vec2::new(250.0, 250.0), Vec2::splat(50.0)))
            .unwrap();

        assert!(world.rect_intersects_wall(&Rect::new(240.0, 240.0, 20.0, 20.0)));
        assert!(world.pathing().is_blocked(10, 10));

        assert!(world.remove_wall(wall).is_some());
        assert!(!world.rect_intersects_wall(&Rect::new(240.0, 240.0, 20.0, 20.0)));
        assert!(!world.pathing().is_blocked(10, 10));
    }

    #[test]
    fn walls_outside_world_are_rejected() {
        let mut world = world();
        let outcome = world.add_wall(
            WallTypeId::new("stone"),
            WorldEntity::new(Vec2::new(-500.0, 10.0), Vec2::splat(50.0)),
        );
        assert!(matches!(outcome, Err(WorldError::OutsideBucketGrid { .. })));
    }

    #[test]
    fn restoring_buffs_keeps_buffs_granted_meanwhile() {
        let mut world = world();
        let outcome = BuffEventOutcome::Cancel;
        assert!(world.gain_buff(Actor::Player, Box::new(Reacting { outcome }), None));
        let detached = world.take_buffs(Actor::Player).unwrap();
        assert!(world.player().buffs().is_empty());

        assert!(world.gain_buff(
            Actor::Player,
            Box::new(Reacting { outcome }),
            Some(Duration::from_secs(4))
        ));
        world.restore_buffs(Actor::Player, detached);

        let buffs = world.player().buffs();
        assert_eq!(buffs.len(), 1);
        assert_eq!(
            buffs.get(BuffTypeId::new("reacting")).unwrap().remaining(),
            Some(Duration::from_secs(4))
        );
    }

    #[test]
    fn events_reach_buffs_and_items() {
        let mut world = world();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _ = world
            .player_mut()
            .items_mut()
            .put(0, Box::new(EventLog { seen: Rc::clone(&seen) }));
        let outcome = BuffEventOutcome::ExtendDuration(Duration::from_secs(1));
        assert!(world.gain_buff(Actor::Player, Box::new(Reacting { outcome }), Some(Duration::from_secs(2))));
        world
            .player_mut()
            .buffs_mut()
            .iter_mut()
            .for_each(|buff| buff.notify_time_passed(Duration::from_millis(1500)));

        world.notify_player_about_event(GameEvent::EnemyDied).unwrap();

        assert_eq!(seen.borrow().as_slice(), &[GameEvent::EnemyDied]);
        let buff = world.player().buffs().get(BuffTypeId::new("reacting")).unwrap();
        assert_eq!(buff.remaining(), Some(Duration::from_millis(1500)));
        assert_eq!(world.player().items().capacity(), PlayerSetup::default().item_slots);
    }

    #[derive(Debug)]
    struct Conjurer;

    impl ItemEffect for Conjurer {
        fn item_type(&self) -> ItemTypeId {
            ItemTypeId::new("conjurer_staff")
        }

        fn apply_middle(&mut self, world: &mut World, _dt: Duration) -> Result<(), WorldError> {
            if let Some(slot) = world.player().items().first_empty_slot() {
                let _ = world
                    .player_mut()
                    .items_mut()
                    .put(slot, Box::new(StatModifyingItem::new(ItemTypeId::new("spirit_orb"), Vec::new())));
            }
            Ok(())
        }
    }

    #[test]
    fn items_equipped_by_item_hooks_are_kept() {
        let mut world = world();
        let _ = world.player_mut().items_mut().put(0, Box::new(Conjurer));

        world
            .with_equipped_items(|item, world| item.apply_middle(world, Duration::from_millis(16)))
            .unwrap();

        assert_eq!(
            world.player().items().equipped_types(),
            vec![ItemTypeId::new("conjurer_staff"), ItemTypeId::new("spirit_orb")]
        );
    }

    #[test]
    fn items_equipped_without_room_drop_to_the_ground() {
        let mut world = World::new(
            WorldConfig::default(),
            &PlayerSetup {
                item_slots: 1,
                ..PlayerSetup::default()
            },
        );
        let messages = world.subscribe_messages();
        let _ = world.player_mut().items_mut().put(0, Box::new(Conjurer));

        world
            .with_equipped_items(|item, world| item.apply_middle(world, Duration::from_millis(16)))
            .unwrap();

        assert_eq!(
            world.player().items().equipped_types(),
            vec![ItemTypeId::new("conjurer_staff")]
        );
        assert_eq!(world.ground_loot_iter().count(), 1);
        assert_eq!(messages.try_recv(), Ok("No space for spirit_orb".to_owned()));
    }

    #[test]
    fn movement_speed_stat_changes_player_multiplier() {
        let mut world = world();
        let speed = world.subscribe_movement_speed();

        world.modify_hero_stat(HeroStat::MovementSpeed, 0.2);

        assert!((world.player_entity().speed_multiplier() - 1.2).abs() < 1e-6);
        assert_eq!(speed.try_recv().map(|value| (value * 10.0).round()), Ok(12.0));
    }

    #[test]
    fn attached_effects_expire_with_their_actor() {
        let mut world = world();
        let npc = world.spawn_npc(goblin(Vec2::new(300.0, 300.0)));
        world.add_visual_effect(exp_text(Vec2::ZERO, 5).attached_to(Actor::Npc(npc)));
        world.add_visual_effect(exp_text(Vec2::ZERO, 5));

        world.update_attached_visual_effects();
        assert_eq!(world.visual_effects()[0].center(), Vec2::new(315.0, 315.0));

        let _ = world.remove_npc(npc);
        world.update_attached_visual_effects();
        world.remove_expired_visual_effects();

        assert_eq!(world.visual_effects().len(), 1);
        assert_eq!(world.visual_effects()[0].center(), world.player_entity().center());
    }

    #[test]
    fn restored_projectiles_precede_new_ones() {
        #[derive(Debug)]
        struct Inert;

        impl ProjectileController for Inert {
            fn notify_time_passed(
                &mut self,
                _world: &mut World,
                _projectile: &mut WorldEntity,
                _dt: Duration,
            ) -> Result<ProjectileLifetime, WorldError> {
                Ok(ProjectileLifetime::Alive)
            }
        }

        let mut world = world();
        let entity = WorldEntity::new(Vec2::new(50.0, 50.0), Vec2::splat(10.0)).moving_in(Direction::Right);
        let first = world.spawn_projectile(entity.clone(), Box::new(Inert));
        let detached = world.take_projectiles();
        let second = world.spawn_projectile(entity, Box::new(Inert));
        world.restore_projectiles(detached);

        let ids: Vec<EntityId> = world.projectiles().iter().map(Projectile::id).collect();
        assert_eq!(ids, vec![first, second]);
    }
}
