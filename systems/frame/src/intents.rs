use emberfall_core::{AbilityId, AudioCue, Command, EntityId, GameEvent};
use emberfall_world::{GroundLootKind, World, WorldError};
use glam::Vec2;
use tracing::debug;

use crate::{EffectOutcome, FrameOrchestrator};

impl FrameOrchestrator {
    /// Applies a player intent to the world.
    ///
    /// Movement intents are ignored while the player is stunned. Expected
    /// shortfalls (no free slot, missing mana) show a message instead of
    /// failing.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownItem`], [`WorldError::UnknownConsumable`]
    /// or [`WorldError::UnknownAbility`] when the catalog cannot resolve a key,
    /// [`WorldError::TalentNotUnlocked`] for a talent pick at a level with no
    /// open choice, and propagates errors raised by content hooks.
    pub fn apply(&mut self, world: &mut World, command: Command) -> Result<(), WorldError> {
        match command {
            Command::MoveInDirection { direction } => {
                if !world.player().is_stunned() {
                    world.player_entity_mut().set_moving_in_direction(direction);
                }
            }
            Command::StopMoving => {
                if !world.player().is_stunned() {
                    world.player_entity_mut().set_not_moving();
                }
            }
            Command::UseAbility { ability } => self.use_ability(world, ability)?,
            Command::UseConsumable { slot } => self.use_consumable(world, slot)?,
            Command::SwitchItemSlots { from, to } => world.player_mut().items_mut().swap(from, to),
            Command::DragConsumable { from, to } => {
                world.player_mut().consumables_mut().drag(from, to);
            }
            Command::DropItem { slot, position } => drop_item(world, slot, position)?,
            Command::DropConsumable { slot, position } => {
                if let Some(consumable) = world.player_mut().consumables_mut().remove(slot) {
                    let _ = world.add_ground_loot(GroundLootKind::Consumable(consumable), position);
                }
            }
            Command::PickUpLoot { loot } => self.pick_up_loot(world, loot)?,
            Command::OpenChest { chest } => open_chest(world, chest),
            Command::ChooseTalent {
                level,
                talent,
                upgrade,
            } => {
                world.player_mut().choose_talent(level, talent, upgrade)?;
                debug!(level, talent = talent.name(), "talent_chosen");
                world.show_message(format!("Talent learned: {}", talent.name()));
            }
        }
        Ok(())
    }

    fn use_ability(&self, world: &mut World, ability: AbilityId) -> Result<(), WorldError> {
        if !world.player().has_ability(ability) {
            return Ok(());
        }
        let effect = self
            .catalog
            .ability(ability)
            .ok_or(WorldError::UnknownAbility(ability))?;
        if !world.player().cooldown(ability).is_zero() {
            return Ok(());
        }
        if world.player().mana().value() < effect.mana_cost() {
            world.show_message("Not enough mana!");
            return Ok(());
        }

        match effect.apply(world)? {
            EffectOutcome::Applied => {
                let _ = world.player_mut().mana_mut().lose(effect.mana_cost() as f32);
                world.player_mut().add_to_cooldown(ability, effect.cooldown());
                debug!(ability = ability.name(), "ability_used");
                world.notify_player_about_event(GameEvent::PlayerUsedAbility { ability })
            }
            EffectOutcome::Refused { reason } => {
                world.show_message(reason);
                Ok(())
            }
        }
    }

    fn use_consumable(&self, world: &mut World, slot: usize) -> Result<(), WorldError> {
        let Some(consumable) = world.player().consumables().get(slot) else {
            return Ok(());
        };
        let effect = self
            .catalog
            .consumable(consumable)
            .ok_or(WorldError::UnknownConsumable(consumable))?;

        match effect.apply(world)? {
            EffectOutcome::Applied => {
                let _ = world.player_mut().consumables_mut().remove(slot);
            }
            EffectOutcome::Refused { reason } => world.show_message(reason),
        }
        Ok(())
    }

    fn pick_up_loot(&self, world: &mut World, loot: EntityId) -> Result<(), WorldError> {
        let Some(kind) = world.ground_loot(loot).map(|ground| ground.kind()) else {
            return Ok(());
        };

        let name = match kind {
            GroundLootKind::Item(item) => {
                let Some(slot) = world.player().items().first_empty_slot() else {
                    world.show_message(format!("No space for {}", item.name()));
                    return Ok(());
                };
                let mut effect = self
                    .catalog
                    .create_item(item)
                    .ok_or(WorldError::UnknownItem(item))?;
                effect.apply_start(world)?;
                let _ = world.player_mut().items_mut().put(slot, effect);
                item.name()
            }
            GroundLootKind::Consumable(consumable) => {
                if world.player_mut().consumables_mut().add(consumable).is_none() {
                    world.show_message(format!("No space for {}", consumable.name()));
                    return Ok(());
                }
                consumable.name()
            }
        };

        world.show_message(format!("You picked up {name}"));
        world.play_sound(AudioCue::PickedUpItem);
        let _ = world.remove_ground_loot(loot);
        Ok(())
    }
}

fn drop_item(world: &mut World, slot: usize, position: Vec2) -> Result<(), WorldError> {
    let Some(mut item) = world.player_mut().items_mut().take(slot) else {
        return Ok(());
    };
    let _ = world.add_ground_loot(GroundLootKind::Item(item.item_type()), position);
    item.apply_end(world)
}

fn open_chest(world: &mut World, chest: EntityId) {
    let Some(chest) = world.remove_chest(chest) else {
        return;
    };
    let loot = world.generate_loot(chest.loot_table());
    let _ = world.place_loot(chest.entity().position(), &loot);
}
