use std::{fmt, time::Duration};

use emberfall_core::{ConsumableTypeId, GameEvent, HeroStat, ItemTypeId};

use crate::{World, WorldError};

/// Pluggable behavior of an equipped item.
pub trait ItemEffect: fmt::Debug {
    /// Kind of item.
    fn item_type(&self) -> ItemTypeId;

    /// Fires when the item is equipped.
    fn apply_start(&mut self, _world: &mut World) -> Result<(), WorldError> {
        Ok(())
    }

    /// Fires every frame while the item is equipped.
    fn apply_middle(&mut self, _world: &mut World, _dt: Duration) -> Result<(), WorldError> {
        Ok(())
    }

    /// Fires when the item is unequipped.
    fn apply_end(&mut self, _world: &mut World) -> Result<(), WorldError> {
        Ok(())
    }

    /// Reacts to an event dispatched to the player.
    fn handle_event(&mut self, _world: &mut World, _event: &GameEvent) -> Result<(), WorldError> {
        Ok(())
    }
}

/// Item that modifies hero stats while equipped.
#[derive(Clone, Debug, PartialEq)]
pub struct StatModifyingItem {
    item_type: ItemTypeId,
    modifiers: Vec<(HeroStat, f32)>,
}

impl StatModifyingItem {
    /// Creates an item applying `modifiers` on equip and reverting them on unequip.
    #[must_use]
    pub fn new(item_type: ItemTypeId, modifiers: Vec<(HeroStat, f32)>) -> Self {
        Self {
            item_type,
            modifiers,
        }
    }

    /// Stat changes applied while equipped.
    #[must_use]
    pub fn modifiers(&self) -> &[(HeroStat, f32)] {
        &self.modifiers
    }
}

impl ItemEffect for StatModifyingItem {
    fn item_type(&self) -> ItemTypeId {
        self.item_type
    }

    fn apply_start(&mut self, world: &mut World) -> Result<(), WorldError> {
        for &(stat, delta) in &self.modifiers {
            world.modify_hero_stat(stat, delta);
        }
        Ok(())
    }

    fn apply_end(&mut self, world: &mut World) -> Result<(), WorldError> {
        for &(stat, delta) in &self.modifiers {
            world.modify_hero_stat(stat, -delta);
        }
        Ok(())
    }
}

/// Equipment slots of the player.
#[derive(Debug, Default)]
pub struct ItemSlots {
    slots: Vec<Option<Box<dyn ItemEffect>>>,
}

impl ItemSlots {
    /// Creates `count` empty slots.
    #[must_use]
    pub fn with_capacity(count: usize) -> Self {
        Self {
            slots: (0..count).map(|_| None).collect(),
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Item in `slot`.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&dyn ItemEffect> {
        self.slots.get(slot)?.as_deref()
    }

    /// Index of the first empty slot.
    #[must_use]
    pub fn first_empty_slot(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Places `item` in `slot`, returning whatever occupied it.
    pub fn put(&mut self, slot: usize, item: Box<dyn ItemEffect>) -> Option<Box<dyn ItemEffect>> {
        self.slots.get_mut(slot)?.replace(item)
    }

    /// Empties `slot`.
    pub fn take(&mut self, slot: usize) -> Option<Box<dyn ItemEffect>> {
        self.slots.get_mut(slot)?.take()
    }

    /// Swaps two slots; out-of-range slots are ignored.
    pub fn swap(&mut self, first: usize, second: usize) {
        if first < self.slots.len() && second < self.slots.len() {
            self.slots.swap(first, second);
        }
    }

    /// Kinds of the equipped items in slot order.
    #[must_use]
    pub fn equipped_types(&self) -> Vec<ItemTypeId> {
        self.slots.iter().flatten().map(|item| item.item_type()).collect()
    }

    /// Mutable iterator over equipped items.
    pub fn equipped_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn ItemEffect>> {
        self.slots.iter_mut().flatten()
    }

    /// Moves every item of `granted` into these slots.
    ///
    /// An item keeps its slot index when that slot is free here and takes the
    /// first empty slot otherwise. Items that find no room are handed back.
    pub fn absorb(&mut self, granted: ItemSlots) -> Vec<Box<dyn ItemEffect>> {
        let mut overflow = Vec::new();
        for (slot, item) in granted.slots.into_iter().enumerate() {
            let Some(item) = item else {
                continue;
            };
            let target = match self.slots.get(slot) {
                Some(None) => Some(slot),
                _ => self.first_empty_slot(),
            };
            match target {
                Some(target) => self.slots[target] = Some(item),
                None => overflow.push(item),
            }
        }
        overflow
    }
}

/// Consumables carried by the player, one per slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsumableInventory {
    slots: Vec<Option<ConsumableTypeId>>,
}

impl ConsumableInventory {
    /// Creates `count` empty slots.
    #[must_use]
    pub fn with_capacity(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    /// Consumable in `slot`.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<ConsumableTypeId> {
        self.slots.get(slot).copied().flatten()
    }

    /// Whether another consumable fits.
    #[must_use]
    pub fn has_space(&self) -> bool {
        self.slots.iter().any(Option::is_none)
    }

    /// Stores `consumable` in the first empty slot, returning the slot used.
    pub fn add(&mut self, consumable: ConsumableTypeId) -> Option<usize> {
        let slot = self.slots.iter().position(Option::is_none)?;
        self.slots[slot] = Some(consumable);
        Some(slot)
    }

    /// Empties `slot`.
    pub fn remove(&mut self, slot: usize) -> Option<ConsumableTypeId> {
        self.slots.get_mut(slot)?.take()
    }

    /// Moves the consumable in `from` to `to`, swapping with any occupant.
    pub fn drag(&mut self, from: usize, to: usize) {
        if from < self.slots.len() && to < self.slots.len() {
            self.slots.swap(from, to);
        }
    }

    /// Slot contents in order.
    #[must_use]
    pub fn slots(&self) -> &[Option<ConsumableTypeId>] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POTION: ConsumableTypeId = ConsumableTypeId::new("health_potion");
    const SCROLL: ConsumableTypeId = ConsumableTypeId::new("scroll_of_summoning");

    #[test]
    fn consumables_fill_first_free_slot() {
        let mut inventory = ConsumableInventory::with_capacity(2);
        assert_eq!(inventory.add(POTION), Some(0));
        assert_eq!(inventory.add(SCROLL), Some(1));
        assert!(!inventory.has_space());
        assert_eq!(inventory.add(POTION), None);

        assert_eq!(inventory.remove(0), Some(POTION));
        assert_eq!(inventory.add(SCROLL), Some(0));
    }

    #[test]
    fn dragging_swaps_occupants() {
        let mut inventory = ConsumableInventory::with_capacity(3);
        let _ = inventory.add(POTION);
        inventory.drag(0, 2);
        assert_eq!(inventory.slots(), &[None, None, Some(POTION)]);
    }

    #[test]
    fn item_slots_report_first_empty() {
        let mut slots = ItemSlots::with_capacity(2);
        let item = StatModifyingItem::new(ItemTypeId::new("wooden_shield"), vec![(HeroStat::Armor, 2.0)]);
        assert!(slots.put(0, Box::new(item)).is_none());
        assert_eq!(slots.first_empty_slot(), Some(1));
        assert_eq!(slots.equipped_types(), vec![ItemTypeId::new("wooden_shield")]);

        slots.swap(0, 1);
        assert_eq!(slots.first_empty_slot(), Some(0));
    }

    #[test]
    fn absorbing_keeps_free_slots_and_returns_overflow() {
        let shield = || Box::new(StatModifyingItem::new(ItemTypeId::new("wooden_shield"), Vec::new()));
        let ring = || Box::new(StatModifyingItem::new(ItemTypeId::new("ruby_ring"), Vec::new()));
        let mut slots = ItemSlots::with_capacity(2);
        let _ = slots.put(0, shield());

        let mut granted = ItemSlots::with_capacity(2);
        let _ = granted.put(0, ring());
        let overflow = slots.absorb(granted);
        assert!(overflow.is_empty());
        assert_eq!(
            slots.equipped_types(),
            vec![ItemTypeId::new("wooden_shield"), ItemTypeId::new("ruby_ring")]
        );

        let mut granted = ItemSlots::with_capacity(2);
        let _ = granted.put(1, ring());
        let overflow = slots.absorb(granted);
        assert_eq!(overflow.len(), 1);
        assert_eq!(overflow[0].item_type(), ItemTypeId::new("ruby_ring"));
    }
}
