use std::{cell::RefCell, rc::Rc, time::Duration};

use emberfall_core::{Actor, BuffEventOutcome, BuffTypeId, GameEvent, NpcCategory, NpcTypeId};
use emberfall_system_buffs::run_buff_lifecycle;
use emberfall_world::{
    BuffEffect, Npc, PlayerSetup, ResourceGauge, World, WorldConfig, WorldEntity, WorldError,
};
use glam::Vec2;
use proptest::prelude::*;

type Log = Rc<RefCell<Vec<String>>>;

const REGEN: BuffTypeId = BuffTypeId::new("regen");
const ECHO: BuffTypeId = BuffTypeId::new("echo");
const DAZE: BuffTypeId = BuffTypeId::new("daze");
const HERALD: BuffTypeId = BuffTypeId::new("herald");
const VIGIL: BuffTypeId = BuffTypeId::new("vigil");

#[derive(Debug)]
struct Recording {
    buff_type: BuffTypeId,
    log: Log,
    cancel_after: Option<usize>,
    middles: usize,
}

impl Recording {
    fn boxed(buff_type: BuffTypeId, log: &Log) -> Box<Self> {
        Box::new(Self {
            buff_type,
            log: Rc::clone(log),
            cancel_after: None,
            middles: 0,
        })
    }
}

impl BuffEffect for Recording {
    fn buff_type(&self) -> BuffTypeId {
        self.buff_type
    }

    fn apply_start(&mut self, _world: &mut World, _owner: Actor) -> Result<(), WorldError> {
        self.log.borrow_mut().push(format!("{}:start", self.buff_type.name()));
        Ok(())
    }

    fn apply_middle(
        &mut self,
        _world: &mut World,
        _owner: Actor,
        _dt: Duration,
    ) -> Result<bool, WorldError> {
        self.middles += 1;
        self.log.borrow_mut().push(format!("{}:middle", self.buff_type.name()));
        Ok(self.cancel_after == Some(self.middles))
    }

    fn apply_end(&mut self, _world: &mut World, _owner: Actor) -> Result<(), WorldError> {
        self.log.borrow_mut().push(format!("{}:end", self.buff_type.name()));
        Ok(())
    }
}

/// Grants an echo buff to its owner when it starts.
#[derive(Debug)]
struct Spawning {
    log: Log,
}

impl BuffEffect for Spawning {
    fn buff_type(&self) -> BuffTypeId {
        REGEN
    }

    fn apply_start(&mut self, world: &mut World, owner: Actor) -> Result<(), WorldError> {
        self.log.borrow_mut().push("regen:start".to_owned());
        let _ = world.gain_buff(owner, Recording::boxed(ECHO, &self.log), None);
        Ok(())
    }
}

/// Stuns on start and releases the stun on end, releasing once too often.
#[derive(Debug)]
struct Daze;

impl BuffEffect for Daze {
    fn buff_type(&self) -> BuffTypeId {
        DAZE
    }

    fn apply_start(&mut self, world: &mut World, owner: Actor) -> Result<(), WorldError> {
        if let Some(stun) = world.stun_mut(owner) {
            stun.add_one();
        }
        Ok(())
    }

    fn apply_end(&mut self, world: &mut World, owner: Actor) -> Result<(), WorldError> {
        if let Some(stun) = world.stun_mut(owner) {
            stun.remove_one()?;
            stun.remove_one()?;
        }
        Ok(())
    }
}

/// Announces an enemy death to the player when it starts.
#[derive(Debug)]
struct Herald;

impl BuffEffect for Herald {
    fn buff_type(&self) -> BuffTypeId {
        HERALD
    }

    fn apply_start(&mut self, world: &mut World, _owner: Actor) -> Result<(), WorldError> {
        world.notify_player_about_event(GameEvent::EnemyDied)
    }
}

/// Lasts until an enemy dies.
#[derive(Debug)]
struct Vigil {
    log: Log,
}

impl BuffEffect for Vigil {
    fn buff_type(&self) -> BuffTypeId {
        VIGIL
    }

    fn apply_end(&mut self, _world: &mut World, _owner: Actor) -> Result<(), WorldError> {
        self.log.borrow_mut().push("vigil:end".to_owned());
        Ok(())
    }

    fn handle_event(&mut self, event: &GameEvent) -> Option<BuffEventOutcome> {
        matches!(event, GameEvent::EnemyDied).then_some(BuffEventOutcome::Cancel)
    }
}

fn world() -> World {
    World::new(WorldConfig::default(), &PlayerSetup::default())
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

#[test]
fn hooks_fire_start_middle_end_once_each() {
    let mut world = world();
    let log = Log::default();
    let _ = world.gain_buff(
        Actor::Player,
        Recording::boxed(REGEN, &log),
        Some(Duration::from_millis(400)),
    );

    for _ in 0..4 {
        run_buff_lifecycle(&mut world, Actor::Player, Duration::from_millis(100)).unwrap();
    }

    assert_eq!(
        entries(&log),
        vec!["regen:start", "regen:middle", "regen:middle", "regen:end"]
    );
    assert!(world.player().buffs().is_empty());

    run_buff_lifecycle(&mut world, Actor::Player, Duration::from_millis(100)).unwrap();
    assert_eq!(entries(&log).len(), 4);
}

#[test]
fn buffs_granted_by_a_start_hook_start_on_the_next_pass() {
    let mut world = world();
    let log = Log::default();
    let _ = world.gain_buff(
        Actor::Player,
        Box::new(Spawning {
            log: Rc::clone(&log),
        }),
        None,
    );

    run_buff_lifecycle(&mut world, Actor::Player, Duration::from_millis(16)).unwrap();
    assert_eq!(entries(&log), vec!["regen:start"]);
    assert_eq!(world.player().buffs().len(), 2);

    run_buff_lifecycle(&mut world, Actor::Player, Duration::from_millis(16)).unwrap();
    assert_eq!(entries(&log), vec!["regen:start", "echo:start"]);
}

#[test]
fn middle_hook_can_cancel_its_own_buff() {
    let mut world = world();
    let log = Log::default();
    let effect = Box::new(Recording {
        buff_type: REGEN,
        log: Rc::clone(&log),
        cancel_after: Some(1),
        middles: 0,
    });
    let _ = world.gain_buff(Actor::Player, effect, Some(Duration::from_secs(10)));

    for _ in 0..3 {
        run_buff_lifecycle(&mut world, Actor::Player, Duration::from_millis(16)).unwrap();
    }

    assert_eq!(entries(&log), vec!["regen:start", "regen:middle", "regen:end"]);
    assert!(world.player().buffs().is_empty());
}

#[test]
fn npc_buffs_follow_the_same_lifecycle() {
    let mut world = world();
    let npc = world.spawn_npc(Npc::new(
        NpcTypeId::new("skeleton"),
        WorldEntity::new(Vec2::new(300.0, 300.0), Vec2::splat(30.0)),
        ResourceGauge::new(20, 0.0),
        NpcCategory::Enemy,
    ));
    let log = Log::default();
    assert!(world.gain_buff(
        Actor::Npc(npc),
        Recording::boxed(ECHO, &log),
        Some(Duration::ZERO)
    ));

    run_buff_lifecycle(&mut world, Actor::Npc(npc), Duration::from_millis(16)).unwrap();
    run_buff_lifecycle(&mut world, Actor::Npc(npc), Duration::from_millis(16)).unwrap();

    assert_eq!(entries(&log), vec!["echo:start", "echo:end"]);
    assert!(world.npc(npc).unwrap().buffs().is_empty());
}

#[test]
fn stun_underflow_aborts_the_pass() {
    let mut world = world();
    let _ = world.gain_buff(Actor::Player, Box::new(Daze), Some(Duration::from_millis(50)));

    run_buff_lifecycle(&mut world, Actor::Player, Duration::from_millis(50)).unwrap();
    assert!(world.player().is_stunned());

    let outcome = run_buff_lifecycle(&mut world, Actor::Player, Duration::from_millis(50));
    assert_eq!(outcome, Err(WorldError::StunUnderflow));
}

#[test]
fn events_raised_by_hooks_reach_the_owners_other_buffs() {
    let mut world = world();
    let log = Log::default();
    let _ = world.gain_buff(Actor::Player, Box::new(Vigil { log: Rc::clone(&log) }), None);
    run_buff_lifecycle(&mut world, Actor::Player, Duration::from_millis(16)).unwrap();

    let _ = world.gain_buff(Actor::Player, Box::new(Herald), None);
    run_buff_lifecycle(&mut world, Actor::Player, Duration::from_millis(16)).unwrap();
    assert!(entries(&log).is_empty());

    run_buff_lifecycle(&mut world, Actor::Player, Duration::from_millis(16)).unwrap();
    assert_eq!(entries(&log), vec!["vigil:end"]);
    assert!(!world.player().buffs().has(VIGIL));
    assert!(world.player().buffs().has(HERALD));
}

#[test]
fn missing_owner_is_skipped() {
    let mut world = world();
    let ghost = emberfall_core::EntityId::new(999);
    assert!(run_buff_lifecycle(&mut world, Actor::Npc(ghost), Duration::from_millis(16)).is_ok());
}

proptest! {
    #[test]
    fn regranting_a_buff_never_duplicates_it(durations in prop::collection::vec(0u64..5_000, 1..20)) {
        let mut world = world();
        let log = Log::default();
        for millis in &durations {
            let _ = world.gain_buff(
                Actor::Player,
                Recording::boxed(REGEN, &log),
                Some(Duration::from_millis(*millis)),
            );
        }

        let buffs = world.player().buffs();
        prop_assert_eq!(buffs.len(), 1);
        let last = durations.last().copied().map(Duration::from_millis);
        prop_assert_eq!(buffs.get(REGEN).and_then(|buff| buff.remaining()), last);
    }
}
