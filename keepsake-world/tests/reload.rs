//! Integration Tests: Scene Reloads and Restarts
//!
//! Drives a [`World`] through reloads and simulated process restarts with a
//! file-backed store, checking that only rebuilt components are restored.

use keepsake_core::config::PersistenceConfig;
use keepsake_core::{InstanceId, KeepsakeConfig, SaveManager, SqliteStore};
use keepsake_world::components::{AudioSettings, Checkpoint, Difficulty, PlayerProgress};
use keepsake_world::{dispatch, EventOutcome, World, WorldEvent};

fn build_town(world: &mut World) {
    world.spawn(PlayerProgress::new);
    world.spawn(AudioSettings::new);
    world.spawn(Checkpoint::new);
}

fn open_manager(path: &std::path::Path) -> SaveManager<SqliteStore> {
    let config = PersistenceConfig::default();
    let store = SqliteStore::open(path, &config).expect("open store");
    SaveManager::from_config(store, &KeepsakeConfig::default())
}

#[test]
fn progress_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("slot1.db");

    {
        let mut world = World::new("town");
        let mut manager = open_manager(&path);
        let event = world.reload("town", build_town);
        dispatch(&event, &world, &mut manager).expect("ready");

        let player = world.get::<PlayerProgress>(InstanceId(1)).expect("player");
        {
            let mut p = player.borrow_mut();
            p.score = 42;
            p.difficulty = Difficulty::Easy;
            p.inventory.push("map".to_string());
        }
        let outcome = dispatch(&WorldEvent::Exiting, &world, &mut manager).expect("exit");
        assert!(matches!(outcome, EventOutcome::Saved(s) if s.components == 3));
    }

    let mut world = World::new("town");
    let mut manager = open_manager(&path);
    let event = world.reload("town", build_town);
    let outcome = dispatch(&event, &world, &mut manager).expect("ready");
    assert!(matches!(outcome, EventOutcome::Loaded(s) if s.components == 3));

    let player = world.get::<PlayerProgress>(InstanceId(1)).expect("player");
    let p = player.borrow();
    assert_eq!(p.score, 42);
    assert_eq!(p.difficulty, Difficulty::Easy);
    assert_eq!(p.inventory, vec!["map"]);
    assert_eq!(p.restores, 1);
}

#[test]
fn reload_restores_rebuilt_components_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut manager = open_manager(&dir.path().join("slot.db"));
    let mut world = World::new("town");
    let event = world.reload("town", build_town);
    dispatch(&event, &world, &mut manager).expect("ready");

    world
        .get::<PlayerProgress>(InstanceId(1))
        .expect("player")
        .borrow_mut()
        .score = 7;
    manager.save_all().expect("save");

    // The cave has no player, only the audio settings at their usual id.
    let event = world.reload("cave", |w| {
        w.spawn_with_id(AudioSettings::new(InstanceId(2)));
    });
    let outcome = dispatch(&event, &world, &mut manager).expect("reload");
    assert!(matches!(outcome, EventOutcome::Loaded(s) if s.components == 1 && s.missing == 0));

    // A repeat notification for the same scene restores nothing.
    let outcome = dispatch(&event, &world, &mut manager).expect("repeat");
    assert!(matches!(outcome, EventOutcome::Loaded(s) if s.components == 0));

    // Back in town the player is rebuilt and gets its score back.
    let event = world.reload("town", build_town);
    dispatch(&event, &world, &mut manager).expect("back to town");
    let player = world.get::<PlayerProgress>(InstanceId(1)).expect("player");
    assert_eq!(player.borrow().score, 7);
}

#[test]
fn despawned_components_are_not_saved() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut manager = open_manager(&dir.path().join("slot.db"));
    let mut world = World::new("town");
    let event = world.reload("town", build_town);
    dispatch(&event, &world, &mut manager).expect("ready");

    world.despawn(InstanceId(3));
    let outcome = dispatch(&WorldEvent::Exiting, &world, &mut manager).expect("exit");
    let EventOutcome::Saved(summary) = outcome else {
        panic!("exit should save");
    };
    assert_eq!(summary.components, 2);
    assert_eq!(summary.stale, 1);
    assert!(manager.read_container().expect("container").component("Checkpoint_3").is_none());
}
