//! Host lifecycle events and their routing to the save manager.
//!
//! The host raises a [`WorldEvent`] whenever the scene is rebuilt or the
//! application is about to quit; [`dispatch`] turns it into the matching
//! [`SaveManager`] call.

use keepsake_core::{KeyValueStore, LoadSummary, Result, SaveManager, SaveSummary};
use tracing::info;

use crate::world::World;

/// Something the host did that affects persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldEvent {
    /// The scene was torn down and rebuilt.
    Reloaded {
        /// Name of the scene now showing.
        scene: String,
    },
    /// The application is exiting.
    Exiting,
}

/// What the manager did in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Newly appeared components were restored.
    Loaded(LoadSummary),
    /// Everything was saved.
    Saved(SaveSummary),
}

/// Route `event` to the save manager.
///
/// # Errors
/// Propagates store failures from the manager.
pub fn dispatch<S: KeyValueStore>(
    event: &WorldEvent,
    world: &World,
    manager: &mut SaveManager<S>,
) -> Result<EventOutcome> {
    match event {
        WorldEvent::Reloaded { scene } => {
            let summary = manager.on_world_reloaded(world)?;
            info!(scene = %scene, restored = summary.components, "Handled reload");
            Ok(EventOutcome::Loaded(summary))
        }
        WorldEvent::Exiting => {
            let summary = manager.on_exit()?;
            info!(saved = summary.components, "Handled exit");
            Ok(EventOutcome::Saved(summary))
        }
    }
}

#[cfg(test)]
mod tests {
    use keepsake_core::MemoryStore;

    use super::*;
    use crate::components::PlayerProgress;

    #[test]
    fn exit_saves_and_reload_restores() {
        let mut world = World::default();
        let mut manager = SaveManager::new(MemoryStore::new());

        let player = world.spawn(PlayerProgress::new);
        player.borrow_mut().score = 12;
        let outcome = dispatch(&WorldEvent::Reloaded { scene: "main".into() }, &world, &mut manager)
            .expect("initial load");
        assert!(matches!(outcome, EventOutcome::Loaded(s) if s.missing == 1));

        let outcome = dispatch(&WorldEvent::Exiting, &world, &mut manager).expect("exit");
        assert!(matches!(outcome, EventOutcome::Saved(s) if s.components == 1));

        drop(player);
        let event = world.reload("main", |w| {
            w.spawn(PlayerProgress::new);
        });
        dispatch(&event, &world, &mut manager).expect("reload");

        let player = world
            .get::<PlayerProgress>(keepsake_core::InstanceId(1))
            .expect("player");
        assert_eq!(player.borrow().score, 12);
        assert_eq!(player.borrow().restores, 1);
    }
}
