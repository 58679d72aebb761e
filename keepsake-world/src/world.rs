//! A minimal host object graph.
//!
//! The [`World`] owns its components and hands out instance ids from a
//! counter that restarts on every [`World::reload`], so a scene rebuilt the
//! same way gets the same component keys as in the previous run.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use keepsake_core::{ComponentHandle, InstanceId, Persistent, SceneGraph};
use tracing::{debug, info};

use crate::events::WorldEvent;

/// One spawned object: its id and the component it carries.
struct WorldObject {
    id: InstanceId,
    type_name: &'static str,
    owner: Rc<dyn Any>,
    handle: ComponentHandle,
}

/// Owns every live component of the current scene.
pub struct World {
    scene: String,
    objects: Vec<WorldObject>,
    next_id: u64,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("scene", &self.scene)
            .field("objects", &self.objects.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new("main")
    }
}

impl World {
    /// An empty world showing `scene`.
    #[must_use]
    pub fn new(scene: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            objects: Vec::new(),
            next_id: 1,
        }
    }

    /// Name of the current scene.
    #[must_use]
    pub fn scene(&self) -> &str {
        &self.scene
    }

    /// Number of live objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the world holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Reserve the next instance id.
    pub fn next_instance_id(&mut self) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Spawn a component built from a freshly assigned instance id.
    pub fn spawn<C: Persistent>(&mut self, build: impl FnOnce(InstanceId) -> C) -> Rc<RefCell<C>> {
        let id = self.next_instance_id();
        self.insert(build(id))
    }

    /// Spawn a component that already carries its id. Later automatic ids
    /// never collide with it.
    pub fn spawn_with_id<C: Persistent>(&mut self, component: C) -> Rc<RefCell<C>> {
        let id = component.instance_id();
        self.next_id = self.next_id.max(id.0 + 1);
        self.insert(component)
    }

    /// Typed access to a live component.
    #[must_use]
    pub fn get<C: Persistent>(&self, id: InstanceId) -> Option<Rc<RefCell<C>>> {
        self.objects
            .iter()
            .filter(|o| o.id == id && o.type_name == C::TYPE_NAME)
            .find_map(|o| Rc::clone(&o.owner).downcast::<RefCell<C>>().ok())
    }

    /// Destroy every object with `id`. Returns how many were removed.
    pub fn despawn(&mut self, id: InstanceId) -> usize {
        let before = self.objects.len();
        self.objects.retain(|o| o.id != id);
        let removed = before - self.objects.len();
        debug!(instance = %id, removed, "Despawned");
        removed
    }

    /// Destroy every object, reset the id counter and rebuild `scene` with
    /// `build`.
    ///
    /// Handles kept by the caller still keep their components alive, so
    /// drop them first if the rebuilt scene should replace them.
    pub fn reload(&mut self, scene: impl Into<String>, build: impl FnOnce(&mut Self)) -> WorldEvent {
        let destroyed = self.objects.len();
        self.objects.clear();
        self.next_id = 1;
        self.scene = scene.into();
        build(self);
        info!(
            scene = %self.scene,
            destroyed,
            spawned = self.objects.len(),
            "World reloaded"
        );
        WorldEvent::Reloaded {
            scene: self.scene.clone(),
        }
    }

    fn insert<C: Persistent>(&mut self, component: C) -> Rc<RefCell<C>> {
        let id = component.instance_id();
        let shared = Rc::new(RefCell::new(component));
        self.objects.push(WorldObject {
            id,
            type_name: C::TYPE_NAME,
            owner: Rc::clone(&shared) as Rc<dyn Any>,
            handle: ComponentHandle::new(&shared),
        });
        debug!(type_name = C::TYPE_NAME, instance = %id, "Spawned");
        shared
    }
}

impl SceneGraph for World {
    fn live_components(&self) -> Vec<ComponentHandle> {
        self.objects.iter().map(|o| o.handle.clone()).collect()
    }
}
