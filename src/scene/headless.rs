//! In-memory scene
//!
//! Stands in for a real engine scene graph: keeps object transforms, runs
//! agent motion and counts operations so passes can be inspected.

use std::collections::BTreeMap;

use glam::Vec3;

use super::motion::Mover;
use super::{
    Layer, Movable, ObjectHandle, Representable, Representation, Scene, Transform, VisualObject,
};
use crate::consts::{DEFAULT_MAX_OBJECTS, DEFAULT_MOVEMENT_SPEED};
use crate::error::SceneError;

/// A live object in the headless scene
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub layer: Layer,
    pub kind: Representation,
    pub transform: Transform,
    /// Present for agent visuals only
    pub mover: Option<Mover>,
    writes: u64,
}

impl VisualObject for SceneObject {
    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
        if let Some(mover) = self.mover.as_mut() {
            mover.settle(position);
        }
        self.writes += 1;
    }

    fn as_movable(&self) -> Option<&dyn Movable> {
        self.mover.as_ref().map(|_| self as &dyn Movable)
    }

    fn as_movable_mut(&mut self) -> Option<&mut dyn Movable> {
        if self.mover.is_some() {
            Some(self)
        } else {
            None
        }
    }

    fn as_representable(&self) -> Option<&dyn Representable> {
        if self.kind.is_agent() {
            Some(self)
        } else {
            None
        }
    }
}

impl Movable for SceneObject {
    fn set_target(&mut self, target: Vec3) -> bool {
        let changed = self
            .mover
            .as_mut()
            .is_some_and(|mover| mover.set_target(target));
        if changed {
            self.writes += 1;
        }
        changed
    }

    fn target(&self) -> Vec3 {
        self.mover
            .as_ref()
            .map_or(self.transform.position, |mover| mover.target())
    }

    fn is_moving(&self) -> bool {
        self.mover.as_ref().is_some_and(|mover| mover.is_moving())
    }
}

impl Representable for SceneObject {
    fn representation(&self) -> Representation {
        self.kind
    }
}

/// Operation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub spawned: u64,
    pub despawned: u64,
    /// Position writes and retarget requests
    pub moves: u64,
}

/// Capacity-bounded object table
#[derive(Debug, Clone)]
pub struct HeadlessScene {
    objects: BTreeMap<ObjectHandle, SceneObject>,
    next_handle: u64,
    capacity: usize,
    movement_speed: f32,
    spawned: u64,
    despawned: u64,
    retired_moves: u64,
}

impl Default for HeadlessScene {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OBJECTS, DEFAULT_MOVEMENT_SPEED)
    }
}

impl HeadlessScene {
    pub fn new(capacity: usize, movement_speed: f32) -> Self {
        Self {
            objects: BTreeMap::new(),
            next_handle: 1,
            capacity,
            movement_speed,
            spawned: 0,
            despawned: 0,
            retired_moves: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&SceneObject> {
        self.objects.get(&handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectHandle, &SceneObject)> {
        self.objects.iter().map(|(h, o)| (*h, o))
    }

    /// Live objects on one layer
    pub fn count_layer(&self, layer: Layer) -> usize {
        self.objects.values().filter(|o| o.layer == layer).count()
    }

    /// Live objects per representation, sorted by kind
    pub fn census(&self) -> BTreeMap<Representation, usize> {
        let mut counts = BTreeMap::new();
        for object in self.objects.values() {
            *counts.entry(object.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn stats(&self) -> SceneStats {
        let live_moves: u64 = self.objects.values().map(|o| o.writes).sum();
        SceneStats {
            spawned: self.spawned,
            despawned: self.despawned,
            moves: self.retired_moves + live_moves,
        }
    }
}

impl Scene for HeadlessScene {
    fn spawn(
        &mut self,
        layer: Layer,
        kind: Representation,
        transform: Transform,
    ) -> Result<ObjectHandle, SceneError> {
        if self.objects.len() >= self.capacity {
            return Err(SceneError::Exhausted {
                capacity: self.capacity,
            });
        }

        let handle = ObjectHandle(self.next_handle);
        self.next_handle += 1;

        let mover = kind
            .is_agent()
            .then(|| Mover::new(transform.position, self.movement_speed));

        self.objects.insert(
            handle,
            SceneObject {
                layer,
                kind,
                transform,
                mover,
                writes: 0,
            },
        );
        self.spawned += 1;
        log::trace!("spawn {:?} {} at {}", handle, kind, transform.position);
        Ok(handle)
    }

    fn despawn(&mut self, handle: ObjectHandle) -> bool {
        match self.objects.remove(&handle) {
            Some(object) => {
                self.despawned += 1;
                self.retired_moves += object.writes;
                log::trace!("despawn {:?} {}", handle, object.kind);
                true
            }
            None => false,
        }
    }

    fn object(&self, handle: ObjectHandle) -> Option<&dyn VisualObject> {
        self.objects.get(&handle).map(|o| o as &dyn VisualObject)
    }

    fn object_mut(&mut self, handle: ObjectHandle) -> Option<&mut dyn VisualObject> {
        self.objects
            .get_mut(&handle)
            .map(|o| o as &mut dyn VisualObject)
    }

    fn advance(&mut self, dt: f32) {
        for object in self.objects.values_mut() {
            if let Some(mover) = object.mover.as_mut() {
                mover.step(&mut object.transform.position, dt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_never_reused() {
        let mut scene = HeadlessScene::default();
        let a = scene
            .spawn(Layer::Dynamic, Representation::Fire, Transform::default())
            .unwrap();
        assert!(scene.despawn(a));
        let b = scene
            .spawn(Layer::Dynamic, Representation::Fire, Transform::default())
            .unwrap();
        assert_ne!(a, b);
        assert!(!scene.is_alive(a));
        assert!(!scene.despawn(a));
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut scene = HeadlessScene::new(1, 5.0);
        scene
            .spawn(Layer::Static, Representation::WallIntact, Transform::default())
            .unwrap();
        let err = scene
            .spawn(Layer::Static, Representation::WallIntact, Transform::default())
            .unwrap_err();
        assert_eq!(err, SceneError::Exhausted { capacity: 1 });
    }

    #[test]
    fn test_only_agents_have_capabilities() {
        let mut scene = HeadlessScene::default();
        let agent = scene
            .spawn(Layer::Dynamic, Representation::Agent, Transform::default())
            .unwrap();
        let fire = scene
            .spawn(Layer::Dynamic, Representation::Fire, Transform::default())
            .unwrap();

        let agent = scene.object(agent).unwrap();
        assert!(agent.as_movable().is_some());
        assert_eq!(
            agent.as_representable().map(|r| r.representation()),
            Some(Representation::Agent)
        );

        let fire = scene.object(fire).unwrap();
        assert!(fire.as_movable().is_none());
        assert!(fire.as_representable().is_none());
    }

    #[test]
    fn test_advance_moves_agents_toward_target() {
        let mut scene = HeadlessScene::new(8, 5.0);
        let handle = scene
            .spawn(Layer::Dynamic, Representation::Agent, Transform::default())
            .unwrap();
        let target = Vec3::new(2.0, 0.0, 0.0);
        scene
            .object_mut(handle)
            .and_then(|o| o.as_movable_mut())
            .unwrap()
            .set_target(target);

        scene.advance(0.2);
        let halfway = scene.get(handle).unwrap().transform.position;
        assert!((halfway.x - 1.0).abs() < 1e-5);

        scene.advance(0.2);
        assert_eq!(scene.get(handle).unwrap().transform.position, target);
    }

    #[test]
    fn test_stats_survive_despawn() {
        let mut scene = HeadlessScene::default();
        let handle = scene
            .spawn(Layer::Dynamic, Representation::Smoke, Transform::default())
            .unwrap();
        scene
            .object_mut(handle)
            .unwrap()
            .set_position(Vec3::new(1.0, 1.0, 0.0));
        scene.despawn(handle);
        assert_eq!(
            scene.stats(),
            SceneStats {
                spawned: 1,
                despawned: 1,
                moves: 1
            }
        );
    }
}
