//! Dynamic object reconciler
//!
//! Maps the live entities of one snapshot (agents, fire, smoke, POIs) onto a
//! keyed pool of scene objects. Per entity the pass either creates, retargets
//! or schedules a morph; afterwards every key the snapshot no longer reports
//! is destroyed.
//!
//! Morphs (representation swaps) are never applied inside the pass. They are
//! queued and drained by [`Reconciler::run_deferred`] once the pass is over,
//! and each one re-checks that the pool still points at the object it was
//! scheduled for.

use std::collections::{HashMap, HashSet, VecDeque};

use glam::Vec3;

use super::mapper::GridMapper;
use super::snapshot::GridCell;
use crate::error::SyncError;
use crate::scene::{Layer, ObjectHandle, Representation, Scene, Transform};

/// One remote entity as the reconciler sees it
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicEntity {
    pub key: String,
    pub representation: Representation,
    /// `None` when the record had no usable position
    pub cell: Option<GridCell>,
}

impl DynamicEntity {
    pub fn new(
        key: impl Into<String>,
        representation: Representation,
        cell: Option<GridCell>,
    ) -> Self {
        Self {
            key: key.into(),
            representation,
            cell,
        }
    }
}

/// A pooled dynamic object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicEntry {
    pub handle: ObjectHandle,
    pub representation: Representation,
    /// Last position the object was sent toward
    pub target: Vec3,
}

/// Pending destroy-and-recreate
#[derive(Debug, Clone, PartialEq)]
struct Morph {
    key: String,
    old: ObjectHandle,
    representation: Representation,
    target: Vec3,
}

/// What one pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub created: usize,
    pub retargeted: usize,
    pub unchanged: usize,
    pub morphs_scheduled: usize,
    pub removed: usize,
    pub skipped: usize,
}

/// Keyed pool of movable objects plus the deferred morph queue
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    mapper: GridMapper,
    entries: HashMap<String, DynamicEntry>,
    pending: VecDeque<Morph>,
}

impl Reconciler {
    pub fn new(mapper: GridMapper) -> Self {
        Self {
            mapper,
            entries: HashMap::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn mapper(&self) -> &GridMapper {
        &self.mapper
    }

    pub fn get(&self, key: &str) -> Option<&DynamicEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn pending_morphs(&self) -> usize {
        self.pending.len()
    }

    /// Apply the full set of live entities for one snapshot
    pub fn reconcile_pass<S: Scene>(
        &mut self,
        scene: &mut S,
        entities: &[DynamicEntity],
    ) -> Result<PassReport, SyncError> {
        let mut report = PassReport::default();
        let mut touched: HashSet<&str> = HashSet::with_capacity(entities.len());

        for entity in entities {
            // Touched even when skipped, so a bad record never deletes a good object
            touched.insert(entity.key.as_str());

            let Some(cell) = entity.cell else {
                log::warn!("Skipping {}: missing or incomplete position", entity.key);
                report.skipped += 1;
                continue;
            };
            let target = self.mapper.cell(cell);

            let existing = self.entries.get(&entity.key).copied();
            let live = existing.and_then(|entry| {
                scene
                    .object(entry.handle)
                    .map(|object| (entry, object.as_representable().map(|r| r.representation())))
            });

            match live {
                None => {
                    if let Some(stale) = existing {
                        log::warn!("{} lost its object {:?}, recreating", entity.key, stale.handle);
                    }
                    let handle =
                        scene.spawn(Layer::Dynamic, entity.representation, Transform::at(target))?;
                    self.entries.insert(
                        entity.key.clone(),
                        DynamicEntry {
                            handle,
                            representation: entity.representation,
                            target,
                        },
                    );
                    report.created += 1;
                }
                Some((entry, Some(current))) if current != entity.representation => {
                    let kind = entity.representation;
                    if self.schedule_morph(&entity.key, entry.handle, kind, target) {
                        report.morphs_scheduled += 1;
                    }
                }
                Some((entry, _)) => {
                    // A later snapshot may have undone a representation change
                    self.pending.retain(|m| m.key != entity.key);

                    if entry.target == target {
                        report.unchanged += 1;
                        continue;
                    }
                    if let Some(object) = scene.object_mut(entry.handle) {
                        match object.as_movable_mut() {
                            Some(movable) => {
                                movable.set_target(target);
                            }
                            None => object.set_position(target),
                        }
                    }
                    if let Some(entry) = self.entries.get_mut(&entity.key) {
                        entry.target = target;
                    }
                    report.retargeted += 1;
                }
            }
        }

        let vanished: Vec<String> = self
            .entries
            .keys()
            .filter(|key| !touched.contains(key.as_str()))
            .cloned()
            .collect();
        for key in vanished {
            if let Some(entry) = self.entries.remove(&key) {
                scene.despawn(entry.handle);
                log::trace!("{} removed", key);
                report.removed += 1;
            }
        }

        Ok(report)
    }

    /// Queue a morph; returns false if one was already pending for this object
    fn schedule_morph(
        &mut self,
        key: &str,
        old: ObjectHandle,
        representation: Representation,
        target: Vec3,
    ) -> bool {
        if let Some(morph) = self.pending.iter_mut().find(|m| m.key == key && m.old == old) {
            morph.representation = representation;
            morph.target = target;
            return false;
        }
        log::trace!("{} morph to {} scheduled", key, representation);
        self.pending.push_back(Morph {
            key: key.to_string(),
            old,
            representation,
            target,
        });
        true
    }

    /// Drain queued morphs; returns how many were applied
    pub fn run_deferred<S: Scene>(&mut self, scene: &mut S) -> Result<usize, SyncError> {
        let mut applied = 0;

        while let Some(morph) = self.pending.pop_front() {
            if self.entries.get(&morph.key).map(|e| e.handle) != Some(morph.old) {
                log::trace!("{} morph dropped: object superseded", morph.key);
                continue;
            }
            let Some(transform) = scene.object(morph.old).map(|o| o.transform()) else {
                log::trace!("{} morph dropped: object already destroyed", morph.key);
                continue;
            };

            self.entries.remove(&morph.key);
            scene.despawn(morph.old);

            // Appear exactly where the old object was, then continue toward the target
            let handle = scene.spawn(Layer::Dynamic, morph.representation, transform)?;
            if let Some(movable) = scene.object_mut(handle).and_then(|o| o.as_movable_mut()) {
                movable.set_target(morph.target);
            }
            self.entries.insert(
                morph.key.clone(),
                DynamicEntry {
                    handle,
                    representation: morph.representation,
                    target: morph.target,
                },
            );
            log::trace!("{} now {}", morph.key, morph.representation);
            applied += 1;
        }

        Ok(applied)
    }

    /// Destroy every pooled object and forget pending morphs
    pub fn clear<S: Scene>(&mut self, scene: &mut S) {
        self.pending.clear();
        for (_, entry) in self.entries.drain() {
            scene.despawn(entry.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SceneError;
    use crate::scene::{HeadlessScene, Movable};

    fn agent(id: u32, row: i64, col: i64, carrying: bool) -> DynamicEntity {
        let kind = if carrying {
            Representation::AgentCarrying
        } else {
            Representation::Agent
        };
        DynamicEntity::new(format!("agent_{id}"), kind, Some(GridCell::new(row, col)))
    }

    fn fire(row: i64, col: i64) -> DynamicEntity {
        let cell = Some(GridCell::new(row, col));
        DynamicEntity::new(format!("fire_{row}_{col}"), Representation::Fire, cell)
    }

    #[test]
    fn test_single_agent_is_created() {
        let mut scene = HeadlessScene::default();
        let mut reconciler = Reconciler::default();

        let report = reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 0, false)]).unwrap();
        assert_eq!(report.created, 1);

        let entry = reconciler.get("agent_1").unwrap();
        assert_eq!(entry.representation, Representation::Agent);
        let object = scene.get(entry.handle).unwrap();
        assert_eq!(object.transform.position, Vec3::new(0.0, -14.0, 0.0));
    }

    #[test]
    fn test_agent_glides_to_new_cell() {
        let mut scene = HeadlessScene::default();
        let mut reconciler = Reconciler::default();
        reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 0, false)]).unwrap();
        let handle = reconciler.get("agent_1").unwrap().handle;

        let report = reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 1, false)]).unwrap();
        assert_eq!(report.retargeted, 1);

        // Same object, still at the old spot until frames advance
        assert_eq!(reconciler.get("agent_1").unwrap().handle, handle);
        let object = scene.get(handle).unwrap();
        assert_eq!(object.transform.position, Vec3::new(0.0, -14.0, 0.0));
        assert_eq!(object.mover.as_ref().unwrap().target(), Vec3::new(2.0, -14.0, 0.0));
    }

    #[test]
    fn test_fire_snaps_when_moved() {
        let mut scene = HeadlessScene::default();
        let mut reconciler = Reconciler::default();
        let mut entity = fire(1, 1);
        reconciler.reconcile_pass(&mut scene, &[entity.clone()]).unwrap();

        // Same key at a new cell is impossible on the wire, but the pool must cope
        entity.cell = Some(GridCell::new(2, 2));
        reconciler.reconcile_pass(&mut scene, &[entity]).unwrap();
        let handle = reconciler.get("fire_1_1").unwrap().handle;
        assert_eq!(scene.get(handle).unwrap().transform.position, Vec3::new(4.0, -10.0, 0.0));
    }

    #[test]
    fn test_carry_flip_morphs_after_pass() {
        let mut scene = HeadlessScene::default();
        let mut reconciler = Reconciler::default();
        reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 0, false)]).unwrap();
        let old = reconciler.get("agent_1").unwrap().handle;

        let report = reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 0, true)]).unwrap();
        assert_eq!(report.morphs_scheduled, 1);
        // Nothing swapped yet
        assert_eq!(reconciler.get("agent_1").unwrap().handle, old);
        assert!(scene.is_alive(old));

        assert_eq!(reconciler.run_deferred(&mut scene).unwrap(), 1);
        let entry = *reconciler.get("agent_1").unwrap();
        assert_ne!(entry.handle, old);
        assert!(!scene.is_alive(old));
        assert_eq!(entry.representation, Representation::AgentCarrying);
        let object = scene.get(entry.handle).unwrap();
        assert_eq!(object.kind, Representation::AgentCarrying);
        assert_eq!(object.transform.position, Vec3::new(0.0, -14.0, 0.0));
    }

    #[test]
    fn test_morph_keeps_in_flight_position() {
        let mut scene = HeadlessScene::new(16, 5.0);
        let mut reconciler = Reconciler::default();
        reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 0, false)]).unwrap();
        reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 2, false)]).unwrap();
        scene.advance(0.2);
        let old = reconciler.get("agent_1").unwrap().handle;
        let mid = scene.get(old).unwrap().transform.position;

        reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 2, true)]).unwrap();
        reconciler.run_deferred(&mut scene).unwrap();

        let entry = reconciler.get("agent_1").unwrap();
        let object = scene.get(entry.handle).unwrap();
        assert_eq!(object.transform.position, mid);
        assert_eq!(object.mover.as_ref().unwrap().target(), Vec3::new(4.0, -14.0, 0.0));
    }

    #[test]
    fn test_vanished_fire_is_removed() {
        let mut scene = HeadlessScene::default();
        let mut reconciler = Reconciler::default();
        reconciler
            .reconcile_pass(&mut scene, &[fire(3, 4), fire(1, 1)])
            .unwrap();
        let handle = reconciler.get("fire_3_4").unwrap().handle;

        let report = reconciler.reconcile_pass(&mut scene, &[fire(1, 1)]).unwrap();
        assert_eq!(report.removed, 1);
        assert!(reconciler.get("fire_3_4").is_none());
        assert!(!scene.is_alive(handle));
        assert_eq!(reconciler.len(), 1);
    }

    #[test]
    fn test_positionless_entity_keeps_its_object() {
        let mut scene = HeadlessScene::default();
        let mut reconciler = Reconciler::default();
        reconciler.reconcile_pass(&mut scene, &[agent(4, 2, 2, false)]).unwrap();
        let handle = reconciler.get("agent_4").unwrap().handle;

        let broken = DynamicEntity::new("agent_4", Representation::Agent, None);
        let report = reconciler.reconcile_pass(&mut scene, &[broken]).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.removed, 0);
        assert_eq!(reconciler.get("agent_4").unwrap().handle, handle);

        // Never seen before: nothing is created
        let unknown = DynamicEntity::new("agent_9", Representation::Agent, None);
        reconciler.reconcile_pass(&mut scene, &[unknown]).unwrap();
        assert!(reconciler.get("agent_9").is_none());
    }

    #[test]
    fn test_morph_for_removed_object_is_noop() {
        let mut scene = HeadlessScene::default();
        let mut reconciler = Reconciler::default();
        reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 0, false)]).unwrap();
        reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 0, true)]).unwrap();
        assert_eq!(reconciler.pending_morphs(), 1);

        // Agent disconnects before the morph fires
        reconciler.reconcile_pass(&mut scene, &[]).unwrap();
        assert_eq!(reconciler.run_deferred(&mut scene).unwrap(), 0);
        assert!(reconciler.is_empty());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_morph_for_vanished_scene_object_is_noop() {
        let mut scene = HeadlessScene::default();
        let mut reconciler = Reconciler::default();
        reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 0, false)]).unwrap();
        reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 0, true)]).unwrap();
        let old = reconciler.get("agent_1").unwrap().handle;

        // Pool still points at the handle, but the scene dropped the object
        assert!(scene.despawn(old));
        assert_eq!(reconciler.run_deferred(&mut scene).unwrap(), 0);
        assert_eq!(reconciler.pending_morphs(), 0);
        assert!(scene.is_empty());
        assert_eq!(reconciler.get("agent_1").unwrap().handle, old);

        // The next pass notices and recreates it in the right form
        let report = reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 0, true)]).unwrap();
        assert_eq!(report.created, 1);
        let entry = reconciler.get("agent_1").unwrap();
        assert_ne!(entry.handle, old);
        assert_eq!(scene.get(entry.handle).unwrap().kind, Representation::AgentCarrying);
    }

    #[test]
    fn test_repeated_flip_schedules_once() {
        let mut scene = HeadlessScene::default();
        let mut reconciler = Reconciler::default();
        reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 0, false)]).unwrap();
        reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 0, true)]).unwrap();
        let report = reconciler.reconcile_pass(&mut scene, &[agent(1, 1, 0, true)]).unwrap();
        assert_eq!(report.morphs_scheduled, 0);
        assert_eq!(reconciler.pending_morphs(), 1);

        reconciler.run_deferred(&mut scene).unwrap();
        assert_eq!(reconciler.get("agent_1").unwrap().target, Vec3::new(0.0, -12.0, 0.0));
    }

    #[test]
    fn test_flip_back_before_drain_cancels_morph() {
        let mut scene = HeadlessScene::default();
        let mut reconciler = Reconciler::default();
        reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 0, false)]).unwrap();
        reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 0, true)]).unwrap();
        reconciler.reconcile_pass(&mut scene, &[agent(1, 0, 0, false)]).unwrap();

        assert_eq!(reconciler.pending_morphs(), 0);
        assert_eq!(reconciler.run_deferred(&mut scene).unwrap(), 0);
        assert_eq!(
            reconciler.get("agent_1").unwrap().representation,
            Representation::Agent
        );
    }

    #[test]
    fn test_identical_pass_is_idle() {
        let mut scene = HeadlessScene::default();
        let mut reconciler = Reconciler::default();
        let entities = [agent(1, 0, 0, false), fire(3, 4), fire(5, 5)];
        reconciler.reconcile_pass(&mut scene, &entities).unwrap();
        let before = scene.stats();

        let report = reconciler.reconcile_pass(&mut scene, &entities).unwrap();
        assert_eq!(report.unchanged, 3);
        assert_eq!(scene.stats(), before);
    }

    #[test]
    fn test_exhaustion_is_surfaced() {
        let mut scene = HeadlessScene::new(1, 5.0);
        let mut reconciler = Reconciler::default();
        let err = reconciler
            .reconcile_pass(&mut scene, &[fire(0, 0), fire(0, 1)])
            .unwrap_err();
        assert_eq!(err, SyncError::Scene(SceneError::Exhausted { capacity: 1 }));
        assert_eq!(reconciler.len(), 1);
    }
}
