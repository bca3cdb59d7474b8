//! Snapshot ingestion
//!
//! Owns both object pools and applies one snapshot at a time: static layout
//! first, then the dynamic reconcile pass. A snapshot without a game state is
//! rejected before anything is touched.

use glam::Vec3;

use super::layout::{DoorState, EdgeChange, LayoutStore, WallState};
use super::mapper::GridMapper;
use super::reconcile::{DynamicEntity, PassReport, Reconciler};
use super::snapshot::{entries, keys, ApiResponse, Coords, EdgeRecord, Entry, EntityId, GameState};
use crate::error::{IngestError, SyncError};
use crate::scene::{Representation, Scene};
use crate::status::{status_text, StatusDisplay};

/// Per-namespace edge outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeTally {
    pub created: usize,
    pub replaced: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub malformed: usize,
}

impl EdgeTally {
    fn record(&mut self, change: EdgeChange) {
        match change {
            EdgeChange::Created => self.created += 1,
            EdgeChange::Replaced => self.replaced += 1,
            EdgeChange::Removed => self.removed += 1,
            EdgeChange::Unchanged => self.unchanged += 1,
        }
    }
}

/// Outcome of one successful ingest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub walls: EdgeTally,
    pub doors: EdgeTally,
    pub dynamic: PassReport,
    /// Dynamic records that could not be turned into entities at all
    pub malformed: usize,
}

/// Session-scoped owner of the static and dynamic pools
#[derive(Debug, Clone, Default)]
pub struct Ingestor {
    layout: LayoutStore,
    reconciler: Reconciler,
    mapper: GridMapper,
    wall_offset: Vec3,
    door_offset: Vec3,
}

impl Ingestor {
    pub fn new(mapper: GridMapper, wall_offset: Vec3, door_offset: Vec3) -> Self {
        Self {
            layout: LayoutStore::new(),
            reconciler: Reconciler::new(mapper),
            mapper,
            wall_offset,
            door_offset,
        }
    }

    pub fn layout(&self) -> &LayoutStore {
        &self.layout
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Apply one snapshot to both pools and forward stats
    pub fn ingest<S: Scene>(
        &mut self,
        scene: &mut S,
        status: &mut dyn StatusDisplay,
        response: &ApiResponse,
    ) -> Result<IngestReport, IngestError> {
        let state = response
            .game_state
            .as_ref()
            .ok_or(IngestError::MissingGameState)?;

        let mut report = IngestReport {
            walls: self.apply_edges(scene, state.walls.as_deref(), Namespace::Wall)?,
            doors: self.apply_edges(scene, state.doors.as_deref(), Namespace::Door)?,
            ..Default::default()
        };

        let (entities, malformed) = dynamic_entities(state);
        report.malformed = malformed;
        report.dynamic = self.reconciler.reconcile_pass(scene, &entities)?;

        if let Some(stats) = &state.game_stats {
            status.show(&status_text(stats));
            status.stats(stats);
        }

        log::debug!("Ingested snapshot: {:?}", report);
        Ok(report)
    }

    /// Run morphs queued by the last pass
    pub fn run_deferred<S: Scene>(&mut self, scene: &mut S) -> Result<usize, SyncError> {
        self.reconciler.run_deferred(scene)
    }

    /// Drop every object from both pools
    pub fn clear<S: Scene>(&mut self, scene: &mut S) {
        self.layout.clear(scene);
        self.reconciler.clear(scene);
    }

    fn apply_edges<S: Scene>(
        &mut self,
        scene: &mut S,
        records: Option<&[Entry<EdgeRecord>]>,
        namespace: Namespace,
    ) -> Result<EdgeTally, SyncError> {
        let mut tally = EdgeTally::default();

        // Layout is republished in full every snapshot; a missing list is a data error
        let Some(records) = records else {
            log::warn!("Snapshot has no {} list, keeping current layout", namespace.label());
            return Ok(tally);
        };

        for record in records {
            let Entry::Valid(record) = record else {
                log::warn!("Skipping malformed {} record", namespace.label());
                tally.malformed += 1;
                continue;
            };
            let Some(edge) = record.edge() else {
                log::warn!("Skipping {} with invalid position {:?}", namespace.label(), record.pos);
                tally.malformed += 1;
                continue;
            };

            let (prefix, desired, offset) = match namespace {
                Namespace::Wall => (
                    keys::WALL,
                    WallState::parse_or_intact(record.state.as_str()).representation(),
                    self.wall_offset,
                ),
                Namespace::Door => (
                    keys::DOOR,
                    DoorState::parse_or_closed(record.state.as_str()).representation(),
                    self.door_offset,
                ),
            };
            let key = keys::edge(prefix, &edge);
            let change = self
                .layout
                .upsert_edge(scene, &self.mapper, &key, &edge, desired, offset)?;
            tally.record(change);
        }

        Ok(tally)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Namespace {
    Wall,
    Door,
}

impl Namespace {
    fn label(&self) -> &'static str {
        match self {
            Namespace::Wall => "walls",
            Namespace::Door => "doors",
        }
    }
}

/// Flatten agents, fire, smoke and POIs into reconciler input, in that order.
/// Returns the entities and the number of records dropped entirely.
pub fn dynamic_entities(state: &GameState) -> (Vec<DynamicEntity>, usize) {
    let mut out = Vec::new();
    let mut malformed = 0;

    for entry in entries(&state.agents) {
        match entry {
            Entry::Valid(agent) => {
                let kind = if agent.carrying_victim {
                    Representation::AgentCarrying
                } else {
                    Representation::Agent
                };
                out.push(DynamicEntity::new(keys::agent(&agent.id), kind, agent.pos.cell()));
            }
            Entry::Malformed(raw) => match EntityId::from_raw(raw) {
                // Unusable record for a known agent: keep whatever is on screen
                Some(id) => {
                    out.push(DynamicEntity::new(keys::agent(&id), Representation::Agent, None))
                }
                None => {
                    log::warn!("Skipping malformed agent record {}", raw);
                    malformed += 1;
                }
            },
        }
    }

    malformed += push_cells(&mut out, entries(&state.fires), keys::FIRE, Representation::Fire);
    malformed += push_cells(&mut out, entries(&state.smoke), keys::SMOKE, Representation::Smoke);

    for entry in entries(&state.pois) {
        match entry {
            Entry::Valid(poi) => {
                let key = keys::poi(&poi.id);
                out.push(DynamicEntity::new(key, Representation::Poi, poi.pos.cell()));
            }
            Entry::Malformed(raw) => match EntityId::from_raw(raw) {
                Some(id) => out.push(DynamicEntity::new(keys::poi(&id), Representation::Poi, None)),
                None => {
                    log::warn!("Skipping malformed POI record {}", raw);
                    malformed += 1;
                }
            },
        }
    }

    (out, malformed)
}

fn push_cells(
    out: &mut Vec<DynamicEntity>,
    cells: &[Entry<Coords>],
    prefix: &str,
    kind: Representation,
) -> usize {
    let mut malformed = 0;
    for entry in cells {
        match entry {
            Entry::Valid(coords) => match coords.cell() {
                Some(cell) => {
                    out.push(DynamicEntity::new(keys::cell(prefix, cell), kind, Some(cell)))
                }
                None => {
                    log::warn!(
                        "Skipping {} cell with invalid position {:?}",
                        kind,
                        coords.as_slice()
                    );
                    malformed += 1;
                }
            },
            Entry::Malformed(raw) => {
                log::warn!("Skipping malformed {} cell {}", kind, raw);
                malformed += 1;
            }
        }
    }
    malformed
}
