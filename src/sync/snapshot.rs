//! Snapshot wire contract
//!
//! Mirrors the JSON the simulation server returns from `/reset`, `/init` and the
//! step endpoints. Parsing is deliberately forgiving:
//! - every collection may be absent or `null` (treated as empty)
//! - each list entry parses on its own; a broken entry becomes [`Entry::Malformed`]
//! - IDs and wall states may be strings or integers
//! - unknown fields (`victims`, `signs`, ...) are ignored

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Top-level response envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub game_state: Option<GameState>,
}

/// Authoritative board state at one poll instant
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameState {
    #[serde(default)]
    pub agents: Option<Vec<Entry<AgentRecord>>>,
    #[serde(default)]
    pub pois: Option<Vec<Entry<PoiRecord>>>,
    #[serde(default)]
    pub fires: Option<Vec<Entry<Coords>>>,
    #[serde(default)]
    pub smoke: Option<Vec<Entry<Coords>>>,
    #[serde(default)]
    pub walls: Option<Vec<Entry<EdgeRecord>>>,
    #[serde(default)]
    pub doors: Option<Vec<Entry<EdgeRecord>>>,
    #[serde(default)]
    pub game_stats: Option<GameStats>,
}

/// One list element: either a well-formed record or the raw JSON that failed
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<T> {
    Valid(T),
    Malformed(Value),
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Entry<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match T::deserialize(&value) {
            Ok(record) => Entry::Valid(record),
            Err(_) => Entry::Malformed(value),
        })
    }
}

/// Borrow an optional collection as a slice (absent means empty)
pub fn entries<T>(list: &Option<Vec<Entry<T>>>) -> &[Entry<T>] {
    list.as_deref().unwrap_or(&[])
}

/// Entity ID as text, whether the server sent a string or a number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "ScalarText")]
pub struct EntityId(pub String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Try to recover an ID from a record that failed to parse
    pub fn from_raw(value: &Value) -> Option<Self> {
        ScalarText::deserialize(value.get("id")?).ok().map(Self::from)
    }
}

impl From<ScalarText> for EntityId {
    fn from(raw: ScalarText) -> Self {
        Self(raw.into_string())
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Representation state string (`"0"`, `"open"`, ...), normalised to text
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "ScalarText")]
pub struct StateText(pub String);

impl StateText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<ScalarText> for StateText {
    fn from(raw: ScalarText) -> Self {
        Self(raw.into_string())
    }
}

/// JSON scalar accepted where the server is loose about types
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScalarText {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl ScalarText {
    fn into_string(self) -> String {
        match self {
            ScalarText::Text(s) => s,
            ScalarText::Int(n) => n.to_string(),
            ScalarText::Bool(b) => b.to_string(),
        }
    }
}

/// Raw grid coordinate list. Anything that is not an array of integers
/// (including `null`) parses as an empty list and fails [`Coords::cell`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Coords(pub Vec<i64>);

impl<'de> Deserialize<'de> for Coords {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let coords = value
            .as_array()
            .and_then(|items| items.iter().map(Value::as_i64).collect::<Option<Vec<_>>>())
            .unwrap_or_default();
        Ok(Self(coords))
    }
}

impl Coords {
    /// Interpret as a grid cell; needs at least two components
    pub fn cell(&self) -> Option<GridCell> {
        GridCell::from_coords(&self.0)
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }
}

/// A board cell in (row, col) order, as the server reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub row: i64,
    pub col: i64,
}

impl GridCell {
    pub fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    pub fn from_coords(coords: &[i64]) -> Option<Self> {
        match coords {
            [row, col, ..] => Some(Self::new(*row, *col)),
            _ => None,
        }
    }
}

/// The boundary between two adjacent cells (where walls and doors sit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub a: GridCell,
    pub b: GridCell,
}

impl Edge {
    /// Only orthogonal neighbours share an edge
    pub fn is_adjacent(&self) -> bool {
        matches!(
            (self.a.row.abs_diff(self.b.row), self.a.col.abs_diff(self.b.col)),
            (0, 1) | (1, 0)
        )
    }
}

/// A firefighter
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentRecord {
    pub id: EntityId,
    #[serde(default)]
    pub pos: Coords,
    #[serde(default)]
    pub carrying_victim: bool,
    #[serde(default)]
    pub action_points: i64,
    #[serde(default)]
    pub saved_ap: i64,
    #[serde(default)]
    pub turn_completed: bool,
}

/// A point of interest (unrevealed victim or false alarm)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PoiRecord {
    pub id: EntityId,
    #[serde(default)]
    pub pos: Coords,
    #[serde(default)]
    pub is_revealed: bool,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// A wall or door occupying the edge between two cells
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EdgeRecord {
    #[serde(default)]
    pub pos: Vec<Coords>,
    #[serde(default)]
    pub state: StateText,
}

impl EdgeRecord {
    /// Both endpoints, if the record carries two well-formed neighbouring cells
    pub fn edge(&self) -> Option<Edge> {
        let edge = match self.pos.as_slice() {
            [a, b, ..] => Edge {
                a: a.cell()?,
                b: b.cell()?,
            },
            _ => return None,
        };
        edge.is_adjacent().then_some(edge)
    }
}

/// Aggregate game statistics
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameStats {
    pub victims_rescued: i64,
    pub victims_lost: i64,
    pub damage_cubes: f64,
    pub game_over: bool,
    pub game_won: bool,
    pub win_condition: i64,
    pub lose_victims: i64,
    pub max_damage: f64,
}

/// Identity keys correlating remote entities with local objects across polls
pub mod keys {
    use super::{Edge, EntityId, GridCell};

    pub const AGENT: &str = "agent_";
    pub const FIRE: &str = "fire_";
    pub const SMOKE: &str = "smoke_";
    pub const POI: &str = "poi_";
    pub const WALL: &str = "wall_";
    pub const DOOR: &str = "door_";

    pub fn agent(id: &EntityId) -> String {
        format!("{AGENT}{id}")
    }

    pub fn poi(id: &EntityId) -> String {
        format!("{POI}{id}")
    }

    /// Cell-keyed entities: the coordinates are the identity
    pub fn cell(prefix: &str, cell: GridCell) -> String {
        format!("{prefix}{}_{}", cell.row, cell.col)
    }

    pub fn edge(prefix: &str, edge: &Edge) -> String {
        format!(
            "{prefix}{}_{}_{}_{}",
            edge.a.row, edge.a.col, edge.b.row, edge.b.col
        )
    }
}
