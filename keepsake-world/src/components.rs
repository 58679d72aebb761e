//! Sample game components with persisted fields.
//!
//! Between them these cover every value kind the codec supports, plus the
//! lifecycle hook and per-field auto flags.

use keepsake_core::{persist_enum, persist_field, persist_object, Field, InstanceId, Persistent};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

/// Game difficulty, persisted by variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    /// Forgiving.
    Easy,
    /// The default.
    #[default]
    Normal,
    /// Unforgiving.
    Hard,
}
persist_enum!(Difficulty { Easy, Normal, Hard });

/// World position, persisted as a JSON object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// East-west.
    pub x: f32,
    /// North-south.
    pub y: f32,
    /// Height.
    pub z: f32,
}
persist_object!(Position);

// ---------------------------------------------------------------------------
// PlayerProgress
// ---------------------------------------------------------------------------

/// Score, position and unlocks of one player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProgress {
    /// Instance id assigned by the world.
    pub id: InstanceId,
    /// Total score.
    pub score: i64,
    /// Chosen difficulty.
    pub difficulty: Difficulty,
    /// Last known position.
    pub position: Position,
    /// Item names in pickup order.
    pub inventory: Vec<String>,
    /// Which of the four chapters are unlocked.
    pub unlocked: [bool; 4],
    /// How many times the fields were restored. Not persisted.
    pub restores: u32,
}

impl PlayerProgress {
    /// Fresh progress for a new game.
    #[must_use]
    pub fn new(id: InstanceId) -> Self {
        Self {
            id,
            score: 0,
            difficulty: Difficulty::default(),
            position: Position::default(),
            inventory: Vec::new(),
            unlocked: [true, false, false, false],
            restores: 0,
        }
    }
}

impl Persistent for PlayerProgress {
    const TYPE_NAME: &'static str = "PlayerProgress";

    fn instance_id(&self) -> InstanceId {
        self.id
    }

    fn persisted_fields() -> Vec<Field<Self>> {
        vec![
            persist_field!("Score" => score),
            persist_field!("Difficulty" => difficulty),
            persist_field!("Position" => position),
            persist_field!("Inventory" => inventory),
            persist_field!("Unlocked" => unlocked),
        ]
    }

    fn on_restored(&mut self) {
        self.restores += 1;
    }
}

// ---------------------------------------------------------------------------
// AudioSettings
// ---------------------------------------------------------------------------

/// Volume settings. The hook clamps a restored volume into `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSettings {
    /// Instance id assigned by the world.
    pub id: InstanceId,
    /// Master volume.
    pub volume: f32,
    /// Muted for this session only; saved explicitly, never on exit.
    pub muted: bool,
}

impl AudioSettings {
    /// Full volume, not muted.
    #[must_use]
    pub fn new(id: InstanceId) -> Self {
        Self {
            id,
            volume: 1.0,
            muted: false,
        }
    }
}

impl Persistent for AudioSettings {
    const TYPE_NAME: &'static str = "AudioSettings";

    fn instance_id(&self) -> InstanceId {
        self.id
    }

    fn persisted_fields() -> Vec<Field<Self>> {
        vec![
            persist_field!("Volume" => volume),
            persist_field!("Muted" => muted).auto_save_on_exit(false),
        ]
    }

    fn on_restored(&mut self) {
        self.volume = self.volume.clamp(0.0, 1.0);
    }
}

// ---------------------------------------------------------------------------
// Checkpoint
// ---------------------------------------------------------------------------

/// Last checkpoint reached. Restored only on request, never on reload.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    /// Instance id assigned by the world.
    pub id: InstanceId,
    /// Checkpoint name.
    pub name: String,
    /// Seconds of play time when it was reached.
    pub play_time: f64,
}

impl Checkpoint {
    /// The starting checkpoint.
    #[must_use]
    pub fn new(id: InstanceId) -> Self {
        Self {
            id,
            name: "start".to_string(),
            play_time: 0.0,
        }
    }
}

impl Persistent for Checkpoint {
    const TYPE_NAME: &'static str = "Checkpoint";

    fn instance_id(&self) -> InstanceId {
        self.id
    }

    fn persisted_fields() -> Vec<Field<Self>> {
        vec![
            persist_field!("Name" => name).auto_load_on_ready(false),
            persist_field!("PlayTime" => play_time).auto_load_on_ready(false),
        ]
    }
}
