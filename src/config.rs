//! Level configuration
//!
//! A level is described by data: its variant, row count, carving order, how many
//! hazards or collectibles it places, and which textures to request. The table of
//! registered levels can be built in or loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::error::{MazeError, Result};
use crate::maze::{CarveStrategy, WallStyle};

/// Level variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LevelKind {
    /// Grid-snapped maze, finish at the end hole
    #[default]
    Standard,
    /// Free movement between thin walls
    OpenArea,
    /// Open area with hazards that send the ball back to the start
    AvoidHazards,
    /// Open area where every item must be gathered before the end counts
    CollectItems,
}

impl LevelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelKind::Standard => "Standard",
            LevelKind::OpenArea => "OpenArea",
            LevelKind::AvoidHazards => "AvoidHazards",
            LevelKind::CollectItems => "CollectItems",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Some(LevelKind::Standard),
            "openarea" | "open" => Some(LevelKind::OpenArea),
            "avoidhazards" | "avoid" => Some(LevelKind::AvoidHazards),
            "collectitems" | "collect" => Some(LevelKind::CollectItems),
            _ => None,
        }
    }

    /// Wall layout the variant draws with
    pub fn wall_style(&self) -> WallStyle {
        match self {
            LevelKind::Standard => WallStyle::StandardWalls,
            _ => WallStyle::OpenAreaWalls,
        }
    }

    /// Whether the variant places hazards or collectibles
    pub fn uses_objects(&self) -> bool {
        matches!(self, LevelKind::AvoidHazards | LevelKind::CollectItems)
    }
}

/// Texture identifiers requested from the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTextures {
    pub floor: String,
    pub wall: String,
    pub ball: String,
    pub hole: String,
    /// Hazard or collectible texture (unused by variants without objects)
    #[serde(default)]
    pub object: String,
}

impl Default for LevelTextures {
    fn default() -> Self {
        Self {
            floor: "floor_wood".to_string(),
            wall: "wall_stone".to_string(),
            ball: "ball_steel".to_string(),
            hole: "hole_dark".to_string(),
            object: "object_gem".to_string(),
        }
    }
}

/// One registered level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    pub kind: LevelKind,
    /// Row count; columns follow from the maze aspect ratio
    pub rows: usize,
    #[serde(default)]
    pub strategy: CarveStrategy,
    /// Hazards or collectibles to place
    #[serde(default)]
    pub object_count: usize,
    #[serde(default)]
    pub textures: LevelTextures,
}

impl LevelConfig {
    pub fn new(name: &str, kind: LevelKind, rows: usize) -> Self {
        Self {
            name: name.to_string(),
            kind,
            rows,
            strategy: CarveStrategy::DepthFirst,
            object_count: 0,
            textures: LevelTextures::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: CarveStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_objects(mut self, count: usize) -> Self {
        self.object_count = count;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows < 2 {
            return Err(MazeError::invalid_config(format!(
                "level '{}' needs at least 2 rows, has {}",
                self.name, self.rows
            )));
        }
        if self.kind.uses_objects() && self.object_count == 0 {
            return Err(MazeError::invalid_config(format!(
                "{} level '{}' needs at least one object",
                self.kind.as_str(),
                self.name
            )));
        }
        if !self.kind.uses_objects() && self.object_count != 0 {
            return Err(MazeError::invalid_config(format!(
                "{} level '{}' does not place objects",
                self.kind.as_str(),
                self.name
            )));
        }
        Ok(())
    }
}

/// The registered levels, in play order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTable {
    pub levels: Vec<LevelConfig>,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            levels: vec![
                LevelConfig::new("First Steps", LevelKind::Standard, 8),
                LevelConfig::new("Wide Open", LevelKind::OpenArea, 10),
                LevelConfig::new("Branches", LevelKind::Standard, 12)
                    .with_strategy(CarveStrategy::BreadthFirst),
                LevelConfig::new("Minefield", LevelKind::AvoidHazards, 12).with_objects(4),
                LevelConfig::new("Gem Trail", LevelKind::CollectItems, 12).with_objects(3),
                LevelConfig::new("Labyrinth", LevelKind::Standard, 20),
            ],
        }
    }
}

impl LevelTable {
    /// Parse and validate a JSON table
    pub fn from_json(json: &str) -> Result<Self> {
        let table: LevelTable = serde_json::from_str(json)?;
        for level in &table.levels {
            level.validate()?;
        }
        log::info!("Loaded level table with {} levels", table.levels.len());
        Ok(table)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&LevelConfig> {
        self.levels.get(index).ok_or(MazeError::LevelIndexOutOfRange {
            index,
            len: self.levels.len(),
        })
    }
}
