//! Level layouts, wave lists and session rules.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{Catalog, CellCoord, ConfigError, EnemyKind};

/// Number of enemies of one kind spawned by a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnGroup {
    /// Enemy kind to spawn.
    pub kind: EnemyKind,
    /// Number of enemies of that kind.
    pub count: u32,
}

/// Enemies spawned by a single wave and the interval between spawns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveSpec {
    /// Seconds between consecutive spawns.
    pub delay: f32,
    /// Enemy counts keyed by kind.
    pub groups: Vec<SpawnGroup>,
}

impl WaveSpec {
    /// Creates a wave from `(kind, count)` pairs.
    #[must_use]
    pub fn new(delay: f32, groups: impl IntoIterator<Item = (EnemyKind, u32)>) -> Self {
        Self {
            delay,
            groups: groups
                .into_iter()
                .map(|(kind, count)| SpawnGroup { kind, count })
                .collect(),
        }
    }

    /// Total number of enemies spawned by the wave.
    #[must_use]
    pub fn total(&self) -> usize {
        self.groups
            .iter()
            .map(|group| usize::try_from(group.count).unwrap_or(usize::MAX))
            .fold(0, usize::saturating_add)
    }

    /// Flattens the groups into one entry per enemy, in group order.
    #[must_use]
    pub fn expand(&self) -> Vec<EnemyKind> {
        let mut queue = Vec::with_capacity(self.total());
        for group in &self.groups {
            for _ in 0..group.count {
                queue.push(group.kind);
            }
        }
        queue
    }
}

/// Static map description: grid, enemy path and wave list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelLayout {
    /// Display name of the level.
    pub name: String,
    /// Number of grid columns.
    pub columns: u32,
    /// Number of grid rows.
    pub rows: u32,
    /// Side length of a grid cell in world units.
    pub cell_size: f32,
    /// Grid cells the enemy path visits, in walking order.
    pub waypoints: Vec<CellCoord>,
    /// Waves in the order they are played.
    pub waves: Vec<WaveSpec>,
}

impl LevelLayout {
    /// S-shaped path through a forest with the classic ten waves.
    #[must_use]
    pub fn forest_path() -> Self {
        let waypoints = [
            (0, 7),
            (1, 7),
            (2, 7),
            (3, 7),
            (4, 7),
            (5, 7),
            (6, 7),
            (7, 6),
            (8, 5),
            (9, 4),
            (10, 3),
            (11, 3),
            (12, 3),
            (13, 3),
            (14, 3),
            (15, 4),
            (16, 5),
            (17, 6),
            (18, 7),
            (19, 8),
            (19, 9),
            (18, 10),
            (17, 11),
            (16, 12),
            (15, 12),
            (14, 12),
            (13, 12),
            (12, 12),
            (11, 11),
            (10, 10),
            (9, 9),
            (8, 8),
            (7, 8),
            (6, 8),
            (5, 8),
            (4, 8),
            (3, 8),
            (2, 8),
            (1, 8),
            (0, 8),
        ];

        use EnemyKind::{Basic, Fast, Flying, Heavy};
        let waves = vec![
            WaveSpec::new(1.0, [(Basic, 10)]),
            WaveSpec::new(0.8, [(Basic, 15)]),
            WaveSpec::new(0.6, [(Basic, 20)]),
            WaveSpec::new(0.8, [(Basic, 15), (Fast, 5)]),
            WaveSpec::new(0.6, [(Basic, 20), (Fast, 8)]),
            WaveSpec::new(0.5, [(Basic, 25), (Fast, 10), (Heavy, 2)]),
            WaveSpec::new(0.4, [(Basic, 20), (Fast, 15), (Heavy, 5)]),
            WaveSpec::new(0.3, [(Basic, 25), (Fast, 20), (Heavy, 8), (Flying, 3)]),
            WaveSpec::new(0.3, [(Basic, 30), (Fast, 25), (Heavy, 12), (Flying, 8)]),
            WaveSpec::new(0.2, [(Basic, 40), (Fast, 30), (Heavy, 15), (Flying, 15)]),
        ];

        Self::from_corners("Forest Path", &waypoints, waves)
    }

    /// Switchback path down a mountain with armored and hidden enemies.
    #[must_use]
    pub fn mountain_pass() -> Self {
        use EnemyKind::*;
        let waves = vec![
            WaveSpec::new(0.9, [(Basic, 12)]),
            WaveSpec::new(0.8, [(Basic, 12), (Fast, 6)]),
            WaveSpec::new(0.8, [(Basic, 10), (Armored, 4)]),
            WaveSpec::new(0.5, [(Fast, 10), (Flying, 4), (Swarm, 10)]),
            WaveSpec::new(0.6, [(Regenerator, 6), (Armored, 6), (Basic, 12)]),
            WaveSpec::new(0.6, [(Shadow, 6), (Fast, 12)]),
            WaveSpec::new(0.5, [(Berserker, 6), (Heavy, 6), (Flying, 6)]),
            WaveSpec::new(0.4, [(Phantom, 6), (Elite, 3), (Swarm, 20)]),
            WaveSpec::new(0.4, [(Elite, 6), (Shadow, 8), (Berserker, 8), (Flying, 8)]),
            WaveSpec::new(0.35, [(Titan, 2), (Elite, 6), (Phantom, 8), (Fast, 20)]),
        ];

        Self::from_corners(
            "Mountain Pass",
            &[(0, 2), (15, 2), (15, 6), (3, 6), (3, 11), (19, 11)],
            waves,
        )
    }

    /// Long winding canyon that ends with a boss wave.
    #[must_use]
    pub fn desert_canyon() -> Self {
        use EnemyKind::*;
        let waves = vec![
            WaveSpec::new(0.4, [(Swarm, 20)]),
            WaveSpec::new(0.6, [(Basic, 15), (Fast, 8)]),
            WaveSpec::new(0.9, [(Heavy, 6), (Armored, 4)]),
            WaveSpec::new(0.5, [(Flying, 8), (Fast, 10)]),
            WaveSpec::new(0.6, [(Regenerator, 8), (Shadow, 4)]),
            WaveSpec::new(0.4, [(Berserker, 8), (Phantom, 4), (Swarm, 20)]),
            WaveSpec::new(0.5, [(Elite, 5), (Armored, 8), (Flying, 8)]),
            WaveSpec::new(0.4, [(Shadow, 10), (Phantom, 8), (Fast, 15)]),
            WaveSpec::new(0.5, [(Titan, 3), (Heavy, 10), (Regenerator, 8)]),
            WaveSpec::new(0.35, [(Elite, 8), (Berserker, 10), (Flying, 12)]),
            WaveSpec::new(0.3, [(Titan, 4), (Phantom, 10), (Shadow, 10), (Swarm, 30)]),
            WaveSpec::new(0.6, [(Boss, 1), (Elite, 6), (Titan, 3)]),
        ];

        Self::from_corners(
            "Desert Canyon",
            &[
                (0, 13),
                (4, 13),
                (4, 2),
                (9, 2),
                (9, 12),
                (14, 12),
                (14, 3),
                (19, 3),
            ],
            waves,
        )
    }

    /// Returns the built-in level with the provided one-based number.
    #[must_use]
    pub fn by_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(Self::forest_path()),
            2 => Some(Self::mountain_pass()),
            3 => Some(Self::desert_canyon()),
            _ => None,
        }
    }

    fn from_corners(name: &str, corners: &[(u32, u32)], waves: Vec<WaveSpec>) -> Self {
        Self {
            name: name.to_owned(),
            columns: 20,
            rows: 15,
            cell_size: 40.0,
            waypoints: corners
                .iter()
                .map(|&(column, row)| CellCoord::new(column, row))
                .collect(),
            waves,
        }
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Center of the cell in world units.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        let half = self.cell_size / 2.0;
        Vec2::new(
            cell.column() as f32 * self.cell_size + half,
            cell.row() as f32 * self.cell_size + half,
        )
    }

    /// Dimensions of the playable area in world units.
    #[must_use]
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.columns as f32 * self.cell_size,
            self.rows as f32 * self.cell_size,
        )
    }

    /// Every cell the path crosses, including cells between waypoints.
    #[must_use]
    pub fn path_cells(&self) -> BTreeSet<CellCoord> {
        let mut cells = BTreeSet::new();
        if let Some(first) = self.waypoints.first() {
            let _ = cells.insert(*first);
        }

        for pair in self.waypoints.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let dx = f64::from(end.column()) - f64::from(start.column());
            let dy = f64::from(end.row()) - f64::from(start.row());
            let steps = dx.abs().max(dy.abs());
            if steps == 0.0 {
                continue;
            }

            let mut step = 0.0;
            while step <= steps {
                let column = (f64::from(start.column()) + dx * step / steps).round();
                let row = (f64::from(start.row()) + dy * step / steps).round();
                let _ = cells.insert(CellCoord::new(column as u32, row as u32));
                step += 1.0;
            }
        }

        cells
    }

    /// Checks the grid, the path and the wave list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0
            || self.rows == 0
            || !self.cell_size.is_finite()
            || self.cell_size <= 0.0
        {
            return Err(ConfigError::InvalidGrid);
        }
        if self.waypoints.is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        if let Some(outside) = self.waypoints.iter().find(|cell| !self.contains(**cell)) {
            return Err(ConfigError::WaypointOutOfBounds(*outside));
        }
        if self.waves.is_empty() {
            return Err(ConfigError::NoWaves);
        }
        for (index, wave) in self.waves.iter().enumerate() {
            if wave.total() == 0 || wave.delay.is_nan() || wave.delay < 0.0 {
                return Err(ConfigError::InvalidWave { index });
            }
        }
        Ok(())
    }
}

impl Default for LevelLayout {
    fn default() -> Self {
        Self::forest_path()
    }
}

/// Economy and pacing parameters of a play session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRules {
    /// Gold available when the session starts.
    pub starting_gold: u32,
    /// Lives available when the session starts.
    pub starting_lives: i32,
    /// Seconds before the first wave.
    pub first_wave_delay: f32,
    /// Seconds between a completed wave and the next one.
    pub inter_wave_delay: f32,
    /// Seconds a wave may run before the next one is released anyway.
    pub wave_force_after: f32,
    /// Longest simulated step in seconds; longer ticks are clamped.
    pub max_step: f32,
    /// Seed for spawn shuffling and stealth rolls.
    pub rng_seed: u64,
}

impl Default for SessionRules {
    fn default() -> Self {
        Self {
            starting_gold: 100,
            starting_lives: 20,
            first_wave_delay: 3.0,
            inter_wave_delay: 3.0,
            wave_force_after: 30.0,
            max_step: 0.1,
            rng_seed: 0x7d3f_a1c2_9b04_e615,
        }
    }
}

impl SessionRules {
    /// Checks that lives are positive and every timer is a usable duration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting_lives <= 0 {
            return Err(ConfigError::InvalidRule {
                name: "starting_lives",
                value: self.starting_lives as f32,
            });
        }
        check_seconds("first_wave_delay", self.first_wave_delay, true)?;
        check_seconds("inter_wave_delay", self.inter_wave_delay, true)?;
        check_seconds("wave_force_after", self.wave_force_after, false)?;
        check_seconds("max_step", self.max_step, false)
    }
}

fn check_seconds(name: &'static str, value: f32, allow_zero: bool) -> Result<(), ConfigError> {
    let in_range = if allow_zero {
        value >= 0.0
    } else {
        value > 0.0
    };
    if value.is_finite() && in_range {
        Ok(())
    } else {
        Err(ConfigError::InvalidRule { name, value })
    }
}

/// Complete static input of a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Economy and pacing.
    pub rules: SessionRules,
    /// Tower and enemy tables.
    pub catalog: Catalog,
    /// Map and waves.
    pub level: LevelLayout,
}

impl GameConfig {
    /// Creates a configuration playing the provided level with stock data.
    #[must_use]
    pub fn with_level(level: LevelLayout) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Validates the rules, the catalog and the level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.validate()?;
        self.catalog.validate()?;
        self.level.validate()
    }
}
