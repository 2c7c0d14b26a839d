#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Path Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems read immutable snapshots such as
//! [`EnemyView`] and [`TowerView`] and respond exclusively with new command
//! batches.
//!
//! Static data (tower and enemy catalogs, levels, session rules) lives here as
//! plain configuration structs so that every consumer receives it explicitly
//! at construction time.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod catalog;
mod level;

pub use catalog::{
    Catalog, CombatTuning, DutyCycleSpec, EnemyKind, EnemySpec, FreezePayload, TowerKind,
    TowerSpec, TowerStats, UpgradeScaling, MAX_UPGRADE_LEVEL,
};
pub use level::{GameConfig, LevelLayout, SessionRules, SpawnGroup, WaveSpec};

slotmap::new_key_type! {
    /// Generation-checked handle referencing an enemy stored in the world arena.
    ///
    /// Handles stay unique after the enemy is removed, so a stale handle never
    /// resolves to an unrelated enemy that later reuses the slot.
    pub struct EnemyId;
}

/// Describes the lifecycle state of a play session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayState {
    /// Session has been configured but not started.
    Menu,
    /// Simulation advances on every tick.
    Playing,
    /// Simulation is frozen until resumed.
    Paused,
    /// Lives were exhausted.
    GameOver,
    /// Every wave was cleared.
    Victory,
}

impl PlayState {
    /// Reports whether the state only leaves through a restart.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Victory)
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests that the world transition to the provided play state.
    SetPlayState {
        /// State the world should activate.
        state: PlayState,
    },
    /// Clears enemies, towers and projectiles and restores the starting economy.
    ResetSession,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that an enemy of the provided kind enters at the path start.
    SpawnEnemy {
        /// Catalog entry describing the enemy.
        kind: EnemyKind,
    },
    /// Requests placement of a tower on the provided cell.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Grid cell that will host the tower.
        cell: CellCoord,
    },
    /// Requests that the tower occupying the cell gains one upgrade level.
    UpgradeTower {
        /// Grid cell hosting the tower.
        cell: CellCoord,
    },
    /// Requests that a tower launches a projectile toward an enemy.
    FireProjectile {
        /// Identifier of the tower that fires.
        tower: TowerId,
        /// Enemy the projectile is aimed at.
        target: EnemyId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the session entered a new play state.
    PlayStateChanged {
        /// State that became active.
        state: PlayState,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Handle allocated for the enemy.
        enemy: EnemyId,
        /// Catalog entry of the enemy.
        kind: EnemyKind,
    },
    /// Reports that an enemy's health dropped to zero.
    EnemyKilled {
        /// Handle of the removed enemy.
        enemy: EnemyId,
        /// Catalog entry of the enemy.
        kind: EnemyKind,
        /// Gold credited for the kill.
        reward: u32,
    },
    /// Reports that an enemy reached the end of the path.
    EnemyEscaped {
        /// Handle of the removed enemy.
        enemy: EnemyId,
        /// Catalog entry of the enemy.
        kind: EnemyKind,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Cell occupied by the tower.
        cell: CellCoord,
        /// Gold spent on the tower.
        cost: u32,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower that was requested.
        kind: TowerKind,
        /// Cell that was requested.
        cell: CellCoord,
        /// Reason the request failed.
        reason: PlacementError,
    },
    /// Confirms that a tower gained an upgrade level.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Upgrade level reached.
        level: u8,
        /// Gold spent on the upgrade.
        cost: u32,
    },
    /// Reports that an upgrade request was rejected.
    TowerUpgradeRejected {
        /// Cell named by the request.
        cell: CellCoord,
        /// Reason the request failed.
        reason: UpgradeError,
    },
    /// Confirms that a tower launched a projectile.
    ProjectileFired {
        /// Tower that fired.
        tower: TowerId,
        /// Enemy the projectile was aimed at.
        target: EnemyId,
    },
    /// Reports the gold balance after it changed.
    GoldChanged {
        /// Current gold balance.
        gold: u32,
    },
    /// Reports the remaining lives after they changed.
    LivesChanged {
        /// Current number of lives. May be negative after a multi-escape tick.
        lives: i32,
    },
    /// Confirms that the world was restored to its starting state.
    SessionReset,
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Handle of the enemy.
    pub id: EnemyId,
    /// Catalog entry of the enemy.
    pub kind: EnemyKind,
    /// Position of the enemy center in world units.
    pub position: Vec2,
    /// Current health.
    pub health: f32,
    /// Health at spawn time.
    pub max_health: f32,
    /// Collision radius in world units.
    pub size: f32,
    /// Normalised progress along the path.
    pub progress: f32,
    /// Indicates that only anti-air towers can target the enemy.
    pub flying: bool,
    /// Indicates that stealth is currently active.
    pub stealthed: bool,
    /// Indicates that phase is currently active.
    pub phased: bool,
    /// Indicates that a freeze effect is slowing the enemy.
    pub frozen: bool,
    /// Indicates that the berserker boost is active.
    pub enraged: bool,
}

/// Read-only snapshot describing all enemies on the path.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Cell occupied by the tower.
    pub cell: CellCoord,
    /// Center of the tower in world units.
    pub center: Vec2,
    /// Current upgrade level.
    pub upgrade_level: u8,
    /// Effective stats derived from the upgrade level.
    pub stats: TowerStats,
    /// Indicates that the firing cooldown has elapsed.
    pub ready: bool,
}

/// Read-only snapshot describing all towers placed on the map.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshots sorted by tower identifier.
    #[must_use]
    pub fn as_slice(&self) -> &[TowerSnapshot] {
        &self.snapshots
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Category used by renderers to pick a projectile sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectileVisual {
    /// Projectile passes through enemies.
    Piercing,
    /// Projectile steers toward its bound enemy.
    Homing,
    /// Projectile carries a freeze payload.
    Freeze,
    /// Any other projectile.
    Plain,
}

/// Immutable representation of an in-flight projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Tower that owns the projectile.
    pub tower: TowerId,
    /// Current position in world units.
    pub position: Vec2,
    /// Render category of the projectile.
    pub visual: ProjectileVisual,
}

/// Target assignment computed by the targeting system for a single tower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower that acquired the target.
    pub tower: TowerId,
    /// Enemy chosen as target.
    pub enemy: EnemyId,
    /// Distance between the tower center and the enemy center.
    pub distance: f32,
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum PlacementError {
    /// The session is not playing, so placement is disabled.
    #[error("towers can only be placed while the session is playing")]
    InvalidState,
    /// The tower kind has no catalog entry.
    #[error("tower kind is missing from the catalog")]
    UnknownKind,
    /// The requested cell lies outside the level grid.
    #[error("cell lies outside the level grid")]
    OutOfBounds,
    /// The requested cell is crossed by the enemy path.
    #[error("cell is part of the enemy path")]
    Unbuildable,
    /// The requested cell already hosts a tower.
    #[error("cell already hosts a tower")]
    Occupied,
    /// The player cannot afford the tower.
    #[error("tower costs {cost} gold but only {available} is available")]
    InsufficientGold {
        /// Price of the tower.
        cost: u32,
        /// Gold held when the request was evaluated.
        available: u32,
    },
}

/// Reasons a tower upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum UpgradeError {
    /// The session is not playing, so upgrades are disabled.
    #[error("towers can only be upgraded while the session is playing")]
    InvalidState,
    /// No tower occupies the requested cell.
    #[error("no tower occupies the cell")]
    MissingTower,
    /// The tower already reached the final upgrade level.
    #[error("tower is already at upgrade level {level}")]
    MaxLevel {
        /// Level the tower currently holds.
        level: u8,
    },
    /// The player cannot afford the upgrade.
    #[error("upgrade costs {cost} gold but only {available} is available")]
    InsufficientGold {
        /// Price of the upgrade.
        cost: u32,
        /// Gold held when the request was evaluated.
        available: u32,
    },
}

/// Reasons static configuration may be rejected before a session starts.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The catalog lacks a tower kind.
    #[error("catalog has no entry for tower `{}`", .0.name())]
    MissingTower(TowerKind),
    /// The catalog lists a tower kind twice.
    #[error("catalog lists tower `{}` more than once", .0.name())]
    DuplicateTower(TowerKind),
    /// The catalog lacks an enemy kind.
    #[error("catalog has no entry for enemy `{}`", .0.name())]
    MissingEnemy(EnemyKind),
    /// The catalog lists an enemy kind twice.
    #[error("catalog lists enemy `{}` more than once", .0.name())]
    DuplicateEnemy(EnemyKind),
    /// The upgrade multiplier tables are empty or differ in length.
    #[error("upgrade multiplier tables must be non-empty and share one length")]
    UpgradeTableShape,
    /// A tower's upgrade cost table does not cover every upgrade level.
    #[error("tower `{}` lists {actual} upgrade costs but {expected} levels exist", .kind.name())]
    UpgradeCostMismatch {
        /// Tower with the mismatching table.
        kind: TowerKind,
        /// Number of upgrade levels defined by the multiplier tables.
        expected: usize,
        /// Number of costs listed for the tower.
        actual: usize,
    },
    /// A tower fires at a non-positive rate.
    #[error("tower `{}` must fire at a positive rate", .0.name())]
    InvalidFireRate(TowerKind),
    /// A probability lies outside the unit interval.
    #[error("`{name}` must lie within [0, 1], got {value}")]
    InvalidProbability {
        /// Name of the tuning value.
        name: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// A session rule lies outside its usable range.
    #[error("session rule `{name}` has unusable value {value}")]
    InvalidRule {
        /// Name of the rule.
        name: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// The level path has no waypoints.
    #[error("level path needs at least one waypoint")]
    EmptyPath,
    /// A waypoint lies outside the level grid.
    #[error("waypoint ({}, {}) lies outside the level grid", .0.column(), .0.row())]
    WaypointOutOfBounds(CellCoord),
    /// The level grid has no area.
    #[error("level grid must have positive dimensions and cell size")]
    InvalidGrid,
    /// The level has no waves.
    #[error("level defines no waves")]
    NoWaves,
    /// A wave spawns with a negative delay or spawns nothing.
    #[error("wave {index} must spawn at least one enemy with a non-negative delay")]
    InvalidWave {
        /// Zero-based index of the wave.
        index: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_game_over_and_victory() {
        assert!(PlayState::GameOver.is_terminal());
        assert!(PlayState::Victory.is_terminal());
        assert!(!PlayState::Playing.is_terminal());
        assert!(!PlayState::Paused.is_terminal());
        assert!(!PlayState::Menu.is_terminal());
    }

    #[test]
    fn tower_view_sorts_snapshots_by_identifier() {
        let view = TowerView::from_snapshots(vec![tower(4), tower(1), tower(2)]);
        let ids: Vec<u32> = view.iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 4]);
    }

    #[test]
    fn errors_render_human_readable_messages() {
        let error = PlacementError::InsufficientGold {
            cost: 90,
            available: 80,
        };
        assert_eq!(
            error.to_string(),
            "tower costs 90 gold but only 80 is available"
        );

        let config = ConfigError::MissingEnemy(EnemyKind::Phantom);
        assert_eq!(config.to_string(), "catalog has no entry for enemy `phantom`");
    }

    fn tower(id: u32) -> TowerSnapshot {
        let catalog = Catalog::standard();
        let stats = catalog
            .tower(TowerKind::Cannon)
            .expect("standard catalog lists cannon")
            .stats;
        TowerSnapshot {
            id: TowerId::new(id),
            kind: TowerKind::Cannon,
            cell: CellCoord::new(id, 0),
            center: Vec2::ZERO,
            upgrade_level: 0,
            stats,
            ready: false,
        }
    }
}
