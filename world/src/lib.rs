#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Path Defence.
//!
//! The world owns every enemy, tower and projectile together with the gold
//! and lives ledger. It only changes through [`apply`], which executes one
//! [`Command`] and appends the resulting [`Event`] values. Read access goes
//! through the [`query`] module.

mod enemies;
mod ledger;
pub mod path;
mod projectiles;
mod towers;

use std::collections::BTreeSet;

use path_defence_core::{
    CellCoord, Command, ConfigError, EnemyId, EnemyKind, Event, GameConfig, PlacementError,
    PlayState, TowerId, TowerKind, UpgradeError,
};
use slotmap::SlotMap;
use tracing::{debug, info, trace};

use crate::{enemies::Enemy, ledger::Ledger, path::PathTracker, towers::TowerRegistry};

/// Represents the authoritative Path Defence world state.
#[derive(Debug)]
pub struct World {
    config: GameConfig,
    path: PathTracker,
    path_cells: BTreeSet<CellCoord>,
    play_state: PlayState,
    enemies: SlotMap<EnemyId, Enemy>,
    towers: TowerRegistry,
    ledger: Ledger,
    tick_index: u64,
}

impl World {
    /// Creates a new world for the provided configuration.
    ///
    /// The world starts in [`PlayState::Menu`] with the starting economy.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            path: PathTracker::from_level(&config.level),
            path_cells: config.level.path_cells(),
            play_state: PlayState::Menu,
            enemies: SlotMap::with_key(),
            towers: TowerRegistry::new(),
            ledger: Ledger::new(&config.rules),
            tick_index: 0,
            config,
        })
    }

    fn set_play_state(&mut self, state: PlayState, out_events: &mut Vec<Event>) {
        if self.play_state == state {
            return;
        }
        info!(from = ?self.play_state, to = ?state, "play state changed");
        self.play_state = state;
        out_events.push(Event::PlayStateChanged { state });
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        self.enemies.clear();
        self.towers.clear();
        self.ledger = Ledger::new(&self.config.rules);
        self.tick_index = 0;
        out_events.push(Event::SessionReset);
        out_events.push(Event::GoldChanged {
            gold: self.ledger.gold(),
        });
        out_events.push(Event::LivesChanged {
            lives: self.ledger.lives(),
        });
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, out_events: &mut Vec<Event>) {
        if self.play_state != PlayState::Playing {
            debug!(?kind, "spawn ignored outside of play");
            return;
        }
        let Some(spec) = self.config.catalog.enemy(kind) else {
            debug!(?kind, "spawn ignored for enemy missing from the catalog");
            return;
        };

        let enemy = Enemy::spawn(
            spec,
            self.path.start(),
            self.config.catalog.combat.berserker_threshold,
        );
        let id = self.enemies.insert(enemy);
        out_events.push(Event::EnemySpawned { enemy: id, kind });
    }

    fn place_tower(
        &mut self,
        kind: TowerKind,
        cell: CellCoord,
    ) -> Result<(TowerId, u32), PlacementError> {
        if self.play_state != PlayState::Playing {
            return Err(PlacementError::InvalidState);
        }
        let spec = self
            .config
            .catalog
            .tower(kind)
            .ok_or(PlacementError::UnknownKind)?;
        if !self.config.level.contains(cell) {
            return Err(PlacementError::OutOfBounds);
        }
        if self.path_cells.contains(&cell) {
            return Err(PlacementError::Unbuildable);
        }
        if self.towers.is_occupied(cell) {
            return Err(PlacementError::Occupied);
        }

        let cost = spec.cost;
        self.ledger
            .spend(cost)
            .map_err(|available| PlacementError::InsufficientGold { cost, available })?;

        let center = self.config.level.cell_center(cell);
        Ok((self.towers.insert(spec, cell, center), cost))
    }

    fn upgrade_tower(&mut self, cell: CellCoord) -> Result<(TowerId, u8, u32), UpgradeError> {
        if self.play_state != PlayState::Playing {
            return Err(UpgradeError::InvalidState);
        }
        let tower = self.towers.at_mut(cell).ok_or(UpgradeError::MissingTower)?;
        let level = tower.level();
        let scaling = &self.config.catalog.upgrades;
        if level >= scaling.max_level() {
            return Err(UpgradeError::MaxLevel { level });
        }
        let cost = self
            .config
            .catalog
            .tower(tower.kind())
            .and_then(|spec| spec.upgrade_cost(level))
            .ok_or(UpgradeError::MaxLevel { level })?;

        self.ledger
            .spend(cost)
            .map_err(|available| UpgradeError::InsufficientGold { cost, available })?;

        let _ = tower.upgrade(scaling);
        Ok((tower.id(), tower.level(), cost))
    }

    fn fire_projectile(
        &mut self,
        tower_id: TowerId,
        target: EnemyId,
        out_events: &mut Vec<Event>,
    ) {
        if self.play_state != PlayState::Playing {
            return;
        }
        let Some(aim) = self
            .enemies
            .get(target)
            .filter(|enemy| enemy.is_alive())
            .map(Enemy::position)
        else {
            debug!(tower = tower_id.get(), "fire ignored for missing target");
            return;
        };
        let Some(tower) = self.towers.get_mut(tower_id) else {
            debug!(tower = tower_id.get(), "fire ignored for missing tower");
            return;
        };
        if !tower.is_ready() {
            debug!(tower = tower_id.get(), "fire ignored while cooling down");
            return;
        }

        tower.fire(target, aim);
        trace!(tower = tower_id.get(), kind = ?tower.kind(), "projectile launched");
        out_events.push(Event::ProjectileFired {
            tower: tower_id,
            target,
        });
    }

    fn tick(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);

        for tower in self.towers.iter_mut() {
            tower.advance_cooldown(dt);
        }

        let mut escaped: Vec<(EnemyId, EnemyKind)> = Vec::new();
        for (id, enemy) in self.enemies.iter_mut() {
            if enemy.tick(dt, &self.path) {
                escaped.push((id, enemy.kind()));
            }
        }
        if !escaped.is_empty() {
            for (id, kind) in &escaped {
                let _ = self.enemies.remove(*id);
                out_events.push(Event::EnemyEscaped {
                    enemy: *id,
                    kind: *kind,
                });
            }
            self.ledger.lose_lives(escaped.len());
            out_events.push(Event::LivesChanged {
                lives: self.ledger.lives(),
            });
            if self.ledger.is_depleted() {
                info!(
                    lives = self.ledger.lives(),
                    tick = self.tick_index,
                    "lives exhausted"
                );
                self.set_play_state(PlayState::GameOver, out_events);
                return;
            }
        }

        let world_size = self.config.level.world_size();
        let tuning = self.config.catalog.combat;
        for tower in self.towers.iter_mut() {
            for projectile in &mut tower.projectiles {
                projectile.advance(dt, &mut self.enemies, world_size, &tuning);
            }
            tower.projectiles.retain(|projectile| projectile.is_alive());
        }

        let killed: Vec<EnemyId> = self
            .enemies
            .iter()
            .filter(|(_, enemy)| !enemy.is_alive())
            .map(|(id, _)| id)
            .collect();
        if killed.is_empty() {
            return;
        }
        for id in killed {
            if let Some(enemy) = self.enemies.remove(id) {
                self.ledger.earn(enemy.reward());
                out_events.push(Event::EnemyKilled {
                    enemy: id,
                    kind: enemy.kind(),
                    reward: enemy.reward(),
                });
            }
        }
        out_events.push(Event::GoldChanged {
            gold: self.ledger.gold(),
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetPlayState { state } => world.set_play_state(state, out_events),
        Command::ResetSession => world.reset(out_events),
        Command::Tick { dt } => {
            if world.play_state != PlayState::Playing {
                return;
            }
            out_events.push(Event::TimeAdvanced { dt });
            world.tick(dt.as_secs_f32(), out_events);
        }
        Command::SpawnEnemy { kind } => world.spawn_enemy(kind, out_events),
        Command::PlaceTower { kind, cell } => match world.place_tower(kind, cell) {
            Ok((tower, cost)) => {
                out_events.push(Event::TowerPlaced {
                    tower,
                    kind,
                    cell,
                    cost,
                });
                out_events.push(Event::GoldChanged {
                    gold: world.ledger.gold(),
                });
            }
            Err(reason) => {
                debug!(?kind, ?cell, %reason, "tower placement rejected");
                out_events.push(Event::TowerPlacementRejected { kind, cell, reason });
            }
        },
        Command::UpgradeTower { cell } => match world.upgrade_tower(cell) {
            Ok((tower, level, cost)) => {
                out_events.push(Event::TowerUpgraded { tower, level, cost });
                out_events.push(Event::GoldChanged {
                    gold: world.ledger.gold(),
                });
            }
            Err(reason) => {
                debug!(?cell, %reason, "tower upgrade rejected");
                out_events.push(Event::TowerUpgradeRejected { cell, reason });
            }
        },
        Command::FireProjectile { tower, target } => {
            world.fire_projectile(tower, target, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use path_defence_core::{
        Catalog, CellCoord, EnemyView, GameConfig, LevelLayout, PlayState, ProjectileSnapshot,
        SessionRules, TowerSnapshot, TowerView,
    };

    use super::{PathTracker, World};

    /// Reports the current play state.
    #[must_use]
    pub fn play_state(world: &World) -> PlayState {
        world.play_state
    }

    /// Reports the current gold balance.
    #[must_use]
    pub fn gold(world: &World) -> u32 {
        world.ledger.gold()
    }

    /// Reports the remaining lives.
    #[must_use]
    pub fn lives(world: &World) -> i32 {
        world.ledger.lives()
    }

    /// Number of ticks simulated since the last reset.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Number of enemies currently on the path.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Captures a read-only view of the enemies on the path.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .map(|(id, enemy)| enemy.snapshot(id))
                .collect(),
        )
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Retrieves the tower standing on the cell, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: CellCoord) -> Option<TowerSnapshot> {
        world.towers.at(cell).map(|tower| tower.snapshot())
    }

    /// Captures every in-flight projectile, grouped by owning tower.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .towers
            .iter()
            .flat_map(|tower| {
                tower.projectiles.iter().map(|projectile| ProjectileSnapshot {
                    tower: tower.id(),
                    position: projectile.position(),
                    visual: projectile.visual(),
                })
            })
            .collect()
    }

    /// Reports whether a tower could stand on the cell ignoring gold.
    #[must_use]
    pub fn is_buildable(world: &World, cell: CellCoord) -> bool {
        world.config.level.contains(cell)
            && !world.path_cells.contains(&cell)
            && !world.towers.is_occupied(cell)
    }

    /// Provides the path walked by enemies.
    #[must_use]
    pub fn path(world: &World) -> &PathTracker {
        &world.path
    }

    /// Provides the configuration the world was built from.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Provides the active level.
    #[must_use]
    pub fn level(world: &World) -> &LevelLayout {
        &world.config.level
    }

    /// Provides the tower and enemy tables.
    #[must_use]
    pub fn catalog(world: &World) -> &Catalog {
        &world.config.catalog
    }

    /// Provides the session rules.
    #[must_use]
    pub fn rules(world: &World) -> &SessionRules {
        &world.config.rules
    }
}
