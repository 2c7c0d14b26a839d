#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session controller that drives the world and every system once per tick.
//!
//! A tick runs in a fixed order: wave pacing, the wave director, the world
//! (cooldowns, enemies, projectiles, rewards and escapes), targeting and
//! firing, and finally the wave completion and victory check.

mod schedule;

use std::time::Duration;

use path_defence_core::{
    CellCoord, Command, ConfigError, Event, GameConfig, LevelLayout, PlacementError, PlayState,
    TowerId, TowerKind, TowerTarget, UpgradeError,
};
use path_defence_system_tower_combat::TowerCombat;
use path_defence_system_tower_targeting::TowerTargeting;
use path_defence_system_wave_director::WaveDirector;
use path_defence_world::{self as world, query, World};
use thiserror::Error;
use tracing::{debug, info};

pub use schedule::{WaveProgress, WaveSchedule};

/// Failures raised while building or switching the session configuration.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SessionError {
    /// No built-in level carries the requested number.
    #[error("level {0} does not exist")]
    UnknownLevel(u32),
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Running totals of a session since the last restart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Enemies killed by towers.
    pub kills: u32,
    /// Enemies that reached the end of the path.
    pub escapes: u32,
    /// Gold earned from kills.
    pub gold_earned: u32,
    /// Waves released so far.
    pub waves_started: usize,
}

impl SessionReport {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::EnemyKilled { reward, .. } => {
                    self.kills = self.kills.saturating_add(1);
                    self.gold_earned = self.gold_earned.saturating_add(*reward);
                }
                Event::EnemyEscaped { .. } => self.escapes = self.escapes.saturating_add(1),
                _ => {}
            }
        }
    }
}

/// Owns the world together with the pacing, spawning and combat systems.
#[derive(Debug)]
pub struct Session {
    world: World,
    schedule: WaveSchedule,
    director: WaveDirector,
    targeting: TowerTargeting,
    combat: TowerCombat,
    report: SessionReport,
    events: Vec<Event>,
    commands: Vec<Command>,
    targets: Vec<TowerTarget>,
}

impl Session {
    /// Creates a session waiting in the menu for the provided configuration.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        let seed = config.rules.rng_seed;
        let schedule = WaveSchedule::new(config.level.waves.len(), &config.rules);
        let world = World::new(config)?;
        Ok(Self {
            world,
            schedule,
            director: WaveDirector::new(seed),
            targeting: TowerTargeting::new(seed),
            combat: TowerCombat::new(),
            report: SessionReport::default(),
            events: Vec::new(),
            commands: Vec::new(),
            targets: Vec::new(),
        })
    }

    /// Leaves the menu and starts playing. Returns `false` outside the menu.
    pub fn start(&mut self) -> bool {
        if query::play_state(&self.world) != PlayState::Menu {
            return false;
        }
        self.restart();
        true
    }

    /// Pauses a running session.
    pub fn pause(&mut self) -> bool {
        self.transition(PlayState::Playing, PlayState::Paused)
    }

    /// Resumes a paused session.
    pub fn resume(&mut self) -> bool {
        self.transition(PlayState::Paused, PlayState::Playing)
    }

    /// Resets gold, lives, towers, enemies and waves, then starts playing.
    pub fn restart(&mut self) {
        self.events.clear();
        self.reset_systems();
        world::apply(&mut self.world, Command::ResetSession, &mut self.events);
        world::apply(
            &mut self.world,
            Command::SetPlayState {
                state: PlayState::Playing,
            },
            &mut self.events,
        );
        info!(
            level = %query::level(&self.world).name,
            waves = self.schedule.total(),
            "session started"
        );
    }

    /// Switches to the built-in level `number` and returns to the menu.
    pub fn select_level(&mut self, number: u32) -> Result<(), SessionError> {
        let level = LevelLayout::by_number(number).ok_or(SessionError::UnknownLevel(number))?;
        self.load_level(level)?;
        Ok(())
    }

    /// Replaces the level, keeping rules and catalog, and returns to the menu.
    pub fn load_level(&mut self, level: LevelLayout) -> Result<(), ConfigError> {
        let config = GameConfig {
            level,
            ..query::config(&self.world).clone()
        };
        self.world = World::new(config)?;
        self.events.clear();
        self.reset_systems();
        info!(level = %query::level(&self.world).name, "level loaded");
        Ok(())
    }

    /// Builds a tower on `cell`, paying its cost.
    pub fn place_tower(
        &mut self,
        kind: TowerKind,
        cell: CellCoord,
    ) -> Result<TowerId, PlacementError> {
        self.events.clear();
        world::apply(
            &mut self.world,
            Command::PlaceTower { kind, cell },
            &mut self.events,
        );
        self.events
            .iter()
            .find_map(|event| match event {
                Event::TowerPlaced { tower, .. } => Some(Ok(*tower)),
                Event::TowerPlacementRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(PlacementError::InvalidState))
    }

    /// Upgrades the tower on `cell` and returns its new level.
    pub fn upgrade_tower(&mut self, cell: CellCoord) -> Result<u8, UpgradeError> {
        self.events.clear();
        world::apply(
            &mut self.world,
            Command::UpgradeTower { cell },
            &mut self.events,
        );
        self.events
            .iter()
            .find_map(|event| match event {
                Event::TowerUpgraded { level, .. } => Some(Ok(*level)),
                Event::TowerUpgradeRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(UpgradeError::InvalidState))
    }

    /// Releases the next wave now.
    ///
    /// Enemies of a running wave stay on the path, but its unspawned entries
    /// are dropped.
    ///
    /// Returns `false` when not playing or when every wave has started.
    pub fn skip_wave(&mut self) -> bool {
        if query::play_state(&self.world) != PlayState::Playing {
            return false;
        }
        match self.schedule.skip() {
            Some(index) => {
                debug!(wave = index + 1, "wave skipped ahead");
                self.launch_wave(index);
                true
            }
            None => false,
        }
    }

    /// Advances the session by `dt`, clamped to the configured maximum step.
    ///
    /// Returns the events produced by the tick. Outside of play the session
    /// does not advance and no events are produced.
    pub fn tick(&mut self, dt: Duration) -> &[Event] {
        self.events.clear();
        if query::play_state(&self.world) != PlayState::Playing {
            return &self.events;
        }

        let dt = clamp_step(dt, query::rules(&self.world).max_step);
        let seconds = dt.as_secs_f32();

        if let Some(index) = self.schedule.advance(seconds) {
            self.launch_wave(index);
        }

        self.commands.clear();
        self.director.handle(PlayState::Playing, dt, &mut self.commands);
        self.dispatch_commands();

        world::apply(&mut self.world, Command::Tick { dt }, &mut self.events);
        if query::play_state(&self.world) != PlayState::Playing {
            self.report.record(&self.events);
            return &self.events;
        }

        let play_state = query::play_state(&self.world);
        let towers = query::tower_view(&self.world);
        self.targeting.handle(
            play_state,
            &towers,
            &query::enemy_view(&self.world),
            query::catalog(&self.world).combat.stealth_miss_chance,
            &mut self.targets,
        );
        self.commands.clear();
        self.combat
            .handle(play_state, &towers, &self.targets, &mut self.commands);
        self.dispatch_commands();

        self.report.record(&self.events);

        let progress = self
            .schedule
            .settle(self.director.is_spawning(), query::enemy_count(&self.world));
        match progress {
            WaveProgress::Ongoing => {}
            WaveProgress::Completed => {
                info!(
                    wave = self.schedule.started(),
                    total = self.schedule.total(),
                    "wave cleared"
                );
            }
            WaveProgress::AllWavesCleared => {
                info!(
                    kills = self.report.kills,
                    escapes = self.report.escapes,
                    "every wave cleared"
                );
                world::apply(
                    &mut self.world,
                    Command::SetPlayState {
                        state: PlayState::Victory,
                    },
                    &mut self.events,
                );
            }
        }

        &self.events
    }

    /// Events produced by the most recent session call.
    #[must_use]
    pub fn last_events(&self) -> &[Event] {
        &self.events
    }

    /// Read-only access to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Current play state.
    #[must_use]
    pub fn play_state(&self) -> PlayState {
        query::play_state(&self.world)
    }

    /// Current gold balance.
    #[must_use]
    pub fn gold(&self) -> u32 {
        query::gold(&self.world)
    }

    /// Remaining lives.
    #[must_use]
    pub fn lives(&self) -> i32 {
        query::lives(&self.world)
    }

    /// Wave pacing state.
    #[must_use]
    pub fn schedule(&self) -> &WaveSchedule {
        &self.schedule
    }

    /// One-based number of the most recently started wave, zero before the first.
    #[must_use]
    pub fn current_wave(&self) -> usize {
        self.schedule.started()
    }

    /// Number of waves in the active level.
    #[must_use]
    pub fn wave_count(&self) -> usize {
        self.schedule.total()
    }

    /// Enemies still queued by the wave director.
    #[must_use]
    pub fn pending_spawns(&self) -> usize {
        self.director.pending()
    }

    /// Totals accumulated since the last restart.
    #[must_use]
    pub fn report(&self) -> SessionReport {
        self.report
    }

    fn transition(&mut self, from: PlayState, to: PlayState) -> bool {
        self.events.clear();
        if query::play_state(&self.world) != from {
            return false;
        }
        world::apply(
            &mut self.world,
            Command::SetPlayState { state: to },
            &mut self.events,
        );
        true
    }

    fn reset_systems(&mut self) {
        let rules = *query::rules(&self.world);
        self.schedule = WaveSchedule::new(query::level(&self.world).waves.len(), &rules);
        self.director.reset(rules.rng_seed);
        self.targeting.reset(rules.rng_seed);
        self.report = SessionReport::default();
        self.commands.clear();
        self.targets.clear();
    }

    fn launch_wave(&mut self, index: usize) {
        let Some(wave) = query::level(&self.world).waves.get(index) else {
            return;
        };
        self.director.start_wave(wave);
        self.report.waves_started = self.schedule.started();
        info!(
            wave = index + 1,
            total = self.schedule.total(),
            enemies = wave.total(),
            "wave started"
        );
    }

    fn dispatch_commands(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }
}

fn clamp_step(dt: Duration, max_step: f32) -> Duration {
    if !max_step.is_finite() || max_step <= 0.0 {
        return dt;
    }
    match Duration::try_from_secs_f32(max_step) {
        Ok(limit) => dt.min(limit),
        Err(_) => dt,
    }
}
