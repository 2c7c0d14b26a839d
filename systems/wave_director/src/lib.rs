#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave director that turns wave specifications into timed spawn commands.
//!
//! Starting a wave expands its groups into a flat queue and shuffles it with a
//! seeded generator. While spawning, the director pops one entry every time
//! the spawn countdown expires and emits `Command::SpawnEnemy` for it.

use std::{collections::VecDeque, time::Duration};

use path_defence_core::{Command, EnemyKind, PlayState, WaveSpec};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Lifecycle of the spawn queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectorPhase {
    /// Nothing is queued.
    Idle,
    /// Queued enemies are released on a timer.
    Spawning,
}

/// Deterministic wave director.
#[derive(Debug)]
pub struct WaveDirector {
    rng: ChaCha8Rng,
    queue: VecDeque<EnemyKind>,
    delay: f32,
    countdown: f32,
    phase: DirectorPhase,
}

impl WaveDirector {
    /// Creates an idle director whose shuffles derive from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            queue: VecDeque::new(),
            delay: 0.0,
            countdown: 0.0,
            phase: DirectorPhase::Idle,
        }
    }

    /// Replaces the queue with the enemies of `wave` in random order.
    ///
    /// Unspawned entries of an earlier wave are dropped. The first enemy of
    /// the new wave is released on the next tick.
    pub fn start_wave(&mut self, wave: &WaveSpec) {
        let mut entries = wave.expand();
        entries.shuffle(&mut self.rng);
        debug!(
            queued = entries.len(),
            dropped = self.queue.len(),
            delay = wave.delay,
            "wave queued"
        );

        self.queue.clear();
        self.queue.extend(entries);
        self.delay = wave.delay;
        self.countdown = 0.0;
        self.phase = if self.queue.is_empty() {
            DirectorPhase::Idle
        } else {
            DirectorPhase::Spawning
        };
    }

    /// Advances the spawn countdown by `dt` and emits at most one spawn.
    pub fn handle(&mut self, play_state: PlayState, dt: Duration, out: &mut Vec<Command>) {
        if play_state != PlayState::Playing || self.phase != DirectorPhase::Spawning {
            return;
        }

        self.countdown -= dt.as_secs_f32();
        if self.countdown > 0.0 {
            return;
        }

        if let Some(kind) = self.queue.pop_front() {
            out.push(Command::SpawnEnemy { kind });
            self.countdown = self.delay;
        }
        if self.queue.is_empty() {
            debug!("spawn queue drained");
            self.phase = DirectorPhase::Idle;
        }
    }

    /// Current phase of the director.
    #[must_use]
    pub fn phase(&self) -> DirectorPhase {
        self.phase
    }

    /// Reports whether queued enemies remain to be spawned.
    #[must_use]
    pub fn is_spawning(&self) -> bool {
        self.phase == DirectorPhase::Spawning
    }

    /// Number of enemies still waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drops the queue and reseeds the shuffle generator.
    pub fn reset(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.queue.clear();
        self.delay = 0.0;
        self.countdown = 0.0;
        self.phase = DirectorPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(500);

    fn spawned(out: &[Command]) -> Vec<EnemyKind> {
        out.iter()
            .filter_map(|command| match command {
                Command::SpawnEnemy { kind } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn first_enemy_spawns_on_the_next_tick() {
        let mut director = WaveDirector::new(1);
        director.start_wave(&WaveSpec::new(1.0, [(EnemyKind::Basic, 3)]));
        let mut out = Vec::new();

        director.handle(PlayState::Playing, STEP, &mut out);

        assert_eq!(spawned(&out), vec![EnemyKind::Basic]);
        assert_eq!(director.pending(), 2);
        assert!(director.is_spawning());
    }

    #[test]
    fn spawns_are_spaced_by_the_wave_delay() {
        let mut director = WaveDirector::new(1);
        director.start_wave(&WaveSpec::new(1.0, [(EnemyKind::Basic, 3)]));
        let mut spawn_ticks = Vec::new();

        for tick in 0..8 {
            let mut out = Vec::new();
            director.handle(PlayState::Playing, STEP, &mut out);
            if !out.is_empty() {
                assert_eq!(out.len(), 1, "at most one spawn per tick");
                spawn_ticks.push(tick);
            }
        }

        assert_eq!(spawn_ticks, vec![0, 2, 4]);
        assert_eq!(director.phase(), DirectorPhase::Idle);
    }

    #[test]
    fn queue_holds_every_enemy_of_the_wave() {
        let mut director = WaveDirector::new(9);
        director.start_wave(&WaveSpec::new(
            0.0,
            [(EnemyKind::Basic, 3), (EnemyKind::Fast, 2)],
        ));
        let mut out = Vec::new();

        for _ in 0..10 {
            director.handle(PlayState::Playing, STEP, &mut out);
        }

        let mut kinds = spawned(&out);
        kinds.sort();
        assert_eq!(
            kinds,
            vec![
                EnemyKind::Basic,
                EnemyKind::Basic,
                EnemyKind::Basic,
                EnemyKind::Fast,
                EnemyKind::Fast,
            ]
        );
    }

    #[test]
    fn shuffle_is_reproducible_for_a_seed() {
        let wave = WaveSpec::new(
            0.0,
            [
                (EnemyKind::Basic, 4),
                (EnemyKind::Fast, 4),
                (EnemyKind::Heavy, 4),
            ],
        );
        let drain = |seed| {
            let mut director = WaveDirector::new(seed);
            director.start_wave(&wave);
            let mut out = Vec::new();
            while director.is_spawning() {
                director.handle(PlayState::Playing, STEP, &mut out);
            }
            spawned(&out)
        };

        assert_eq!(drain(42), drain(42));
    }

    #[test]
    fn new_wave_replaces_unspawned_entries() {
        let mut director = WaveDirector::new(1);
        director.start_wave(&WaveSpec::new(1.0, [(EnemyKind::Basic, 3)]));
        let mut out = Vec::new();
        director.handle(PlayState::Playing, STEP, &mut out);
        assert_eq!(director.pending(), 2);

        director.start_wave(&WaveSpec::new(2.0, [(EnemyKind::Heavy, 2)]));
        assert_eq!(director.pending(), 2);

        out.clear();
        director.handle(PlayState::Playing, STEP, &mut out);
        assert_eq!(spawned(&out), vec![EnemyKind::Heavy], "countdown restarts");

        while director.is_spawning() {
            director.handle(PlayState::Playing, STEP, &mut out);
        }
        assert_eq!(spawned(&out), vec![EnemyKind::Heavy, EnemyKind::Heavy]);
    }

    #[test]
    fn paused_director_holds_its_countdown() {
        let mut director = WaveDirector::new(1);
        director.start_wave(&WaveSpec::new(1.0, [(EnemyKind::Basic, 2)]));
        let mut out = Vec::new();

        director.handle(PlayState::Paused, STEP, &mut out);
        director.handle(PlayState::Menu, STEP, &mut out);

        assert!(out.is_empty());
        assert_eq!(director.pending(), 2);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut director = WaveDirector::new(1);
        director.start_wave(&WaveSpec::new(1.0, [(EnemyKind::Basic, 2)]));

        director.reset(1);

        assert_eq!(director.phase(), DirectorPhase::Idle);
        assert_eq!(director.pending(), 0);
    }
}
