#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that selects a target for every tower from world snapshots.
//!
//! Candidates are filtered by range, flying and phase before stealthed enemies
//! are subjected to a miss roll. The roll is drawn from a seeded generator on
//! every attempt, so a replay with the same seed and inputs yields the same
//! assignments.

use std::{cmp::Ordering, collections::BTreeMap};

use path_defence_core::{
    EnemyId, EnemySnapshot, EnemyView, PlayState, TowerId, TowerSnapshot, TowerTarget, TowerView,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Per-tower acquisition state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetingState {
    /// No valid target was found on the last evaluation.
    #[default]
    Idle,
    /// The tower holds a target.
    Engaged {
        /// Enemy currently targeted.
        enemy: EnemyId,
    },
}

/// Tower targeting system that reuses scratch buffers between ticks.
#[derive(Debug)]
pub struct TowerTargeting {
    rng: ChaCha8Rng,
    states: BTreeMap<TowerId, TargetingState>,
    candidates: Vec<Candidate>,
}

impl TowerTargeting {
    /// Creates a new targeting system whose stealth rolls derive from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            states: BTreeMap::new(),
            candidates: Vec::new(),
        }
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments. `miss_chance` is the probability that a tower without
    /// hidden-enemy detection fails to acquire a stealthed candidate.
    pub fn handle(
        &mut self,
        play_state: PlayState,
        towers: &TowerView,
        enemies: &EnemyView,
        miss_chance: f32,
        out: &mut Vec<TowerTarget>,
    ) {
        out.clear();

        if play_state != PlayState::Playing {
            return;
        }

        self.states.retain(|id, _| {
            towers
                .as_slice()
                .binary_search_by_key(id, |snapshot| snapshot.id)
                .is_ok()
        });

        let miss_chance = f64::from(miss_chance);
        let miss_chance = if miss_chance.is_finite() {
            miss_chance.clamp(0.0, 1.0)
        } else {
            0.0
        };

        for tower in towers.iter() {
            let best = self.select(tower, enemies, miss_chance);
            let state = match best {
                Some(candidate) => {
                    out.push(TowerTarget {
                        tower: tower.id,
                        enemy: candidate.id,
                        distance: candidate.distance,
                    });
                    TargetingState::Engaged {
                        enemy: candidate.id,
                    }
                }
                None => TargetingState::Idle,
            };
            let _ = self.states.insert(tower.id, state);
        }
    }

    /// Reports the acquisition state recorded for the tower on the last tick.
    #[must_use]
    pub fn state(&self, tower: TowerId) -> TargetingState {
        self.states.get(&tower).copied().unwrap_or_default()
    }

    /// Forgets every per-tower state and reseeds the miss roll generator.
    pub fn reset(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.states.clear();
        self.candidates.clear();
    }

    fn select(
        &mut self,
        tower: &TowerSnapshot,
        enemies: &EnemyView,
        miss_chance: f64,
    ) -> Option<Candidate> {
        self.candidates.clear();
        let stats = &tower.stats;

        for enemy in enemies.iter() {
            let distance = tower.center.distance(enemy.position);
            if distance > stats.range {
                continue;
            }
            if !is_reachable(tower, enemy) {
                continue;
            }
            if enemy.stealthed && !stats.detects_hidden && self.rng.gen_bool(miss_chance) {
                continue;
            }
            self.candidates.push(Candidate {
                id: enemy.id,
                distance,
            });
        }

        self.candidates
            .iter()
            .copied()
            .min_by(|left, right| left.precedence(right))
    }
}

fn is_reachable(tower: &TowerSnapshot, enemy: &EnemySnapshot) -> bool {
    if enemy.flying && !tower.stats.targets_flying {
        return false;
    }
    !(enemy.phased && !tower.stats.detects_hidden)
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    id: EnemyId,
    distance: f32,
}

impl Candidate {
    fn precedence(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}
