//! Per-enemy health, abilities and path following.

use glam::Vec2;
use path_defence_core::{
    DutyCycleSpec, EnemyId, EnemyKind, EnemySnapshot, EnemySpec, FreezePayload,
};

use crate::path::PathTracker;

/// Timed ability that alternates between an active and a cooldown window.
///
/// Abilities start in their cooldown window.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DutyCycle {
    spec: DutyCycleSpec,
    timer: f32,
    active: bool,
}

impl DutyCycle {
    pub(crate) fn new(spec: DutyCycleSpec) -> Self {
        Self {
            spec,
            timer: 0.0,
            active: false,
        }
    }

    pub(crate) fn advance(&mut self, dt: f32) {
        self.timer += dt;
        let threshold = if self.active {
            self.spec.duration
        } else {
            self.spec.cooldown
        };
        if self.timer >= threshold {
            self.active = !self.active;
            self.timer = 0.0;
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }
}

/// Authoritative enemy state stored in the world arena.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    kind: EnemyKind,
    health: f32,
    max_health: f32,
    base_speed: f32,
    speed: f32,
    armor: f32,
    regeneration: f32,
    reward: u32,
    size: f32,
    flying: bool,
    splash_immune: bool,
    berserker_boost: Option<f32>,
    berserker_threshold: f32,
    stealth: Option<DutyCycle>,
    phase: Option<DutyCycle>,
    freeze_timer: f32,
    slow_multiplier: f32,
    position: Vec2,
    progress: f32,
    reached_end: bool,
}

impl Enemy {
    /// Creates a full-health enemy at the start of the path.
    pub(crate) fn spawn(spec: &EnemySpec, start: Vec2, berserker_threshold: f32) -> Self {
        Self {
            kind: spec.kind,
            health: spec.health,
            max_health: spec.health,
            base_speed: spec.speed,
            speed: spec.speed,
            armor: spec.armor,
            regeneration: spec.regeneration,
            reward: spec.reward,
            size: spec.size,
            flying: spec.flying,
            splash_immune: spec.splash_immune,
            berserker_boost: spec.berserker_boost,
            berserker_threshold,
            stealth: spec.stealth.map(DutyCycle::new),
            phase: spec.phase.map(DutyCycle::new),
            freeze_timer: 0.0,
            slow_multiplier: 1.0,
            position: start,
            progress: 0.0,
            reached_end: false,
        }
    }

    pub(crate) fn kind(&self) -> EnemyKind {
        self.kind
    }

    pub(crate) fn reward(&self) -> u32 {
        self.reward
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn size(&self) -> f32 {
        self.size
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Reports whether splash damage and splash freezes skip the enemy.
    pub(crate) fn ignores_splash(&self) -> bool {
        self.flying || self.splash_immune
    }

    pub(crate) fn is_stealthed(&self) -> bool {
        self.stealth.is_some_and(|cycle| cycle.is_active())
    }

    pub(crate) fn is_phased(&self) -> bool {
        self.phase.is_some_and(|cycle| cycle.is_active())
    }

    pub(crate) fn is_frozen(&self) -> bool {
        self.freeze_timer > 0.0
    }

    pub(crate) fn is_enraged(&self) -> bool {
        self.berserker_boost.is_some() && self.health <= self.max_health * self.berserker_threshold
    }

    /// Applies a hit after armor and reports whether the enemy died.
    ///
    /// Armor never reduces a hit below one point of damage.
    pub(crate) fn take_damage(&mut self, amount: f32) -> bool {
        let actual = (amount - self.armor).max(1.0);
        self.health -= actual;
        !self.is_alive()
    }

    /// Replaces any running slow with the payload.
    pub(crate) fn apply_freeze(&mut self, payload: FreezePayload) {
        self.freeze_timer = payload.duration;
        self.slow_multiplier = payload.slow_multiplier;
    }

    /// Speed after berserker rage and freeze.
    pub(crate) fn current_speed(&self) -> f32 {
        if self.is_frozen() {
            self.speed * self.slow_multiplier
        } else {
            self.speed
        }
    }

    /// Advances regeneration, abilities, freeze and movement.
    ///
    /// Returns `true` on the tick the enemy reaches the end of the path.
    pub(crate) fn tick(&mut self, dt: f32, path: &PathTracker) -> bool {
        if !self.is_alive() || self.reached_end {
            return false;
        }

        if self.regeneration > 0.0 {
            self.health = (self.health + self.regeneration * dt).min(self.max_health);
        }

        self.speed = match self.berserker_boost {
            Some(boost) if self.is_enraged() => self.base_speed * boost,
            _ => self.base_speed,
        };

        if let Some(cycle) = self.stealth.as_mut() {
            cycle.advance(dt);
        }
        if let Some(cycle) = self.phase.as_mut() {
            cycle.advance(dt);
        }

        if self.freeze_timer > 0.0 {
            self.freeze_timer -= dt;
            if self.freeze_timer <= 0.0 {
                self.freeze_timer = 0.0;
                self.slow_multiplier = 1.0;
            }
        }

        let step = path.advance(self.progress, self.current_speed() * dt);
        self.position = step.position;
        self.progress = step.progress;

        if self.progress >= 1.0 {
            self.reached_end = true;
            return true;
        }
        false
    }

    pub(crate) fn snapshot(&self, id: EnemyId) -> EnemySnapshot {
        EnemySnapshot {
            id,
            kind: self.kind,
            position: self.position,
            health: self.health,
            max_health: self.max_health,
            size: self.size,
            progress: self.progress,
            flying: self.flying,
            stealthed: self.is_stealthed(),
            phased: self.is_phased(),
            frozen: self.is_frozen(),
            enraged: self.is_enraged(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use path_defence_core::Catalog;

    fn spec(kind: EnemyKind) -> EnemySpec {
        Catalog::standard()
            .enemy(kind)
            .expect("standard catalog lists every enemy")
            .clone()
    }

    fn straight_path() -> PathTracker {
        PathTracker::new(vec![Vec2::ZERO, Vec2::new(1_000.0, 0.0)])
    }

    #[test]
    fn armor_never_fully_negates_a_hit() {
        let mut titan = Enemy::spawn(&spec(EnemyKind::Titan), Vec2::ZERO, 0.5);
        let before = titan.health;

        let died = titan.take_damage(3.0);

        assert!(!died);
        assert_eq!(before - titan.health, 1.0);
    }

    #[test]
    fn damage_reports_death() {
        let mut swarm = Enemy::spawn(&spec(EnemyKind::Swarm), Vec2::ZERO, 0.5);
        assert!(swarm.take_damage(15.0));
        assert!(!swarm.is_alive());
    }

    #[test]
    fn regeneration_is_capped_at_max_health() {
        let mut enemy = Enemy::spawn(&spec(EnemyKind::Regenerator), Vec2::ZERO, 0.5);
        let _ = enemy.take_damage(10.0);

        let _ = enemy.tick(1.0, &straight_path());
        assert!((enemy.health - 88.0).abs() < 1e-4);

        let _ = enemy.tick(1.0, &straight_path());
        assert_eq!(enemy.health, enemy.max_health);
    }

    #[test]
    fn berserker_rage_toggles_with_health() {
        let path = straight_path();
        let mut enemy = Enemy::spawn(&spec(EnemyKind::Berserker), Vec2::ZERO, 0.5);

        let _ = enemy.tick(1.0, &path);
        assert_eq!(enemy.current_speed(), 25.0);

        let _ = enemy.take_damage(50.0);
        let _ = enemy.tick(1.0, &path);
        assert!(enemy.is_enraged());
        assert_eq!(enemy.current_speed(), 50.0);

        enemy.health = 80.0;
        let _ = enemy.tick(1.0, &path);
        assert!(!enemy.is_enraged());
        assert_eq!(enemy.current_speed(), 25.0);
    }

    #[test]
    fn stealth_follows_its_duty_cycle() {
        let path = straight_path();
        let mut enemy = Enemy::spawn(&spec(EnemyKind::Shadow), Vec2::ZERO, 0.5);

        for _ in 0..4 {
            let _ = enemy.tick(1.0, &path);
        }
        assert!(!enemy.is_stealthed(), "cooldown window lasts five seconds");

        let _ = enemy.tick(1.0, &path);
        assert!(enemy.is_stealthed());

        let _ = enemy.tick(1.0, &path);
        assert!(enemy.is_stealthed());
        let _ = enemy.tick(1.0, &path);
        assert!(!enemy.is_stealthed(), "active window lasts two seconds");
    }

    #[test]
    fn freeze_slows_until_it_expires() {
        let path = straight_path();
        let mut enemy = Enemy::spawn(&spec(EnemyKind::Basic), Vec2::ZERO, 0.5);
        enemy.apply_freeze(FreezePayload {
            duration: 1.0,
            slow_multiplier: 0.5,
        });

        let _ = enemy.tick(0.5, &path);
        assert!(enemy.is_frozen());
        assert!((enemy.position.x - 7.5).abs() < 1e-3);

        let _ = enemy.tick(0.5, &path);
        assert!(!enemy.is_frozen());
        assert_eq!(enemy.slow_multiplier, 1.0);
        assert!((enemy.position.x - 22.5).abs() < 1e-3);
    }

    #[test]
    fn reaching_the_end_is_reported_once() {
        let path = PathTracker::new(vec![Vec2::ZERO, Vec2::new(10.0, 0.0)]);
        let mut enemy = Enemy::spawn(&spec(EnemyKind::Fast), Vec2::ZERO, 0.5);

        assert!(enemy.tick(1.0, &path));
        assert!(!enemy.tick(1.0, &path));
        assert_eq!(enemy.position(), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn dead_enemies_do_not_move() {
        let path = straight_path();
        let mut enemy = Enemy::spawn(&spec(EnemyKind::Basic), Vec2::ZERO, 0.5);
        let _ = enemy.take_damage(100.0);

        assert!(!enemy.tick(1.0, &path));
        assert_eq!(enemy.position(), Vec2::ZERO);
    }
}
