//! Projectile flight, hit detection and impact resolution.

use std::collections::HashSet;

use glam::Vec2;
use path_defence_core::{CombatTuning, EnemyId, FreezePayload, ProjectileVisual, TowerStats};
use slotmap::SlotMap;

use crate::enemies::Enemy;

/// In-flight projectile owned by the tower that fired it.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    position: Vec2,
    velocity: Vec2,
    speed: f32,
    damage: f32,
    splash_radius: f32,
    homing_target: Option<EnemyId>,
    piercing: bool,
    freeze: Option<FreezePayload>,
    hit: HashSet<EnemyId>,
    alive: bool,
}

impl Projectile {
    /// Launches a projectile from `origin` toward `aim`.
    ///
    /// Homing projectiles stay bound to `target` for retargeting.
    pub(crate) fn launch(origin: Vec2, aim: Vec2, target: EnemyId, stats: &TowerStats) -> Self {
        Self {
            position: origin,
            velocity: (aim - origin).normalize_or_zero() * stats.projectile_speed,
            speed: stats.projectile_speed,
            damage: stats.damage,
            splash_radius: stats.splash_radius,
            homing_target: stats.homing.then_some(target),
            piercing: stats.piercing,
            freeze: stats.freeze,
            hit: HashSet::new(),
            alive: true,
        }
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive
    }

    pub(crate) fn visual(&self) -> ProjectileVisual {
        if self.piercing {
            ProjectileVisual::Piercing
        } else if self.homing_target.is_some() {
            ProjectileVisual::Homing
        } else if self.freeze.is_some() {
            ProjectileVisual::Freeze
        } else {
            ProjectileVisual::Plain
        }
    }

    /// Moves the projectile and resolves every hit it makes this tick.
    ///
    /// Non-piercing projectiles stop after their first hit. Projectiles that
    /// leave `world_size` by more than the bounds margin are discarded.
    pub(crate) fn advance(
        &mut self,
        dt: f32,
        enemies: &mut SlotMap<EnemyId, Enemy>,
        world_size: Vec2,
        tuning: &CombatTuning,
    ) {
        if !self.alive {
            return;
        }

        if let Some(target) = self.homing_target {
            if let Some(enemy) = enemies.get(target).filter(|enemy| enemy.is_alive()) {
                let heading = enemy.position() - self.position;
                if heading.length_squared() > 0.0 {
                    self.velocity = heading.normalize() * self.speed;
                }
            }
        }

        self.position += self.velocity * dt;

        let touching: Vec<EnemyId> = enemies
            .iter()
            .filter(|(id, enemy)| {
                enemy.is_alive()
                    && !self.hit.contains(id)
                    && enemy.position().distance(self.position)
                        <= enemy.size() + tuning.hit_margin
            })
            .map(|(id, _)| id)
            .collect();

        for id in touching {
            if !enemies.get(id).is_some_and(Enemy::is_alive) {
                continue;
            }
            self.strike(id, enemies, tuning);
            if !self.piercing {
                self.alive = false;
                return;
            }
        }

        let margin = tuning.bounds_margin;
        if self.position.x < -margin
            || self.position.y < -margin
            || self.position.x > world_size.x + margin
            || self.position.y > world_size.y + margin
        {
            self.alive = false;
        }
    }

    fn strike(
        &mut self,
        primary: EnemyId,
        enemies: &mut SlotMap<EnemyId, Enemy>,
        tuning: &CombatTuning,
    ) {
        let _ = self.hit.insert(primary);
        let impact = self.position;

        if let Some(enemy) = enemies.get_mut(primary) {
            let _ = enemy.take_damage(self.damage);
            if let Some(freeze) = self.freeze {
                enemy.apply_freeze(freeze);
            }
        }

        if self.splash_radius <= 0.0 {
            return;
        }

        for (id, enemy) in enemies.iter_mut() {
            if id == primary || !enemy.is_alive() || enemy.ignores_splash() {
                continue;
            }

            let distance = enemy.position().distance(impact);
            if distance > self.splash_radius {
                continue;
            }

            let amount = splash_damage(
                self.damage,
                distance,
                self.splash_radius,
                tuning.splash_ratio,
            );
            if amount > 0.0 {
                let _ = enemy.take_damage(amount);
            }
            if let Some(freeze) = self.freeze {
                enemy.apply_freeze(freeze);
            }
        }
    }
}

/// Damage dealt by splash at `distance` from the impact point.
///
/// Falls off linearly from `damage * ratio` at the impact point to zero at
/// the edge of the radius.
pub(crate) fn splash_damage(damage: f32, distance: f32, radius: f32, ratio: f32) -> f32 {
    if radius <= 0.0 || distance >= radius {
        return 0.0;
    }
    damage * (1.0 - distance / radius) * ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use path_defence_core::{Catalog, EnemyKind, EnemySpec, TowerKind};

    const WORLD: Vec2 = Vec2::new(800.0, 600.0);

    fn enemy_spec(kind: EnemyKind) -> EnemySpec {
        Catalog::standard()
            .enemy(kind)
            .expect("standard catalog lists every enemy")
            .clone()
    }

    fn tower_stats(kind: TowerKind) -> TowerStats {
        Catalog::standard()
            .tower(kind)
            .expect("standard catalog lists every tower")
            .stats
    }

    fn spawn_at(enemies: &mut SlotMap<EnemyId, Enemy>, kind: EnemyKind, at: Vec2) -> EnemyId {
        enemies.insert(Enemy::spawn(&enemy_spec(kind), at, 0.5))
    }

    fn health(enemies: &SlotMap<EnemyId, Enemy>, id: EnemyId) -> f32 {
        enemies[id].snapshot(id).health
    }

    #[test]
    fn splash_falls_off_to_zero_at_the_radius() {
        assert_eq!(splash_damage(40.0, 0.0, 20.0, 0.5), 20.0);
        assert_eq!(splash_damage(40.0, 10.0, 20.0, 0.5), 10.0);
        assert_eq!(splash_damage(40.0, 20.0, 20.0, 0.5), 0.0);
        assert_eq!(splash_damage(40.0, 5.0, 0.0, 0.5), 0.0);
    }

    #[test]
    fn non_piercing_projectile_hits_only_one_enemy() {
        let tuning = CombatTuning::default();
        let mut enemies = SlotMap::with_key();
        let first = spawn_at(&mut enemies, EnemyKind::Heavy, Vec2::new(100.0, 100.0));
        let second = spawn_at(&mut enemies, EnemyKind::Heavy, Vec2::new(104.0, 100.0));
        let stats = tower_stats(TowerKind::MachineGun);
        let mut projectile = Projectile::launch(
            Vec2::new(90.0, 100.0),
            Vec2::new(100.0, 100.0),
            first,
            &stats,
        );

        projectile.advance(0.01, &mut enemies, WORLD, &tuning);
        projectile.advance(0.01, &mut enemies, WORLD, &tuning);

        assert!(!projectile.is_alive());
        assert_eq!(health(&enemies, first), 142.0);
        assert_eq!(health(&enemies, second), 150.0);
    }

    #[test]
    fn piercing_projectile_hits_each_enemy_once() {
        let tuning = CombatTuning::default();
        let mut enemies = SlotMap::with_key();
        let near = spawn_at(&mut enemies, EnemyKind::Heavy, Vec2::new(100.0, 100.0));
        let far = spawn_at(&mut enemies, EnemyKind::Heavy, Vec2::new(160.0, 100.0));
        let stats = tower_stats(TowerKind::Laser);
        let mut projectile = Projectile::launch(
            Vec2::new(80.0, 100.0),
            Vec2::new(100.0, 100.0),
            near,
            &stats,
        );

        for _ in 0..10 {
            projectile.advance(0.02, &mut enemies, WORLD, &tuning);
        }

        assert!(projectile.is_alive());
        assert_eq!(health(&enemies, near), 135.0);
        assert_eq!(health(&enemies, far), 135.0);
        assert_eq!(projectile.visual(), ProjectileVisual::Piercing);
    }

    #[test]
    fn splash_spares_flying_and_immune_enemies() {
        let tuning = CombatTuning::default();
        let mut enemies = SlotMap::with_key();
        let primary = spawn_at(&mut enemies, EnemyKind::Heavy, Vec2::new(100.0, 100.0));
        let ground = spawn_at(&mut enemies, EnemyKind::Heavy, Vec2::new(100.0, 110.0));
        let flyer = spawn_at(&mut enemies, EnemyKind::Flying, Vec2::new(100.0, 90.0));
        let titan = spawn_at(&mut enemies, EnemyKind::Titan, Vec2::new(105.0, 100.0));
        let stats = TowerStats {
            damage: 40.0,
            splash_radius: 20.0,
            ..tower_stats(TowerKind::Cannon)
        };
        let mut projectile = Projectile::launch(
            Vec2::new(100.0, 100.0),
            Vec2::new(100.0, 100.0),
            primary,
            &stats,
        );

        projectile.strike(primary, &mut enemies, &tuning);

        assert_eq!(health(&enemies, primary), 110.0);
        assert_eq!(health(&enemies, ground), 140.0);
        assert_eq!(health(&enemies, flyer), 40.0);
        assert_eq!(health(&enemies, titan), 600.0);
    }

    #[test]
    fn splash_edge_deals_no_damage_but_still_freezes() {
        let tuning = CombatTuning::default();
        let mut enemies = SlotMap::with_key();
        let primary = spawn_at(&mut enemies, EnemyKind::Heavy, Vec2::new(100.0, 100.0));
        let edge = spawn_at(&mut enemies, EnemyKind::Heavy, Vec2::new(125.0, 100.0));
        let stats = tower_stats(TowerKind::Frost);
        let mut projectile = Projectile::launch(
            Vec2::new(100.0, 100.0),
            Vec2::new(100.0, 100.0),
            primary,
            &stats,
        );

        projectile.strike(primary, &mut enemies, &tuning);

        let snapshot = enemies[edge].snapshot(edge);
        assert_eq!(snapshot.health, 150.0);
        assert!(snapshot.frozen);
        assert!(enemies[primary].snapshot(primary).frozen);
        assert_eq!(projectile.visual(), ProjectileVisual::Freeze);
    }

    #[test]
    fn homing_projectile_follows_its_target() {
        let tuning = CombatTuning::default();
        let mut enemies = SlotMap::with_key();
        let target = spawn_at(&mut enemies, EnemyKind::Heavy, Vec2::new(200.0, 300.0));
        let stats = tower_stats(TowerKind::Missile);
        let mut projectile = Projectile::launch(
            Vec2::new(100.0, 100.0),
            Vec2::new(300.0, 100.0),
            target,
            &stats,
        );

        projectile.advance(0.1, &mut enemies, WORLD, &tuning);

        let heading = (projectile.position() - Vec2::new(100.0, 100.0)).normalize();
        let expected = (Vec2::new(200.0, 300.0) - Vec2::new(100.0, 100.0)).normalize();
        assert!((heading - expected).length() < 1e-4);
        assert_eq!(projectile.visual(), ProjectileVisual::Homing);
    }

    #[test]
    fn homing_projectile_keeps_course_after_target_dies() {
        let tuning = CombatTuning::default();
        let mut enemies = SlotMap::with_key();
        let target = spawn_at(&mut enemies, EnemyKind::Swarm, Vec2::new(100.0, 400.0));
        let stats = tower_stats(TowerKind::Missile);
        let mut projectile = Projectile::launch(
            Vec2::new(100.0, 100.0),
            Vec2::new(300.0, 100.0),
            target,
            &stats,
        );
        let _ = enemies.remove(target);

        projectile.advance(0.1, &mut enemies, WORLD, &tuning);

        assert!((projectile.position() - Vec2::new(115.0, 100.0)).length() < 1e-4);
        assert!(projectile.is_alive());
    }

    #[test]
    fn projectiles_leaving_the_map_are_discarded() {
        let tuning = CombatTuning::default();
        let mut enemies: SlotMap<EnemyId, Enemy> = SlotMap::with_key();
        let ghost = spawn_at(&mut enemies, EnemyKind::Basic, Vec2::new(-999.0, -999.0));
        let stats = tower_stats(TowerKind::Cannon);
        let mut projectile = Projectile::launch(
            Vec2::new(790.0, 10.0),
            Vec2::new(900.0, 10.0),
            ghost,
            &stats,
        );

        projectile.advance(0.2, &mut enemies, WORLD, &tuning);
        assert!(projectile.is_alive());

        projectile.advance(0.2, &mut enemies, WORLD, &tuning);
        assert!(!projectile.is_alive());
    }
}
