//! Tower and enemy stat tables injected into the world at construction time.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Highest upgrade level reachable with the standard multiplier tables.
pub const MAX_UPGRADE_LEVEL: u8 = 3;

/// Types of towers that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Slow splash cannon.
    Cannon,
    /// Rapid single-target gun.
    MachineGun,
    /// Homing launcher able to hit flying enemies.
    Missile,
    /// Piercing beam that sees through stealth and phase.
    Laser,
    /// Splash emitter that slows what it hits.
    Frost,
}

impl TowerKind {
    /// Every tower kind in catalog order.
    pub const ALL: [Self; 5] = [
        Self::Cannon,
        Self::MachineGun,
        Self::Missile,
        Self::Laser,
        Self::Frost,
    ];

    /// Stable identifier used in configuration files and command lines.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cannon => "cannon",
            Self::MachineGun => "machine_gun",
            Self::Missile => "missile",
            Self::Laser => "laser",
            Self::Frost => "frost",
        }
    }

    /// Parses the identifier produced by [`TowerKind::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Types of enemies that can walk the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Baseline walker.
    Basic,
    /// Quick and fragile.
    Fast,
    /// Slow and sturdy.
    Heavy,
    /// Airborne, ignores splash.
    Flying,
    /// Reduces every hit by a flat amount.
    Armored,
    /// Tiny enemies that come in numbers.
    Swarm,
    /// Heals over time.
    Regenerator,
    /// Periodically turns stealthed.
    Shadow,
    /// Speeds up when badly hurt.
    Berserker,
    /// Periodically phases out of reach.
    Phantom,
    /// Armored and regenerating.
    Elite,
    /// Huge, armored and immune to splash.
    Titan,
    /// Final boss.
    Boss,
}

impl EnemyKind {
    /// Every enemy kind in catalog order.
    pub const ALL: [Self; 13] = [
        Self::Basic,
        Self::Fast,
        Self::Heavy,
        Self::Flying,
        Self::Armored,
        Self::Swarm,
        Self::Regenerator,
        Self::Shadow,
        Self::Berserker,
        Self::Phantom,
        Self::Elite,
        Self::Titan,
        Self::Boss,
    ];

    /// Stable identifier used in configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Fast => "fast",
            Self::Heavy => "heavy",
            Self::Flying => "flying",
            Self::Armored => "armored",
            Self::Swarm => "swarm",
            Self::Regenerator => "regenerator",
            Self::Shadow => "shadow",
            Self::Berserker => "berserker",
            Self::Phantom => "phantom",
            Self::Elite => "elite",
            Self::Titan => "titan",
            Self::Boss => "boss",
        }
    }
}

/// Slow applied to enemies struck by a freezing projectile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FreezePayload {
    /// Seconds the slow lasts.
    pub duration: f32,
    /// Factor applied to the enemy speed while the slow lasts.
    pub slow_multiplier: f32,
}

/// Combat parameters of a tower at a given upgrade level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Damage dealt to the primary target.
    pub damage: f32,
    /// Targeting radius in world units.
    pub range: f32,
    /// Shots per second.
    pub fire_rate: f32,
    /// Area of effect around the impact point. Zero disables splash.
    #[serde(default)]
    pub splash_radius: f32,
    /// Projectile travel speed in world units per second.
    pub projectile_speed: f32,
    /// Projectiles steer toward their bound enemy.
    #[serde(default)]
    pub homing: bool,
    /// Projectiles survive hits and strike each enemy at most once.
    #[serde(default)]
    pub piercing: bool,
    /// Slow applied on impact.
    #[serde(default)]
    pub freeze: Option<FreezePayload>,
    /// Tower may target flying enemies.
    #[serde(default)]
    pub targets_flying: bool,
    /// Tower acquires stealthed and phased enemies without penalty.
    #[serde(default)]
    pub detects_hidden: bool,
}

impl TowerStats {
    /// Seconds between shots.
    #[must_use]
    pub fn cooldown(&self) -> f32 {
        if self.fire_rate > 0.0 {
            1.0 / self.fire_rate
        } else {
            f32::INFINITY
        }
    }
}

/// Catalog entry describing a buildable tower.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerSpec {
    /// Tower kind described by the entry.
    pub kind: TowerKind,
    /// Gold required to build the tower.
    pub cost: u32,
    /// Stats at upgrade level zero.
    pub stats: TowerStats,
    /// Gold required to reach each upgrade level; index zero buys level one.
    pub upgrade_costs: Vec<u32>,
}

impl TowerSpec {
    /// Gold required to upgrade a tower currently at `level`.
    #[must_use]
    pub fn upgrade_cost(&self, level: u8) -> Option<u32> {
        self.upgrade_costs.get(usize::from(level)).copied()
    }
}

/// Level-indexed multipliers applied to base tower stats.
///
/// Entry `n` of every table holds the multiplier for upgrade level `n`, so
/// the first entry is normally `1.0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeScaling {
    /// Damage multipliers.
    pub damage: Vec<f32>,
    /// Range multipliers.
    pub range: Vec<f32>,
    /// Fire rate multipliers.
    pub fire_rate: Vec<f32>,
    /// Splash radius multipliers.
    pub splash_radius: Vec<f32>,
}

impl UpgradeScaling {
    /// Highest level covered by every table.
    #[must_use]
    pub fn max_level(&self) -> u8 {
        let shortest = [
            self.damage.len(),
            self.range.len(),
            self.fire_rate.len(),
            self.splash_radius.len(),
        ]
        .into_iter()
        .min()
        .unwrap_or(0);
        u8::try_from(shortest.saturating_sub(1)).unwrap_or(u8::MAX)
    }

    /// Derives effective stats for `level` from the untouched base stats.
    ///
    /// Levels above [`UpgradeScaling::max_level`] use the final multipliers.
    #[must_use]
    pub fn apply(&self, base: &TowerStats, level: u8) -> TowerStats {
        let level = level.min(self.max_level());
        TowerStats {
            damage: base.damage * multiplier(&self.damage, level),
            range: base.range * multiplier(&self.range, level),
            fire_rate: base.fire_rate * multiplier(&self.fire_rate, level),
            splash_radius: base.splash_radius * multiplier(&self.splash_radius, level),
            ..*base
        }
    }
}

impl Default for UpgradeScaling {
    fn default() -> Self {
        Self {
            damage: vec![1.0, 1.3, 1.6, 2.0],
            range: vec![1.0, 1.1, 1.2, 1.3],
            fire_rate: vec![1.0, 1.15, 1.3, 1.5],
            splash_radius: vec![1.0, 1.15, 1.3, 1.5],
        }
    }
}

fn multiplier(table: &[f32], level: u8) -> f32 {
    table.get(usize::from(level)).copied().unwrap_or(1.0)
}

/// Alternating active and cooldown windows of a timed ability.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DutyCycleSpec {
    /// Seconds the ability stays active.
    pub duration: f32,
    /// Seconds between activations.
    pub cooldown: f32,
}

/// Catalog entry describing an enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySpec {
    /// Enemy kind described by the entry.
    pub kind: EnemyKind,
    /// Health at spawn time.
    pub health: f32,
    /// Base speed in world units per second.
    pub speed: f32,
    /// Gold granted on kill.
    pub reward: u32,
    /// Collision radius in world units.
    pub size: f32,
    /// Flat damage reduction per hit.
    #[serde(default)]
    pub armor: f32,
    /// Health restored per second.
    #[serde(default)]
    pub regeneration: f32,
    /// Only anti-air towers can target the enemy and splash ignores it.
    #[serde(default)]
    pub flying: bool,
    /// Splash never damages the enemy.
    #[serde(default)]
    pub splash_immune: bool,
    /// Stealth duty cycle.
    #[serde(default)]
    pub stealth: Option<DutyCycleSpec>,
    /// Phase duty cycle.
    #[serde(default)]
    pub phase: Option<DutyCycleSpec>,
    /// Speed multiplier applied while badly hurt.
    #[serde(default)]
    pub berserker_boost: Option<f32>,
}

/// Shared constants of projectile and targeting resolution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Extra distance added to an enemy's size when testing for hits.
    pub hit_margin: f32,
    /// Distance beyond the map edges at which projectiles are discarded.
    pub bounds_margin: f32,
    /// Chance that a tower without hidden detection skips a stealthed enemy.
    pub stealth_miss_chance: f32,
    /// Fraction of the falloff-scaled damage dealt by splash.
    pub splash_ratio: f32,
    /// Health fraction at or below which berserkers speed up.
    pub berserker_threshold: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            hit_margin: 5.0,
            bounds_margin: 50.0,
            stealth_miss_chance: 0.75,
            splash_ratio: 0.5,
            berserker_threshold: 0.5,
        }
    }
}

/// Complete set of tower, enemy and upgrade tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Buildable towers.
    pub towers: Vec<TowerSpec>,
    /// Enemies that waves may spawn.
    pub enemies: Vec<EnemySpec>,
    /// Upgrade multipliers shared by all towers.
    pub upgrades: UpgradeScaling,
    /// Projectile and targeting constants.
    pub combat: CombatTuning,
}

impl Catalog {
    /// Returns the stock catalog shipped with the game.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            towers: standard_towers(),
            enemies: standard_enemies(),
            upgrades: UpgradeScaling::default(),
            combat: CombatTuning::default(),
        }
    }

    /// Looks up the entry for a tower kind.
    #[must_use]
    pub fn tower(&self, kind: TowerKind) -> Option<&TowerSpec> {
        self.towers.iter().find(|spec| spec.kind == kind)
    }

    /// Looks up the entry for an enemy kind.
    #[must_use]
    pub fn enemy(&self, kind: EnemyKind) -> Option<&EnemySpec> {
        self.enemies.iter().find(|spec| spec.kind == kind)
    }

    /// Checks that every kind is listed exactly once and that the tables agree.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in TowerKind::ALL {
            match self.towers.iter().filter(|spec| spec.kind == kind).count() {
                0 => return Err(ConfigError::MissingTower(kind)),
                1 => {}
                _ => return Err(ConfigError::DuplicateTower(kind)),
            }
        }
        for kind in EnemyKind::ALL {
            match self.enemies.iter().filter(|spec| spec.kind == kind).count() {
                0 => return Err(ConfigError::MissingEnemy(kind)),
                1 => {}
                _ => return Err(ConfigError::DuplicateEnemy(kind)),
            }
        }

        let lengths = [
            self.upgrades.damage.len(),
            self.upgrades.range.len(),
            self.upgrades.fire_rate.len(),
            self.upgrades.splash_radius.len(),
        ];
        if lengths[0] == 0 || lengths.iter().any(|length| *length != lengths[0]) {
            return Err(ConfigError::UpgradeTableShape);
        }

        let expected = usize::from(self.upgrades.max_level());
        for spec in &self.towers {
            if spec.stats.fire_rate <= 0.0 {
                return Err(ConfigError::InvalidFireRate(spec.kind));
            }
            if spec.upgrade_costs.len() != expected {
                return Err(ConfigError::UpgradeCostMismatch {
                    kind: spec.kind,
                    expected,
                    actual: spec.upgrade_costs.len(),
                });
            }
        }

        check_probability("stealth_miss_chance", self.combat.stealth_miss_chance)?;
        check_probability("splash_ratio", self.combat.splash_ratio)?;
        check_probability("berserker_threshold", self.combat.berserker_threshold)?;
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn check_probability(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}

fn standard_towers() -> Vec<TowerSpec> {
    let plain = TowerStats {
        damage: 0.0,
        range: 0.0,
        fire_rate: 1.0,
        splash_radius: 0.0,
        projectile_speed: 0.0,
        homing: false,
        piercing: false,
        freeze: None,
        targets_flying: false,
        detects_hidden: false,
    };

    vec![
        TowerSpec {
            kind: TowerKind::Cannon,
            cost: 25,
            stats: TowerStats {
                damage: 25.0,
                range: 80.0,
                fire_rate: 1.5,
                splash_radius: 20.0,
                projectile_speed: 200.0,
                ..plain
            },
            upgrade_costs: vec![20, 35, 50],
        },
        TowerSpec {
            kind: TowerKind::MachineGun,
            cost: 40,
            stats: TowerStats {
                damage: 8.0,
                range: 60.0,
                fire_rate: 5.0,
                projectile_speed: 300.0,
                ..plain
            },
            upgrade_costs: vec![30, 45, 60],
        },
        TowerSpec {
            kind: TowerKind::Missile,
            cost: 60,
            stats: TowerStats {
                damage: 40.0,
                range: 100.0,
                fire_rate: 0.8,
                splash_radius: 15.0,
                projectile_speed: 150.0,
                homing: true,
                targets_flying: true,
                ..plain
            },
            upgrade_costs: vec![45, 65, 90],
        },
        TowerSpec {
            kind: TowerKind::Laser,
            cost: 80,
            stats: TowerStats {
                damage: 15.0,
                range: 120.0,
                fire_rate: 2.0,
                projectile_speed: 400.0,
                piercing: true,
                targets_flying: true,
                detects_hidden: true,
                ..plain
            },
            upgrade_costs: vec![60, 80, 110],
        },
        TowerSpec {
            kind: TowerKind::Frost,
            cost: 50,
            stats: TowerStats {
                damage: 5.0,
                range: 70.0,
                fire_rate: 1.0,
                splash_radius: 25.0,
                projectile_speed: 180.0,
                freeze: Some(FreezePayload {
                    duration: 2.0,
                    slow_multiplier: 0.5,
                }),
                ..plain
            },
            upgrade_costs: vec![35, 50, 70],
        },
    ]
}

fn standard_enemies() -> Vec<EnemySpec> {
    let stealth = DutyCycleSpec {
        duration: 2.0,
        cooldown: 5.0,
    };
    let phase = DutyCycleSpec {
        duration: 1.0,
        cooldown: 8.0,
    };

    vec![
        enemy(EnemyKind::Basic, 50.0, 30.0, 5, 15.0),
        enemy(EnemyKind::Fast, 25.0, 60.0, 8, 12.0),
        enemy(EnemyKind::Heavy, 150.0, 15.0, 15, 20.0),
        EnemySpec {
            flying: true,
            ..enemy(EnemyKind::Flying, 40.0, 40.0, 12, 14.0)
        },
        EnemySpec {
            armor: 5.0,
            ..enemy(EnemyKind::Armored, 120.0, 20.0, 18, 18.0)
        },
        enemy(EnemyKind::Swarm, 15.0, 50.0, 2, 8.0),
        EnemySpec {
            regeneration: 8.0,
            ..enemy(EnemyKind::Regenerator, 90.0, 25.0, 14, 16.0)
        },
        EnemySpec {
            stealth: Some(stealth),
            ..enemy(EnemyKind::Shadow, 60.0, 35.0, 16, 14.0)
        },
        EnemySpec {
            berserker_boost: Some(2.0),
            ..enemy(EnemyKind::Berserker, 100.0, 25.0, 18, 17.0)
        },
        EnemySpec {
            phase: Some(phase),
            ..enemy(EnemyKind::Phantom, 70.0, 30.0, 20, 15.0)
        },
        EnemySpec {
            armor: 3.0,
            regeneration: 3.0,
            ..enemy(EnemyKind::Elite, 200.0, 28.0, 30, 22.0)
        },
        EnemySpec {
            armor: 8.0,
            splash_immune: true,
            ..enemy(EnemyKind::Titan, 600.0, 12.0, 60, 30.0)
        },
        EnemySpec {
            armor: 5.0,
            regeneration: 5.0,
            splash_immune: true,
            ..enemy(EnemyKind::Boss, 1000.0, 15.0, 100, 30.0)
        },
    ]
}

fn enemy(kind: EnemyKind, health: f32, speed: f32, reward: u32, size: f32) -> EnemySpec {
    EnemySpec {
        kind,
        health,
        speed,
        reward,
        size,
        armor: 0.0,
        regeneration: 0.0,
        flying: false,
        splash_immune: false,
        stealth: None,
        phase: None,
        berserker_boost: None,
    }
}
