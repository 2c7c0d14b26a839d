use std::time::Duration;

use path_defence_core::{
    CellCoord, Command, EnemyKind, Event, GameConfig, LevelLayout, PlayState, SessionRules,
    TowerKind, WaveSpec,
};
use path_defence_system_tower_combat::TowerCombat;
use path_defence_system_tower_targeting::TowerTargeting;
use path_defence_world::{self as world, query, World};

fn corridor() -> LevelLayout {
    LevelLayout {
        name: "Corridor".to_owned(),
        columns: 20,
        rows: 4,
        cell_size: 40.0,
        waypoints: vec![CellCoord::new(0, 1), CellCoord::new(19, 1)],
        waves: vec![WaveSpec::new(1.0, [(EnemyKind::Heavy, 2)])],
    }
}

struct Harness {
    world: World,
    targeting: TowerTargeting,
    combat: TowerCombat,
}

impl Harness {
    fn new(tower: TowerKind, cell: CellCoord, enemies: &[EnemyKind]) -> Self {
        let config = GameConfig {
            rules: SessionRules {
                starting_gold: 500,
                ..SessionRules::default()
            },
            ..GameConfig::with_level(corridor())
        };
        let mut world = World::new(config).expect("corridor is valid");
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::SetPlayState {
                state: PlayState::Playing,
            },
            &mut events,
        );
        world::apply(&mut world, Command::PlaceTower { kind: tower, cell }, &mut events);
        for kind in enemies {
            world::apply(&mut world, Command::SpawnEnemy { kind: *kind }, &mut events);
        }
        assert!(
            events
                .iter()
                .any(|event| matches!(event, Event::TowerPlaced { .. })),
            "tower placement failed: {events:?}"
        );

        Self {
            world,
            targeting: TowerTargeting::new(11),
            combat: TowerCombat::new(),
        }
    }

    fn step(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
            &mut events,
        );

        let play_state = query::play_state(&self.world);
        let towers = query::tower_view(&self.world);
        let mut targets = Vec::new();
        self.targeting.handle(
            play_state,
            &towers,
            &query::enemy_view(&self.world),
            query::catalog(&self.world).combat.stealth_miss_chance,
            &mut targets,
        );

        let mut commands = Vec::new();
        self.combat.handle(play_state, &towers, &targets, &mut commands);
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        events
    }

    fn health(&self) -> Vec<f32> {
        query::enemy_view(&self.world)
            .iter()
            .map(|enemy| enemy.health)
            .collect()
    }

    fn run_until_first_impact(&mut self) -> Vec<f32> {
        for _ in 0..50 {
            let _ = self.step();
            let health = self.health();
            if health.iter().any(|value| *value < 150.0) {
                return health;
            }
        }
        panic!("no projectile connected");
    }
}

#[test]
fn piercing_projectile_strikes_every_stacked_enemy() {
    let mut harness = Harness::new(
        TowerKind::Laser,
        CellCoord::new(2, 0),
        &[EnemyKind::Heavy, EnemyKind::Heavy],
    );

    assert_eq!(harness.run_until_first_impact(), vec![135.0, 135.0]);
}

#[test]
fn plain_projectile_stops_at_the_first_enemy() {
    let mut harness = Harness::new(
        TowerKind::MachineGun,
        CellCoord::new(1, 0),
        &[EnemyKind::Heavy, EnemyKind::Heavy],
    );

    let mut health = harness.run_until_first_impact();
    health.sort_by(f32::total_cmp);
    assert_eq!(health, vec![142.0, 150.0]);
}

#[test]
fn towers_fire_only_once_their_cooldown_elapses() {
    let mut harness = Harness::new(TowerKind::Cannon, CellCoord::new(1, 0), &[EnemyKind::Heavy]);

    let mut fired_on = Vec::new();
    for tick in 0..20 {
        let events = harness.step();
        if events
            .iter()
            .any(|event| matches!(event, Event::ProjectileFired { .. }))
        {
            fired_on.push(tick);
        }
    }

    assert!(fired_on.len() >= 2, "cannon fired {fired_on:?}");
    for pair in fired_on.windows(2) {
        assert!(pair[1] - pair[0] >= 6, "cooldown not honoured: {fired_on:?}");
    }
}
