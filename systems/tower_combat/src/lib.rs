#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits projectile firing commands from targeting data.

use path_defence_core::{Command, PlayState, TowerId, TowerSnapshot, TowerTarget, TowerView};

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a `Command::FireProjectile` for every engaged tower whose
    /// cooldown has elapsed. Targets naming unknown towers are dropped.
    pub fn handle(
        &mut self,
        play_state: PlayState,
        towers: &TowerView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if play_state != PlayState::Playing || tower_targets.is_empty() {
            return;
        }

        let snapshots = towers.as_slice();
        self.scratch.clear();
        self.scratch.extend(
            tower_targets
                .iter()
                .filter(|target| {
                    find_tower(snapshots, target.tower).is_some_and(|tower| tower.ready)
                })
                .map(|target| Command::FireProjectile {
                    tower: target.tower,
                    target: target.enemy,
                }),
        );

        out.append(&mut self.scratch);
    }
}

fn find_tower(towers: &[TowerSnapshot], tower: TowerId) -> Option<&TowerSnapshot> {
    let index = towers
        .binary_search_by_key(&tower, |snapshot| snapshot.id)
        .ok()?;
    towers.get(index)
}
