//! Authoritative tower state management utilities.

use std::collections::BTreeMap;

use glam::Vec2;
use path_defence_core::{
    CellCoord, EnemyId, TowerId, TowerKind, TowerSnapshot, TowerSpec, TowerStats, UpgradeScaling,
};

use crate::projectiles::Projectile;

/// Tower stored inside the world together with its projectiles.
#[derive(Clone, Debug)]
pub(crate) struct Tower {
    id: TowerId,
    kind: TowerKind,
    cell: CellCoord,
    center: Vec2,
    base: TowerStats,
    level: u8,
    stats: TowerStats,
    since_last_shot: f32,
    pub(crate) projectiles: Vec<Projectile>,
}

impl Tower {
    fn new(id: TowerId, spec: &TowerSpec, cell: CellCoord, center: Vec2) -> Self {
        Self {
            id,
            kind: spec.kind,
            cell,
            center,
            base: spec.stats,
            level: 0,
            stats: spec.stats,
            since_last_shot: 0.0,
            projectiles: Vec::new(),
        }
    }

    pub(crate) fn id(&self) -> TowerId {
        self.id
    }

    pub(crate) fn kind(&self) -> TowerKind {
        self.kind
    }

    pub(crate) fn level(&self) -> u8 {
        self.level
    }

    /// Re-derives effective stats from the base stats and current level.
    pub(crate) fn recompute_stats(&mut self, scaling: &UpgradeScaling) {
        self.stats = scaling.apply(&self.base, self.level);
    }

    /// Raises the level by one unless the tables are exhausted.
    pub(crate) fn upgrade(&mut self, scaling: &UpgradeScaling) -> bool {
        if self.level >= scaling.max_level() {
            return false;
        }
        self.level += 1;
        self.recompute_stats(scaling);
        true
    }

    pub(crate) fn advance_cooldown(&mut self, dt: f32) {
        self.since_last_shot = (self.since_last_shot + dt).min(self.stats.cooldown());
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.since_last_shot >= self.stats.cooldown()
    }

    /// Launches a projectile at `aim` and restarts the cooldown.
    pub(crate) fn fire(&mut self, target: EnemyId, aim: Vec2) {
        self.projectiles
            .push(Projectile::launch(self.center, aim, target, &self.stats));
        self.since_last_shot = 0.0;
    }

    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            cell: self.cell,
            center: self.center,
            upgrade_level: self.level,
            stats: self.stats,
            ready: self.is_ready(),
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, Tower>,
    cells: BTreeMap<CellCoord, TowerId>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            cells: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Stores a level-zero tower on the cell and returns its identifier.
    pub(crate) fn insert(&mut self, spec: &TowerSpec, cell: CellCoord, center: Vec2) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().wrapping_add(1));
        let _ = self.cells.insert(cell, id);
        let _ = self.entries.insert(id, Tower::new(id, spec, cell, center));
        id
    }

    pub(crate) fn is_occupied(&self, cell: CellCoord) -> bool {
        self.cells.contains_key(&cell)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn at(&self, cell: CellCoord) -> Option<&Tower> {
        self.cells.get(&cell).and_then(|id| self.entries.get(id))
    }

    pub(crate) fn at_mut(&mut self, cell: CellCoord) -> Option<&mut Tower> {
        let id = *self.cells.get(&cell)?;
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tower> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tower> {
        self.entries.values_mut()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.cells.clear();
        self.next_tower_id = TowerId::new(0);
    }
}
