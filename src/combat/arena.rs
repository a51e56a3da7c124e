//! Combat Arena
//!
//! Holds the targets and obstacles the combat core works against, together
//! with their broad-phase indices. Targets move every frame, so their index
//! is rebuilt on each simulation call; obstacles are static and indexed once.

use std::collections::BTreeMap;

use crate::core::vec3::Vec3;
use crate::combat::spatial::{SpatialIndex, DEFAULT_CELL_SIZE};
use crate::combat::target::{Collider, Obstacle, ObstacleId, Target, TargetId};

/// Reusable query buffers. Owned by the simulation so per-frame queries do
/// not allocate once warmed up.
#[derive(Debug, Default)]
pub struct QueryScratch {
    /// Target slots returned by the last target query
    pub targets: Vec<usize>,
    /// Obstacles returned by the last obstacle query
    pub obstacles: Vec<ObstacleId>,
    /// Candidate ordering buffer: (sort key, target slot)
    pub ordered: Vec<(f32, usize)>,
    /// Chain members for chain-electrical weapons
    pub chain: Vec<usize>,
}

/// Targets, obstacles and their indices.
#[derive(Debug)]
pub struct Arena {
    /// Targets, addressed by slot. The caller may move, add or remove targets
    /// between simulation calls.
    pub targets: Vec<Target>,
    obstacles: BTreeMap<ObstacleId, Obstacle>,
    obstacle_index: SpatialIndex<ObstacleId>,
    target_index: SpatialIndex<usize>,
    next_obstacle_id: u32,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl Arena {
    /// Create an empty arena with the given grid cell size.
    pub fn new(cell_size: f32) -> Self {
        Self {
            targets: Vec::new(),
            obstacles: BTreeMap::new(),
            obstacle_index: SpatialIndex::new(cell_size),
            target_index: SpatialIndex::new(cell_size),
            next_obstacle_id: 0,
        }
    }

    /// Add a target. Returns its slot.
    pub fn add_target(&mut self, target: Target) -> usize {
        self.targets.push(target);
        self.targets.len() - 1
    }

    /// Find a target by id.
    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    /// Find a target by id (mutable).
    pub fn target_mut(&mut self, id: TargetId) -> Option<&mut Target> {
        self.targets.iter_mut().find(|t| t.id == id)
    }

    /// Add a static obstacle and index it.
    pub fn add_obstacle(&mut self, position: Vec3, collider: Collider) -> ObstacleId {
        let id = ObstacleId(self.next_obstacle_id);
        self.next_obstacle_id += 1;

        let obstacle = Obstacle { id, position, collider };
        self.obstacle_index.insert(id, &obstacle);
        self.obstacles.insert(id, obstacle);
        id
    }

    /// Remove an obstacle from the arena and from every indexed cell.
    pub fn remove_obstacle(&mut self, id: ObstacleId) -> bool {
        match self.obstacles.remove(&id) {
            Some(obstacle) => self.obstacle_index.remove(id, &obstacle),
            None => false,
        }
    }

    /// Look up an obstacle.
    pub fn obstacle(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.get(&id)
    }

    /// Number of obstacles.
    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    /// Rebuild the target index from current target positions.
    pub fn reindex_targets(&mut self) {
        self.target_index.clear();
        for (slot, target) in self.targets.iter().enumerate() {
            self.target_index.insert(slot, target);
        }
    }

    /// Broad-phase target query. Results go into `out`.
    pub fn query_targets(&self, center: Vec3, radius: f32, out: &mut Vec<usize>) {
        self.target_index.query_radius_into(center, radius, out);
    }

    /// Broad-phase obstacle query. Results go into `out`.
    pub fn query_obstacles(&self, center: Vec3, radius: f32, out: &mut Vec<ObstacleId>) {
        self.obstacle_index.query_radius_into(center, radius, out);
    }

    /// Count of targets still alive.
    pub fn alive_count(&self) -> usize {
        self.targets.iter().filter(|t| t.is_alive()).count()
    }
}

// =============================================================================
// TESTS
// =============================================================================
