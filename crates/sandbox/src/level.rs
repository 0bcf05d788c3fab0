//! Blockout level: flat floor, raised platforms, pools, ladders and ledges.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use strider_movement::{
    EntityId, LadderMount, LedgeFlags, LedgeId, LedgeInfo, LedgeQuery, WaterQuery,
};

/// Height difference the floor probe still snaps onto.
pub const STEP_HEIGHT: f32 = 0.5;

/// First collider id handed out to platforms. The floor has none.
pub const PLATFORM_ID_BASE: EntityId = 100;

/// Axis-aligned footprint on the XY plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub min: Vec2,
    pub max: Vec2,
}

impl Footprint {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    #[inline]
    pub fn contains(&self, position: Vec3) -> bool {
        position.x >= self.min.x
            && position.x <= self.max.x
            && position.y >= self.min.y
            && position.y <= self.max.y
    }
}

/// A solid block whose top can be stood on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub footprint: Footprint,
    pub top: f32,
}

/// A water volume with a flat surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub footprint: Footprint,
    pub surface: f32,
}

/// Level geometry the sandbox simulates against.
#[derive(Debug, Clone, Default)]
pub struct Level {
    /// Height of the infinite floor.
    pub floor: f32,
    pub platforms: Vec<Platform>,
    pub pools: Vec<Pool>,
    pub ladders: Vec<LadderMount>,
    pub ledges: Vec<LedgeInfo>,
}

impl Level {
    /// Empty floor at height zero.
    pub fn flat() -> Self {
        Self::default()
    }

    /// A small course with one of everything, laid out along +Y:
    /// a grabbable wall, a pool and a ladder up to a tower.
    pub fn test_course() -> Self {
        let mut level = Self::flat();

        // Wall with a grabbable edge 1.5 m up.
        level.add_platform(Vec2::new(-3.0, 1.0), Vec2::new(3.0, 4.0), 1.5);
        level.add_ledge(LedgeInfo {
            position: Vec3::new(0.0, 1.0, 1.5),
            facing: -Vec3::Y,
            flags: LedgeFlags::default(),
        });

        level.add_pool(Vec2::new(-5.0, 10.0), Vec2::new(5.0, 30.0), 2.0);

        // Tower reached by a ladder on its south face.
        level.add_platform(Vec2::new(-3.0, 41.0), Vec2::new(3.0, 45.0), 3.0);
        level.add_ladder(LadderMount {
            bottom: Vec3::new(0.0, 41.0, 0.0),
            height: 3.0,
            facing: -Vec3::Y,
        });

        level
    }

    pub fn add_platform(&mut self, min: Vec2, max: Vec2, top: f32) -> usize {
        self.platforms.push(Platform {
            footprint: Footprint::new(min, max),
            top,
        });
        self.platforms.len() - 1
    }

    pub fn add_pool(&mut self, min: Vec2, max: Vec2, surface: f32) -> usize {
        self.pools.push(Pool {
            footprint: Footprint::new(min, max),
            surface,
        });
        self.pools.len() - 1
    }

    pub fn add_ladder(&mut self, mount: LadderMount) -> usize {
        self.ladders.push(mount);
        self.ladders.len() - 1
    }

    pub fn add_ledge(&mut self, info: LedgeInfo) -> LedgeId {
        self.ledges.push(info);
        (self.ledges.len() - 1) as LedgeId
    }

    /// Move a ledge, e.g. one riding a moving platform.
    pub fn move_ledge(&mut self, id: LedgeId, position: Vec3) {
        if let Some(ledge) = self.ledges.get_mut(id as usize) {
            ledge.position = position;
        }
    }

    /// Highest surface below `position` that can be stood on, and the
    /// collider it belongs to.
    pub fn support(&self, position: Vec3) -> (f32, Option<EntityId>) {
        self.platforms
            .iter()
            .enumerate()
            .filter(|(_, platform)| {
                platform.footprint.contains(position) && platform.top <= position.z + STEP_HEIGHT
            })
            .map(|(index, platform)| (platform.top, Some(PLATFORM_ID_BASE + index as EntityId)))
            .fold((self.floor, None), |best, candidate| {
                if candidate.0 > best.0 {
                    candidate
                } else {
                    best
                }
            })
    }

    /// Ladder whose foot is within `radius` horizontally of `position`.
    pub fn ladder_near(&self, position: Vec3, radius: f32) -> Option<LadderMount> {
        self.ladders
            .iter()
            .copied()
            .find(|ladder| {
                let offset = ladder.bottom - position;
                Vec2::new(offset.x, offset.y).length() <= radius
            })
    }
}

impl LedgeQuery for Level {
    fn find_nearest_ledge(&self, position: Vec3, radius: f32) -> Option<LedgeId> {
        self.ledges
            .iter()
            .enumerate()
            .map(|(id, ledge)| (id, ledge.position.distance(position)))
            .filter(|&(_, distance)| distance <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id as LedgeId)
    }

    fn ledge(&self, id: LedgeId) -> Option<LedgeInfo> {
        self.ledges.get(id as usize).copied()
    }
}

impl WaterQuery for Level {
    fn water_level(&self, position: Vec3) -> Option<f32> {
        self.pools
            .iter()
            .filter(|pool| pool.footprint.contains(position))
            .map(|pool| pool.surface)
            .reduce(f32::max)
    }

    fn ground_level(&self, position: Vec3) -> Option<f32> {
        Some(self.support(position).0)
    }
}
