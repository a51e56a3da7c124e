//! Projectile Pool
//!
//! Growth-on-demand pool of projectile records. Released slots go onto a free
//! list and are reused by the next `acquire`. The backing store never shrinks,
//! so firing does not allocate once the pool has grown to its working size.

use serde::{Serialize, Deserialize};

use crate::core::vec3::Vec3;
use crate::combat::effects::{MarkerHandle, WorldEffects};
use crate::combat::target::TargetId;
use crate::combat::weapon::WeaponId;

/// Handle to a pool slot. Stable for the lifetime of the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectileHandle(pub u32);

impl ProjectileHandle {
    /// Slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Flight model of a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProjectileKind {
    /// Straight-line, swept against targets
    Bullet = 0,
    /// Parabolic, detonates on landing
    Throwable = 1,
}

/// A pooled projectile record.
#[derive(Clone, Debug)]
pub struct Projectile {
    /// Flight model
    pub kind: ProjectileKind,
    /// Weapon that fired it
    pub weapon_id: WeaponId,
    /// Velocity in units/second
    pub velocity: Vec3,
    /// Position at creation
    pub spawn_origin: Vec3,
    /// Current position
    pub position: Vec3,
    /// Current damage (decays for piercing bullets)
    pub damage: f32,
    /// Seconds until forced expiry
    pub remaining_life: f32,
    /// Area radius (throwables only)
    pub max_area_radius: Option<f32>,
    /// Targets already damaged this flight
    pub hit_set: Vec<TargetId>,
    /// Inactive slots are free for reuse
    pub active: bool,
    /// Landing preview marker (throwables only)
    pub ground_marker: Option<MarkerHandle>,
    /// Predicted landing point (throwables only)
    pub landing_point: Option<Vec3>,
    /// Visual spin angle
    pub spin: f32,
    /// Seconds since launch
    pub age: f32,
}

impl Projectile {
    fn new(kind: ProjectileKind, weapon_id: WeaponId) -> Self {
        Self {
            kind,
            weapon_id,
            velocity: Vec3::ZERO,
            spawn_origin: Vec3::ZERO,
            position: Vec3::ZERO,
            damage: 0.0,
            remaining_life: 0.0,
            max_area_radius: None,
            hit_set: Vec::new(),
            active: true,
            ground_marker: None,
            landing_point: None,
            spin: 0.0,
            age: 0.0,
        }
    }

    /// Overwrite every field for a new flight. The hit set keeps its allocation.
    fn reset(&mut self, kind: ProjectileKind, weapon_id: WeaponId) {
        self.kind = kind;
        self.weapon_id = weapon_id;
        self.velocity = Vec3::ZERO;
        self.spawn_origin = Vec3::ZERO;
        self.position = Vec3::ZERO;
        self.damage = 0.0;
        self.remaining_life = 0.0;
        self.max_area_radius = None;
        self.hit_set.clear();
        self.active = true;
        self.ground_marker = None;
        self.landing_point = None;
        self.spin = 0.0;
        self.age = 0.0;
    }

    /// Place the projectile at `origin` with the given velocity.
    pub fn launch(&mut self, origin: Vec3, velocity: Vec3, damage: f32, life: f32) {
        self.spawn_origin = origin;
        self.position = origin;
        self.velocity = velocity;
        self.damage = damage;
        self.remaining_life = life;
    }

    /// Has this target already been damaged by this projectile?
    #[inline]
    pub fn has_hit(&self, id: TargetId) -> bool {
        self.hit_set.contains(&id)
    }
}

/// Pool of projectile slots with a free list.
#[derive(Debug, Default)]
pub struct ProjectilePool {
    slots: Vec<Projectile>,
    free_list: Vec<u32>,
    active_count: usize,
}

impl ProjectilePool {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool with `capacity` slots pre-allocated (all inactive).
    pub fn with_capacity(capacity: usize) -> Self {
        let mut pool = Self::new();
        for i in (0..capacity).rev() {
            let mut slot = Projectile::new(ProjectileKind::Bullet, WeaponId::default());
            slot.active = false;
            pool.slots.push(slot);
            pool.free_list.push(i as u32);
        }
        pool
    }

    /// Take an inactive slot (or grow) and reset it for `kind`.
    pub fn acquire(&mut self, kind: ProjectileKind, weapon_id: WeaponId) -> ProjectileHandle {
        self.active_count += 1;

        if let Some(index) = self.free_list.pop() {
            self.slots[index as usize].reset(kind, weapon_id);
            return ProjectileHandle(index);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Projectile::new(kind, weapon_id));
        ProjectileHandle(index)
    }

    /// Deactivate a slot, hide its marker and detach its visual.
    ///
    /// Returns false if the slot was already inactive or out of range.
    pub fn release(&mut self, handle: ProjectileHandle, fx: &mut dyn WorldEffects) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index()) else {
            return false;
        };
        if !slot.active {
            return false;
        }

        slot.active = false;
        if let Some(marker) = slot.ground_marker.take() {
            fx.hide_ground_marker(marker);
        }
        fx.detach_projectile_visual(handle);

        self.free_list.push(handle.0);
        self.active_count -= 1;
        true
    }

    /// Release every active slot.
    pub fn release_all(&mut self, fx: &mut dyn WorldEffects) -> usize {
        let mut released = 0;
        for index in (0..self.slots.len()).rev() {
            if self.release(ProjectileHandle(index as u32), fx) {
                released += 1;
            }
        }
        released
    }

    /// Slot by handle.
    pub fn get(&self, handle: ProjectileHandle) -> Option<&Projectile> {
        self.slots.get(handle.index())
    }

    /// Slot by handle (mutable).
    pub fn get_mut(&mut self, handle: ProjectileHandle) -> Option<&mut Projectile> {
        self.slots.get_mut(handle.index())
    }

    /// Number of slots ever allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of active slots.
    #[inline]
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Iterate active projectiles in slot order.
    pub fn iter_active(&self) -> impl Iterator<Item = (ProjectileHandle, &Projectile)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, p)| p.active)
            .map(|(i, p)| (ProjectileHandle(i as u32), p))
    }
}

// =============================================================================
// TESTS
// =============================================================================
