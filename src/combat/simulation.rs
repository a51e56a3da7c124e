//! Combat Simulation
//!
//! Caller-facing façade. Owns the projectile pool, fire zones, weapon and
//! impact registries, tunables, RNG and query buffers. Targets and obstacles
//! live in the caller's [`Arena`]; side effects go to the caller's
//! [`WorldEffects`].
//!
//! Frame flow:
//!
//! ```text
//! fire_bullet / fire_throwable   once per discrete weapon action
//! update_continuous              every tick a continuous trigger is held
//! update(dt, now)                every tick:
//!   1. rebuild target index
//!   2. step projectiles (backward), release finished slots
//!   3. dispatch throwable impacts
//!   4. tick fire zones
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::core::vec3::Vec3;
use crate::combat::arena::{Arena, QueryScratch};
use crate::combat::ballistics::{self, ThrowableOutcome};
use crate::combat::continuous;
use crate::combat::effects::{NoiseTag, ParticleKind, SoundCue, WorldEffects};
use crate::combat::impact::{ImpactContext, ImpactRegistry};
use crate::combat::projectile::{ProjectileHandle, ProjectileKind, ProjectilePool};
use crate::combat::spatial::DEFAULT_CELL_SIZE;
use crate::combat::weapon::{WeaponFamily, WeaponId, WeaponSpec, WeaponTable};
use crate::combat::zone::ZoneField;

const MUZZLE_PARTICLES: u32 = 3;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Combat tunables.
///
/// Every field has a default, so a JSON file only needs the values it
/// overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Grid cell size of both spatial indices
    pub cell_size: f32,

    /// Probe radius for bullet-vs-obstacle queries
    pub obstacle_probe_radius: f32,
    /// Added to the travelled distance for bullet target queries
    pub target_query_margin: f32,
    /// Bullet hit radius at unit target scale
    pub bullet_hit_radius: f32,
    /// Piercing bullets below this damage are spent
    pub pierce_damage_floor: f32,
    /// Lower bound on target mass in knockback division
    pub min_knockback_mass: f32,
    /// Bullet knockback per unit of damage/mass
    pub bullet_knockback_scale: f32,
    /// AI-awareness radius of gunfire
    pub gunfire_noise_radius: f32,

    /// Downward acceleration of throwables
    pub gravity: f32,
    /// Flight time of every throw in seconds
    pub throw_flight_time: f32,
    /// Throwables detonate after this many seconds regardless of height
    pub throwable_max_life: f32,
    /// Height at which a throwable counts as landed
    pub ground_epsilon: f32,
    /// Visual spin in radians/second
    pub throwable_spin_rate: f32,
    /// Landing marker pulse speed
    pub marker_pulse_rate: f32,

    /// Extra query radius around explosions
    pub explosion_query_margin: f32,
    /// Death force magnitude at the blast center
    pub explosion_force: f32,
    /// Vertical component added to the outward death force
    pub explosion_upward_bias: f32,
    /// Knockback on targets surviving a blast
    pub explosion_knockback: f32,
    /// AI-awareness radius of explosions
    pub explosion_noise_radius: f32,

    /// Lifetime of fire zones in seconds
    pub fire_zone_life: f32,
    /// Seconds between fire zone damage ticks
    pub fire_tick_interval: f64,
    /// Damage per fire zone tick
    pub fire_tick_damage: f32,
    /// Ambient particles per zone per frame
    pub fire_zone_particles: u32,
    /// Burning duration applied by fire
    pub burn_duration: f32,

    /// Cosine of the flame cone half-angle (25 degrees)
    pub flame_cone_cos: f32,
    /// Particles per flame tick
    pub flame_particles: u32,

    /// Cosine of the chain first-target cone half-angle (18 degrees)
    pub chain_cone_cos: f32,
    /// Maximum hop distance between chain members
    pub chain_radius: f32,
    /// Maximum chain length
    pub max_chain: usize,
    /// Stun split across the chain
    pub chain_base_stun: f32,

    /// RNG seed (pellet spread, flame rolls)
    pub rng_seed: u64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,

            obstacle_probe_radius: 2.0,
            target_query_margin: 5.0,
            bullet_hit_radius: 1.2,
            pierce_damage_floor: 15.0,
            min_knockback_mass: 0.3,
            bullet_knockback_scale: 0.05,
            gunfire_noise_radius: 40.0,

            gravity: 20.0,
            throw_flight_time: 1.0,
            throwable_max_life: 5.0,
            ground_epsilon: 0.05,
            throwable_spin_rate: 12.0,
            marker_pulse_rate: 6.0,

            explosion_query_margin: 3.0,
            explosion_force: 25.0,
            explosion_upward_bias: 0.6,
            explosion_knockback: 8.0,
            explosion_noise_radius: 80.0,

            fire_zone_life: 6.0,
            fire_tick_interval: 0.5,
            fire_tick_damage: 6.0,
            fire_zone_particles: 2,
            burn_duration: 3.0,

            flame_cone_cos: 0.9063, // cos 25°
            flame_particles: 4,

            chain_cone_cos: 0.9511, // cos 18°
            chain_radius: 8.0,
            max_chain: 5,
            chain_base_stun: 1.5,

            rng_seed: 0x5EED,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("Failed to read combat config: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON.
    #[error("Malformed combat config: {0}")]
    Json(#[from] serde_json::Error),

    /// A value out of range.
    #[error("Invalid combat config field `{field}`: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong
        reason: &'static str,
    },
}

impl CombatConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid { field, reason: "must be positive and finite" })
            }
        }

        fn cosine(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if (-1.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::Invalid { field, reason: "must be in [-1, 1]" })
            }
        }

        positive("cell_size", self.cell_size)?;
        positive("bullet_hit_radius", self.bullet_hit_radius)?;
        positive("min_knockback_mass", self.min_knockback_mass)?;
        positive("gravity", self.gravity)?;
        positive("throw_flight_time", self.throw_flight_time)?;
        positive("throwable_max_life", self.throwable_max_life)?;
        positive("chain_radius", self.chain_radius)?;
        cosine("flame_cone_cos", self.flame_cone_cos)?;
        cosine("chain_cone_cos", self.chain_cone_cos)?;

        if !(self.fire_tick_interval > 0.0 && self.fire_tick_interval.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "fire_tick_interval",
                reason: "must be positive and finite",
            });
        }
        if self.max_chain == 0 {
            return Err(ConfigError::Invalid { field: "max_chain", reason: "must be at least 1" });
        }
        Ok(())
    }
}

// =============================================================================
// FRAME REPORT
// =============================================================================

/// Summary of one `update` call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Bullets advanced this frame
    pub bullets_stepped: u32,
    /// Throwables that landed this frame
    pub throwables_landed: u32,
    /// Targets affected by impact behaviors
    pub impact_targets: u32,
    /// Pool slots released this frame
    pub released: u32,
    /// Fire zone damage ticks applied
    pub zone_ticks: u32,
    /// Fire zones alive after the frame
    pub zones_active: u32,
    /// Projectiles still in flight after the frame
    pub projectiles_active: u32,
}

// =============================================================================
// SIMULATION
// =============================================================================

/// Projectile and area-effect combat simulation.
#[derive(Debug)]
pub struct CombatSimulation {
    config: CombatConfig,
    weapons: WeaponTable,
    impacts: ImpactRegistry,
    pool: ProjectilePool,
    zones: ZoneField,
    rng: DeterministicRng,
    scratch: QueryScratch,
    /// Remaining cooldown of chain weapons while the trigger is held
    discharge_cooldowns: BTreeMap<WeaponId, f32>,
    frame: u64,
}

impl CombatSimulation {
    /// Create a simulation with explicit registries.
    pub fn new(config: CombatConfig, weapons: WeaponTable, impacts: ImpactRegistry) -> Self {
        let rng = DeterministicRng::new(config.rng_seed);
        Self {
            config,
            weapons,
            impacts,
            pool: ProjectilePool::new(),
            zones: ZoneField::new(),
            rng,
            scratch: QueryScratch::default(),
            discharge_cooldowns: BTreeMap::new(),
            frame: 0,
        }
    }

    /// Create a simulation with the standard impact behaviors.
    pub fn with_standard_impacts(config: CombatConfig, weapons: WeaponTable) -> Self {
        Self::new(config, weapons, ImpactRegistry::standard())
    }

    /// Arena sized for this simulation's grid.
    pub fn new_arena(&self) -> Arena {
        Arena::new(self.config.cell_size)
    }

    /// Fire a bullet weapon. Returns the number of pellets launched.
    pub fn fire_bullet(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        weapon_id: WeaponId,
        fx: &mut dyn WorldEffects,
    ) -> usize {
        let Some(weapon) = self.weapons.get_usable(weapon_id, |f| f == WeaponFamily::Ballistic) else {
            return 0;
        };

        let aim = direction.horizontal().normalize();
        if aim == Vec3::ZERO {
            debug!("Zero aim for {:?}, no shot", weapon_id);
            return 0;
        }

        let (speed, damage, lifetime, pellets, spread) = (
            weapon.projectile_speed,
            weapon.damage,
            weapon.lifetime,
            weapon.pellets,
            weapon.spread,
        );

        for _ in 0..pellets {
            let angle = self.rng.spread(spread);
            let velocity = aim.rotate_y(angle) * speed;

            let handle = self.pool.acquire(ProjectileKind::Bullet, weapon_id);
            if let Some(bullet) = self.pool.get_mut(handle) {
                bullet.launch(origin, velocity, damage, lifetime);
            }
            fx.attach_projectile_visual(handle, ProjectileKind::Bullet, weapon_id);
        }

        fx.spawn_particles(origin, ParticleKind::Muzzle, MUZZLE_PARTICLES);
        fx.play_sound(SoundCue::Gunshot);
        fx.emit_noise(origin, self.config.gunfire_noise_radius, NoiseTag::Gunfire);

        pellets as usize
    }

    /// Throw a throwable weapon with `charge` in [0, 1].
    pub fn fire_throwable(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        weapon_id: WeaponId,
        charge: f32,
        fx: &mut dyn WorldEffects,
    ) -> Option<ProjectileHandle> {
        let weapon = self.weapons.get_usable(weapon_id, WeaponFamily::is_throwable)?;

        let distance = weapon.throw_distance(charge);
        let Some(solution) = ballistics::solve_throw(
            origin,
            direction,
            distance,
            self.config.throw_flight_time,
            self.config.gravity,
        ) else {
            debug!("Zero aim for {:?}, no throw", weapon_id);
            return None;
        };

        let (damage, radius) = (weapon.damage, weapon.area_radius);
        let handle = self.pool.acquire(ProjectileKind::Throwable, weapon_id);
        let marker = fx.show_ground_marker(solution.landing_point, radius);

        let throwable = self.pool.get_mut(handle)?;
        throwable.launch(origin, solution.velocity, damage, self.config.throwable_max_life);
        throwable.max_area_radius = Some(radius);
        throwable.landing_point = Some(solution.landing_point);
        throwable.ground_marker = marker;

        fx.attach_projectile_visual(handle, ProjectileKind::Throwable, weapon_id);
        fx.play_sound(SoundCue::Throw);
        trace!("Throw {:?} toward {}", weapon_id, solution.landing_point);

        Some(handle)
    }

    /// One tick of a held continuous weapon.
    ///
    /// Returns the number of targets affected (flame: inside the cone;
    /// chain: chain length).
    pub fn update_continuous(
        &mut self,
        weapon_id: WeaponId,
        origin: Vec3,
        direction: Vec3,
        dt: f32,
        arena: &mut Arena,
        fx: &mut dyn WorldEffects,
    ) -> usize {
        if !dt.is_finite() || dt < 0.0 {
            warn!("Rejected continuous tick with dt = {}", dt);
            return 0;
        }
        let Some(weapon) = self.weapons.get_usable(weapon_id, WeaponFamily::is_continuous) else {
            return 0;
        };
        if direction.horizontal().normalize() == Vec3::ZERO {
            debug!("Zero aim for {:?}, no effect", weapon_id);
            return 0;
        }

        arena.reindex_targets();

        match weapon.family {
            WeaponFamily::Flame => continuous::fire_flame(
                weapon,
                origin,
                direction,
                dt,
                arena,
                &self.config,
                &mut self.rng,
                &mut self.scratch,
                fx,
            ),
            WeaponFamily::Chain => {
                let cooldown = self.discharge_cooldowns.entry(weapon_id).or_insert(0.0);
                *cooldown -= dt;
                if *cooldown > 0.0 {
                    return 0;
                }
                *cooldown = (*cooldown + weapon.fire_rate).max(0.0);
                continuous::fire_chain(weapon, origin, direction, arena, &self.config, &mut self.scratch, fx)
            }
            _ => 0,
        }
    }

    /// Advance every projectile and fire zone by `dt` seconds. `now` is the
    /// caller's clock, used for the fire zone cadence.
    pub fn update(&mut self, dt: f32, now: f64, arena: &mut Arena, fx: &mut dyn WorldEffects) -> FrameReport {
        let mut report = FrameReport::default();
        if !dt.is_finite() || dt < 0.0 || !now.is_finite() {
            warn!("Rejected frame with dt = {}, now = {}", dt, now);
            return report;
        }

        self.frame += 1;
        arena.reindex_targets();

        for index in (0..self.pool.capacity()).rev() {
            let handle = ProjectileHandle(index as u32);
            let Some(projectile) = self.pool.get_mut(handle) else {
                continue;
            };
            if !projectile.active {
                continue;
            }

            let Some(weapon) = self.weapons.get(projectile.weapon_id) else {
                self.pool.release(handle, fx);
                report.released += 1;
                continue;
            };

            match projectile.kind {
                ProjectileKind::Bullet => {
                    report.bullets_stepped += 1;
                    let outcome = ballistics::step_bullet(
                        projectile,
                        weapon,
                        dt,
                        arena,
                        &self.config,
                        &mut self.scratch,
                        fx,
                    );
                    if outcome.is_finished() {
                        trace!("Bullet {:?} finished: {:?}", handle, outcome);
                        self.pool.release(handle, fx);
                        report.released += 1;
                    } else {
                        fx.sync_projectile_visual(handle, projectile.position, projectile.spin);
                    }
                }
                ProjectileKind::Throwable => {
                    match ballistics::step_throwable(projectile, dt, &self.config, fx) {
                        ThrowableOutcome::Flying => {
                            fx.sync_projectile_visual(handle, projectile.position, projectile.spin);
                        }
                        ThrowableOutcome::Landed(point) => {
                            let radius = projectile.max_area_radius.unwrap_or(weapon.area_radius);
                            let damage = projectile.damage;
                            report.throwables_landed += 1;

                            let mut ctx = ImpactContext {
                                arena: &mut *arena,
                                zones: &mut self.zones,
                                config: &self.config,
                                weapon,
                                fx: &mut *fx,
                                scratch: &mut self.scratch,
                            };
                            if let Some(affected) = self.impacts.dispatch(&mut ctx, point, radius, damage) {
                                report.impact_targets += affected as u32;
                            }

                            self.pool.release(handle, fx);
                            report.released += 1;
                        }
                    }
                }
            }
        }

        report.zone_ticks = self.zones.update(dt, now, arena, &self.config, fx);
        report.zones_active = self.zones.len() as u32;
        report.projectiles_active = self.pool.active_count() as u32;
        report
    }

    /// Release every projectile and remove every fire zone.
    pub fn clear_all(&mut self, fx: &mut dyn WorldEffects) {
        let released = self.pool.release_all(fx);
        let zones = self.zones.len();
        self.zones.clear(fx);
        self.discharge_cooldowns.clear();
        info!("Cleared {} projectiles and {} fire zones", released, zones);
    }

    /// Hash of the simulation state and the arena's targets.
    pub fn compute_hash(&self, arena: &Arena) -> StateHash {
        compute_state_hash(self.frame, self.config.rng_seed, |h| {
            let rng = self.rng.snapshot();
            h.put(rng.s0).put(rng.s1);

            h.put(arena.targets.len() as u32);
            for target in &arena.targets {
                h.put(target.id.0)
                    .put(target.position)
                    .put(target.health)
                    .put(target.death_state as u8)
                    .put(target.knockback)
                    .put(target.status.burning)
                    .put(target.status.blinded)
                    .put(target.status.stunned);
            }

            h.put(self.pool.active_count() as u32);
            for (handle, projectile) in self.pool.iter_active() {
                h.put(handle.0)
                    .put(projectile.kind as u8)
                    .put(projectile.weapon_id.0)
                    .put(projectile.position)
                    .put(projectile.velocity)
                    .put(projectile.damage)
                    .put(projectile.remaining_life);
            }

            h.put(self.zones.len() as u32);
            for zone in self.zones.iter() {
                h.put(zone.id.0)
                    .put(zone.position)
                    .put(zone.remaining_life)
                    .put(zone.last_tick_time);
            }

            h.put_all(self.discharge_cooldowns.values().copied());
            for id in self.discharge_cooldowns.keys() {
                h.put(id.0);
            }
        })
    }

    /// Tunables.
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Weapon table.
    pub fn weapons(&self) -> &WeaponTable {
        &self.weapons
    }

    /// Projectile pool.
    pub fn pool(&self) -> &ProjectilePool {
        &self.pool
    }

    /// Live fire zones.
    pub fn zones(&self) -> &ZoneField {
        &self.zones
    }

    /// Number of accepted `update` calls.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

// =============================================================================
// TESTS
// =============================================================================
