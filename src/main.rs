//! Ordnance combat simulator
//!
//! Headless driver for the combat core. Runs a scripted skirmish, prints the
//! final state hash, then replays the same script to verify determinism.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ordnance::{
    DEFAULT_TICK_RATE, VERSION,
    combat::{
        events::CombatEventData,
        target::Collider,
        weapon::{ARC_PROJECTOR, FLAMETHROWER, FLASHBANG, FRAG_GRENADE, INCENDIARY, MARKSMAN, RIFLE, SHOTGUN},
        Arena, CombatConfig, CombatSimulation, EventLog, Target, TargetId, WeaponTable,
    },
    core::hash::StateHash,
    Vec3,
};

/// Skirmish length in frames (20 seconds).
const SKIRMISH_FRAMES: u32 = 20 * DEFAULT_TICK_RATE;

/// Launch settings read from the environment.
#[derive(Debug, Default)]
struct LaunchConfig {
    /// Weapon table JSON (`ORDNANCE_WEAPONS`)
    weapons_path: Option<PathBuf>,
    /// Combat config JSON (`ORDNANCE_CONFIG`)
    config_path: Option<PathBuf>,
    /// Where to dump the event log (`ORDNANCE_EVENTS`)
    events_path: Option<PathBuf>,
}

impl LaunchConfig {
    fn from_env() -> Self {
        Self {
            weapons_path: std::env::var_os("ORDNANCE_WEAPONS").map(PathBuf::from),
            config_path: std::env::var_os("ORDNANCE_CONFIG").map(PathBuf::from),
            events_path: std::env::var_os("ORDNANCE_EVENTS").map(PathBuf::from),
        }
    }

    fn weapons(&self) -> Result<WeaponTable> {
        match &self.weapons_path {
            Some(path) => WeaponTable::load(path)
                .with_context(|| format!("loading weapons from {}", path.display())),
            None => Ok(WeaponTable::standard()),
        }
    }

    fn combat(&self) -> Result<CombatConfig> {
        match &self.config_path {
            Some(path) => CombatConfig::load(path)
                .with_context(|| format!("loading combat config from {}", path.display())),
            None => Ok(CombatConfig::default()),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Ordnance v{}", VERSION);
    info!("Tick Rate: {} Hz", DEFAULT_TICK_RATE);

    let launch = LaunchConfig::from_env();
    let weapons = launch.weapons()?;
    let config = launch.combat()?;
    info!("Loaded {} weapons, RNG seed {:#x}", weapons.len(), config.rng_seed);

    info!("=== Running Skirmish ===");
    let mut log = EventLog::new();
    let first = run_skirmish(&config, &weapons, &mut log);

    info!("Final State Hash: {}", hex::encode(first));
    info!(
        "Damage dealt: {:.1} ({:.1} on bosses), {} hits",
        log.damage_total, log.boss_damage_total, log.hit_count
    );
    let explosions = log.count(|d| matches!(d, CombatEventData::TargetExploded { .. }));
    let beams = log.count(|d| matches!(d, CombatEventData::Beam { .. }));
    info!("{} events recorded, {} targets blown apart, {} beams drawn", log.events.len(), explosions, beams);

    if let Some(path) = &launch.events_path {
        let json = log.to_json().context("serializing event log")?;
        std::fs::write(path, json).with_context(|| format!("writing events to {}", path.display()))?;
        info!("Event log written to {}", path.display());
    }

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let mut replay_log = EventLog::new();
    let second = run_skirmish(&config, &weapons, &mut replay_log);
    info!("Replay State Hash: {}", hex::encode(second));

    if first != second || log.events != replay_log.events {
        warn!("Replay diverged");
        bail!("determinism check failed");
    }
    info!("Determinism verified: hashes match");

    Ok(())
}

/// Lay out the skirmish arena: a wave of grunts, a boss and some cover.
fn build_arena(sim: &CombatSimulation) -> Arena {
    let mut arena = sim.new_arena();

    let mut id = 0;
    for row in 0..4 {
        for col in 0..6 {
            let position = Vec3::flat(20.0 + row as f32 * 6.0, -15.0 + col as f32 * 6.0);
            arena.add_target(Target::new(TargetId(id), position, 100.0));
            id += 1;
        }
    }
    arena.add_target(Target::new(TargetId(id), Vec3::flat(50.0, 0.0), 2500.0).with_scale(1.8, 1.5).boss());

    arena.add_obstacle(Vec3::flat(12.0, 18.0), Collider::Sphere { radius: 3.0 });
    arena.add_obstacle(
        Vec3::flat(12.0, -18.0),
        Collider::Box { half_extents: Vec3::new(2.0, 3.0, 4.0) },
    );
    arena
}

/// Advance the wave toward the shooter.
fn advance_targets(arena: &mut Arena, dt: f32) {
    for target in arena.targets.iter_mut().filter(|t| t.is_alive()) {
        let step = Vec3::new(-2.5 * dt, 0.0, 0.0) + target.knockback * dt;
        target.position += step;
        target.knockback = target.knockback * 0.9;
    }
}

/// Run the scripted skirmish and return the final state hash.
fn run_skirmish(config: &CombatConfig, weapons: &WeaponTable, log: &mut EventLog) -> StateHash {
    let mut sim = CombatSimulation::with_standard_impacts(config.clone(), weapons.clone());
    let mut arena = build_arena(&sim);

    let muzzle = Vec3::new(0.0, 1.5, 0.0);
    let dt = 1.0 / DEFAULT_TICK_RATE as f32;
    let mut now = 0.0f64;

    for frame in 0..SKIRMISH_FRAMES {
        log.set_frame(frame as u64);
        now += dt as f64;

        // Sweep aim across the wave
        let sweep = ((frame as f32) * 0.02).sin() * 0.4;
        let aim = Vec3::X.rotate_y(sweep);

        match frame {
            f if f % 12 == 0 && f < 300 => {
                sim.fire_bullet(muzzle, aim, RIFLE, log);
            }
            f if f % 45 == 0 && (300..600).contains(&f) => {
                sim.fire_bullet(muzzle, aim, SHOTGUN, log);
            }
            f if f % 90 == 0 && f >= 600 => {
                sim.fire_bullet(muzzle, Vec3::X, MARKSMAN, log);
            }
            _ => {}
        }

        match frame {
            120 => {
                sim.fire_throwable(muzzle, Vec3::X, FRAG_GRENADE, 0.8, log);
            }
            420 => {
                sim.fire_throwable(muzzle, aim, INCENDIARY, 0.6, log);
            }
            700 => {
                sim.fire_throwable(muzzle, Vec3::X, FLASHBANG, 0.4, log);
            }
            _ => {}
        }

        if (800..900).contains(&frame) {
            sim.update_continuous(FLAMETHROWER, muzzle, aim, dt, &mut arena, log);
        }
        if (950..1100).contains(&frame) {
            sim.update_continuous(ARC_PROJECTOR, muzzle, Vec3::X, dt, &mut arena, log);
        }

        let report = sim.update(dt, now, &mut arena, log);
        advance_targets(&mut arena, dt);

        if frame % DEFAULT_TICK_RATE == 0 {
            info!(
                "Frame {}: {} alive, {} projectiles, {} fire zones",
                frame,
                arena.alive_count(),
                report.projectiles_active,
                report.zones_active
            );
        }
    }

    sim.clear_all(log);
    info!(
        "Pool grew to {} slots, {} targets still standing",
        sim.pool().capacity(),
        arena.alive_count()
    );

    sim.compute_hash(&arena)
}
