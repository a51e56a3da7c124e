//! Weapon Data
//!
//! Numeric weapon parameters are authored outside the combat core and handed
//! in as a [`WeaponTable`]. The core only reads them.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

/// Identifier of a weapon in the [`WeaponTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct WeaponId(pub u32);

/// Behavior family. Selects the fire path and the impact behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponFamily {
    /// Pooled bullets
    Ballistic,
    /// Thrown, detonates on landing
    Explosive,
    /// Thrown, leaves a fire zone
    Incendiary,
    /// Thrown, blinds and stuns
    Disabling,
    /// Continuous cone damage
    Flame,
    /// Continuous chain damage
    Chain,
}

impl WeaponFamily {
    /// Fired through `fire_throwable`.
    pub fn is_throwable(self) -> bool {
        matches!(self, WeaponFamily::Explosive | WeaponFamily::Incendiary | WeaponFamily::Disabling)
    }

    /// Driven through `update_continuous`.
    pub fn is_continuous(self) -> bool {
        matches!(self, WeaponFamily::Flame | WeaponFamily::Chain)
    }
}

/// Numeric weapon parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponSpec {
    /// Identifier
    pub id: WeaponId,

    /// Display name
    pub name: String,

    /// Behavior family
    pub family: WeaponFamily,

    /// Damage per hit (bullets), per detonation (throwables), per shot
    /// (flame) or per discharge (chain, split across the chain)
    pub damage: f32,

    /// Maximum reach of continuous weapons
    #[serde(default)]
    pub range: f32,

    /// Half-angle of random spread in radians
    #[serde(default)]
    pub spread: f32,

    /// Seconds between shots
    #[serde(default = "default_fire_rate")]
    pub fire_rate: f32,

    /// Damage multiplier applied after each hit. `None` = not piercing.
    #[serde(default)]
    pub pierce_decay: Option<f32>,

    /// Area radius of throwables
    #[serde(default)]
    pub area_radius: f32,

    /// Bullet speed (units/second)
    #[serde(default)]
    pub projectile_speed: f32,

    /// Bullet lifetime in seconds
    #[serde(default = "default_lifetime")]
    pub lifetime: f32,

    /// Bullets per trigger pull
    #[serde(default = "default_pellets")]
    pub pellets: u32,

    /// Throw distance at zero charge
    #[serde(default)]
    pub min_throw_distance: f32,

    /// Throw distance at full charge
    #[serde(default)]
    pub max_throw_distance: f32,

    /// Blind duration of disabling weapons
    #[serde(default = "default_blind_duration")]
    pub blind_duration: f32,

    /// Stun duration of disabling weapons
    #[serde(default = "default_stun_duration")]
    pub stun_duration: f32,
}

fn default_fire_rate() -> f32 {
    0.1
}

fn default_lifetime() -> f32 {
    2.0
}

fn default_pellets() -> u32 {
    1
}

fn default_blind_duration() -> f32 {
    4.0
}

fn default_stun_duration() -> f32 {
    2.0
}

impl WeaponSpec {
    /// Create a spec with defaults for every optional field.
    pub fn new(id: WeaponId, name: impl Into<String>, family: WeaponFamily, damage: f32) -> Self {
        Self {
            id,
            name: name.into(),
            family,
            damage,
            range: 0.0,
            spread: 0.0,
            fire_rate: default_fire_rate(),
            pierce_decay: None,
            area_radius: 0.0,
            projectile_speed: 0.0,
            lifetime: default_lifetime(),
            pellets: default_pellets(),
            min_throw_distance: 0.0,
            max_throw_distance: 0.0,
            blind_duration: default_blind_duration(),
            stun_duration: default_stun_duration(),
        }
    }

    /// Builder: bullet speed and lifetime.
    pub fn with_ballistics(mut self, speed: f32, lifetime: f32) -> Self {
        self.projectile_speed = speed;
        self.lifetime = lifetime;
        self
    }

    /// Builder: piercing decay.
    pub fn with_pierce(mut self, decay: f32) -> Self {
        self.pierce_decay = Some(decay);
        self
    }

    /// Builder: pellets and spread.
    pub fn with_pellets(mut self, pellets: u32, spread: f32) -> Self {
        self.pellets = pellets;
        self.spread = spread;
        self
    }

    /// Builder: throw distances and area radius.
    pub fn with_throw(mut self, min_distance: f32, max_distance: f32, area_radius: f32) -> Self {
        self.min_throw_distance = min_distance;
        self.max_throw_distance = max_distance;
        self.area_radius = area_radius;
        self
    }

    /// Builder: range and fire rate of continuous weapons.
    pub fn with_range(mut self, range: f32, fire_rate: f32) -> Self {
        self.range = range;
        self.fire_rate = fire_rate;
        self
    }

    /// Builder: disabling durations.
    pub fn with_disable(mut self, blind: f32, stun: f32) -> Self {
        self.blind_duration = blind;
        self.stun_duration = stun;
        self
    }

    /// Is this a piercing bullet weapon?
    #[inline]
    pub fn is_piercing(&self) -> bool {
        self.pierce_decay.is_some()
    }

    /// Throw distance for a charge in [0, 1].
    #[inline]
    pub fn throw_distance(&self, charge: f32) -> f32 {
        let charge = if charge.is_finite() { charge.clamp(0.0, 1.0) } else { 0.0 };
        self.min_throw_distance + charge * (self.max_throw_distance - self.min_throw_distance)
    }

    /// Check the spec for values the simulation cannot use.
    pub fn validate(&self) -> Result<(), WeaponError> {
        let invalid = |reason: &'static str| WeaponError::Invalid { id: self.id, reason };

        if !self.damage.is_finite() || self.damage < 0.0 {
            return Err(invalid("damage must be finite and non-negative"));
        }
        if let Some(decay) = self.pierce_decay {
            if !(decay > 0.0 && decay <= 1.0) {
                return Err(invalid("pierce_decay must be in (0, 1]"));
            }
        }
        if self.pellets == 0 {
            return Err(invalid("pellets must be at least 1"));
        }
        if !self.spread.is_finite() || self.spread < 0.0 {
            return Err(invalid("spread must be finite and non-negative"));
        }
        match self.family {
            WeaponFamily::Ballistic => {
                if !(self.projectile_speed > 0.0) || !self.projectile_speed.is_finite() {
                    return Err(invalid("projectile_speed must be positive"));
                }
                if !(self.lifetime > 0.0) {
                    return Err(invalid("lifetime must be positive"));
                }
            }
            WeaponFamily::Explosive | WeaponFamily::Incendiary | WeaponFamily::Disabling => {
                if !(self.min_throw_distance >= 0.0)
                    || !(self.min_throw_distance <= self.max_throw_distance)
                {
                    return Err(invalid("throw distances must satisfy 0 <= min <= max"));
                }
                if !(self.area_radius >= 0.0) {
                    return Err(invalid("area_radius must be non-negative"));
                }
            }
            WeaponFamily::Flame | WeaponFamily::Chain => {
                if !(self.fire_rate > 0.0) {
                    return Err(invalid("fire_rate must be positive"));
                }
                if !(self.range > 0.0) {
                    return Err(invalid("range must be positive"));
                }
            }
        }
        Ok(())
    }
}

/// Weapon data errors.
#[derive(Debug, Error)]
pub enum WeaponError {
    /// Failed to read a weapon file.
    #[error("Failed to read weapon data: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON.
    #[error("Malformed weapon data: {0}")]
    Json(#[from] serde_json::Error),

    /// Two weapons share an id.
    #[error("Duplicate weapon id {0:?}")]
    Duplicate(WeaponId),

    /// A weapon failed validation.
    #[error("Invalid weapon {id:?}: {reason}")]
    Invalid {
        /// Offending weapon
        id: WeaponId,
        /// What is wrong
        reason: &'static str,
    },
}

/// On-disk layout of a weapon file.
#[derive(Debug, Serialize, Deserialize)]
struct WeaponFile {
    weapons: Vec<WeaponSpec>,
}

/// Lookup table of weapon specs.
#[derive(Clone, Debug, Default)]
pub struct WeaponTable {
    weapons: BTreeMap<WeaponId, WeaponSpec>,
}

impl WeaponTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validated weapon.
    pub fn insert(&mut self, spec: WeaponSpec) -> Result<(), WeaponError> {
        spec.validate()?;
        if self.weapons.contains_key(&spec.id) {
            return Err(WeaponError::Duplicate(spec.id));
        }
        self.weapons.insert(spec.id, spec);
        Ok(())
    }

    /// Look up a weapon.
    pub fn get(&self, id: WeaponId) -> Option<&WeaponSpec> {
        self.weapons.get(&id)
    }

    /// Look up a weapon whose family passes `accept`. Unknown ids and
    /// rejected families are logged and yield `None`.
    pub fn get_usable(&self, id: WeaponId, accept: fn(WeaponFamily) -> bool) -> Option<&WeaponSpec> {
        match self.weapons.get(&id) {
            Some(spec) if accept(spec.family) => Some(spec),
            Some(spec) => {
                debug!("Weapon {:?} ({:?}) cannot be used this way", id, spec.family);
                None
            }
            None => {
                debug!("Unknown weapon {:?}", id);
                None
            }
        }
    }

    /// Number of weapons.
    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    /// True when empty.
    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    /// Iterate in id order.
    pub fn iter(&self) -> impl Iterator<Item = &WeaponSpec> {
        self.weapons.values()
    }

    /// Parse a `{"weapons": [...]}` document.
    pub fn from_json(json: &str) -> Result<Self, WeaponError> {
        let file: WeaponFile = serde_json::from_str(json)?;
        let mut table = Self::new();
        for spec in file.weapons {
            table.insert(spec)?;
        }
        Ok(table)
    }

    /// Load a weapon file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WeaponError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to the same layout `from_json` reads.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let file = WeaponFile {
            weapons: self.weapons.values().cloned().collect(),
        };
        serde_json::to_string_pretty(&file)
    }

    /// Built-in arsenal.
    pub fn standard() -> Self {
        let specs = [
            WeaponSpec::new(RIFLE, "Rifle", WeaponFamily::Ballistic, 34.0)
                .with_ballistics(160.0, 1.2)
                .with_pellets(1, 0.02),
            WeaponSpec::new(MARKSMAN, "Marksman Rifle", WeaponFamily::Ballistic, 120.0)
                .with_ballistics(260.0, 1.5)
                .with_pierce(0.7),
            WeaponSpec::new(SHOTGUN, "Shotgun", WeaponFamily::Ballistic, 18.0)
                .with_ballistics(120.0, 0.4)
                .with_pellets(8, 0.15),
            WeaponSpec::new(FRAG_GRENADE, "Frag Grenade", WeaponFamily::Explosive, 150.0)
                .with_throw(8.0, 30.0, 7.0),
            WeaponSpec::new(INCENDIARY, "Incendiary", WeaponFamily::Incendiary, 0.0)
                .with_throw(8.0, 25.0, 5.0),
            WeaponSpec::new(FLASHBANG, "Flashbang", WeaponFamily::Disabling, 0.0)
                .with_throw(8.0, 28.0, 10.0)
                .with_disable(4.0, 2.0),
            WeaponSpec::new(FLAMETHROWER, "Flamethrower", WeaponFamily::Flame, 12.0)
                .with_range(12.0, 0.1),
            WeaponSpec::new(ARC_PROJECTOR, "Arc Projector", WeaponFamily::Chain, 90.0)
                .with_range(25.0, 0.5),
        ];

        let mut table = Self::new();
        for spec in specs {
            table.weapons.insert(spec.id, spec);
        }
        table
    }
}

/// Built-in rifle.
pub const RIFLE: WeaponId = WeaponId(1);
/// Built-in piercing rifle.
pub const MARKSMAN: WeaponId = WeaponId(2);
/// Built-in multi-pellet shotgun.
pub const SHOTGUN: WeaponId = WeaponId(3);
/// Built-in explosive throwable.
pub const FRAG_GRENADE: WeaponId = WeaponId(10);
/// Built-in incendiary throwable.
pub const INCENDIARY: WeaponId = WeaponId(11);
/// Built-in disabling throwable.
pub const FLASHBANG: WeaponId = WeaponId(12);
/// Built-in cone weapon.
pub const FLAMETHROWER: WeaponId = WeaponId(20);
/// Built-in chain weapon.
pub const ARC_PROJECTOR: WeaponId = WeaponId(21);
