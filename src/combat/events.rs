//! Combat Events
//!
//! [`EventLog`] is a [`WorldEffects`] collaborator that records every request
//! as a serializable [`CombatEvent`]. Used for replays, headless runs and
//! tests. Per-frame visual syncs are counted rather than recorded.

use serde::{Serialize, Deserialize};

use crate::core::vec3::Vec3;
use crate::combat::effects::{
    DecalKind, MarkerHandle, NoiseTag, ParticleKind, SoundCue, StatKind, TextColor, WorldEffects,
};
use crate::combat::projectile::{ProjectileHandle, ProjectileKind};
use crate::combat::target::TargetId;
use crate::combat::weapon::WeaponId;
use crate::combat::zone::ZoneId;

/// Event payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CombatEventData {
    /// Particle burst requested
    Particles {
        /// Burst center
        position: Vec3,
        /// Particle style
        kind: ParticleKind,
        /// Particles requested
        count: u32,
    },

    /// Floating damage number
    DamageText {
        /// Where the number floats
        position: Vec3,
        /// Damage shown
        amount: f32,
        /// Text color
        color: TextColor,
    },

    /// Ground decal
    Decal {
        /// Decal center
        position: Vec3,
        /// Decal radius
        scale: f32,
        /// Decal style
        kind: DecalKind,
    },

    /// Target handed to physics on death
    TargetExploded {
        /// Dead target
        target: TargetId,
        /// Impulse handed to physics
        force: Vec3,
    },

    /// Noise for AI awareness
    Noise {
        /// Noise source
        position: Vec3,
        /// Audible radius
        radius: f32,
        /// What made the noise
        tag: NoiseTag,
    },

    /// Sound cue
    Sound {
        /// Cue to play
        cue: SoundCue,
    },

    /// Beam segment
    Beam {
        /// Segment start
        from: Vec3,
        /// Segment end
        to: Vec3,
    },

    /// Projectile visual attached
    ProjectileAttached {
        /// Pool slot
        handle: ProjectileHandle,
        /// Bullet or throwable
        kind: ProjectileKind,
        /// Firing weapon
        weapon: WeaponId,
    },

    /// Projectile visual detached
    ProjectileDetached {
        /// Pool slot
        handle: ProjectileHandle,
    },

    /// Landing marker shown
    MarkerShown {
        /// Marker handle
        marker: MarkerHandle,
        /// Predicted landing point
        position: Vec3,
        /// Area radius
        radius: f32,
    },

    /// Landing marker hidden
    MarkerHidden {
        /// Marker handle
        marker: MarkerHandle,
    },

    /// Fire zone visual shown
    ZoneShown {
        /// Zone id
        zone: ZoneId,
        /// Zone center
        position: Vec3,
        /// Zone radius
        radius: f32,
    },

    /// Fire zone visual hidden
    ZoneHidden {
        /// Zone id
        zone: ZoneId,
    },
}

/// A recorded event with the frame it happened on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatEvent {
    /// Frame counter at the time of recording
    pub frame: u64,
    /// Event data
    pub data: CombatEventData,
}

/// Recording collaborator.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventLog {
    /// Recorded events, in order
    pub events: Vec<CombatEvent>,
    /// Frame stamped onto new events
    pub frame: u64,
    /// Sum of tracked damage
    pub damage_total: f32,
    /// Sum of tracked damage on bosses
    pub boss_damage_total: f32,
    /// Number of hits reported
    pub hit_count: u32,
    /// Number of projectile visual syncs
    pub sync_count: u64,
    /// Number of marker opacity updates
    pub opacity_updates: u64,
    next_marker: u32,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frame stamped onto subsequent events.
    pub fn set_frame(&mut self, frame: u64) {
        self.frame = frame;
    }

    /// Drop recorded events, keeping totals.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Take recorded events, keeping totals.
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    /// Iterate over event payloads.
    pub fn data(&self) -> impl Iterator<Item = &CombatEventData> {
        self.events.iter().map(|e| &e.data)
    }

    /// Count events matching a predicate.
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CombatEventData) -> bool,
    {
        self.data().filter(|d| predicate(d)).count()
    }

    /// Serialize recorded events as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }

    fn push(&mut self, data: CombatEventData) {
        self.events.push(CombatEvent { frame: self.frame, data });
    }
}

impl WorldEffects for EventLog {
    fn spawn_particles(&mut self, position: Vec3, kind: ParticleKind, count: u32) {
        self.push(CombatEventData::Particles { position, kind, count });
    }

    fn spawn_damage_text(&mut self, position: Vec3, amount: f32, color: TextColor) {
        self.push(CombatEventData::DamageText { position, amount, color });
    }

    fn spawn_ground_decal(&mut self, position: Vec3, scale: f32, kind: DecalKind) {
        self.push(CombatEventData::Decal { position, scale, kind });
    }

    fn explode_target(&mut self, target: TargetId, force: Vec3) {
        self.push(CombatEventData::TargetExploded { target, force });
    }

    fn track_statistic(&mut self, kind: StatKind, amount: f32, is_boss: bool) {
        match kind {
            StatKind::Damage => {
                self.damage_total += amount;
                if is_boss {
                    self.boss_damage_total += amount;
                }
            }
            StatKind::Hit => self.hit_count += amount as u32,
        }
    }

    fn emit_noise(&mut self, position: Vec3, radius: f32, tag: NoiseTag) {
        self.push(CombatEventData::Noise { position, radius, tag });
    }

    fn play_sound(&mut self, cue: SoundCue) {
        self.push(CombatEventData::Sound { cue });
    }

    fn draw_beam(&mut self, from: Vec3, to: Vec3) {
        self.push(CombatEventData::Beam { from, to });
    }

    fn attach_projectile_visual(&mut self, handle: ProjectileHandle, kind: ProjectileKind, weapon: WeaponId) {
        self.push(CombatEventData::ProjectileAttached { handle, kind, weapon });
    }

    fn sync_projectile_visual(&mut self, _handle: ProjectileHandle, _position: Vec3, _spin: f32) {
        self.sync_count += 1;
    }

    fn detach_projectile_visual(&mut self, handle: ProjectileHandle) {
        self.push(CombatEventData::ProjectileDetached { handle });
    }

    fn show_ground_marker(&mut self, position: Vec3, radius: f32) -> Option<MarkerHandle> {
        let marker = MarkerHandle(self.next_marker);
        self.next_marker += 1;
        self.push(CombatEventData::MarkerShown { marker, position, radius });
        Some(marker)
    }

    fn set_marker_opacity(&mut self, _marker: MarkerHandle, _opacity: f32) {
        self.opacity_updates += 1;
    }

    fn hide_ground_marker(&mut self, marker: MarkerHandle) {
        self.push(CombatEventData::MarkerHidden { marker });
    }

    fn show_zone_visual(&mut self, zone: ZoneId, position: Vec3, radius: f32) {
        self.push(CombatEventData::ZoneShown { zone, position, radius });
    }

    fn hide_zone_visual(&mut self, zone: ZoneId) {
        self.push(CombatEventData::ZoneHidden { zone });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_records_and_counts() {
        let mut log = EventLog::new();
        log.set_frame(7);
        log.play_sound(SoundCue::Gunshot);
        log.draw_beam(Vec3::ZERO, Vec3::X);
        log.track_statistic(StatKind::Damage, 12.5, false);
        log.track_statistic(StatKind::Damage, 10.0, true);
        log.track_statistic(StatKind::Hit, 1.0, false);

        assert_eq!(log.events.len(), 2);
        assert_eq!(log.events[0].frame, 7);
        assert_eq!(log.damage_total, 22.5);
        assert_eq!(log.boss_damage_total, 10.0);
        assert_eq!(log.hit_count, 1);
        assert_eq!(log.count(|d| matches!(d, CombatEventData::Beam { .. })), 1);
    }

    #[test]
    fn test_markers_are_unique() {
        let mut log = EventLog::new();
        let a = log.show_ground_marker(Vec3::ZERO, 3.0);
        let b = log.show_ground_marker(Vec3::ZERO, 3.0);
        assert_ne!(a, b);
        assert!(a.is_some());
    }

    #[test]
    fn test_json_export() {
        let mut log = EventLog::new();
        log.emit_noise(Vec3::ZERO, 80.0, NoiseTag::Explosion);

        let json = log.to_json().unwrap();
        assert!(json.contains("Explosion"));

        let parsed: Vec<CombatEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, log.events);
    }
}
