//! Per-frame morph from the glyph to the heart.
//!
//! All state lives in [`AnimationState`]; randomness comes from the seeded
//! generator it owns, so a given seed replays the same frames.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f32::consts::PI;

use crate::particle_system::{particle_attributes, ParticleSystem};
use crate::theme::{Theme, ThemeCycle};

/// Clock increment per rendered frame
pub const TIME_STEP: f32 = 0.02;

/// Below this progress the glyph phase eases slowly toward 0.7
const GLYPH_PHASE_END: f32 = 0.3;
const GLYPH_PHASE_TARGET: f32 = 0.7;
const GLYPH_PHASE_RATE: f32 = 0.005;
const HEART_PHASE_RATE: f32 = 0.04;

/// Smallest rendered particle size
pub const MIN_SIZE: f32 = 0.05;

/// One step of the two-regime easing recurrence.
///
/// Slow approach to 0.7 while under 0.3, then 4% of the remaining distance to 1.
pub fn advance_morph(progress: f32) -> f32 {
    if progress < GLYPH_PHASE_END {
        progress + (GLYPH_PHASE_TARGET - progress) * GLYPH_PHASE_RATE
    } else {
        progress + (1.0 - progress) * HEART_PHASE_RATE
    }
}

/// Brightness multiplier for particle `index` at `time`
pub fn brightness(index: usize, count: usize, time: f32, disintegration: f32) -> f32 {
    let phase = index as f32 / count.max(1) as f32 * PI * 7.0 + time * 1.3;
    let sweep = (0.65 + phase.sin() * 0.35) * (1.0 - disintegration * 0.75);
    let flicker = 0.85 + (time * 7.0 + index as f32 * 0.5).sin() * 0.15;
    sweep * flicker
}

/// Rendered size for a particle with random `base_size`
pub fn pulsed_size(base_size: f32, index: usize, time: f32, disintegration: f32) -> f32 {
    let size = base_size * (1.0 - disintegration * 0.9);
    let pulse = 0.8 + (time * 5.0 + index as f32 * 0.3).sin() * 0.2;
    (size * pulse).max(MIN_SIZE)
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Morph {
    Eased(f32),
    Pinned(f32),
}

/// Everything the frame loop mutates
pub struct AnimationState {
    pub particles: ParticleSystem,
    pub themes: ThemeCycle,
    time: f32,
    morph: Morph,
    enabled: bool,
    rng: StdRng,
}

impl AnimationState {
    /// Build the particle cloud from `rng`, starting on the first theme
    pub fn new(count: usize, mut rng: StdRng) -> Self {
        let themes = ThemeCycle::new();
        let particles = ParticleSystem::new(count, themes.current(), &mut rng);
        log::info!("Spawned {} particles", count);

        Self {
            particles,
            themes,
            time: 0.0,
            morph: Morph::Eased(0.0),
            enabled: true,
            rng,
        }
    }

    pub fn seeded(count: usize, seed: u64) -> Self {
        Self::new(count, StdRng::seed_from_u64(seed))
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn morph_progress(&self) -> f32 {
        match self.morph {
            Morph::Eased(p) | Morph::Pinned(p) => p,
        }
    }

    /// Freeze morph progress at `value`, bypassing the easing
    pub fn pin_morph(&mut self, value: f32) {
        self.morph = Morph::Pinned(value.clamp(0.0, 1.0));
    }

    pub fn theme(&self) -> &Theme {
        self.themes.current()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Advance one frame: clock, morph progress, then every particle.
    pub fn step(&mut self) {
        if !self.enabled {
            return;
        }
        self.time += TIME_STEP;

        if let Morph::Eased(p) = self.morph {
            self.morph = Morph::Eased(advance_morph(p));
        }

        let progress = self.morph_progress();
        let disintegration = 1.0 - progress;
        let blend = progress.powf(1.5);
        let lerp_factor = 0.04 + (1.0 - blend) * 0.01;

        let time = self.time;
        let count = self.particles.count;
        let theme = self.themes.current();
        let particles = &mut self.particles;

        for i in 0..count {
            let target: Vec3 =
                particles.glyph_targets()[i].lerp(particles.heart_targets()[i], blend);
            let position = particles.positions[i];
            particles.positions[i] = position + (target - position) * lerp_factor;

            let (base_color, base_size) =
                particle_attributes(i, count, theme, time, &mut self.rng);
            particles.colors[i] = base_color * brightness(i, count, time, disintegration);
            particles.sizes[i] = pulsed_size(base_size, i, time, disintegration);
        }

        particles.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_step_from_zero() {
        assert!((advance_morph(0.0) - 0.0035).abs() < 1e-7);
    }

    #[test]
    fn heart_phase_step() {
        assert!((advance_morph(0.5) - 0.52).abs() < 1e-6);
    }

    #[test]
    fn progress_crosses_into_heart_phase() {
        let mut p = 0.0;
        let mut frames = 0;
        while p < GLYPH_PHASE_END {
            p = advance_morph(p);
            frames += 1;
        }
        // ~112 frames of glyph before the heart takes over
        assert!((90..120).contains(&frames), "{frames}");
    }

    proptest! {
        #[test]
        fn progress_is_monotone_and_bounded(steps in 0usize..5_000) {
            let mut p = 0.0f32;
            for _ in 0..steps {
                let next = advance_morph(p);
                prop_assert!(next >= p);
                p = next;
            }
            prop_assert!((0.0..1.0).contains(&p));
        }
    }

    #[test]
    fn size_never_drops_below_floor() {
        for i in 0..100 {
            let s = pulsed_size(0.65, i, i as f32 * 0.37, 1.0);
            assert!(s >= MIN_SIZE);
        }
    }

    #[test]
    fn brightness_dims_while_scattered() {
        let full = brightness(0, 100, 0.0, 0.0);
        let scattered = brightness(0, 100, 0.0, 1.0);
        assert!((scattered - full * 0.25).abs() < 1e-6);
    }

    #[test]
    fn step_advances_clock_and_progress() {
        let mut state = AnimationState::seeded(16, 1);
        state.step();
        assert!((state.time() - TIME_STEP).abs() < 1e-7);
        assert!((state.morph_progress() - 0.0035).abs() < 1e-7);
        assert!(state.particles.is_dirty());
    }

    #[test]
    fn disabled_state_is_frozen() {
        let mut state = AnimationState::seeded(16, 1);
        let before = state.particles.positions.clone();
        state.set_enabled(false);
        assert!(!state.is_enabled());
        state.step();
        assert_eq!(state.time(), 0.0);
        assert_eq!(state.particles.positions, before);
    }

    #[test]
    fn pinned_progress_does_not_ease() {
        let mut state = AnimationState::seeded(8, 2);
        state.pin_morph(0.25);
        for _ in 0..10 {
            state.step();
        }
        assert_eq!(state.morph_progress(), 0.25);
    }

    #[test]
    fn glyph_dominates_early() {
        let mut state = AnimationState::seeded(400, 5);
        state.pin_morph(0.0);
        for _ in 0..600 {
            state.step();
        }
        let p = &state.particles;
        for i in 0..p.count {
            assert!(p.positions[i].distance(p.glyph_targets()[i]) < 1e-2);
        }
    }

    #[test]
    fn same_seed_replays_frames() {
        let mut a = AnimationState::seeded(50, 77);
        let mut b = AnimationState::seeded(50, 77);
        for _ in 0..5 {
            a.step();
            b.step();
        }
        assert_eq!(a.particles.colors, b.particles.colors);
        assert_eq!(a.particles.sizes, b.particles.sizes);
    }
}
