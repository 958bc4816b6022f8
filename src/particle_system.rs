use glam::Vec3;
use rand::Rng;

use crate::shapes;
use crate::theme::Theme;

/// Side of the cube particles are scattered in at startup
pub const SPAWN_CUBE: f32 = 300.0;
/// Radius range of the disintegration shell
pub const OFFSET_RADIUS: (f32, f32) = (40.0, 90.0);

/// GPU-aligned particle instance (32 bytes, 16-byte aligned for GPU)
/// This struct is directly copied to GPU buffers - zero-copy design
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3], // World position
    pub size: f32,          // Size multiplier
    pub color: [f32; 4],    // Linear RGB, alpha unused
}

/// Deterministic half of the color rule: where particle `i` sits in the palette
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PaletteSample {
    pub first: usize,
    pub second: usize,
    pub blend: f32,
    pub color: Vec3,
}

/// Position of particle `index` along the palette at `time`.
pub fn palette_sample(index: usize, count: usize, colors: &[Vec3], time: f32) -> PaletteSample {
    let len = colors.len();
    let t = index as f32 / count.max(1) as f32;
    let progress = (t * len as f32 * 1.5 + time * 0.05).rem_euclid(len as f32);

    // rem_euclid can round up to exactly `len` for tiny negative inputs
    let first = (progress.floor() as usize).min(len - 1);
    let second = (first + 1) % len;
    let blend = (progress - first as f32).clamp(0.0, 1.0 - f32::EPSILON);

    PaletteSample {
        first,
        second,
        blend,
        color: colors[first].lerp(colors[second], blend),
    }
}

/// Full color/size rule: palette color scaled by a random brightness, plus a random size.
///
/// Draws two values from `rng` on every call.
pub fn particle_attributes<R: Rng + ?Sized>(
    index: usize,
    count: usize,
    theme: &Theme,
    time: f32,
    rng: &mut R,
) -> (Vec3, f32) {
    let base = palette_sample(index, count, &theme.colors, time).color;
    let color = base * (0.65 + rng.gen::<f32>() * 0.55);
    let size = 0.65 + rng.gen::<f32>() * 0.6;
    (color, size)
}

/// Fixed-size particle cloud stored as a structure of arrays
#[derive(Clone, Debug)]
pub struct ParticleSystem {
    pub count: usize,
    pub positions: Vec<Vec3>,
    glyph_targets: Vec<Vec3>,
    heart_targets: Vec<Vec3>,
    radial_offsets: Vec<Vec3>,
    pub colors: Vec<Vec3>,
    pub sizes: Vec<f32>,
    instances: Vec<ParticleInstance>,
    dirty: bool,
}

impl ParticleSystem {
    /// Scatter `count` particles and bake their shape targets
    pub fn new<R: Rng + ?Sized>(count: usize, theme: &Theme, rng: &mut R) -> Self {
        let mut positions = Vec::with_capacity(count);
        let mut glyph_targets = Vec::with_capacity(count);
        let mut heart_targets = Vec::with_capacity(count);
        let mut radial_offsets = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);
        let mut sizes = Vec::with_capacity(count);

        for i in 0..count {
            heart_targets.push(shapes::heart_point(i, count, rng));
            glyph_targets.push(shapes::glyph_point(i, count, rng));

            positions.push(Vec3::new(
                (rng.gen::<f32>() - 0.5) * SPAWN_CUBE,
                (rng.gen::<f32>() - 0.5) * SPAWN_CUBE,
                (rng.gen::<f32>() - 0.5) * SPAWN_CUBE,
            ));

            let (color, size) = particle_attributes(i, count, theme, 0.0, rng);
            colors.push(color);
            sizes.push(size);

            radial_offsets.push(shapes::radial_offset(rng, OFFSET_RADIUS.0, OFFSET_RADIUS.1));
        }

        Self {
            count,
            positions,
            glyph_targets,
            heart_targets,
            radial_offsets,
            colors,
            sizes,
            instances: vec![ParticleInstance::default(); count],
            dirty: true,
        }
    }

    pub fn glyph_targets(&self) -> &[Vec3] {
        &self.glyph_targets
    }

    pub fn heart_targets(&self) -> &[Vec3] {
        &self.heart_targets
    }

    /// Disintegration shell offsets. Baked at startup but not applied to positions.
    pub fn radial_offsets(&self) -> &[Vec3] {
        &self.radial_offsets
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Pack the attribute arrays into instances if they changed since the last call.
    /// Returns the bytes to upload, or `None` when nothing changed.
    pub fn take_upload(&mut self) -> Option<&[u8]> {
        if !self.dirty {
            return None;
        }
        for (i, instance) in self.instances.iter_mut().enumerate() {
            let c = self.colors[i];
            *instance = ParticleInstance {
                position: self.positions[i].to_array(),
                size: self.sizes[i],
                color: [c.x, c.y, c.z, 1.0],
            };
        }
        self.dirty = false;
        Some(bytemuck::cast_slice(&self.instances))
    }
}
