use glam::{Vec2, Vec3};
use rand::Rng;
use std::f32::consts::PI;

/// Uniform scale applied to the heart curve
pub const HEART_SCALE: f32 = 2.2;
const HEART_JITTER: f32 = 0.2;

/// Glyph bounding box in stroke units (scaled by `GLYPH_SCALE`)
pub const GLYPH_WIDTH: f32 = 12.0;
pub const GLYPH_HEIGHT: f32 = 16.0;
pub const GLYPH_SCALE: f32 = 6.0;
const GLYPH_JITTER: f32 = 0.3;

/// Number of straight strokes forming the glyph
pub const GLYPH_STROKES: usize = 4;

/// Centered jitter in `[-strength/2, strength/2)`
fn jitter<R: Rng + ?Sized>(rng: &mut R, strength: f32) -> f32 {
    (rng.gen::<f32>() - 0.5) * strength
}

/// Point `i` of `count` on the heart outline.
///
/// Every call draws fresh jitter, so results must be generated once and cached.
pub fn heart_point<R: Rng + ?Sized>(index: usize, count: usize, rng: &mut R) -> Vec3 {
    let base = heart_curve(index, count);
    Vec3::new(
        base.x + jitter(rng, HEART_JITTER),
        base.y + jitter(rng, HEART_JITTER),
        base.z + jitter(rng, HEART_JITTER * 0.5),
    )
}

/// Noise-free heart curve, `t` sweeping one full turn over `count` points
pub fn heart_curve(index: usize, count: usize) -> Vec3 {
    let t = (index as f32 / count.max(1) as f32) * PI * 2.0;

    let x = 16.0 * t.sin().powi(3);
    let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
    let z = (t * 4.0).sin() * 2.0;

    Vec3::new(x * HEART_SCALE, y * HEART_SCALE, z)
}

/// Endpoints of each glyph stroke in box units, centered on the origin
pub fn stroke_endpoints(stroke: usize) -> (Vec2, Vec2) {
    let half_w = GLYPH_WIDTH / 2.0;
    let half_h = GLYPH_HEIGHT / 2.0;

    match stroke {
        // left edge, bottom to top
        0 => (Vec2::new(-half_w, -half_h), Vec2::new(-half_w, half_h)),
        // top-left down to the middle valley
        1 => (Vec2::new(-half_w, half_h), Vec2::new(0.0, -half_h)),
        // valley up to top-right
        2 => (Vec2::new(0.0, -half_h), Vec2::new(half_w, half_h)),
        // right edge, top to bottom
        _ => (Vec2::new(half_w, half_h), Vec2::new(half_w, -half_h)),
    }
}

/// Particles assigned to each stroke; the remainder lands on the last one
pub fn particles_per_stroke(count: usize) -> usize {
    (count / GLYPH_STROKES).max(1)
}

/// Stroke index and parameter `t` in `[0, 1]` for particle `index`
pub fn glyph_stroke(index: usize, count: usize) -> (usize, f32) {
    let per_stroke = particles_per_stroke(count);
    let stroke = (index / per_stroke).min(GLYPH_STROKES - 1);
    let local = index - stroke * per_stroke;
    let t = local as f32 / per_stroke.saturating_sub(1).max(1) as f32;
    (stroke, t)
}

/// Noise-free glyph point in world units
pub fn glyph_curve(index: usize, count: usize) -> Vec3 {
    let (stroke, t) = glyph_stroke(index, count);
    let (from, to) = stroke_endpoints(stroke);
    let p = from.lerp(to, t) * GLYPH_SCALE;
    Vec3::new(p.x, p.y, 0.0)
}

/// Point `i` of `count` on the four-stroke glyph, jittered on every axis.
pub fn glyph_point<R: Rng + ?Sized>(index: usize, count: usize, rng: &mut R) -> Vec3 {
    let base = glyph_curve(index, count);
    Vec3::new(
        base.x + jitter(rng, GLYPH_JITTER),
        base.y + jitter(rng, GLYPH_JITTER),
        base.z + jitter(rng, GLYPH_JITTER),
    )
}

/// Uniformly distributed point on a sphere shell with radius in `[min_radius, max_radius)`
pub fn radial_offset<R: Rng + ?Sized>(rng: &mut R, min_radius: f32, max_radius: f32) -> Vec3 {
    let strength = min_radius + rng.gen::<f32>() * (max_radius - min_radius);
    let phi = rng.gen::<f32>() * PI * 2.0;
    let theta = (2.0 * rng.gen::<f32>() - 1.0).acos();

    Vec3::new(
        theta.sin() * phi.cos(),
        theta.sin() * phi.sin(),
        theta.cos(),
    ) * strength
}
