/// Edge length of the particle sprite texture
pub const SPRITE_SIZE: u32 = 64;

/// (offset, rgba) stops of the radial glow, center to rim
const STOPS: [(f32, [f32; 4]); 4] = [
    (0.0, [255.0, 255.0, 255.0, 1.0]),
    (0.2, [255.0, 220.0, 240.0, 0.9]),
    (0.6, [255.0, 150.0, 200.0, 0.4]),
    (1.0, [255.0, 100.0, 180.0, 0.0]),
];

/// Gradient color at normalized distance `d` from the center
fn gradient(d: f32) -> [f32; 4] {
    let d = d.clamp(0.0, 1.0);
    for pair in STOPS.windows(2) {
        let (a_off, a) = pair[0];
        let (b_off, b) = pair[1];
        if d <= b_off {
            let t = (d - a_off) / (b_off - a_off);
            return std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t);
        }
    }
    STOPS[STOPS.len() - 1].1
}

/// RGBA8 pixels of a soft round particle, `size`×`size`, row-major.
///
/// Pixels outside the circle are fully transparent.
pub fn radial_glow(size: u32) -> Vec<u8> {
    let half = size as f32 / 2.0;
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);

    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - half;
            let dy = y as f32 + 0.5 - half;
            let d = (dx * dx + dy * dy).sqrt() / half;

            let [r, g, b, a] = if d > 1.0 { [0.0; 4] } else { gradient(d) };
            pixels.extend_from_slice(&[
                r.round() as u8,
                g.round() as u8,
                b.round() as u8,
                (a * 255.0).round() as u8,
            ]);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(data: &[u8], size: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * size + x) * 4) as usize;
        [data[i], data[i + 1], data[i + 2], data[i + 3]]
    }

    #[test]
    fn glow_fades_from_center() {
        let data = radial_glow(SPRITE_SIZE);
        assert_eq!(data.len(), (SPRITE_SIZE * SPRITE_SIZE * 4) as usize);

        let center = pixel(&data, SPRITE_SIZE, 32, 32);
        assert!(center[3] > 240);
        assert_eq!(pixel(&data, SPRITE_SIZE, 0, 0)[3], 0);

        let mid = pixel(&data, SPRITE_SIZE, 32 + 16, 32);
        assert!(mid[3] < center[3] && mid[3] > 0);
    }

    #[test]
    fn gradient_hits_stops() {
        assert_eq!(gradient(0.0), [255.0, 255.0, 255.0, 1.0]);
        let g = gradient(0.6);
        assert!((g[1] - 150.0).abs() < 1e-3 && (g[3] - 0.4).abs() < 1e-5);
        assert_eq!(gradient(1.0)[3], 0.0);
    }
}
