use heart_morph::animation::AnimationState;
use heart_morph::camera::OrbitCamera;
use heart_morph::config::Config;
use heart_morph::error::RenderError;
use heart_morph::particle_system::{ParticleInstance, ParticleSystem};
use heart_morph::stage::{FrameOutcome, RenderBackend, Stage};
use heart_morph::theme::BloomSettings;
use std::time::Duration;

/// Backend that keeps the last uploaded instances and bloom values
#[derive(Default)]
struct HeadlessBackend {
    size: (u32, u32),
    bloom: Option<BloomSettings>,
    instances: Vec<ParticleInstance>,
    frames: usize,
}

impl RenderBackend for HeadlessBackend {
    fn upload(&mut self, particles: &mut ParticleSystem) {
        if let Some(bytes) = particles.take_upload() {
            self.instances = bytemuck::cast_slice::<u8, ParticleInstance>(bytes).to_vec();
        }
    }

    fn render(&mut self, _camera: &OrbitCamera, _time: f32) -> Result<(), RenderError> {
        self.frames += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_bloom(&mut self, bloom: BloomSettings) {
        self.bloom = Some(bloom);
    }
}

#[test]
fn pinned_full_morph_lands_on_heart() {
    let mut state = AnimationState::seeded(4, 2024);
    state.pin_morph(1.0);

    for _ in 0..1_000 {
        state.step();
    }

    let particles = &state.particles;
    for i in 0..particles.count {
        let gap = particles.positions[i].distance(particles.heart_targets()[i]);
        assert!(gap < 1e-3, "particle {i} is {gap} away from the heart");
    }
}

#[test]
fn eased_morph_ends_near_heart() {
    let mut state = AnimationState::seeded(200, 8);
    let mut last = 0.0;
    for _ in 0..1_500 {
        state.step();
        assert!(state.morph_progress() >= last);
        last = state.morph_progress();
    }
    assert!(last > 0.999 && last < 1.0);

    let particles = &state.particles;
    let worst = (0..particles.count)
        .map(|i| particles.positions[i].distance(particles.heart_targets()[i]))
        .fold(0.0f32, f32::max);
    assert!(worst < 0.5, "worst distance {worst}");
}

#[test]
fn positions_follow_targets_without_radial_offsets() {
    let mut state = AnimationState::seeded(64, 5);
    let offsets = state.particles.radial_offsets().to_vec();
    assert!(offsets.iter().any(|o| o.length() > 1.0));

    let mut expected = state.particles.positions.clone();
    for _ in 0..50 {
        state.step();

        let blend = state.morph_progress().powf(1.5);
        let lerp_factor = 0.04 + (1.0 - blend) * 0.01;
        let particles = &state.particles;
        for (i, p) in expected.iter_mut().enumerate() {
            let target = particles.glyph_targets()[i].lerp(particles.heart_targets()[i], blend);
            *p += (target - *p) * lerp_factor;
        }
    }

    assert_eq!(state.particles.radial_offsets(), offsets.as_slice());
    for (i, (actual, want)) in state.particles.positions.iter().zip(&expected).enumerate() {
        assert!(actual.distance(*want) < 1e-4, "particle {i} drifted to {actual}");
    }
}

#[test]
fn headless_session_runs_until_redirect() {
    let config = Config {
        particle_count: 128,
        seed: Some(99),
        ..Config::default()
    };
    let mut stage = Stage::new(&config, 640, 480);
    let mut backend = HeadlessBackend::default();
    stage.attach(&mut backend);
    stage.resize(800, 400, &mut backend);

    let frame = Duration::from_millis(50);
    let mut redirect_at = None;
    for n in 1..=400u32 {
        let outcome = stage.frame(frame, &mut backend).unwrap();
        if let FrameOutcome::Navigate(target) = outcome {
            assert_eq!(target, "Heart.html");
            redirect_at = Some(n);
            break;
        }
    }

    // 12 s at 50 ms per frame
    assert_eq!(redirect_at, Some(240));
    assert_eq!(backend.frames, 240);
    assert_eq!(backend.instances.len(), 128);
    assert!(backend.instances.iter().all(|p| p.size >= 0.05));

    // Themes fired at 5 s and 10 s
    assert_eq!(stage.animation.theme().key, "neonRose");
    assert_eq!(backend.bloom, Some(stage.animation.theme().bloom));

    assert!((stage.camera.aspect - 2.0).abs() < 1e-6);
    assert_eq!(backend.size(), (800, 400));
}
