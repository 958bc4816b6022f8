//! Frame driver tying animation, camera, timers and the render backend together.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

use crate::animation::AnimationState;
use crate::camera::OrbitCamera;
use crate::config::Config;
use crate::error::RenderError;
use crate::particle_system::ParticleSystem;
use crate::scheduler::{Scheduler, TimerHandle};
use crate::theme::BloomSettings;

/// What the frame loop needs from a renderer
pub trait RenderBackend {
    /// Send changed particle buffers to the GPU
    fn upload(&mut self, particles: &mut ParticleSystem);
    /// Draw and composite one frame
    fn render(&mut self, camera: &OrbitCamera, time: f32) -> Result<(), RenderError>;
    fn resize(&mut self, width: u32, height: u32);
    fn size(&self) -> (u32, u32);
    fn set_bloom(&mut self, bloom: BloomSettings);
}

/// Timer payloads
#[derive(Clone, Debug, PartialEq)]
pub enum StageEvent {
    CycleTheme,
    Navigate(String),
}

/// Result of a frame for the host loop
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    Continue,
    /// The redirect timer fired; leave for this target
    Navigate(String),
}

pub struct Stage {
    pub animation: AnimationState,
    pub camera: OrbitCamera,
    scheduler: Scheduler<StageEvent>,
    redirect_timer: Option<TimerHandle>,
    viewport: (u32, u32),
    /// Host clock reading, in seconds, of the previous tick
    last_tick: f64,
}

impl Stage {
    pub fn new(config: &Config, width: u32, height: u32) -> Self {
        Self::starting_at(config, width, height, 0.0)
    }

    /// Build a stage whose timers start counting at host time `now` (seconds)
    pub fn starting_at(config: &Config, width: u32, height: u32, now: f64) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let animation = AnimationState::new(config.particle_count, rng);

        let mut scheduler = Scheduler::new();
        scheduler.every(config.theme_interval(), StageEvent::CycleTheme);
        let redirect_timer = config.redirect_after().map(|delay| {
            scheduler.once(delay, StageEvent::Navigate(config.redirect_target.clone()))
        });

        Self {
            animation,
            camera: OrbitCamera::framing(width, height),
            scheduler,
            redirect_timer,
            viewport: (width, height),
            last_tick: now,
        }
    }

    /// Host time elapsed since the previous tick, or since the stage was built.
    /// A clock that steps backwards yields zero.
    pub fn tick(&mut self, now: f64) -> Duration {
        let dt = (now - self.last_tick).max(0.0);
        self.last_tick = self.last_tick.max(now);
        Duration::from_secs_f64(dt)
    }

    /// Push the starting theme's bloom into a freshly created backend
    pub fn attach<B: RenderBackend + ?Sized>(&self, backend: &mut B) {
        backend.set_bloom(self.animation.theme().bloom);
    }

    pub fn cancel_redirect(&mut self) -> bool {
        self.redirect_timer
            .take()
            .map(|handle| self.scheduler.cancel(handle))
            .unwrap_or(false)
    }

    /// Move the timers forward by `dt` and apply whatever fired
    pub fn poll_timers<B: RenderBackend + ?Sized>(
        &mut self,
        dt: Duration,
        backend: &mut B,
    ) -> FrameOutcome {
        self.fire_timers(dt, Some(backend))
    }

    /// Keep the timers running while no backend exists yet.
    /// Themes still advance; [`Stage::attach`] pushes the current one later.
    pub fn idle(&mut self, dt: Duration) -> FrameOutcome {
        self.fire_timers(dt, None::<&mut dyn RenderBackend>)
    }

    fn fire_timers<B: RenderBackend + ?Sized>(
        &mut self,
        dt: Duration,
        mut backend: Option<&mut B>,
    ) -> FrameOutcome {
        let mut outcome = FrameOutcome::Continue;
        for event in self.scheduler.advance(dt) {
            match event {
                StageEvent::CycleTheme => {
                    let bloom = self.animation.themes.advance().bloom;
                    if let Some(backend) = backend.as_mut() {
                        backend.set_bloom(bloom);
                    }
                }
                StageEvent::Navigate(target) => {
                    log::info!("Redirecting to {}", target);
                    self.redirect_timer = None;
                    outcome = FrameOutcome::Navigate(target);
                }
            }
        }
        outcome
    }

    /// One display refresh: timers, camera, animation step, upload, render.
    pub fn frame<B: RenderBackend + ?Sized>(
        &mut self,
        dt: Duration,
        backend: &mut B,
    ) -> Result<FrameOutcome, RenderError> {
        let outcome = self.poll_timers(dt, backend);

        self.camera.update(dt.as_secs_f32());
        self.animation.step();
        backend.upload(&mut self.animation.particles);
        backend.render(&self.camera, self.animation.time())?;

        Ok(outcome)
    }

    /// Viewport changed; zero-sized (minimized) viewports are ignored
    pub fn resize<B: RenderBackend + ?Sized>(&mut self, width: u32, height: u32, backend: &mut B) {
        if width == 0 || height == 0 {
            return;
        }
        log::debug!("Resize to {}x{}", width, height);
        self.viewport = (width, height);
        self.camera.set_viewport(width, height);
        backend.resize(width, height);
    }

    pub fn pointer_drag(&mut self, dx: f32, dy: f32) {
        self.camera.drag(dx, dy, self.viewport.1 as f32);
    }

    pub fn scroll(&mut self, steps: f32) {
        self.camera.zoom(steps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        size: (u32, u32),
        bloom: Option<BloomSettings>,
        uploads: usize,
        frames: usize,
    }

    impl RenderBackend for Recorder {
        fn upload(&mut self, particles: &mut ParticleSystem) {
            if particles.take_upload().is_some() {
                self.uploads += 1;
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

    fn config() -> Config {
        Config {
            particle_count: 32,
            seed: Some(1),
            ..Config::default()
        }
    }

    #[test]
    fn attach_applies_first_theme() {
        let stage = Stage::new(&config(), 800, 600);
        let mut backend = Recorder::default();
        stage.attach(&mut backend);
        assert_eq!(backend.bloom, Some(BloomSettings::new(0.4, 0.5, 0.7)));
    }

    #[test]
    fn theme_follows_timer() {
        let mut stage = Stage::new(&config(), 800, 600);
        let mut backend = Recorder::default();
        stage.attach(&mut backend);

        for k in 1..=7 {
            stage.poll_timers(Duration::from_secs(5), &mut backend);
            let expected = &stage.animation.themes.themes()[k % 3];
            assert_eq!(stage.animation.theme().key, expected.key);
            assert_eq!(backend.bloom, Some(expected.bloom));
        }
    }

    #[test]
    fn redirect_fires_once_after_delay() {
        let mut stage = Stage::new(&config(), 800, 600);
        let mut backend = Recorder::default();

        let mut outcomes = Vec::new();
        for _ in 0..15 {
            outcomes.push(stage.poll_timers(Duration::from_secs(1), &mut backend));
        }
        let navigations: Vec<usize> = outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| matches!(o, FrameOutcome::Navigate(_)))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(navigations, vec![11]);
        assert_eq!(outcomes[11], FrameOutcome::Navigate("Heart.html".into()));
    }

    #[test]
    fn cancelled_redirect_stays_put() {
        let mut stage = Stage::new(&config(), 800, 600);
        let mut backend = Recorder::default();
        assert!(stage.cancel_redirect());
        let outcome = stage.poll_timers(Duration::from_secs(60), &mut backend);
        assert_eq!(outcome, FrameOutcome::Continue);
    }

    #[test]
    fn time_before_first_render_counts() {
        let mut stage = Stage::starting_at(&config(), 800, 600, 100.0);
        let mut backend = Recorder::default();

        // no backend for the first 6 s
        let mut now = 100.0;
        while now < 106.0 {
            now += 0.5;
            let dt = stage.tick(now);
            assert_eq!(stage.idle(dt), FrameOutcome::Continue);
        }
        assert_eq!(stage.animation.theme().key, "dreamyPink");

        stage.attach(&mut backend);
        assert_eq!(backend.bloom, Some(stage.animation.theme().bloom));

        let mut redirect_at = None;
        while redirect_at.is_none() && now < 130.0 {
            now += 0.5;
            let dt = stage.tick(now);
            if let FrameOutcome::Navigate(_) = stage.frame(dt, &mut backend).unwrap() {
                redirect_at = Some(now - 100.0);
            }
        }
        assert_eq!(redirect_at, Some(12.0));
        assert_eq!(backend.frames, 12);
    }

    #[test]
    fn tick_ignores_clock_going_backwards() {
        let mut stage = Stage::starting_at(&config(), 800, 600, 10.0);
        assert_eq!(stage.tick(9.0), Duration::ZERO);
        assert_eq!(stage.tick(10.25), Duration::from_millis(250));
    }

    #[test]
    fn frame_uploads_and_renders() {
        let mut stage = Stage::new(&config(), 800, 600);
        let mut backend = Recorder::default();
        for _ in 0..3 {
            stage.frame(Duration::from_millis(16), &mut backend).unwrap();
        }
        assert_eq!(backend.frames, 3);
        assert_eq!(backend.uploads, 3);
    }

    #[test]
    fn resize_updates_camera_and_backend() {
        let mut stage = Stage::new(&config(), 800, 600);
        let mut backend = Recorder::default();
        stage.resize(1024, 512, &mut backend);
        assert!((stage.camera.aspect - 2.0).abs() < 1e-6);
        assert_eq!(backend.size(), (1024, 512));

        stage.resize(0, 0, &mut backend);
        assert_eq!(backend.size(), (1024, 512));
    }
}
