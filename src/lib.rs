// Library exports for WebAssembly and library usage
pub mod animation;
pub mod bloom;
pub mod camera;
pub mod config;
pub mod error;
pub mod particle_system;
pub mod renderer;
pub mod scheduler;
pub mod shapes;
pub mod sprite;
pub mod stage;
pub mod theme;

// Re-export main types
pub use animation::AnimationState;
pub use camera::OrbitCamera;
pub use config::Config;
pub use error::{ConfigError, RenderError};
pub use particle_system::{ParticleInstance, ParticleSystem};
pub use renderer::Renderer;
pub use scheduler::{Scheduler, TimerHandle};
pub use stage::{FrameOutcome, RenderBackend, Stage, StageEvent};
pub use theme::{BloomSettings, Theme, ThemeCycle};
