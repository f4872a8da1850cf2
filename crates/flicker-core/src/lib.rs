//! Candlelight flicker engine.
//!
//! Everything here is plain Rust with no host dependency: the noise field,
//! the color model, classification of text elements into light bands, the
//! gradient and shadow builders, and the session that schedules them against
//! a [`Surface`].

pub mod classify;
pub mod color;
pub mod compositor;
pub mod config;
pub mod css;
pub mod error;
pub mod frame;
pub mod message;
pub mod noise;
pub mod session;
pub mod shadow;
pub mod sources;
pub mod surface;

pub use classify::{Classifier, ClassifyStats, Exposure, ReclassifySchedule};
pub use color::{warm_rgb, Rgb, WarmColor};
pub use compositor::{ambient_opacity, compose, Composite, DirectionFlicker};
pub use config::{Config, ConfigPatch, Direction, Directions, SiteOverrides};
pub use error::{FlickerError, FlickerResult};
pub use frame::{FrameClock, RenderCommand, RenderLoop};
pub use message::{site_label, Message, Reply};
pub use noise::{candle, hash, noise};
pub use session::{EffectSession, MessageOutcome, SessionState};
pub use shadow::ShadowBuilder;
pub use surface::{MemorySurface, Rect, Surface, SurfaceCall, Tag, Viewport};
