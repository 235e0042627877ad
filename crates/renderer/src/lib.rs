//! Renderer crate for livebg, the procedural animated page background.
//!
//! The crate owns everything between a host's frame callbacks and pixels on
//! a surface. The overall flow is:
//!
//! ```text
//!   host (HeadlessHost / HostRuntime)
//!          │ HostEvent, fired FrameHandle
//!          ▼
//!   LiveBackground::on_frame ──▶ FrameThrottle ──▶ AnimationPolicy
//!                                                     │
//!                      static: paint_backdrop ◀───────┤
//!                                                     ▼
//!                      dynamic: paint_backdrop ─▶ paint_stars ─▶ paint_waves
//! ```
//!
//! `LiveBackground` owns the surface and render state for one mount, reads
//! ambient signals through an [`EnvironmentProbe`], and requests frames from a
//! [`scheduler::FrameScheduler`]. `PixelSurface` rasterizes on the CPU through
//! `vello_cpu` and can export PNG frames; `RecordingSurface` logs draw calls
//! instead.

mod background;
mod environment;
mod host;
mod policy;
mod raster;
mod recording;
mod runtime;
pub mod scene;
mod surface;
mod types;

pub use background::{FrameOutcome, FrameStats, LiveBackground, LoopPhase, RenderState};
pub use environment::{EnvironmentProbe, ListenerId, ListenerKind, StaticProbe};
pub use host::{dispatch_event, fire_due, HeadlessHost, HostEvent, HostedBackground};
pub use policy::AnimationPolicy;
pub use raster::PixelSurface;
pub use recording::{DrawCommand, RecordingSurface};
pub use runtime::{HostRuntime, RunStats, RuntimeConfig};
pub use scene::{WaveParams, WAVES};
pub use surface::{Surface, SurfaceError};
pub use types::{
    BackgroundOptions, BezPath, Circle, ColorStop, Paint, PathEl, Point, Rect, Rgb, Rgba,
    StarCounts, VerticalGradient,
};
