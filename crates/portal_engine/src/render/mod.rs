//! Rendering seam for portal views
//!
//! The portal engine never rasterizes. It prepares virtual cameras (buffer
//! size, clip plane, projection, transform) and hands them to a host-provided
//! [`CaptureBackend`].

pub mod camera;
pub mod target;
pub mod headless;

pub use camera::{Projection, PostProcessSettings, Viewer};
pub use target::{CaptureBackend, ClipPlane, LinearColor, RenderTarget, VirtualCamera};
pub use headless::{CaptureEvent, HeadlessCapture};
