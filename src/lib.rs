//! Stageview - scene composition and live-parameter engine for a 3D model viewer.
//!
//! A [`app::ViewerSession`] owns one viewport, a fixed three-point lighting rig, an
//! image-based environment, the displayed model and its animation driver. Parameter
//! edits flow through [`params::ParameterController`], which routes each edit to the
//! rig that owns it so that e.g. a light slider never triggers an environment
//! prefilter pass.
//!
//! Rendering, asset parsing and environment decoding are capabilities injected at
//! construction; the crate ships a glTF/OBJ/STL importer, a Radiance HDR decoder and
//! a CPU preview backend.

pub mod app;
pub mod assets;
pub mod params;
pub mod render;
pub mod scene;
pub mod ui;

pub use app::{HostCapabilities, LoadOutcome, ViewerError, ViewerSession, ViewerTuning};
pub use assets::{AssetError, AssetSource, FormatHint, GeometryAsset};
pub use params::{ParamValue, ParameterController, ParameterError, ParameterSnapshot};
pub use scene::serialization::{ExportedConfig, SessionConfig};
