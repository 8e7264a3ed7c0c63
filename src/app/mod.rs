mod input;
mod loading;
mod timing;

pub use input::{wheel_steps, PointerState};
pub use loading::{LoadKind, LoadOutcome, LoadTicket, LoadTracker};
pub use timing::FrameTiming;

use crate::assets::hdr::{EquirectLoader, RadianceLoader};
use crate::assets::{
    display_stem, AssetError, AssetLoader, AssetSource, Fetch, FetchedBytes, FormatHint,
    GeometryAsset, ModelImporter, SourceFetcher,
};
use crate::params::{ParamValue, ParameterController, ParameterError, ParameterSnapshot, SceneTargets};
use crate::render::{
    FrameScene, PreviewBackend, RenderBackend, RenderError, Viewport, ViewportRig, CAPTURE_SIZE,
};
use crate::scene::animation::AnimationRig;
use crate::scene::environment::{EnvironmentError, EnvironmentRig, DEFAULT_INTENSITY_EPSILON};
use crate::scene::lighting::LightingRig;
use crate::scene::serialization::{ExportedConfig, SerializationError, SessionConfig};
use crate::scene::stage::{ModelStage, ModelTransform, Placement, LIBRARY_TARGET_SIZE, SCENE_TARGET_SIZE};
use crate::ui::{ModelInfo, StatusBanner, PARSE_FAILURE_TEXT, UNSUPPORTED_FORMAT_TEXT};
use glam::Vec3;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Tuned constants of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerTuning {
    /// Largest side of a normalized model.
    pub normalize_target: f32,
    pub env_intensity_epsilon: f32,
    pub banner_timeout: Duration,
    pub capture_size: u32,
}

impl Default for ViewerTuning {
    fn default() -> Self {
        Self {
            normalize_target: LIBRARY_TARGET_SIZE,
            env_intensity_epsilon: DEFAULT_INTENSITY_EPSILON,
            banner_timeout: Duration::from_secs(5),
            capture_size: CAPTURE_SIZE,
        }
    }
}

impl ViewerTuning {
    /// Tuning for a viewer whose model fills the whole scene.
    pub fn full_scene() -> Self {
        Self {
            normalize_target: SCENE_TARGET_SIZE,
            ..Self::default()
        }
    }
}

/// Capabilities supplied by the host. Optional ones degrade their feature to a no-op.
pub struct HostCapabilities {
    pub container: Viewport,
    pub backend: Box<dyn RenderBackend>,
    pub fetcher: Box<dyn Fetch>,
    pub asset_loader: Option<Box<dyn AssetLoader>>,
    pub environment_loader: Option<Box<dyn EquirectLoader>>,
}

impl HostCapabilities {
    /// Software backend plus the built-in importers and fetcher.
    pub fn preview(container: Viewport) -> Self {
        Self {
            container,
            backend: Box::new(PreviewBackend::new()),
            fetcher: Box::new(SourceFetcher),
            asset_loader: Some(Box::new(ModelImporter)),
            environment_loader: Some(Box::new(RadianceLoader)),
        }
    }
}

macro_rules! scene_targets {
    ($session:ident) => {
        SceneTargets {
            viewport: &mut $session.viewport,
            stage: &mut $session.stage,
            lighting: &mut $session.lighting,
            environment: &mut $session.environment,
            backend: &mut *$session.backend,
        }
    };
}

/// One viewer instance: owns every rig plus the parameter state that drives them.
pub struct ViewerSession {
    config: SessionConfig,
    tuning: ViewerTuning,
    backend: Box<dyn RenderBackend>,
    fetcher: Box<dyn Fetch>,
    asset_loader: Option<Box<dyn AssetLoader>>,
    viewport: ViewportRig,
    stage: ModelStage,
    lighting: LightingRig,
    environment: EnvironmentRig,
    animation: AnimationRig,
    params: ParameterController,
    loads: LoadTracker,
    timing: FrameTiming,
    banner: StatusBanner,
    pointer: PointerState,
    model_name: String,
}

impl ViewerSession {
    pub fn new(config: SessionConfig, tuning: ViewerTuning, caps: HostCapabilities) -> Self {
        let size = config
            .dimension
            .map(|d| Viewport {
                width: d.width,
                height: d.height,
            })
            .unwrap_or(caps.container);
        if caps.asset_loader.is_none() {
            log::error!("no asset loader provided; model loading disabled");
        }
        let snapshot = ParameterSnapshot::from_config(&config);
        let mut session = Self {
            viewport: ViewportRig::new(
                size.width,
                size.height,
                snapshot.camera(),
                config.is_interactable,
            ),
            stage: ModelStage::new(),
            lighting: LightingRig::new(),
            environment: EnvironmentRig::new(caps.environment_loader, tuning.env_intensity_epsilon),
            animation: AnimationRig::new(),
            params: ParameterController::new(snapshot),
            loads: LoadTracker::default(),
            timing: FrameTiming::new(),
            banner: StatusBanner::new(tuning.banner_timeout),
            pointer: PointerState::default(),
            model_name: config.id.clone().unwrap_or_else(|| "model".to_string()),
            backend: caps.backend,
            fetcher: caps.fetcher,
            asset_loader: caps.asset_loader,
            config,
            tuning,
        };
        if let Err(err) = session.params.apply_all(&mut scene_targets!(session), snapshot, true) {
            log::warn!("initial parameters rejected: {}", err);
        }
        log::info!(
            "viewer session '{}' created ({}x{})",
            session.model_name,
            size.width,
            size.height
        );
        session
    }

    /// Loads the configured `url`, if any.
    pub fn start(&mut self) -> Option<LoadOutcome> {
        let url = self.config.url.clone()?;
        Some(self.load_model(AssetSource::from_location(&url)))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn tuning(&self) -> &ViewerTuning {
        &self.tuning
    }

    // ----- model loading -----

    pub fn request_model(&mut self) -> LoadTicket {
        self.banner.show_progress(0);
        self.loads.begin(LoadKind::Model)
    }

    /// Finishes a model load. Results of superseded tickets are dropped.
    pub fn complete_model(
        &mut self,
        ticket: LoadTicket,
        result: Result<GeometryAsset, AssetError>,
        placement: Placement,
    ) -> LoadOutcome {
        if !self.loads.is_current(ticket) {
            log::debug!("dropping stale model load (generation {})", ticket.generation);
            return LoadOutcome::Stale;
        }
        match result {
            Ok(asset) => self.install_model(asset, placement),
            Err(err) => {
                log::warn!("model load failed: {}", err);
                let text = match err {
                    AssetError::UnsupportedFormat { .. } => UNSUPPORTED_FORMAT_TEXT,
                    _ => PARSE_FAILURE_TEXT,
                };
                self.banner.show_error(text, Instant::now());
                LoadOutcome::Failed(err.to_string())
            }
        }
    }

    /// Fetches, parses and installs a model in one step.
    ///
    /// URL loads use the configured scale and rotation; file and byte loads are normalized.
    pub fn load_model(&mut self, source: AssetSource) -> LoadOutcome {
        let ticket = self.request_model();
        let placement = match source {
            AssetSource::Url(_) => Placement::Explicit(self.configured_transform()),
            AssetSource::Path(_) | AssetSource::Bytes { .. } => Placement::Normalize {
                target: self.tuning.normalize_target,
            },
        };
        let banner = &mut self.banner;
        let fetched = self.fetcher.fetch(&source, &mut |loaded, total| {
            if let Some(total) = total.filter(|t| *t > 0) {
                banner.show_progress((loaded.saturating_mul(100) / total).min(100) as u8);
            }
        });
        if !matches!(source, AssetSource::Url(_)) {
            self.model_name = display_stem(&source.name());
        }
        let result = fetched.and_then(|fetched| self.parse_model(&fetched));
        self.complete_model(ticket, result, placement)
    }

    /// Installs the built-in placeholder cube with the configured transform.
    pub fn load_default_cube(&mut self) -> LoadOutcome {
        let ticket = self.request_model();
        let placement = Placement::Explicit(self.configured_transform());
        self.complete_model(ticket, Ok(GeometryAsset::default_cube()), placement)
    }

    pub fn parse_model(&self, fetched: &FetchedBytes) -> Result<GeometryAsset, AssetError> {
        let hint = FormatHint::detect(&fetched.name, &fetched.bytes).ok_or_else(|| {
            AssetError::UnsupportedFormat {
                name: fetched.name.clone(),
            }
        })?;
        let Some(loader) = &self.asset_loader else {
            log::error!("cannot parse '{}': no asset loader", fetched.name);
            return Err(AssetError::MissingCapability {
                capability: "asset loader",
                name: fetched.name.clone(),
            });
        };
        loader.parse(&fetched.bytes, hint, &fetched.name)
    }

    fn configured_transform(&self) -> ModelTransform {
        ModelTransform {
            scale: self.config.model_scale(),
            rotation_deg: self.config.model_rotation(),
        }
    }

    fn install_model(&mut self, asset: GeometryAsset, placement: Placement) -> LoadOutcome {
        let clips = asset.clips.clone();
        if let Err(err) = self.stage.install(&mut *self.backend, asset, placement) {
            log::warn!("model install failed: {}", err);
            self.banner.show_error(PARSE_FAILURE_TEXT, Instant::now());
            return LoadOutcome::Failed(err.to_string());
        }
        self.animation.bind(clips);
        if self.config.is_animatable {
            self.animation.play(0);
        }
        let snapshot = *self.params.snapshot();
        if let Err(err) = self.params.apply_all(&mut scene_targets!(self), snapshot, true) {
            log::warn!("parameters rejected after load: {}", err);
        }
        self.banner.show_help();
        LoadOutcome::Installed
    }

    // ----- environment loading -----

    pub fn request_environment(&mut self) -> LoadTicket {
        self.loads.begin(LoadKind::Environment)
    }

    /// Finishes an environment load. Failures keep the previous environment.
    pub fn complete_environment(
        &mut self,
        ticket: LoadTicket,
        result: Result<FetchedBytes, AssetError>,
    ) -> LoadOutcome {
        if !self.loads.is_current(ticket) {
            log::debug!("dropping stale environment load (generation {})", ticket.generation);
            return LoadOutcome::Stale;
        }
        let outcome = result.map_err(EnvironmentError::from).and_then(|fetched| {
            self.environment
                .load_source(&mut *self.backend, &fetched.bytes, &fetched.name)
        });
        match outcome {
            Ok(()) => LoadOutcome::Installed,
            Err(err) => {
                log::warn!("environment load failed: {}", err);
                LoadOutcome::Failed(err.to_string())
            }
        }
    }

    pub fn load_environment(&mut self, source: AssetSource) -> LoadOutcome {
        let ticket = self.request_environment();
        let fetched = self.fetcher.fetch(&source, &mut |_, _| {});
        self.complete_environment(ticket, fetched)
    }

    // ----- parameters -----

    pub fn apply_parameter(&mut self, id: &str, value: ParamValue) -> Result<bool, ViewerError> {
        Ok(self.params.apply(&mut scene_targets!(self), id, value)?)
    }

    /// Queues raw control text, applied at the start of the next frame.
    pub fn queue_parameter(&mut self, id: impl Into<String>, raw: impl Into<String>) {
        self.params.queue(id, raw);
    }

    pub fn apply_settings(&mut self, settings: &ExportedConfig) -> Result<(), ViewerError> {
        let snapshot = ParameterSnapshot::from_exported(settings)?;
        self.params.apply_all(&mut scene_targets!(self), snapshot, true)?;
        Ok(())
    }

    pub fn export_settings(&self) -> ExportedConfig {
        self.params.export_snapshot()
    }

    pub fn export_settings_json(&self) -> Result<String, ViewerError> {
        Ok(self.export_settings().to_json_pretty()?)
    }

    pub fn reset_defaults(&mut self) {
        let defaults = ParameterSnapshot::factory_defaults();
        if let Err(err) = self.params.apply_all(&mut scene_targets!(self), defaults, true) {
            log::warn!("reset rejected: {}", err);
        }
    }

    pub fn snapshot(&self) -> &ParameterSnapshot {
        self.params.snapshot()
    }

    pub fn take_display_refresh(&mut self) -> bool {
        self.params.take_display_refresh()
    }

    // ----- per frame -----

    /// Applies queued edits, advances animation by wall-clock time, then renders.
    pub fn frame(&mut self, now: Instant) -> Result<(), ViewerError> {
        let dt = self.timing.update(now);
        self.banner.update(now);
        self.params.drain(&mut scene_targets!(self));
        if let Some(pose) = self.animation.tick(dt) {
            self.stage.apply_pose(&pose);
        }
        let frame = compose_frame(&self.viewport, &self.stage, &self.lighting, &self.environment);
        self.viewport.render(&mut *self.backend, &frame)?;
        Ok(())
    }

    /// PNG still at the configured capture size; the viewport size is restored afterwards.
    pub fn capture(&mut self) -> Result<Vec<u8>, ViewerError> {
        let frame = compose_frame(&self.viewport, &self.stage, &self.lighting, &self.environment);
        let png = self
            .viewport
            .capture_still(&mut *self.backend, &frame, self.tuning.capture_size)?;
        Ok(png)
    }

    pub fn capture_file_name(&self) -> String {
        format!("show-{}.png", self.model_name)
    }

    pub fn capture_to_file(&mut self, path: &std::path::Path) -> Result<(), ViewerError> {
        let png = self.capture()?;
        std::fs::write(path, png).map_err(|source| ViewerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("capture written to {}", path.display());
        Ok(())
    }

    // ----- interaction -----

    pub fn pointer_button(&mut self, pressed: bool) {
        self.pointer.handle_button(pressed);
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        if let Some((dx, dy)) = self.pointer.handle_move(x, y) {
            if self.viewport.orbit_drag(dx, dy) {
                self.params.sync_camera(self.viewport.camera());
            }
        }
    }

    pub fn pointer_left(&mut self) {
        self.pointer.handle_leave();
    }

    pub fn wheel(&mut self, delta_y: f32) {
        if self.viewport.dolly(wheel_steps(delta_y)) {
            self.params.sync_camera(self.viewport.camera());
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport.resize(width, height);
    }

    pub fn set_helpers_visible(&mut self, visible: bool) {
        self.viewport.set_helpers_visible(visible);
    }

    pub fn set_light_markers_visible(&mut self, visible: bool) {
        self.lighting.set_debug_visible(visible);
    }

    pub fn set_bounds_visible(&mut self, visible: bool) {
        self.stage.set_debug_bounds_visible(visible);
    }

    // ----- animation -----

    pub fn play_animation(&mut self, index: usize) -> bool {
        self.animation.play(index)
    }

    pub fn play_animation_named(&mut self, name: &str) -> bool {
        self.animation.play_named(name)
    }

    pub fn stop_animations(&mut self) {
        self.animation.stop_all();
    }

    pub fn animation(&self) -> &AnimationRig {
        &self.animation
    }

    // ----- queries -----

    pub fn compute_dimensions(&self) -> Option<Vec3> {
        self.stage.compute_dimensions()
    }

    pub fn model_info(&self) -> Option<ModelInfo> {
        let stats = self.stage.stats()?;
        Some(ModelInfo {
            name: self.model_name.clone(),
            stats,
            dimensions: self.stage.compute_dimensions(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn banner(&self) -> &StatusBanner {
        &self.banner
    }

    pub fn viewport(&self) -> &ViewportRig {
        &self.viewport
    }

    pub fn stage(&self) -> &ModelStage {
        &self.stage
    }

    pub fn lighting(&self) -> &LightingRig {
        &self.lighting
    }

    pub fn environment(&self) -> &EnvironmentRig {
        &self.environment
    }

    pub fn resident_resources(&self) -> usize {
        self.backend.resident_count()
    }

    /// Releases every GPU resource the session holds.
    pub fn teardown(&mut self) {
        self.animation.bind(Vec::new());
        self.stage.clear(&mut *self.backend);
        self.environment.teardown(&mut *self.backend);
        log::info!("viewer session '{}' torn down", self.model_name);
    }
}

fn compose_frame<'a>(
    viewport: &ViewportRig,
    stage: &'a ModelStage,
    lighting: &'a LightingRig,
    environment: &EnvironmentRig,
) -> FrameScene<'a> {
    FrameScene {
        camera: *viewport.camera(),
        model: stage.staged(),
        bounds_overlay: stage.bounds_overlay(),
        ambient: lighting.ambient(),
        point_lights: lighting.point_lights(),
        light_markers: lighting.markers(),
        environment: environment.binding(),
        helpers_visible: viewport.helpers_visible(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::tests::box_asset;
    use crate::assets::{Channel, ChannelValues, Clip, Interpolation};
    use crate::scene::animation::AnimationState;
    use crate::assets::hdr::{DecodeError, EquirectImage};
    use crate::render::CameraState;
    use crate::scene::serialization::Vec3Doc;
    use crate::ui::{BannerKind, HELP_TEXT};

    struct SolidLoader;

    impl EquirectLoader for SolidLoader {
        fn decode(&self, bytes: &[u8], name: &str) -> Result<EquirectImage, DecodeError> {
            match bytes.first() {
                Some(&level) => Ok(EquirectImage::solid(8, 4, [level as f32 / 255.0; 3])),
                None => Err(DecodeError::NotEquirectangular {
                    name: name.to_string(),
                    width: 0,
                    height: 0,
                }),
            }
        }
    }

    fn session_with_environment() -> ViewerSession {
        let caps = HostCapabilities {
            environment_loader: Some(Box::new(SolidLoader)),
            ..HostCapabilities::preview(Viewport {
                width: 320,
                height: 240,
            })
        };
        ViewerSession::new(SessionConfig::default(), ViewerTuning::default(), caps)
    }

    fn hdr(name: &str, level: u8) -> Result<FetchedBytes, AssetError> {
        Ok(FetchedBytes {
            name: name.to_string(),
            bytes: vec![level],
        })
    }

    fn session(config: SessionConfig) -> ViewerSession {
        ViewerSession::new(
            config,
            ViewerTuning::full_scene(),
            HostCapabilities::preview(Viewport {
                width: 320,
                height: 240,
            }),
        )
    }

    fn obj_bytes() -> Vec<u8> {
        b"v 0 0 0\nv 2 0 0\nv 0 4 0\nv 0 0 6\nf 1 2 3\nf 1 3 4\n".to_vec()
    }

    #[test]
    fn no_url_means_no_model() {
        let mut s = session(SessionConfig::default());
        assert!(s.start().is_none());
        assert!(s.stage().is_empty());
        assert_eq!(s.compute_dimensions(), None);
        assert!(s.model_info().is_none());
        s.frame(Instant::now()).unwrap();
    }

    #[test]
    fn stale_model_completion_is_dropped() {
        let mut s = session(SessionConfig::default());
        let first = s.request_model();
        let second = s.request_model();
        let newer = box_asset(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO);
        let older = box_asset(Vec3::new(9.0, 1.0, 1.0), Vec3::ZERO);
        let placement = Placement::Explicit(ModelTransform::default());

        assert_eq!(s.complete_model(second, Ok(newer), placement), LoadOutcome::Installed);
        assert_eq!(s.complete_model(first, Ok(older), placement), LoadOutcome::Stale);
        let dims = s.compute_dimensions().unwrap();
        assert!((dims - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-4);
    }

    #[test]
    fn stale_environment_completion_is_dropped() {
        let mut s = session_with_environment();
        let first = s.request_environment();
        let second = s.request_environment();
        assert_eq!(s.complete_environment(second, hdr("b.hdr", 20)), LoadOutcome::Installed);
        assert_eq!(s.complete_environment(first, hdr("a.hdr", 10)), LoadOutcome::Stale);
        assert_eq!(s.environment().source_name(), Some("b.hdr"));
    }

    #[test]
    fn failed_environment_load_keeps_previous_binding() {
        let mut s = session_with_environment();
        let ticket = s.request_environment();
        s.complete_environment(ticket, hdr("good.hdr", 200));
        let binding = s.environment().binding();
        assert!(binding.is_some());

        let ticket = s.request_environment();
        let fetch_error = Err(AssetError::Fetch {
            url: "https://example.invalid/env.hdr".to_string(),
            message: "connection refused".to_string(),
        });
        assert!(matches!(
            s.complete_environment(ticket, fetch_error),
            LoadOutcome::Failed(_)
        ));
        let ticket = s.request_environment();
        let empty = Ok(FetchedBytes {
            name: "broken.hdr".to_string(),
            bytes: Vec::new(),
        });
        assert!(matches!(s.complete_environment(ticket, empty), LoadOutcome::Failed(_)));

        assert_eq!(s.environment().binding(), binding);
        assert_eq!(s.environment().source_name(), Some("good.hdr"));
        assert_eq!(s.banner().kind(), BannerKind::Help);
        s.frame(Instant::now()).unwrap();
    }

    #[test]
    fn non_finite_config_never_reaches_rigs() {
        let mut config = SessionConfig::default();
        let mut camera = crate::scene::serialization::CameraDoc::default();
        camera.position = Vec3Doc {
            x: f32::INFINITY,
            y: 0.0,
            z: 5.0,
        };
        config.model_properties.camera = Some(camera);
        config.model_properties.scale = Some(Vec3Doc {
            x: f32::INFINITY,
            y: 1.0,
            z: 1.0,
        });
        let mut s = session(config);
        assert_eq!(*s.viewport().camera(), CameraState::default());
        assert!(s.snapshot().first_invalid().is_none());

        s.load_default_cube();
        let dims = s.compute_dimensions().unwrap();
        assert!((dims - Vec3::ONE).length() < 1e-4);
    }

    #[test]
    fn byte_loads_are_normalized_to_scene_target() {
        let mut s = session(SessionConfig::default());
        let outcome = s.load_model(AssetSource::Bytes {
            name: "Wedge.obj".to_string(),
            bytes: obj_bytes(),
        });
        assert_eq!(outcome, LoadOutcome::Installed);
        let info = s.model_info().unwrap();
        assert!((info.stats.scale_factor - 5.0 / 6.0).abs() < 1e-5);
        assert!((s.compute_dimensions().unwrap().max_element() - 5.0).abs() < 1e-4);
        assert_eq!(s.capture_file_name(), "show-Wedge.png");
        assert_eq!(s.banner().text(), HELP_TEXT);
    }

    #[test]
    fn unsupported_format_shows_banner_and_keeps_model() {
        let mut s = session(SessionConfig::default());
        s.load_default_cube();
        let outcome = s.load_model(AssetSource::Bytes {
            name: "notes.txt".to_string(),
            bytes: b"hello".to_vec(),
        });
        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert_eq!(s.banner().kind(), BannerKind::Error);
        assert_eq!(s.banner().text(), UNSUPPORTED_FORMAT_TEXT);
        assert!(!s.stage().is_empty());
    }

    #[test]
    fn animatable_session_autoplays_first_clip() {
        let config = SessionConfig {
            is_animatable: true,
            ..SessionConfig::default()
        };
        let mut s = session(config);
        let mut asset = box_asset(Vec3::ONE, Vec3::ZERO);
        asset.clips.push(std::sync::Arc::new(Clip::new(
            "spin",
            vec![Channel {
                node: 0,
                interpolation: Interpolation::Linear,
                times: vec![0.0, 2.0],
                values: ChannelValues::Translation(vec![Vec3::ZERO, Vec3::X]),
            }],
        )));
        let ticket = s.request_model();
        s.complete_model(ticket, Ok(asset), Placement::Explicit(ModelTransform::default()));
        assert_eq!(s.animation().state(), AnimationState::Playing);

        let start = Instant::now();
        s.frame(start).unwrap();
        s.frame(start + Duration::from_millis(500)).unwrap();
        let time = s.animation().time().unwrap();
        assert!((time - 0.516).abs() < 1e-3);
    }

    #[test]
    fn queued_edits_apply_before_render() {
        let mut s = session(SessionConfig::default());
        s.queue_parameter("fov", "60");
        s.queue_parameter("light1Intensity", "oops");
        s.frame(Instant::now()).unwrap();
        assert_eq!(s.viewport().camera().fov_deg, 60.0);
        assert_eq!(s.snapshot().fov_deg, 60.0);
        assert_eq!(s.snapshot().lights[0].intensity, 15.0);
    }

    #[test]
    fn settings_roundtrip_through_json() {
        let mut s = session(SessionConfig::default());
        s.apply_parameter("envIntensity", ParamValue::Number(2.5)).unwrap();
        s.apply_parameter("rotZ", ParamValue::Number(12.0)).unwrap();
        let json = s.export_settings_json().unwrap();
        s.reset_defaults();
        assert_eq!(s.snapshot().env_intensity, 1.0);

        s.apply_settings(&ExportedConfig::from_json_str(&json).unwrap()).unwrap();
        assert_eq!(s.snapshot().env_intensity, 2.5);
        assert_eq!(s.snapshot().rotation_deg.z, 12.0);
        assert_eq!(s.export_settings_json().unwrap(), json);
    }

    #[test]
    fn interactive_drag_updates_snapshot() {
        let config = SessionConfig {
            is_interactable: true,
            ..SessionConfig::default()
        };
        let mut s = session(config);
        let before = s.snapshot().camera_position;
        s.pointer_button(true);
        s.pointer_moved(10.0, 10.0);
        s.pointer_moved(60.0, 10.0);
        assert_ne!(s.snapshot().camera_position, before);
        assert_eq!(s.snapshot().camera_position, s.viewport().camera().position);
    }

    #[test]
    fn capture_restores_viewport_and_teardown_releases_everything() {
        let mut s = session(SessionConfig::default());
        s.load_default_cube();
        assert!(s.resident_resources() > 0);
        let png = s.capture().unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        assert_eq!(s.viewport().size(), Viewport { width: 320, height: 240 });
        s.teardown();
        assert_eq!(s.resident_resources(), 0);
    }
}
