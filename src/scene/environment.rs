use crate::assets::hdr::{content_digest, DecodeError, EquirectLoader};
use crate::assets::AssetError;
use crate::render::{EnvironmentBinding, RenderBackend, RenderError, ResourceHandle};

/// Intensity changes smaller than this do not trigger a new prefilter pass.
pub const DEFAULT_INTENSITY_EPSILON: f32 = 0.01;

#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("no {capability} available")]
    MissingCapability { capability: &'static str },
    #[error("failed to load environment source: {0}")]
    Load(#[from] AssetError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("renderer rejected environment: {0}")]
    Backend(#[from] RenderError),
}

#[derive(Debug, Clone)]
struct Source {
    name: String,
    handle: ResourceHandle,
    digest: [u8; 32],
}

/// Inputs of the last prefilter pass. The live intensity scalar is tracked separately.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Applied {
    digest: [u8; 32],
    blurriness: f32,
    intensity: f32,
    prefiltered: ResourceHandle,
}

/// Image-based lighting: an equirectangular source and its prefiltered derivative.
pub struct EnvironmentRig {
    loader: Option<Box<dyn EquirectLoader>>,
    epsilon: f32,
    source: Option<Source>,
    applied: Option<Applied>,
    blurriness: f32,
    intensity: f32,
}

impl std::fmt::Debug for EnvironmentRig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentRig")
            .field("has_loader", &self.loader.is_some())
            .field("epsilon", &self.epsilon)
            .field("source", &self.source.as_ref().map(|s| s.name.as_str()))
            .field("blurriness", &self.blurriness)
            .field("intensity", &self.intensity)
            .finish()
    }
}

impl EnvironmentRig {
    pub fn new(loader: Option<Box<dyn EquirectLoader>>, epsilon: f32) -> Self {
        if loader.is_none() {
            log::error!("no equirectangular loader provided; environment lighting disabled");
        }
        Self {
            loader,
            epsilon,
            source: None,
            applied: None,
            blurriness: 0.0,
            intensity: 1.0,
        }
    }

    pub fn is_available(&self) -> bool {
        self.loader.is_some()
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().map(|source| source.name.as_str())
    }

    /// Last requested `(blurriness, intensity)`.
    pub fn parameters(&self) -> (f32, f32) {
        (self.blurriness, self.intensity)
    }

    /// Replaces the source image and reapplies the current parameters.
    ///
    /// Any failure leaves the previous environment in place.
    pub fn load_source(
        &mut self,
        backend: &mut dyn RenderBackend,
        bytes: &[u8],
        name: &str,
    ) -> Result<(), EnvironmentError> {
        let Some(loader) = &self.loader else {
            log::error!("cannot load environment '{}': no equirectangular loader", name);
            return Err(EnvironmentError::MissingCapability {
                capability: "equirectangular loader",
            });
        };
        let image = loader.decode(bytes, name)?;
        let handle = backend.upload_environment(&image)?;
        let previous = self.source.replace(Source {
            name: name.to_string(),
            handle,
            digest: content_digest(bytes),
        });
        if let Some(previous) = previous {
            backend.release(previous.handle);
        }
        log::info!("environment source '{}' loaded ({}x{})", name, image.width, image.height);

        let (blurriness, intensity) = (self.blurriness, self.intensity);
        self.set_parameters(backend, blurriness, intensity)?;
        Ok(())
    }

    /// Applies blur and intensity. Returns whether a prefilter pass ran.
    ///
    /// The intensity scalar always takes effect; only the convolution is guarded.
    pub fn set_parameters(
        &mut self,
        backend: &mut dyn RenderBackend,
        blurriness: f32,
        intensity: f32,
    ) -> Result<bool, EnvironmentError> {
        self.blurriness = blurriness.clamp(0.0, 1.0);
        self.intensity = intensity.max(0.0);
        let Some(source) = &self.source else {
            return Ok(false);
        };

        if let Some(applied) = &self.applied {
            if applied.digest == source.digest
                && applied.blurriness == self.blurriness
                && (self.intensity - applied.intensity).abs() < self.epsilon
            {
                log::debug!(
                    "environment unchanged (blur {:.3}, intensity {:.3}); skipping prefilter",
                    self.blurriness,
                    self.intensity
                );
                return Ok(false);
            }
        }

        let prefiltered = backend.prefilter_environment(source.handle, self.blurriness)?;
        let previous = self.applied.replace(Applied {
            digest: source.digest,
            blurriness: self.blurriness,
            intensity: self.intensity,
            prefiltered,
        });
        if let Some(previous) = previous {
            backend.release(previous.prefiltered);
        }
        Ok(true)
    }

    pub fn binding(&self) -> Option<EnvironmentBinding> {
        self.applied.map(|applied| EnvironmentBinding {
            prefiltered: applied.prefiltered,
            intensity: self.intensity,
        })
    }

    pub fn teardown(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(applied) = self.applied.take() {
            backend.release(applied.prefiltered);
        }
        if let Some(source) = self.source.take() {
            backend.release(source.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::hdr::EquirectImage;
    use crate::render::PreviewBackend;

    struct SolidLoader;

    impl EquirectLoader for SolidLoader {
        fn decode(&self, bytes: &[u8], name: &str) -> Result<EquirectImage, DecodeError> {
            if bytes.is_empty() {
                return Err(DecodeError::NotEquirectangular {
                    name: name.to_string(),
                    width: 0,
                    height: 0,
                });
            }
            Ok(EquirectImage::solid(8, 4, [bytes[0] as f32 / 255.0; 3]))
        }
    }

    fn rig() -> EnvironmentRig {
        EnvironmentRig::new(Some(Box::new(SolidLoader)), DEFAULT_INTENSITY_EPSILON)
    }

    #[test]
    fn parameters_without_source_are_a_no_op() {
        let mut backend = PreviewBackend::new();
        let mut env = rig();
        assert!(!env.set_parameters(&mut backend, 0.5, 2.0).unwrap());
        assert_eq!(backend.prefilter_passes(), 0);
        assert!(env.binding().is_none());
    }

    #[test]
    fn identical_parameters_prefilter_once() {
        let mut backend = PreviewBackend::new();
        let mut env = rig();
        env.load_source(&mut backend, &[200], "studio.hdr").unwrap();
        let after_load = backend.prefilter_passes();
        assert_eq!(after_load, 1);

        assert!(env.set_parameters(&mut backend, 0.3, 1.0).unwrap());
        assert!(!env.set_parameters(&mut backend, 0.3, 1.0).unwrap());
        assert!(!env.set_parameters(&mut backend, 0.3, 1.005).unwrap());
        assert_eq!(backend.prefilter_passes(), after_load + 1);

        assert!(env.set_parameters(&mut backend, 0.3, 1.5).unwrap());
        assert!(env.set_parameters(&mut backend, 0.4, 1.5).unwrap());
        assert_eq!(backend.prefilter_passes(), after_load + 3);
    }

    #[test]
    fn small_intensity_change_is_bound_without_prefilter() {
        let mut backend = PreviewBackend::new();
        let mut env = rig();
        env.load_source(&mut backend, &[200], "studio.hdr").unwrap();
        let passes = backend.prefilter_passes();

        assert!(!env.set_parameters(&mut backend, 0.0, 1.009).unwrap());
        assert_eq!(backend.prefilter_passes(), passes);
        let binding = env.binding().unwrap();
        assert_eq!(binding.intensity, 1.009);
        assert_eq!(env.parameters(), (0.0, 1.009));
    }

    #[test]
    fn replacing_source_releases_previous_resources() {
        let mut backend = PreviewBackend::new();
        let mut env = rig();
        env.load_source(&mut backend, &[10], "a.hdr").unwrap();
        env.load_source(&mut backend, &[20], "b.hdr").unwrap();
        assert_eq!(backend.resident_count(), 2);
        assert_eq!(env.source_name(), Some("b.hdr"));
        env.teardown(&mut backend);
        assert_eq!(backend.resident_count(), 0);
    }

    #[test]
    fn failed_load_keeps_previous_environment() {
        let mut backend = PreviewBackend::new();
        let mut env = rig();
        env.load_source(&mut backend, &[10], "good.hdr").unwrap();
        let binding = env.binding();
        assert!(matches!(
            env.load_source(&mut backend, &[], "broken.hdr"),
            Err(EnvironmentError::Decode(_))
        ));
        assert_eq!(env.binding(), binding);
        assert_eq!(env.source_name(), Some("good.hdr"));
    }

    #[test]
    fn missing_loader_degrades_to_no_op() {
        let mut backend = PreviewBackend::new();
        let mut env = EnvironmentRig::new(None, DEFAULT_INTENSITY_EPSILON);
        assert!(!env.is_available());
        assert!(matches!(
            env.load_source(&mut backend, &[1], "x.hdr"),
            Err(EnvironmentError::MissingCapability { .. })
        ));
        assert!(!env.set_parameters(&mut backend, 0.2, 1.0).unwrap());
        assert_eq!(backend.resident_count(), 0);
    }
}
