//! Render adapter: owns the single live preview instance and brokers exports.
//!
//! The adapter is the only holder of the preview [`RenderInstance`]. Exports
//! temporarily resize that instance and always put the preview options back,
//! so callers observe the preview unchanged whether the export succeeded or not.

use crate::models::{ExportSize, Settings, StyleState};
use crate::services::engine::{
    Container, EngineHandle, ErrorCorrection, ImageFormat, RenderError, RenderInstance,
    RenderOptions,
};
use crate::services::logo::LogoImage;
use camino::{Utf8Path, Utf8PathBuf};

/// What [`RenderAdapter::ensure`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// First render: an instance was constructed and attached to the preview
    Created,
    /// The existing instance was updated in place
    Updated,
    /// Blank payload: the preview was emptied
    Cleared,
    /// Engine not loaded yet: the request was queued
    Deferred,
}

#[derive(Debug, Clone)]
struct PendingRender {
    payload: String,
    style: StyleState,
    logo: Option<LogoImage>,
}

/// Façade over the rendering engine for the live preview.
pub struct RenderAdapter {
    engine: EngineHandle,
    instance: Option<Box<dyn RenderInstance>>,
    /// Preview options the instance currently shows
    current: Option<RenderOptions>,
    pending: Option<PendingRender>,
    attached: bool,

    preview_size: u32,
    export_margin: u32,
    error_correction: ErrorCorrection,
}

impl RenderAdapter {
    pub fn new(engine: EngineHandle) -> Self {
        Self::with_settings(engine, &Settings::default())
    }

    pub fn with_settings(engine: EngineHandle, settings: &Settings) -> Self {
        Self {
            engine,
            instance: None,
            current: None,
            pending: None,
            attached: false,
            preview_size: settings.preview.size,
            export_margin: settings.export.logo_margin,
            error_correction: settings.export.error_correction,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_ready()
    }

    /// Whether a request is waiting for the engine.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the preview currently shows a drawing.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Options of the drawing currently shown in the preview.
    pub fn preview_options(&self) -> Option<&RenderOptions> {
        self.current.as_ref()
    }

    /// Bring the preview in line with `payload`, `style` and `logo`.
    ///
    /// Before the engine is installed the request is queued (latest wins) and
    /// applied by [`resume`](Self::resume).
    pub fn ensure(
        &mut self,
        payload: &str,
        style: &StyleState,
        logo: Option<LogoImage>,
    ) -> Result<EnsureOutcome, RenderError> {
        if payload.trim().is_empty() {
            self.pending = None;
            self.clear();
            return Ok(EnsureOutcome::Cleared);
        }

        let Some(engine) = self.engine.engine() else {
            tracing::debug!("Engine not ready, deferring preview render");
            self.pending = Some(PendingRender {
                payload: payload.to_string(),
                style: style.clone(),
                logo,
            });
            return Ok(EnsureOutcome::Deferred);
        };
        self.pending = None;

        let options = RenderOptions::from_style(payload, style, self.preview_size)
            .with_logo(logo)
            .with_error_correction(self.error_correction);

        let outcome = match self.instance.as_mut() {
            Some(instance) => {
                instance.update(&options)?;
                EnsureOutcome::Updated
            }
            None => {
                self.instance = Some(engine.construct(&options)?);
                tracing::debug!("Constructed preview instance");
                EnsureOutcome::Created
            }
        };

        if !self.attached {
            if let Some(instance) = self.instance.as_mut() {
                instance.append(Container::Preview)?;
            }
            self.attached = true;
        }

        self.current = Some(options);
        Ok(outcome)
    }

    /// Apply the queued request, if any, once the engine is ready.
    ///
    /// Returns `Ok(None)` when nothing was queued or the engine is still missing.
    pub fn resume(&mut self) -> Result<Option<EnsureOutcome>, RenderError> {
        if !self.engine.is_ready() {
            return Ok(None);
        }
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };

        tracing::debug!("Applying deferred preview render");
        self.ensure(&pending.payload, &pending.style, pending.logo)
            .map(Some)
    }

    fn clear(&mut self) {
        if self.attached {
            if let Some(instance) = self.instance.as_mut() {
                instance.detach();
            }
            self.attached = false;
        }
    }

    /// Encode the preview drawing at `resolution` with the export logo margin.
    ///
    /// The preview options are restored afterwards, also when the export fails.
    pub fn export_as(
        &mut self,
        format: ImageFormat,
        resolution: ExportSize,
    ) -> Result<Vec<u8>, RenderError> {
        let preview = match (&self.current, self.attached) {
            (Some(options), true) => options.clone(),
            _ => return Err(RenderError::NoPreview),
        };
        let instance = self.instance.as_mut().ok_or(RenderError::NoPreview)?;

        let export = preview
            .resized(resolution.get())
            .with_margin(self.export_margin);

        let exported = instance
            .update(&export)
            .and_then(|_| instance.raw_data(format));

        if let Err(e) = instance.update(&preview) {
            tracing::warn!("Failed to restore preview after export: {}", e);
        }

        let bytes = exported?;
        if bytes.is_empty() {
            return Err(RenderError::EmptyExport);
        }

        tracing::debug!(
            "Exported {} bytes as {} at {}px",
            bytes.len(),
            format.extension(),
            resolution.get()
        );
        Ok(bytes)
    }

    /// Export and write `<name>.<ext>` into `dir`.
    ///
    /// # Returns
    /// The written file path
    pub fn download(
        &mut self,
        format: ImageFormat,
        resolution: ExportSize,
        dir: &Utf8Path,
        name: &str,
    ) -> Result<Utf8PathBuf, RenderError> {
        let bytes = self.export_as(format, resolution)?;

        let path = dir.join(format!("{}.{}", name, format.extension()));
        std::fs::write(&path, bytes)?;

        tracing::info!("Downloaded {}", path);
        Ok(path)
    }

    /// The preview drawing as SVG markup, at preview size.
    pub fn svg_markup(&mut self) -> Result<String, RenderError> {
        if !self.attached {
            return Err(RenderError::NoPreview);
        }
        let instance = self.instance.as_mut().ok_or(RenderError::NoPreview)?;

        let bytes = instance.raw_data(ImageFormat::Svg)?;
        if bytes.is_empty() {
            return Err(RenderError::EmptyExport);
        }
        String::from_utf8(bytes).map_err(|_| RenderError::InvalidSvg)
    }

    /// Detach and drop the preview instance.
    pub fn dispose(&mut self) {
        self.clear();
        self.instance = None;
        self.current = None;
        self.pending = None;
        tracing::debug!("Render adapter disposed");
    }
}

impl Drop for RenderAdapter {
    fn drop(&mut self) {
        self.clear();
    }
}
