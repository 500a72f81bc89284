//! Capability boundary to the external code-rendering engine.
//!
//! The engine is loaded by the host at some point after startup. Until it is
//! installed into an [`EngineHandle`], every renderer-dependent component must
//! treat "not ready" as a normal state.

use crate::models::{CornerDotType, CornerSquareType, DotType, HexColor, StyleState};
use crate::services::logo::LogoImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::watch;

/// Output encodings supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Svg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Svg => "svg",
        }
    }
}

/// Reed-Solomon error-correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    L,
    M,
    #[default]
    Q,
    H,
}

/// Where an engine instance is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    /// The on-screen preview owned by the render adapter
    Preview,
    /// A disposable off-screen container for batch item `n`
    Offscreen(usize),
}

/// Full option set handed to the engine on construct and update
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub data: String,
    pub image: Option<LogoImage>,
    pub dot_color: HexColor,
    pub dot_type: DotType,
    /// `None` renders a transparent background
    pub background: Option<HexColor>,
    pub image_margin: u32,
    pub corner_square_type: CornerSquareType,
    pub corner_dot_type: CornerDotType,
    pub error_correction: ErrorCorrection,
}

impl RenderOptions {
    /// Options for `payload` drawn in `style` at `size`×`size`, without a logo.
    pub fn from_style(payload: &str, style: &StyleState, size: u32) -> Self {
        Self {
            width: size,
            height: size,
            data: payload.to_string(),
            image: None,
            dot_color: style.color.clone(),
            dot_type: style.dot_type,
            background: style.background().cloned(),
            image_margin: style.logo_margin.get(),
            corner_square_type: style.corner_square_type,
            corner_dot_type: style.corner_dot_type,
            error_correction: ErrorCorrection::default(),
        }
    }

    pub fn with_logo(mut self, logo: Option<LogoImage>) -> Self {
        self.image = logo;
        self
    }

    pub fn with_margin(mut self, margin: u32) -> Self {
        self.image_margin = margin;
        self
    }

    pub fn with_error_correction(mut self, level: ErrorCorrection) -> Self {
        self.error_correction = level;
        self
    }

    /// Same options at a different square size.
    pub fn resized(&self, size: u32) -> Self {
        Self {
            width: size,
            height: size,
            ..self.clone()
        }
    }
}

/// Errors surfaced by the engine or the adapter around it
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Rendering engine is not ready")]
    EngineNotReady,

    #[error("No preview has been rendered")]
    NoPreview,

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Export produced no data")]
    EmptyExport,

    #[error("SVG export is not valid UTF-8")]
    InvalidSvg,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A live engine instance bound to one drawing.
#[cfg_attr(test, mockall::automock)]
pub trait RenderInstance: Send {
    /// Apply a new option set, re-rendering in place.
    fn update(&mut self, options: &RenderOptions) -> Result<(), RenderError>;

    /// Attach the drawing to a container.
    fn append(&mut self, container: Container) -> Result<(), RenderError>;

    /// Remove the drawing from whatever container holds it.
    fn detach(&mut self);

    /// Encode the current drawing.
    fn raw_data(&mut self, format: ImageFormat) -> Result<Vec<u8>, RenderError>;
}

/// Factory for engine instances.
#[cfg_attr(test, mockall::automock)]
pub trait RenderEngine: Send + Sync {
    fn construct(&self, options: &RenderOptions) -> Result<Box<dyn RenderInstance>, RenderError>;
}

/// Shared slot for the engine plus a readiness signal.
///
/// Clones share the slot, so a handle given to the adapter and the batch
/// pipeline both observe [`install`](Self::install).
#[derive(Clone)]
pub struct EngineHandle {
    engine: Arc<RwLock<Option<Arc<dyn RenderEngine>>>>,
    ready_tx: Arc<watch::Sender<bool>>,
}

impl EngineHandle {
    /// An empty, not-ready handle.
    pub fn new() -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            engine: Arc::new(RwLock::new(None)),
            ready_tx: Arc::new(ready_tx),
        }
    }

    /// A handle that is ready from the start.
    pub fn with_engine(engine: Arc<dyn RenderEngine>) -> Self {
        let handle = Self::new();
        handle.install(engine);
        handle
    }

    /// Make `engine` available and signal readiness.
    pub fn install(&self, engine: Arc<dyn RenderEngine>) {
        *self.engine.write().unwrap_or_else(|e| e.into_inner()) = Some(engine);
        self.ready_tx.send_replace(true);
        tracing::info!("Rendering engine installed");
    }

    pub fn is_ready(&self) -> bool {
        *self.ready_tx.borrow()
    }

    pub fn engine(&self) -> Option<Arc<dyn RenderEngine>> {
        self.engine
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Receiver that flips to `true` once the engine is installed.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.ready_tx.subscribe()
    }

    /// Resolve once the engine is installed.
    pub async fn wait_ready(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for EngineHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExportSize;

    #[test]
    fn test_options_from_style() {
        let style = StyleState {
            bg_transparent: true,
            export_size: ExportSize::new(1024).unwrap(),
            ..Default::default()
        };

        let options = RenderOptions::from_style("https://a.com", &style, 300);

        assert_eq!(options.width, 300);
        assert_eq!(options.data, "https://a.com");
        assert!(options.background.is_none());
        assert_eq!(options.image_margin, 5);
        assert_eq!(options.error_correction, ErrorCorrection::Q);

        let export = options.resized(1024).with_margin(20);
        assert_eq!((export.width, export.height), (1024, 1024));
        assert_eq!(export.image_margin, 20);
        assert_eq!(export.data, "https://a.com");
    }

    #[test]
    fn test_handle_readiness() {
        let handle = EngineHandle::new();
        let clone = handle.clone();
        assert!(!handle.is_ready());
        assert!(handle.engine().is_none());

        clone.install(Arc::new(MockRenderEngine::new()));

        assert!(handle.is_ready());
        assert!(handle.engine().is_some());
    }

    #[tokio::test]
    async fn test_wait_ready_resolves_after_install() {
        let handle = EngineHandle::new();
        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.wait_ready().await })
        };

        handle.install(Arc::new(MockRenderEngine::new()));

        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("wait_ready did not resolve")
            .unwrap();
    }
}
