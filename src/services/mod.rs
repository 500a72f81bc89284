//! Services module - rendering, logo compositing and batch export.
//!
//! The services are framework-agnostic: the rendering engine is reached only
//! through the [`RenderEngine`] / [`RenderInstance`] traits, so every service
//! can be driven by a test double.
//!
//! # Components
//!
//! - [`EngineHandle`]: Late-bound slot for the engine with a readiness signal
//! - [`RenderAdapter`]: Owns the live preview instance, exports at full resolution
//! - [`logo`]: Puts an uploaded logo on a rounded backing plate
//! - [`BatchPipeline`]: Sequential off-screen rendering of many payloads into one zip
//! - [`ArchiveBuilder`]: Ordered zip packaging
//! - [`Payload`]: Templates for Wi-Fi, e-mail, SMS and vCard content
//!
//! # Usage Example
//!
//! ```ignore
//! use qrypt::services::{BatchPipeline, EngineHandle};
//!
//! let engine = EngineHandle::new();
//! // ... host installs the engine once it has loaded
//! engine.install(my_engine);
//!
//! let pipeline = BatchPipeline::new(engine, state, &settings);
//! let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
//! let archive = pipeline.run(urls, &style, cancel_rx).await?;
//! archive.save_to(downloads)?;
//! ```

pub mod archive;
pub mod batch;
pub mod engine;
pub mod logo;
pub mod payload;
pub mod render;

pub use archive::{ArchiveBuilder, ArchiveError};
pub use batch::{BatchArchive, BatchError, BatchPipeline, ItemFailure, entry_name, sanitize_payload};
pub use engine::{
    Container, EngineHandle, ErrorCorrection, ImageFormat, RenderEngine, RenderError,
    RenderInstance, RenderOptions,
};
pub use logo::{LogoImage, LogoOutcome, LogoTicketer};
pub use payload::{Payload, WifiEncryption};
pub use render::{EnsureOutcome, RenderAdapter};
