//! Data models for Qrypt.
//!
//! - [`StyleState`]: Every visual parameter of a generated code, with validated newtypes
//!   ([`HexColor`], [`ExportSize`], [`LogoMargin`]) and closed shape enums
//! - [`BatchJob`]: An in-flight batch run with per-item status
//! - [`AppState`]: Observable batch progress, wrapped by [`StateManager`](crate::state::StateManager)
//! - [`Settings`]: Tunables loaded from `qrypt.yaml`
//! - [`MAX_CONCURRENT_RENDERS`]: Always 1, the rendering engine is not reentrant

pub mod app_state;
pub mod batch;
pub mod config;
pub mod style;

pub use app_state::{AppState, MAX_CONCURRENT_RENDERS};
pub use batch::{BatchItem, BatchJob, ItemStatus};
pub use config::Settings;
pub use style::{
    CornerDotType, CornerSquareType, DotType, ExportSize, HexColor, LogoMargin, StyleError,
    StyleState,
};
