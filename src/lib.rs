// Qrypt - Style state engine for styled QR codes
//
// This is the library crate: the style model and its share-link codec, the
// undo/redo history, logo compositing, the render adapter and the batch
// export pipeline. The binary crate (main.rs) is a small inspection tool.

pub mod codec;
pub mod config;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use codec::PartialStyle;
pub use config::ConfigManager;
pub use history::{HistoryStore, RecentPayloads};
pub use models::{AppState, Settings, StyleState};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
