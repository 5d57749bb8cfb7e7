//! Configuration module for the recorder.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the recorder
//! and the capture device, `AppPaths` for cross-platform directories, and
//! TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, CaptureConfig, RecorderConfig};
