//! Top-level error type for both binaries. Only startup can fail; once the
//! loop is running every simulation step is total.

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("event loop error: {source}")]
    EventLoop {
        #[from]
        source: winit::error::EventLoopError,
    },

    #[error("window creation failed: {source}")]
    Window {
        #[from]
        source: winit::error::OsError,
    },

    #[error("surface creation failed: {source}")]
    Surface {
        #[from]
        source: wgpu::CreateSurfaceError,
    },

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("device request failed: {source}")]
    Device {
        #[from]
        source: wgpu::RequestDeviceError,
    },

    #[error("server I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}
