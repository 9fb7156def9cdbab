//! Infrastructure layer: configuration, executable lookup and the renderer
//! subprocess.

pub mod app_config;
pub mod renderer;
pub mod shell;
