pub mod domain;
pub mod infra;

pub use domain::{RenderError, RenderRequest};
pub use infra::app_config::{RendererConfig, load_config};
pub use infra::renderer::{Invoker, RenderOutput};
