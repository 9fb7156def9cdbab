use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::{DEFAULT_OUTPUT_EXTENSION, RenderError};

pub const CONFIG_PATH_ENV: &str = "RENDER_DIAGRAM_CONFIG_PATH";

/// How to reach the external renderer. Defaults run the Mermaid CLI through
/// `npx`, which downloads it on first use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Executable name or path (resolved through `PATH`).
    pub program: String,
    /// Arguments placed before the input/output flags.
    pub program_args: Vec<String>,
    pub input_flag: String,
    pub output_flag: String,
    /// Arguments appended after the output path (theme, background, ...).
    pub extra_args: Vec<String>,
    pub output_extension: String,
    /// Directory the renderer runs in. Relative request paths are anchored at
    /// the caller's directory when this is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Searched before `PATH`, same syntax as `PATH`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_path: Option<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            program_args: vec!["-y".to_string(), "@mermaid-js/mermaid-cli".to_string()],
            input_flag: "-i".to_string(),
            output_flag: "-o".to_string(),
            extra_args: Vec::new(),
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            working_dir: None,
            extra_path: None,
        }
    }
}

/// Load the configuration.
///
/// An explicit path (argument or `RENDER_DIAGRAM_CONFIG_PATH`) must exist and
/// parse. The per-user default file is optional and a broken one is ignored.
pub fn load_config(explicit: Option<&Path>) -> Result<RendererConfig, RenderError> {
    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

    if let Some(path) = explicit {
        log::debug!("Loading renderer config from {}", path.display());
        let contents = std::fs::read_to_string(&path).map_err(|err| RenderError::Config {
            path: path.clone(),
            message: err.to_string(),
        })?;
        return parse_config(&contents).map_err(|message| RenderError::Config { path, message });
    }

    let Some(path) = default_config_path() else {
        return Ok(RendererConfig::default());
    };
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return Ok(RendererConfig::default());
    };

    match parse_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded renderer config from {}", path.display());
            Ok(config)
        }
        Err(message) => {
            log::warn!(
                "Ignoring invalid config at {}: {}",
                path.display(),
                message
            );
            Ok(RendererConfig::default())
        }
    }
}

pub fn parse_config(contents: &str) -> Result<RendererConfig, String> {
    toml::from_str(contents).map_err(|err| err.to_string())
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("render-diagram").join("config.toml"))
}
