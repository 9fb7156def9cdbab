//! Runs the external diagram renderer for a [`RenderRequest`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::domain::{RenderError, RenderRequest};
use crate::infra::app_config::RendererConfig;
use crate::infra::shell;

/// What a successful render left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub output: PathBuf,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Builds and runs the renderer command. One [`Invoker::render`] call spawns
/// exactly one child process and waits for it without a timeout.
#[derive(Debug, Clone, Default)]
pub struct Invoker {
    config: RendererConfig,
}

impl Invoker {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Resolve the positional arguments using the configured image extension.
    pub fn request(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
    ) -> Result<RenderRequest, RenderError> {
        RenderRequest::resolve(input, output, &self.config.output_extension)
    }

    /// Request with paths adjusted for the directory the renderer runs in.
    pub fn effective_request(&self, request: &RenderRequest) -> Result<RenderRequest, RenderError> {
        if self.config.working_dir.is_none() {
            return Ok(request.clone());
        }
        let cwd = self.caller_dir()?;
        Ok(request.anchored_at(&cwd))
    }

    /// Arguments passed after the program name.
    pub fn arguments(&self, request: &RenderRequest) -> Vec<OsString> {
        let config = &self.config;
        let mut args: Vec<OsString> = config.program_args.iter().map(OsString::from).collect();
        args.push(OsString::from(&config.input_flag));
        args.push(request.input().as_os_str().to_os_string());
        args.push(OsString::from(&config.output_flag));
        args.push(request.output().as_os_str().to_os_string());
        args.extend(config.extra_args.iter().map(OsString::from));
        args
    }

    /// The command as a single printable line.
    pub fn command_line(&self, request: &RenderRequest) -> String {
        shell::display_command(&self.config.program, self.arguments(request))
    }

    fn caller_dir(&self) -> Result<PathBuf, RenderError> {
        std::env::current_dir().map_err(|source| RenderError::Launch {
            program: self.config.program.clone(),
            source,
        })
    }

    /// Absolute path of the renderer executable. Relative program paths are
    /// taken from `cwd`, not from `working_dir`.
    pub fn resolve_program(&self, cwd: &Path) -> Result<PathBuf, RenderError> {
        let config = &self.config;
        shell::find_bin(&config.program, config.extra_path.as_deref(), cwd)
            .ok_or_else(|| RenderError::ProgramNotFound(config.program.clone()))
    }

    pub async fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError> {
        let config = &self.config;
        let program = self.resolve_program(&self.caller_dir()?)?;
        log::debug!("Resolved renderer {} to {}", config.program, program.display());

        let mut command = tokio::process::Command::new(&program);
        command.args(self.arguments(request));
        if let Some(dir) = &config.working_dir {
            log::debug!("Running renderer in {}", dir.display());
            command.current_dir(dir);
        }

        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RenderError::Launch {
                program: config.program.clone(),
                source,
            })?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| RenderError::Launch {
                program: config.program.clone(),
                source,
            })?;

        if output.status.success() {
            log::info!("Renderer finished: {}", request.output().display());
            Ok(RenderOutput {
                output: request.output().to_path_buf(),
                stdout: output.stdout,
                stderr: output.stderr,
            })
        } else {
            log::debug!("Renderer exited with {}", output.status);
            Err(RenderError::Failed {
                code: output.status.code(),
                stdout: output.stdout,
                stderr: output.stderr,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(input: &str, output: Option<&str>) -> RenderRequest {
        Invoker::default()
            .request(Some(PathBuf::from(input)), output.map(PathBuf::from))
            .unwrap()
    }

    #[test]
    fn test_default_command_line() {
        let invoker = Invoker::default();
        let line = invoker.command_line(&request("dir/diagram.mmd", None));
        assert_eq!(
            line,
            "npx -y @mermaid-js/mermaid-cli -i dir/diagram.mmd -o dir/diagram.png"
        );
    }

    #[test]
    fn test_configured_flags_and_extra_args() {
        let invoker = Invoker::new(RendererConfig {
            program: "mmdc".to_string(),
            program_args: Vec::new(),
            input_flag: "--input".to_string(),
            output_flag: "--output".to_string(),
            extra_args: vec!["-b".to_string(), "transparent".to_string()],
            ..RendererConfig::default()
        });
        let args = invoker.arguments(&request("a.mmd", Some("b.png")));
        assert_eq!(
            args,
            ["--input", "a.mmd", "--output", "b.png", "-b", "transparent"]
                .iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_request_uses_configured_extension() {
        let invoker = Invoker::new(RendererConfig {
            output_extension: "svg".to_string(),
            ..RendererConfig::default()
        });
        let request = invoker
            .request(Some(PathBuf::from("flow.ddm")), None)
            .unwrap();
        assert_eq!(request.output(), std::path::Path::new("flow.svg"));
    }

    #[test]
    fn test_effective_request_unchanged_without_working_dir() {
        let invoker = Invoker::default();
        let original = request("diagram.mmd", None);
        assert_eq!(invoker.effective_request(&original).unwrap(), original);
    }

    #[test]
    fn test_effective_request_anchors_with_working_dir() {
        let invoker = Invoker::new(RendererConfig {
            working_dir: Some(PathBuf::from("tools")),
            ..RendererConfig::default()
        });
        let effective = invoker
            .effective_request(&request("diagram.mmd", None))
            .unwrap();
        assert!(effective.input().is_absolute());
        assert!(effective.output().ends_with("diagram.png"));
    }

    #[test]
    fn test_relative_program_resolves_from_caller_dir() {
        let caller = tempfile::tempdir().unwrap();
        std::fs::create_dir(caller.path().join("bin")).unwrap();
        std::fs::write(caller.path().join("bin").join("fake-mmdc"), "#!/bin/sh\n").unwrap();

        let invoker = Invoker::new(RendererConfig {
            program: "./bin/fake-mmdc".to_string(),
            working_dir: Some(PathBuf::from("elsewhere")),
            ..RendererConfig::default()
        });
        let program = invoker.resolve_program(caller.path()).unwrap();
        assert!(program.is_absolute());
        assert_eq!(program, caller.path().join("./bin/fake-mmdc"));
    }

    #[tokio::test]
    async fn test_missing_program_fails_before_spawn() {
        let invoker = Invoker::new(RendererConfig {
            program: "non_existent_renderer_12345".to_string(),
            ..RendererConfig::default()
        });
        let result = invoker.render(&request("diagram.mmd", None)).await;
        assert!(matches!(result, Err(RenderError::ProgramNotFound(name)) if name == "non_existent_renderer_12345"));
    }
}
