//! The resolved (input, output) pair handed to the external renderer.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::domain::error::RenderError;

/// Image extension used when the configuration does not name one.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "png";

/// A single render invocation: which diagram to read and where the image goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    input: PathBuf,
    output: PathBuf,
}

impl RenderRequest {
    /// Build a request from the positional arguments.
    ///
    /// A missing (or empty) output falls back to [`default_output_path`].
    pub fn resolve(
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        extension: &str,
    ) -> Result<Self, RenderError> {
        let input = input
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(RenderError::Usage)?;

        let output = match output.filter(|path| !path.as_os_str().is_empty()) {
            Some(explicit) => explicit,
            None => default_output_path(&input, extension),
        };

        Ok(Self { input, output })
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Both paths made absolute against `base`. Used when the renderer runs in
    /// a different working directory than the caller.
    pub fn anchored_at(&self, base: &Path) -> Self {
        Self {
            input: anchor(base, &self.input),
            output: anchor(base, &self.output),
        }
    }
}

/// `dir/name.ext` -> `dir/name.<extension>`, in the input's own directory.
pub fn default_output_path(input: &Path, extension: &str) -> PathBuf {
    let extension = extension.trim_start_matches('.');
    let extension = if extension.is_empty() {
        DEFAULT_OUTPUT_EXTENSION
    } else {
        extension
    };

    let mut file_name: OsString = input
        .file_stem()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("diagram"));
    file_name.push(".");
    file_name.push(extension);

    match input.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

fn anchor(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(input: &str, output: Option<&str>) -> Result<RenderRequest, RenderError> {
        RenderRequest::resolve(
            Some(PathBuf::from(input)),
            output.map(PathBuf::from),
            DEFAULT_OUTPUT_EXTENSION,
        )
    }

    #[test]
    fn test_missing_input_is_usage_error() {
        let result = RenderRequest::resolve(None, None, "png");
        assert!(matches!(result, Err(RenderError::Usage)));
    }

    #[test]
    fn test_empty_input_is_usage_error() {
        let result = RenderRequest::resolve(Some(PathBuf::new()), None, "png");
        assert!(matches!(result, Err(RenderError::Usage)));
    }

    #[test]
    fn test_default_output_replaces_extension() {
        let request = resolve("diagram.mmd", None).unwrap();
        assert_eq!(request.input(), Path::new("diagram.mmd"));
        assert_eq!(request.output(), Path::new("diagram.png"));
    }

    #[test]
    fn test_default_output_stays_in_input_dir() {
        let request = resolve("dir/diagram.mmd", None).unwrap();
        assert_eq!(request.output(), Path::new("dir/diagram.png"));
    }

    #[test]
    fn test_explicit_output_bypasses_derivation() {
        let request = resolve("a.mmd", Some("b.png")).unwrap();
        assert_eq!(request.output(), Path::new("b.png"));
    }

    #[test]
    fn test_empty_output_is_treated_as_absent() {
        let request = resolve("a.mmd", Some("")).unwrap();
        assert_eq!(request.output(), Path::new("a.png"));
    }

    #[test]
    fn test_only_last_extension_is_replaced() {
        assert_eq!(
            default_output_path(Path::new("out/a.b.ddm"), "png"),
            PathBuf::from("out/a.b.png")
        );
    }

    #[test]
    fn test_input_without_extension() {
        assert_eq!(
            default_output_path(Path::new("diagram"), "png"),
            PathBuf::from("diagram.png")
        );
    }

    #[test]
    fn test_configured_extension() {
        assert_eq!(
            default_output_path(Path::new("diagram.mmd"), ".svg"),
            PathBuf::from("diagram.svg")
        );
        assert_eq!(
            default_output_path(Path::new("diagram.mmd"), ""),
            PathBuf::from("diagram.png")
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_anchored_at_keeps_absolute_paths() {
        let request = resolve("dir/diagram.mmd", Some("/tmp/out.png")).unwrap();
        let anchored = request.anchored_at(Path::new("/work"));
        assert_eq!(anchored.input(), Path::new("/work/dir/diagram.mmd"));
        assert_eq!(anchored.output(), Path::new("/tmp/out.png"));
    }
}
