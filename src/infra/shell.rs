use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub const EXTRA_PATH_ENV: &str = "RENDER_DIAGRAM_EXTRA_PATH";

/// Locate `command`, searching `extra_path`, then `RENDER_DIAGRAM_EXTRA_PATH`,
/// then `PATH`. Commands with a directory component are taken relative to
/// `cwd`. The returned path is always absolute.
pub fn find_bin(command: &str, extra_path: Option<&str>, cwd: &Path) -> Option<PathBuf> {
    let path = Path::new(command);
    if path.components().count() > 1 {
        let candidate = cwd.join(path);
        return candidate.is_file().then_some(candidate);
    }

    let search = std::env::join_paths(collect_search_paths(extra_path)).ok()?;
    let found = which::which_in(command, Some(search), cwd).ok()?;
    Some(if found.is_relative() {
        cwd.join(found)
    } else {
        found
    })
}

fn collect_search_paths(extra_path: Option<&str>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(extra) = extra_path {
        push_unique_paths(&mut paths, std::env::split_paths(extra));
    }

    if let Some(extra) = std::env::var_os(EXTRA_PATH_ENV) {
        push_unique_paths(&mut paths, std::env::split_paths(&extra));
    }

    if let Some(env_path) = std::env::var_os("PATH") {
        push_unique_paths(&mut paths, std::env::split_paths(&env_path));
    }

    paths
}

fn push_unique_paths<I>(dest: &mut Vec<PathBuf>, paths: I)
where
    I: IntoIterator<Item = PathBuf>,
{
    for path in paths {
        if path.as_os_str().is_empty() {
            continue;
        }
        if !dest.iter().any(|existing| existing == &path) {
            dest.push(path);
        }
    }
}

/// Render `program` and `args` as one line that can be pasted into a POSIX
/// shell. Arguments made only of safe characters are left bare.
pub fn display_command<I, S>(program: &str, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut line = shell_escape_value(OsStr::new(program));
    for arg in args {
        line.push(' ');
        line.push_str(&shell_escape_value(arg.as_ref()));
    }
    line
}

fn shell_escape_value(value: &OsStr) -> String {
    let value = value.to_string_lossy();
    if !value.is_empty() && value.chars().all(is_shell_safe) {
        return value.into_owned();
    }

    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}

fn is_shell_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | '@' | ':' | '=' | '+' | ',')
}
