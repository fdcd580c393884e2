use std::path::{Path, PathBuf};

use tokio::process::Command;

/// `sh -c <command>` on Unix, `cmd /C <command>` on Windows.
pub(crate) fn shell_command(command: &str) -> Command {
    cfg_if::cfg_if! {
        if #[cfg(target_family = "windows")] {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
        }
    }
    cmd
}

/// Resolve `path` against the current directory.
///
/// Steps run inside the job directory, so every path handed to them must be absolute.
/// An unresolvable path (empty, or no readable cwd) is returned unchanged.
pub(crate) fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Quote `arg` for a POSIX shell command line.
///
/// Plain arguments are returned untouched so transcripts stay readable.
pub fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | ':' | '=' | ','));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
