use std::path::Path;
use std::process::ExitStatus;

use tokio::process::Command;

use crate::error::{AppError, Result};

/// Run `command` through the system shell in `cwd`, inheriting stdio.
pub async fn run(command: &str, cwd: &Path) -> Result<ExitStatus> {
    let mut child = shell_command(command);
    let status = child
        .current_dir(cwd)
        .status()
        .await
        .map_err(|e| AppError::Exec(format!("{}: {}", command, e)))?;
    log::debug!("`{}` in {} exited with {}", command, cwd.display(), status);
    Ok(status)
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Keep terminal interrupts from ending the session.
///
/// While a command runs the terminal is in cooked mode, so Ctrl-C signals the
/// whole foreground process group. The child still receives it and stops;
/// this process only logs it.
#[cfg(unix)]
pub fn shield_interrupts() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupts = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        while interrupts.recv().await.is_some() {
            log::debug!("interrupt left to the running command");
        }
    });
    Ok(())
}

#[cfg(windows)]
pub fn shield_interrupts() -> Result<()> {
    let mut interrupts = tokio::signal::windows::ctrl_c()?;
    tokio::spawn(async move {
        while interrupts.recv().await.is_some() {
            log::debug!("interrupt left to the running command");
        }
    });
    Ok(())
}

/// Quote a path as a single shell word.
pub fn quote(path: &Path) -> String {
    let raw = path.display().to_string();
    if cfg!(windows) {
        format!("\"{}\"", raw)
    } else {
        format!("'{}'", raw.replace('\'', r"'\''"))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn runs_in_given_directory() {
        let dir = TempDir::new().unwrap();
        let status = run("echo hi > marker.txt", dir.path()).await.unwrap();
        assert!(status.success());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("marker.txt")).unwrap(),
            "hi\n"
        );
    }

    #[tokio::test]
    async fn reports_failure_status() {
        let dir = TempDir::new().unwrap();
        let status = run("exit 3", dir.path()).await.unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[tokio::test]
    async fn interrupt_during_command_does_not_end_process() {
        let dir = TempDir::new().unwrap();
        shield_interrupts().unwrap();
        let pid = std::process::id().to_string();
        let sender = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(200));
            std::process::Command::new("kill")
                .args(["-INT", &pid])
                .status()
                .unwrap()
        });
        let status = run("sleep 1", dir.path()).await.unwrap();
        assert!(status.success());
        assert!(sender.join().unwrap().success());
    }

    #[tokio::test]
    async fn missing_directory_is_exec_error() {
        let err = run("true", Path::new("/definitely/not/here")).await.unwrap_err();
        assert!(matches!(err, AppError::Exec(_)));
    }

    #[test]
    fn quote_escapes_single_quotes() {
        assert_eq!(quote(Path::new("/tmp/it's.txt")), r"'/tmp/it'\''s.txt'");
    }
}
