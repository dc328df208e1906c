//! Rendering engine (OpenSCAD) discovery and invocation.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::EngineSettings;
use crate::interrupt;

/// Well-known install locations, checked before falling back to `PATH`.
const ENGINE_CANDIDATES: &[&str] = &[
    "/Applications/OpenSCAD.app/Contents/MacOS/OpenSCAD",
    "/usr/bin/openscad",
    "/usr/local/bin/openscad",
];

const ENGINE_ON_PATH: &str = "openscad";

pub const TEMPLATE_FILE_NAME: &str = "magnetic_label.scad";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("OpenSCAD not found")]
    NotFound,

    #[error("failed to launch {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("OpenSCAD timed out after {}s", .timeout.as_secs())]
    TimedOut { timeout: Duration },

    #[error("OpenSCAD run interrupted")]
    Interrupted,

    #[error("I/O error while running OpenSCAD: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured result of one engine run.
#[derive(Debug)]
pub struct EngineOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl EngineOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// A located engine executable.
#[derive(Debug, Clone)]
pub struct Engine {
    path: PathBuf,
    /// Raised when the run should be abandoned; checked while polling.
    cancel: &'static AtomicBool,
}

impl Engine {
    /// Use `path` as the engine without probing it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cancel: interrupt::flag(),
        }
    }

    /// Watch `flag` instead of the process-wide interrupt flag.
    #[cfg(all(test, unix))]
    pub fn with_cancel_flag(mut self, flag: &'static AtomicBool) -> Self {
        self.cancel = flag;
        self
    }

    /// Find the engine: configured path, well-known locations, then `PATH`.
    pub fn locate(settings: &EngineSettings) -> Result<Self, EngineError> {
        if let Some(path) = &settings.path {
            if is_executable(path) {
                return Ok(Self::new(path));
            }
            tracing::warn!(
                "configured engine {} is not an executable file",
                path.display()
            );
            return Err(EngineError::NotFound);
        }

        for candidate in ENGINE_CANDIDATES {
            let path = Path::new(candidate);
            if is_executable(path) {
                tracing::debug!("found engine at {}", path.display());
                return Ok(Self::new(path));
            }
        }

        match which::which(ENGINE_ON_PATH) {
            Ok(path) => {
                tracing::debug!("found engine on PATH at {}", path.display());
                Ok(Self::new(path))
            }
            Err(e) => {
                tracing::debug!("{ENGINE_ON_PATH} not on PATH: {e}");
                Err(EngineError::NotFound)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the engine with `args`, waiting at most `timeout`.
    ///
    /// Output is captured into anonymous temp files rather than pipes so a
    /// chatty engine can't block on a full pipe while we poll. On timeout or
    /// interrupt the child is killed and reaped before returning, so callers
    /// unwind normally and their scratch files are dropped.
    pub fn run<I, S>(&self, args: I, timeout: Option<Duration>) -> Result<EngineOutput, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(EngineError::Interrupted);
        }
        let _busy = interrupt::busy();

        let mut stdout_file = tempfile::tempfile()?;
        let mut stderr_file = tempfile::tempfile()?;

        let mut cmd = Command::new(&self.path);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout_file.try_clone()?))
            .stderr(Stdio::from(stderr_file.try_clone()?));

        tracing::debug!("running {:?}", cmd);
        let mut child = cmd.spawn().map_err(|source| EngineError::Spawn {
            path: self.path.clone(),
            source,
        })?;

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if self.cancel.load(Ordering::SeqCst) {
                stop(&mut child);
                return Err(EngineError::Interrupted);
            }
            if let Some(timeout) = timeout.filter(|t| start.elapsed() >= *t) {
                stop(&mut child);
                return Err(EngineError::TimedOut { timeout });
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        Ok(EngineOutput {
            status,
            stdout: read_captured(&mut stdout_file)?,
            stderr: read_captured(&mut stderr_file)?,
        })
    }
}

fn stop(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn read_captured(file: &mut File) -> std::io::Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Resolve the parametric geometry template.
///
/// Tries in order:
/// 1. the configured `engine.template`
/// 2. `magnetic_label.scad` or `scad/magnetic_label.scad` in the current directory
/// 3. next to the current executable
/// 4. the crate's `scad/` directory (compile-time)
pub fn locate_template(settings: &EngineSettings) -> Option<PathBuf> {
    if let Some(path) = &settings.template {
        return path.is_file().then(|| path.clone());
    }

    let mut candidates = vec![
        PathBuf::from(TEMPLATE_FILE_NAME),
        Path::new("scad").join(TEMPLATE_FILE_NAME),
    ];
    if let Some(dir) = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)) {
        candidates.push(dir.join(TEMPLATE_FILE_NAME));
    }
    candidates.push(Path::new(env!("CARGO_MANIFEST_DIR")).join("scad").join(TEMPLATE_FILE_NAME));

    candidates.into_iter().find(|p| p.is_file())
}

/// Escape a value for use inside a double-quoted OpenSCAD string literal.
pub fn scad_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Test helpers shared by the modules that drive a fake engine.
#[cfg(all(test, unix))]
pub(crate) mod fake {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Write an executable shell script named `openscad` into `dir`.
    pub fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("openscad");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    /// A cancel flag private to one test.
    pub fn cancel_flag() -> &'static super::AtomicBool {
        Box::leak(Box::new(super::AtomicBool::new(false)))
    }

    /// Raise `flag` from another thread after `delay`.
    pub fn raise_after(flag: &'static super::AtomicBool, delay: std::time::Duration) {
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            flag.store(true, super::Ordering::SeqCst);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scad_string_escapes_quotes_and_backslashes() {
        assert_eq!(scad_string("ASA"), "\"ASA\"");
        assert_eq!(scad_string(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn configured_missing_engine_is_not_found() {
        let settings = EngineSettings {
            path: Some(PathBuf::from("/nonexistent/openscad")),
            ..EngineSettings::default()
        };
        assert!(matches!(Engine::locate(&settings), Err(EngineError::NotFound)));
    }

    #[test]
    fn configured_template_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.scad");
        let mut settings = EngineSettings {
            template: Some(path.clone()),
            ..EngineSettings::default()
        };
        assert_eq!(locate_template(&settings), None);

        std::fs::write(&path, "cube(1);").unwrap();
        assert_eq!(locate_template(&settings), Some(path));

        settings.template = None;
        assert!(locate_template(&settings).is_some(), "crate template ships in scad/");
    }

    #[cfg(unix)]
    mod unix {
        use super::super::*;
        use crate::engine::fake;

        #[test]
        fn captures_output_and_status() {
            let dir = tempfile::tempdir().unwrap();
            let path = fake::script(dir.path(), "echo out; echo err >&2; exit 3");
            let settings = EngineSettings {
                path: Some(path),
                ..EngineSettings::default()
            };
            let engine = Engine::locate(&settings).unwrap();

            let output = engine.run(["-o", "x.stl"], Some(Duration::from_secs(10))).unwrap();
            assert!(!output.success());
            assert_eq!(output.status.code(), Some(3));
            assert_eq!(output.stdout.trim(), "out");
            assert_eq!(output.stderr.trim(), "err");
        }

        #[test]
        fn kills_engine_after_timeout() {
            let dir = tempfile::tempdir().unwrap();
            let engine = Engine::new(fake::script(dir.path(), "sleep 10"));

            let start = Instant::now();
            let result = engine.run(std::iter::empty::<&str>(), Some(Duration::from_millis(200)));
            assert!(matches!(result, Err(EngineError::TimedOut { .. })));
            assert!(start.elapsed() < Duration::from_secs(5));
        }

        #[test]
        fn raised_flag_stops_a_run_without_deadline() {
            let dir = tempfile::tempdir().unwrap();
            let flag = fake::cancel_flag();
            let engine = Engine::new(fake::script(dir.path(), "sleep 10")).with_cancel_flag(flag);
            fake::raise_after(flag, Duration::from_millis(150));

            let start = Instant::now();
            let result = engine.run(std::iter::empty::<&str>(), None);
            assert!(matches!(result, Err(EngineError::Interrupted)));
            assert!(start.elapsed() < Duration::from_secs(5));
        }

        #[test]
        fn raised_flag_skips_the_launch() {
            let dir = tempfile::tempdir().unwrap();
            let marker = dir.path().join("ran");
            let flag = fake::cancel_flag();
            flag.store(true, Ordering::SeqCst);
            let engine = Engine::new(fake::script(dir.path(), &format!("touch '{}'", marker.display())))
                .with_cancel_flag(flag);

            let result = engine.run(std::iter::empty::<&str>(), Some(Duration::from_secs(10)));
            assert!(matches!(result, Err(EngineError::Interrupted)));
            assert!(!marker.exists());
        }

        #[test]
        fn non_executable_file_is_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("openscad");
            std::fs::write(&path, "not a program").unwrap();
            let settings = EngineSettings {
                path: Some(path),
                ..EngineSettings::default()
            };
            assert!(matches!(Engine::locate(&settings), Err(EngineError::NotFound)));
        }
    }
}
