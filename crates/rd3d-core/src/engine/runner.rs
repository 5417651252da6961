use crate::engine::config::SimulatorCommand;
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to launch simulator '{program}': {source}", program = .program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Simulator failed ({status}); its output was written to the run log")]
    NonZeroExit {
        status: ExitStatus,
        output: CapturedOutput,
    },
    #[error("Cannot write run log '{path}': {source}", path = .path.display())]
    Log {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Everything the simulator printed during one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

/// Per-run log file, separate from the application's tracing output.
///
/// Opening a `RunLog` truncates the file, so it only ever holds the most
/// recent run.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    pub fn create(path: &Path) -> Result<Self, RunError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|source| RunError::Log {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one timestamped entry. Multi-line messages keep their lines.
    pub fn record(&mut self, level: &str, message: &str) -> Result<(), RunError> {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.file, "{} {:<7} {}", stamp, level, message)
            .and_then(|_| self.file.flush())
            .map_err(|source| RunError::Log {
                path: self.path.clone(),
                source,
            })
    }

    pub fn info(&mut self, message: &str) -> Result<(), RunError> {
        self.record("INFO", message)
    }

    pub fn warn(&mut self, message: &str) -> Result<(), RunError> {
        self.record("WARNING", message)
    }

    pub fn error(&mut self, message: &str) -> Result<(), RunError> {
        self.record("ERROR", message)
    }
}

/// Launches the external dose simulator.
#[derive(Debug, Clone)]
pub struct Simulator {
    command: SimulatorCommand,
}

impl Simulator {
    pub fn new(command: SimulatorCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &SimulatorCommand {
        &self.command
    }

    /// Runs the simulator on `input`, writing outputs under `output_prefix`.
    ///
    /// Blocks until the process exits. The captured output is appended to
    /// `log` before the exit status is inspected, so a failed run still
    /// leaves its diagnostics behind.
    pub fn run(
        &self,
        input: &Path,
        output_prefix: &Path,
        log: &mut RunLog,
    ) -> Result<CapturedOutput, RunError> {
        let mut command = Command::new(&self.command.program);
        command
            .args(&self.command.args)
            .arg("-i")
            .arg(input)
            .arg("-p")
            .arg(output_prefix);
        debug!("Launching simulator: {:?}", command);
        log.info(&format!("Running {:?}", command))?;

        let output = command.output().map_err(|source| RunError::Launch {
            program: self.command.program.clone(),
            source,
        })?;

        let captured = CapturedOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !captured.stdout.is_empty() {
            log.info(captured.stdout.trim_end())?;
        }
        if !captured.stderr.is_empty() {
            log.error(captured.stderr.trim_end())?;
        }

        if !output.status.success() {
            log.error(&format!("Simulator failed: {}", output.status))?;
            return Err(RunError::NonZeroExit {
                status: output.status,
                output: captured,
            });
        }

        info!("Simulator finished ({}).", output.status);
        Ok(captured)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn shell(script: &str) -> Simulator {
        Simulator::new(SimulatorCommand {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), script.to_string(), "sh".to_string()],
        })
    }

    #[test]
    fn run_log_truncates_previous_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log");
        fs::write(&path, "old run\n").unwrap();

        let mut log = RunLog::create(&path).unwrap();
        log.info("new run").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("old run"));
        assert!(content.contains("INFO"));
        assert!(content.trim_end().ends_with("new run"));
    }

    #[test]
    fn successful_run_passes_input_and_prefix() {
        let dir = tempdir().unwrap();
        let mut log = RunLog::create(&dir.path().join("run.log")).unwrap();
        let simulator = shell(r#"echo "$1 $2 $3 $4""#);

        let output = simulator
            .run(Path::new("in.txt"), Path::new("out_"), &mut log)
            .unwrap();
        assert_eq!(output.stdout.trim(), "-i in.txt -p out_");
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn non_zero_exit_is_an_error_and_output_is_logged() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("run.log");
        let mut log = RunLog::create(&log_path).unwrap();
        let simulator = shell("echo partial result; echo 'java.lang.Exception: boom' >&2; exit 3");

        let err = simulator
            .run(Path::new("in.txt"), Path::new("out_"), &mut log)
            .unwrap_err();
        match err {
            RunError::NonZeroExit { status, output } => {
                assert_eq!(status.code(), Some(3));
                assert!(output.stdout.contains("partial result"));
                assert!(output.stderr.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let logged = fs::read_to_string(&log_path).unwrap();
        assert!(logged.contains("partial result"));
        assert!(logged.contains("java.lang.Exception: boom"));
        assert!(logged.contains("Simulator failed"));
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let dir = tempdir().unwrap();
        let mut log = RunLog::create(&dir.path().join("run.log")).unwrap();
        let simulator = Simulator::new(SimulatorCommand {
            program: dir.path().join("no-such-simulator"),
            args: Vec::new(),
        });

        let result = simulator.run(Path::new("in.txt"), Path::new("out_"), &mut log);
        assert!(matches!(result, Err(RunError::Launch { .. })));
    }
}
