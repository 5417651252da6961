use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_BIN_DIR: &str = "rd3d_bin";
pub const DEFAULT_WORK_DIR: &str = "rd3d_work";

const INPUT_FILE_NAME: &str = "rd3d_input.txt";
const OUTPUT_PREFIX: &str = "rd3d_";
const SUMMARY_CSV_NAME: &str = "rd3d_Summary.csv";
const SUMMARY_TEXT_NAME: &str = "rd3d_Summary.txt";
const DOSE_STATE_NAME: &str = "rd3d_DoseState.csv";
const LOG_FILE_NAME: &str = "rd3d_calc.log";
const LOCK_FILE_NAME: &str = ".rd3d.lock";

#[derive(Debug, Error)]
pub enum PathError {
    #[error("Cannot create working directory '{path}': {source}", path = .path.display())]
    WorkDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Working directory '{path}' does not exist", path = .path.display())]
    MissingWorkDir { path: PathBuf },
    #[error("Another run is already using '{path}' (lock is held)", path = .path.display())]
    Busy { path: PathBuf },
    #[error("Cannot create lock file '{path}': {source}", path = .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Every file location a run reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub bin_dir: PathBuf,
    pub work_dir: PathBuf,
    pub template: PathBuf,
    pub input: PathBuf,
    /// Prefix handed to the simulator; it appends its own file names.
    pub output_prefix: PathBuf,
    pub summary_csv: PathBuf,
    pub summary_text: PathBuf,
    pub dose_state: PathBuf,
    pub log: PathBuf,
}

impl RunPaths {
    fn layout(bin_dir: &Path, work_dir: &Path, template_name: &str) -> Self {
        Self {
            bin_dir: bin_dir.to_path_buf(),
            work_dir: work_dir.to_path_buf(),
            template: bin_dir.join(template_name),
            input: work_dir.join(INPUT_FILE_NAME),
            output_prefix: work_dir.join(OUTPUT_PREFIX),
            summary_csv: work_dir.join(SUMMARY_CSV_NAME),
            summary_text: work_dir.join(SUMMARY_TEXT_NAME),
            dose_state: work_dir.join(DOSE_STATE_NAME),
            log: work_dir.join(LOG_FILE_NAME),
        }
    }

    /// Resolves the layout for a new run, creating the working directory if
    /// it does not exist yet.
    pub fn resolve(
        bin_dir: &Path,
        work_dir: &Path,
        template_name: &str,
    ) -> Result<Self, PathError> {
        fs::create_dir_all(work_dir).map_err(|source| PathError::WorkDir {
            path: work_dir.to_path_buf(),
            source,
        })?;
        let paths = Self::layout(bin_dir, work_dir, template_name);
        debug!("Resolved run paths: {:?}", paths);
        Ok(paths)
    }

    /// Resolves the layout of a working directory left by an earlier run.
    pub fn existing(work_dir: &Path) -> Result<Self, PathError> {
        if !work_dir.is_dir() {
            return Err(PathError::MissingWorkDir {
                path: work_dir.to_path_buf(),
            });
        }
        Ok(Self::layout(
            Path::new(DEFAULT_BIN_DIR),
            work_dir,
            crate::engine::config::DEFAULT_TEMPLATE_NAME,
        ))
    }

    pub fn lock_file(&self) -> PathBuf {
        self.work_dir.join(LOCK_FILE_NAME)
    }
}

/// Directory of the running executable joined with `name`.
///
/// Falls back to a path relative to the current directory when the
/// executable location cannot be determined.
pub fn install_relative(name: &str) -> PathBuf {
    match std::env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join(name))
            .unwrap_or_else(|| PathBuf::from(name)),
        Err(e) => {
            warn!("Cannot determine executable location ({}); using ./{}", e, name);
            PathBuf::from(name)
        }
    }
}

/// Exclusive claim on a working directory for the duration of one run.
///
/// The claim is an advisory lock on `.rd3d.lock`, held by the open file and
/// released by the kernel when the guard is dropped or the process dies. The
/// file itself stays in place and only records the PID of the last holder.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    _file: File,
}

impl RunLock {
    pub fn acquire(paths: &RunPaths) -> Result<Self, PathError> {
        let path = paths.lock_file();
        let lock_error = |source| PathError::Lock {
            path: path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(lock_error)?;
        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => return Err(PathError::Busy { path: path.clone() }),
            Err(TryLockError::Error(source)) => return Err(lock_error(source)),
        }

        file.set_len(0)
            .and_then(|()| writeln!(file, "{}", std::process::id()))
            .map_err(lock_error)?;
        debug!("Acquired run lock {:?}", path);
        Ok(Self { path, _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Copies the template to the run's input file, replacing any earlier input.
pub fn fresh_input(paths: &RunPaths) -> io::Result<()> {
    fs::copy(&paths.template, &paths.input)?;
    Ok(())
}
