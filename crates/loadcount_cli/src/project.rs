//! Project root and configuration resolution shared by the CLI commands.

use std::path::{Path, PathBuf};

use loadcount_config::{load_config, load_config_file, ProjectConfig, CONFIG_FILE_NAME};
use tracing::debug;

use crate::GlobalArgs;

/// A resolved project: where outputs go and the configuration to run with.
pub struct Project {
    /// Directory outputs (`out/`) are written under.
    pub root: PathBuf,
    /// The loaded configuration, or the defaults when no file exists.
    pub config: ProjectConfig,
}

impl Project {
    /// The directory waveforms are written to by default.
    pub fn out_dir(&self) -> PathBuf {
        self.root.join("out")
    }
}

/// Walks up from `start` looking for the nearest directory containing `loadcount.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).is_file() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Resolves the project from global CLI args.
///
/// `--config` may name the file itself or its directory; an explicit path
/// must exist. Otherwise the nearest `loadcount.toml` at or above the current
/// directory is used, falling back to the built-in defaults.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let path = PathBuf::from(config_path);
        return if path.is_file() {
            let root = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok(Project {
                root,
                config: load_config_file(&path)?,
            })
        } else {
            Ok(Project {
                config: load_config(&path)?,
                root: path,
            })
        };
    }

    let cwd = std::env::current_dir()?;
    match find_project_root(&cwd) {
        Some(root) => {
            debug!(root = %root.display(), "using project configuration");
            Ok(Project {
                config: load_config(&root)?,
                root,
            })
        }
        None => {
            debug!("no {CONFIG_FILE_NAME} found, using defaults");
            Ok(Project {
                root: cwd,
                config: ProjectConfig::default(),
            })
        }
    }
}
