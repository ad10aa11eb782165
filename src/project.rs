use crate::{
    errors::{FileOperation, IoError},
    manifest::Manifest,
};
use indexmap::IndexMap;
use miette::Diagnostic;
use std::{
    fs,
    path::{Path, PathBuf, MAIN_SEPARATOR},
};
use thiserror::Error;

/// Name of the environment-state file kept in the project root.
pub const ENV_FILE_NAME: &str = ".dskit.env";

#[derive(Debug, Error, Diagnostic)]
pub enum ProjectError {
    #[error("environment file does not exist: '{path}'")]
    #[diagnostic(
        code(dskit::project::env_missing),
        help("dskit has not been set up for this project. Run `dskit init` first.")
    )]
    EnvMissing { path: PathBuf },

    #[error("environment file '{path}' is missing the '{key}' entry")]
    #[diagnostic(
        code(dskit::project::key_missing),
        help("Re-run `dskit init` to regenerate the environment file.")
    )]
    KeyMissing { key: String, path: PathBuf },

    #[error("I/O error within project domain")]
    #[diagnostic(code(dskit::project::io))]
    Io(#[from] IoError),
}

/// Parsed view of the `KEY=VALUE` environment-state file. Directory values are
/// stored relative to `PROJECT_ROOT` and joined back on access.
#[derive(Debug, Clone)]
pub struct ProjectEnv {
    path: PathBuf,
    vars: IndexMap<String, String>,
}

impl ProjectEnv {
    pub fn env_file_path(root: &Path) -> PathBuf {
        root.join(ENV_FILE_NAME)
    }

    pub fn load(root: &Path) -> Result<Self, ProjectError> {
        let path = Self::env_file_path(root);

        if !path.is_file() {
            return Err(ProjectError::EnvMissing { path });
        }

        let content = fs::read_to_string(&path)
            .map_err(|error| IoError::new(FileOperation::Read, path.clone(), error))?;

        // Value is everything after the first '='.
        let vars: IndexMap<String, String> = content
            .lines()
            .filter_map(|line| {
                line.split_once('=')
                    .map(|(key, value)| (key.to_string(), value.to_string()))
            })
            .collect();

        let env = Self { path, vars };

        // Nothing works without a project root.
        env.get("PROJECT_ROOT")?;

        Ok(env)
    }

    pub fn get(&self, key: &str) -> Result<&str, ProjectError> {
        self.vars
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ProjectError::KeyMissing {
                key: key.to_string(),
                path: self.path.clone(),
            })
    }

    pub fn project_root(&self) -> Result<PathBuf, ProjectError> {
        Ok(PathBuf::from(self.get("PROJECT_ROOT")?))
    }

    pub fn project_name(&self) -> Result<&str, ProjectError> {
        self.get("PROJECT_NAME")
    }

    fn rooted(&self, key: &str) -> Result<PathBuf, ProjectError> {
        let fragment = self.get(key)?.trim_start_matches(MAIN_SEPARATOR).to_string();

        Ok(self.project_root()?.join(fragment))
    }

    pub fn data_dir(&self) -> Result<PathBuf, ProjectError> {
        self.rooted("DATA_DIR")
    }

    pub fn data_raw_dir(&self) -> Result<PathBuf, ProjectError> {
        self.rooted("DATA_RAW_DIR")
    }

    pub fn data_processed_dir(&self) -> Result<PathBuf, ProjectError> {
        self.rooted("DATA_PROCESSED_DIR")
    }

    pub fn artefacts_dir(&self) -> Result<PathBuf, ProjectError> {
        self.rooted("ARTEFACTS_DIR")
    }

    pub fn experiments_dir(&self) -> Result<PathBuf, ProjectError> {
        self.rooted("EXPERIMENTS_DIR")
    }

    pub fn sources_file(&self) -> Result<PathBuf, ProjectError> {
        self.rooted("SOURCES_FILE")
    }

    /// Persists the environment file for `root`: `PROJECT_ROOT`, `PROJECT_NAME`
    /// (the root's basename), then one uppercased entry per manifest key with
    /// the created path stored relative to the root. Entries are joined with a
    /// newline, no trailing newline.
    pub fn write(
        root: &Path,
        manifest: &Manifest,
        created: &[PathBuf],
    ) -> Result<PathBuf, ProjectError> {
        let project_name = root
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut entries: Vec<(String, String)> = vec![
            ("PROJECT_ROOT".to_string(), root.display().to_string()),
            ("PROJECT_NAME".to_string(), project_name),
        ];

        for (key, path) in manifest.0.keys().zip(created) {
            let relative = path
                .strip_prefix(root)
                .map(|rel| format!("{}{}", MAIN_SEPARATOR, rel.display()))
                .unwrap_or_else(|_| path.display().to_string());

            entries.push((key.to_uppercase(), relative));
        }

        let content = entries
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("\n");

        let path = Self::env_file_path(root);

        fs::write(&path, content)
            .map_err(|error| IoError::new(FileOperation::Write, path.clone(), error))?;

        Ok(path)
    }
}
