use crate::{
    errors::{FileOperation, IoError},
    project::{ProjectEnv, ProjectError},
};
use lazy_static::lazy_static;
use miette::Diagnostic;
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tera::{Context, Tera};
use thiserror::Error;

const NOTEBOOK_TEMPLATE: &str = include_str!("../assets/notebook.ipynb.tera");

const MAX_NAME_LENGTH: usize = 50;

#[derive(Debug, Error, Diagnostic)]
pub enum ExperimentError {
    #[error("the experiments directory does not exist: '{path}'")]
    #[diagnostic(
        code(dskit::experiment::missing_experiments_dir),
        help("dskit has not been set up for this project. Run `dskit init` first.")
    )]
    MissingExperimentsDir { path: PathBuf },

    #[error("invalid experiment arguments:\n{}", messages.join("\n"))]
    #[diagnostic(code(dskit::experiment::invalid))]
    Invalid { messages: Vec<String> },

    #[error("an experiment directory or notebook named '{name}' already exists")]
    #[diagnostic(
        code(dskit::experiment::already_exists),
        help("Choose a different experiment name.")
    )]
    AlreadyExists { name: String },

    #[error("failed to render the notebook skeleton")]
    #[diagnostic(code(dskit::experiment::render))]
    Render {
        #[source]
        source: tera::Error,
    },

    #[error("I/O error within experiment domain")]
    #[diagnostic(code(dskit::experiment::io))]
    Io(#[from] IoError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Project(#[from] ProjectError),
}

/// Directory-safe form of an experiment name: trimmed, lowercased, spaces and
/// hyphens mapped to underscores.
pub fn slug(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Human form used as the notebook heading: underscores and hyphens back to
/// spaces, each word title-cased.
fn title(name: &str) -> String {
    name.trim()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_name(experiments_dir: &Path, name: &str) -> Vec<String> {
    lazy_static! {
        static ref NAME_REGEX: Regex =
            Regex::new(r"^[a-zA-Z0-9\s_\-]+$").expect("a valid regex");
    }

    let mut errors = Vec::new();

    if name.is_empty() {
        errors.push("Experiment name cannot be empty.".to_string());
        return errors;
    }
    if name.len() > MAX_NAME_LENGTH {
        errors.push(format!(
            "Experiment name cannot be longer than {} characters.",
            MAX_NAME_LENGTH
        ));
    }
    if !NAME_REGEX.is_match(name) {
        errors.push(
            "Experiment name can only contain alphanumeric characters, whitespace, underscores, and hyphens."
                .to_string(),
        );
    }

    let clashes = fs::read_dir(experiments_dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .any(|entry| entry.file_name().to_string_lossy().to_lowercase() == slug(name))
        })
        .unwrap_or(false);

    if clashes {
        errors.push("An experiment with this name already exists.".to_string());
    }

    errors
}

pub fn validate_description(description: &str) -> Vec<String> {
    if description.is_empty() {
        vec!["Experiment description cannot be empty.".to_string()]
    } else {
        Vec::new()
    }
}

/// Paths are embedded in the notebook's JSON source lines, so backslashes
/// must be doubled to survive JSON decoding.
fn escape_for_notebook(value: &str) -> String {
    value.replace('\\', "\\\\")
}

fn notebook_contents(
    env: &ProjectEnv,
    name: &str,
    description: &str,
) -> Result<String, ExperimentError> {
    let mut context = Context::new();

    context.insert("title", &title(name));
    context.insert("description", description.trim());
    context.insert("project_dir", &escape_for_notebook(env.get("PROJECT_ROOT")?));
    context.insert(
        "experiments_dir",
        &escape_for_notebook(env.get("EXPERIMENTS_DIR")?),
    );
    context.insert("data_dir", &escape_for_notebook(env.get("DATA_DIR")?));
    context.insert(
        "processed_dir",
        &escape_for_notebook(env.get("DATA_PROCESSED_DIR")?),
    );
    context.insert("raw_dir", &escape_for_notebook(env.get("DATA_RAW_DIR")?));
    context.insert(
        "artefacts_dir",
        &escape_for_notebook(env.get("ARTEFACTS_DIR")?),
    );
    context.insert("sources_file", &escape_for_notebook(env.get("SOURCES_FILE")?));

    Tera::one_off(NOTEBOOK_TEMPLATE, &context, false)
        .map_err(|error| ExperimentError::Render { source: error })
}

/// Creates `experiments/<slug>/<slug>.ipynb` with a rendered notebook
/// skeleton and returns the experiment directory path.
pub fn start(
    env: &ProjectEnv,
    name: &str,
    description: &str,
) -> Result<PathBuf, ExperimentError> {
    let experiments_dir = env.experiments_dir()?;

    if !experiments_dir.is_dir() {
        return Err(ExperimentError::MissingExperimentsDir {
            path: experiments_dir,
        });
    }

    let name = name.trim();
    let description = description.trim();

    let mut messages = validate_name(&experiments_dir, name);
    messages.extend(validate_description(description));
    if !messages.is_empty() {
        return Err(ExperimentError::Invalid { messages });
    }

    let dir_name = slug(name);
    let dir_path = experiments_dir.join(&dir_name);
    let notebook_path = dir_path.join(format!("{}.ipynb", dir_name));

    // validate_name compares lowercased entries, but a direct hit can still
    // slip through on case-sensitive filesystems with racing callers.
    if dir_path.exists() || notebook_path.exists() {
        return Err(ExperimentError::AlreadyExists { name: dir_name });
    }

    let contents = notebook_contents(env, name, description)?;

    fs::create_dir(&dir_path)
        .map_err(|error| IoError::new(FileOperation::Mkdir, dir_path.clone(), error))?;
    fs::write(&notebook_path, contents)
        .map_err(|error| IoError::new(FileOperation::Write, notebook_path.clone(), error))?;

    Ok(dir_path)
}
