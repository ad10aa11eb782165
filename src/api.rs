use crate::{
    errors::{FileOperation, IoError},
    experiment::{self, ExperimentError},
    ledger::{Ledger, LedgerError, SourceRecord},
    manifest::{Manifest, ManifestError},
    materialize::{self, MaterializeError},
    project::{ProjectEnv, ProjectError},
    prompt::{self, PromptError},
};
use colored::Colorize;
use std::{
    fs,
    path::{Path, PathBuf},
};

const INIT_BANNER: &str = "
#===========================================================#
#                                                           #
#   Welcome to dskit!                                       #
#                                                           #
#   This setup will guide you through scaffolding the       #
#   standard data-science layout for your project.          #
#                                                           #
#===========================================================#
";

const INIT_FINISHED: &str = "
#===========================================================#
#                                                           #
#   Setup completed successfully!                           #
#   Happy experimenting!                                    #
#                                                           #
#===========================================================#
";

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DskitError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Materialize(#[from] MaterializeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Experiment(#[from] ExperimentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Io(#[from] IoError),
}

/// Undoes a partially completed init: the environment file if it was written,
/// then every manifest entry. Best-effort.
fn cleanup(manifest: &Manifest, root: &Path) {
    let env_path = ProjectEnv::env_file_path(root);

    if env_path.is_file() {
        if let Err(error) = fs::remove_file(&env_path) {
            log::warn!("failed to remove {}: {}", env_path.display(), error);
        }
    }

    materialize::remove(manifest, root);
}

/// An explicitly supplied root must already exist; a prompted one is
/// re-requested until it does.
fn resolve_root(supplied: Option<&str>, assume_yes: bool) -> Result<PathBuf, DskitError> {
    let mut current = match supplied {
        Some(value) => {
            let path = PathBuf::from(value.trim());

            if !path.is_dir() {
                return Err(MaterializeError::InvalidRoot { path }.into());
            }

            path.canonicalize()
                .map_err(|error| IoError::new(FileOperation::Read, path, error))?
        }
        None => prompt_for_root()?,
    };

    if assume_yes {
        return Ok(current);
    }

    loop {
        println!("Is this the path to the root directory of your project?");
        println!("\t{}", current.display().to_string().cyan());

        if prompt::confirm("(y/n)")? {
            return Ok(current);
        }

        current = prompt_for_root()?;
    }
}

fn prompt_for_root() -> Result<PathBuf, DskitError> {
    loop {
        let answer = prompt::text("Please enter the root directory of your project:")?;
        let path = PathBuf::from(&answer);

        match path.canonicalize() {
            Ok(absolute) if absolute.is_dir() => return Ok(absolute),
            _ => println!(
                "{}",
                format!("'{}' does not exist or is not a directory.", answer).yellow()
            ),
        }
    }
}

/// Sets up dskit for a project: records the root in the environment file and
/// materializes the standard layout. Declining the overwrite confirmation is
/// a normal completion, not an error.
pub fn init(project_root: Option<&str>, assume_yes: bool) -> Result<(), DskitError> {
    println!("{}", INIT_BANNER);

    let manifest = Manifest::builtin()?;
    let root = resolve_root(project_root, assume_yes)?;

    println!("{} {}", "PROJECT_ROOT set to:".green(), root.display());

    let env_path = ProjectEnv::env_file_path(&root);
    if env_path.is_file() {
        println!(
            "{}",
            "Environment file already exists. dskit has probably been set up for this project."
                .yellow()
        );
        println!(
            "{}",
            "Continuing will overwrite the existing environment file.".yellow()
        );

        if !assume_yes && !prompt::confirm("Continue?")? {
            println!("Not overwriting environment file. Exiting setup.");
            return Ok(());
        }

        fs::remove_file(&env_path)
            .map_err(|error| IoError::new(FileOperation::Remove, env_path.clone(), error))?;
    }

    let created = materialize::create(&manifest, &root)?;

    if let Err(error) = ProjectEnv::write(&root, &manifest, &created) {
        cleanup(&manifest, &root);
        return Err(error.into());
    }

    println!(
        "{} {}",
        "Created dskit environment file at:".green(),
        env_path.display()
    );
    println!("{}", INIT_FINISHED);

    Ok(())
}

fn load_env() -> Result<ProjectEnv, DskitError> {
    let cwd = std::env::current_dir()
        .map_err(|error| IoError::new(FileOperation::Read, PathBuf::from("."), error))?;

    Ok(ProjectEnv::load(&cwd)?)
}

/// Appends a source to the ledger. With every field supplied the call is
/// non-interactive and fails fast on invalid values; missing or invalid
/// fields are otherwise requested interactively until they validate.
pub fn add_source(
    name: Option<&str>,
    description: Option<&str>,
    url: Option<&str>,
    citation: Option<&str>,
) -> Result<String, DskitError> {
    let env = load_env()?;
    let sources_path = env.sources_file()?;
    let mut ledger = Ledger::load(&sources_path)?;

    let all_supplied =
        name.is_some() && description.is_some() && url.is_some() && citation.is_some();

    let record = if all_supplied {
        SourceRecord {
            name: name.unwrap_or_default().trim().to_string(),
            description: description.unwrap_or_default().trim().to_string(),
            url: url.unwrap_or_default().trim().to_string(),
            citation: citation.unwrap_or_default().trim().to_string(),
        }
    } else {
        let trimmed = |value: Option<&str>| value.map(|v| v.trim().to_string());

        let name = prompt::text_until_valid("Source name:", trimmed(name), |attempt| {
            ledger.validate_name(attempt)
        })?;
        let description = prompt::text_until_valid(
            "Source description:",
            trimmed(description),
            |attempt| Ledger::validate_description(attempt),
        )?;
        let url = prompt::text_until_valid("Source URL:", trimmed(url), |attempt| {
            Ledger::validate_url(attempt)
        })?;
        let citation =
            prompt::text_until_valid("Source citation:", trimmed(citation), |attempt| {
                Ledger::validate_citation(attempt)
            })?;

        SourceRecord {
            name,
            description,
            url,
            citation,
        }
    };

    let line = ledger.append(&record)?;

    println!("{} {}", "Added source:".green(), line);

    Ok(line)
}

/// Starts a new experiment: a directory plus notebook skeleton under the
/// experiments directory. Same interactivity rules as [`add_source`].
pub fn start_experiment(
    name: Option<&str>,
    description: Option<&str>,
) -> Result<PathBuf, DskitError> {
    let env = load_env()?;

    let all_supplied = name.is_some() && description.is_some();

    let (name, description) = if all_supplied {
        (
            name.unwrap_or_default().trim().to_string(),
            description.unwrap_or_default().trim().to_string(),
        )
    } else {
        let experiments_dir = env.experiments_dir()?;

        if !experiments_dir.is_dir() {
            return Err(ExperimentError::MissingExperimentsDir {
                path: experiments_dir,
            }
            .into());
        }

        let trimmed = |value: Option<&str>| value.map(|v| v.trim().to_string());

        let name =
            prompt::text_until_valid("Experiment name:", trimmed(name), |attempt| {
                experiment::validate_name(&experiments_dir, attempt)
            })?;
        let description = prompt::text_until_valid(
            "Experiment description:",
            trimmed(description),
            |attempt| experiment::validate_description(attempt),
        )?;

        (name, description)
    };

    let dir_path = experiment::start(&env, &name, &description)?;

    println!(
        "{} {}",
        "Successfully created experiment:".green(),
        dir_path.display()
    );

    Ok(dir_path)
}
