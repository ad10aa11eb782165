use crate::manifest::Manifest;
use colored::Colorize;
use miette::Diagnostic;
use std::{
    cmp::Reverse,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum MaterializeError {
    #[error("project root does not exist or is not a directory: '{path}'")]
    #[diagnostic(
        code(dskit::materialize::invalid_root),
        help("Enter a valid project root directory.")
    )]
    InvalidRoot { path: PathBuf },

    #[error("failed to create '{path}'")]
    #[diagnostic(
        code(dskit::materialize::creation),
        help("Check file permissions and disk space. Entries created so far were rolled back.")
    )]
    Creation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A manifest entry resolved against a concrete root. Lives only for the
/// duration of a create or remove call.
#[derive(Debug, Clone)]
pub struct MaterializedPath {
    pub key: String,
    pub path: PathBuf,
    pub is_file: bool,
    pub contents: String,
}

/// Resolves every manifest entry against `root`, in manifest order. Pure: the
/// filesystem is not touched and `root` need not exist yet.
pub fn resolve(manifest: &Manifest, root: &Path) -> Vec<MaterializedPath> {
    manifest
        .0
        .iter()
        .map(|(key, entry)| {
            let fragment: PathBuf = entry
                .path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .collect();

            MaterializedPath {
                key: key.clone(),
                path: root.join(fragment),
                is_file: entry.is_file,
                contents: entry.file_contents.resolve(),
            }
        })
        .collect()
}

/// Creates every manifest entry under `root`, in manifest order. Entries that
/// already exist are skipped, so re-running is safe. Returns one absolute path
/// per entry, in manifest order.
///
/// # Errors
///
/// Returns [`MaterializeError::InvalidRoot`] before any mutation if `root` is
/// missing or not a directory. Any filesystem failure mid-loop rolls back the
/// whole manifest via [`remove`] and returns [`MaterializeError::Creation`].
pub fn create(manifest: &Manifest, root: &Path) -> Result<Vec<PathBuf>, MaterializeError> {
    if !root.is_dir() {
        return Err(MaterializeError::InvalidRoot {
            path: root.to_path_buf(),
        });
    }

    let resolved = resolve(manifest, root);
    let mut created: Vec<PathBuf> = Vec::with_capacity(resolved.len());

    log::info!("Creating files and folders under {}", root.display());

    for entry in &resolved {
        if entry.path.is_file() || entry.path.is_dir() {
            println!(
                "\t{} {} (already exists)",
                "skip".yellow(),
                entry.path.display()
            );
        } else {
            let outcome = if entry.is_file {
                fs::write(&entry.path, &entry.contents)
            } else {
                fs::create_dir(&entry.path)
            };

            if let Err(error) = outcome {
                log::error!("failed to create {}: {}", entry.path.display(), error);
                remove(manifest, root);

                return Err(MaterializeError::Creation {
                    path: entry.path.clone(),
                    source: error,
                });
            }

            println!("\t{} {}", "create".green(), entry.path.display());
        }

        created.push(entry.path.clone());
    }

    Ok(created)
}

/// Removes every manifest entry that exists under `root`: files before
/// directories, deeper paths before shallower ones, so a directory is never
/// removed while it still holds a materialized child. Best-effort: entries
/// that cannot be deleted are logged and skipped.
pub fn remove(manifest: &Manifest, root: &Path) {
    let mut resolved = resolve(manifest, root);

    resolved.sort_by_key(|entry| (!entry.is_file, Reverse(entry.path.components().count())));

    log::warn!("Removing files and folders under {}", root.display());

    for entry in resolved {
        let outcome = if entry.path.is_file() {
            fs::remove_file(&entry.path)
        } else if entry.path.is_dir() {
            fs::remove_dir(&entry.path)
        } else {
            continue;
        };

        match outcome {
            Ok(()) => println!("\t{} {}", "remove".red(), entry.path.display()),
            Err(error) => {
                log::warn!("failed to remove {}: {}", entry.path.display(), error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;

    fn artefacts_manifest() -> Manifest {
        Manifest::from_toml_str(
            r#"
            [artefacts_dir]
            path = "/artefacts"
            isFile = false

            [artefacts_file]
            path = "/artefacts/artefacts.py"
            isFile = true
            fileContents = ""
        "#,
        )
        .unwrap()
    }

    #[test]
    fn resolve_joins_root_and_translates_separators() {
        let manifest = artefacts_manifest();
        let root = Path::new("/tmp/proj");

        let resolved = resolve(&manifest, root);

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].path, root.join("artefacts"));
        assert_eq!(resolved[1].path, root.join("artefacts").join("artefacts.py"));
        assert!(!resolved[0].is_file);
        assert!(resolved[1].is_file);
    }

    #[test]
    fn create_materializes_every_entry_in_order() {
        let manifest = artefacts_manifest();
        let root = tempfile::tempdir().unwrap();

        let created = create(&manifest, root.path()).unwrap();

        assert_eq!(
            created,
            vec![
                root.path().join("artefacts"),
                root.path().join("artefacts/artefacts.py"),
            ]
        );
        assert!(root.path().join("artefacts").is_dir());
        assert!(root.path().join("artefacts/artefacts.py").is_file());
        assert_eq!(
            fs::read_to_string(root.path().join("artefacts/artefacts.py")).unwrap(),
            ""
        );
    }

    #[test]
    fn create_is_idempotent() {
        let manifest = artefacts_manifest();
        let root = tempfile::tempdir().unwrap();

        let first = create(&manifest, root.path()).unwrap();
        let second = create(&manifest, root.path()).unwrap();

        assert_eq!(first, second);
        assert!(root.path().join("artefacts/artefacts.py").is_file());
    }

    #[test]
    fn list_contents_are_joined_without_trailing_newline() {
        let manifest = Manifest::from_toml_str(
            r#"
            [readme]
            path = "/README.md"
            isFile = true
            fileContents = ["line1", "line2"]
        "#,
        )
        .unwrap();
        let root = tempfile::tempdir().unwrap();

        create(&manifest, root.path()).unwrap();

        assert_eq!(
            fs::read_to_string(root.path().join("README.md")).unwrap(),
            "line1\nline2"
        );
    }

    #[test]
    fn create_then_remove_round_trips() {
        let manifest = artefacts_manifest();
        let root = tempfile::tempdir().unwrap();

        create(&manifest, root.path()).unwrap();
        remove(&manifest, root.path());

        assert!(!root.path().join("artefacts").exists());
        assert!(!root.path().join("artefacts/artefacts.py").exists());
    }

    #[test]
    fn remove_deletes_nested_files_before_their_directory() {
        // The file entry is declared before its parent directory. If removal
        // followed declaration order the non-empty directory would survive.
        let manifest = Manifest::from_toml_str(
            r#"
            [artefacts_file]
            path = "/artefacts/artefacts.py"
            isFile = true

            [artefacts_dir]
            path = "/artefacts"
            isFile = false
        "#,
        )
        .unwrap();
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("artefacts")).unwrap();
        fs::write(root.path().join("artefacts/artefacts.py"), "").unwrap();

        remove(&manifest, root.path());

        assert!(!root.path().join("artefacts/artefacts.py").exists());
        assert!(!root.path().join("artefacts").exists());
    }

    #[test]
    fn remove_skips_entries_it_cannot_delete() {
        let manifest = artefacts_manifest();
        let root = tempfile::tempdir().unwrap();

        create(&manifest, root.path()).unwrap();
        // A foreign file keeps the directory non-empty; remove must still
        // delete what it can and not panic.
        fs::write(root.path().join("artefacts/keep.txt"), "keep").unwrap();

        remove(&manifest, root.path());

        assert!(!root.path().join("artefacts/artefacts.py").exists());
        assert!(root.path().join("artefacts").is_dir());
    }

    #[test]
    fn failed_creation_rolls_back_earlier_entries() {
        // The third entry's parent directory never exists, so its creation
        // fails and the first two entries must be rolled back.
        let manifest = Manifest::from_toml_str(
            r#"
            [artefacts_dir]
            path = "/artefacts"
            isFile = false

            [artefacts_file]
            path = "/artefacts/artefacts.py"
            isFile = true

            [orphan_file]
            path = "/missing/orphan.txt"
            isFile = true
        "#,
        )
        .unwrap();
        let root = tempfile::tempdir().unwrap();

        let error = create(&manifest, root.path()).unwrap_err();

        assert!(matches!(error, MaterializeError::Creation { .. }));
        assert!(!root.path().join("artefacts").exists());
        assert!(!root.path().join("artefacts/artefacts.py").exists());
    }

    #[test]
    fn create_rejects_missing_root_before_any_mutation() {
        let manifest = artefacts_manifest();
        let parent = tempfile::tempdir().unwrap();
        let root = parent.path().join("does-not-exist");

        let error = create(&manifest, &root).unwrap_err();

        assert!(matches!(error, MaterializeError::InvalidRoot { .. }));
        assert!(!root.exists());
    }
}
