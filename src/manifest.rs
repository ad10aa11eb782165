use indexmap::IndexMap;
use miette::Diagnostic;
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

/// The manifest that ships with the binary, describing the standard
/// data-science project layout.
const BUILTIN_MANIFEST: &str = include_str!("../assets/manifest.toml");

#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    #[error("unable to parse manifest: {source}")]
    #[diagnostic(code(dskit::manifest::parse), help("Review the manifest file"))]
    Parse {
        #[source]
        source: toml::de::Error,
    },

    #[error("manifest entry '{key}' has path '{path}' that does not begin with '/'")]
    #[diagnostic(
        code(dskit::manifest::path_not_rooted),
        help("Manifest paths are relative to the project root and must start with '/'")
    )]
    PathNotRooted { key: String, path: String },

    #[error("manifest entries '{first}' and '{second}' resolve to the same path '{path}'")]
    #[diagnostic(code(dskit::manifest::duplicate_path))]
    DuplicatePath {
        first: String,
        second: String,
        path: String,
    },

    #[error("manifest entry '{key}' is a directory but carries file contents")]
    #[diagnostic(
        code(dskit::manifest::directory_with_contents),
        help("Only entries with isFile = true may set fileContents")
    )]
    DirectoryWithContents { key: String },
}

/// File contents in the manifest's serialized form: either a single string or
/// an ordered list of lines.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FileContents {
    Text(String),
    Lines(Vec<String>),
}

impl Default for FileContents {
    fn default() -> Self {
        FileContents::Text(String::new())
    }
}

impl FileContents {
    /// List contents are joined with a newline separator, no trailing newline.
    pub fn resolve(&self) -> String {
        match self {
            FileContents::Text(text) => text.clone(),
            FileContents::Lines(lines) => lines.join("\n"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    /// Path fragment relative to the project root, forward-slash separated,
    /// beginning with '/'.
    pub path: String,
    #[serde(rename = "isFile")]
    pub is_file: bool,
    #[serde(rename = "fileContents", default)]
    pub file_contents: FileContents,
}

/// The declarative list of filesystem entries to materialize, in declaration
/// order. Directory entries must precede anything nested within them.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest(pub IndexMap<String, ManifestEntry>);

impl Manifest {
    pub fn from_toml_str(content: &str) -> Result<Self, ManifestError> {
        let parsed: Manifest =
            toml::from_str(content).map_err(|error| ManifestError::Parse { source: error })?;

        parsed.validate()?;

        Ok(parsed)
    }

    /// The embedded default manifest: data/, data/raw, data/processed,
    /// artefacts/, experiments/ and the sources ledger.
    pub fn builtin() -> Result<Self, ManifestError> {
        Manifest::from_toml_str(BUILTIN_MANIFEST)
    }

    fn validate(&self) -> Result<(), ManifestError> {
        let mut seen: HashSet<&str> = HashSet::new();

        for (key, entry) in &self.0 {
            if !entry.path.starts_with('/') {
                return Err(ManifestError::PathNotRooted {
                    key: key.clone(),
                    path: entry.path.clone(),
                });
            }

            if !seen.insert(entry.path.as_str()) {
                let first = self
                    .0
                    .iter()
                    .find(|(_, e)| e.path == entry.path)
                    .map(|(k, _)| k.clone())
                    .unwrap_or_default();

                return Err(ManifestError::DuplicatePath {
                    first,
                    second: key.clone(),
                    path: entry.path.clone(),
                });
            }

            if !entry.is_file && !entry.file_contents.resolve().is_empty() {
                return Err(ManifestError::DirectoryWithContents { key: key.clone() });
            }
        }

        Ok(())
    }
}
