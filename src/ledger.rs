use crate::errors::{FileOperation, IoError};
use lazy_static::lazy_static;
use miette::Diagnostic;
use regex::Regex;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum LedgerError {
    #[error("sources file does not exist: '{path}'")]
    #[diagnostic(
        code(dskit::ledger::missing),
        help("dskit has not been set up for this project. Run `dskit init` first.")
    )]
    Missing { path: PathBuf },

    #[error("invalid source entry:\n{}", messages.join("\n"))]
    #[diagnostic(code(dskit::ledger::invalid_source))]
    Invalid { messages: Vec<String> },

    #[error("I/O error within ledger domain")]
    #[diagnostic(code(dskit::ledger::io))]
    Io(#[from] IoError),
}

/// One row of the sources ledger, prior to being assigned an id.
#[derive(Debug, Clone, Default)]
pub struct SourceRecord {
    pub name: String,
    pub description: String,
    pub url: String,
    pub citation: String,
}

/// The semicolon-separated sources ledger: a header line followed by
/// `{id};'{name}';'{description}';'{url}';'{citation}'` rows.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    lines: Vec<String>,
}

impl Ledger {
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        if !path.is_file() {
            return Err(LedgerError::Missing {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)
            .map_err(|error| IoError::new(FileOperation::Read, path.to_path_buf(), error))?;

        Ok(Self {
            path: path.to_path_buf(),
            lines: content.lines().map(str::to_string).collect(),
        })
    }

    /// Names already recorded in the ledger, unquoted.
    fn names(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .skip(1)
            .filter_map(|line| line.split(';').nth(1))
            .map(|name| name.trim_matches('\''))
    }

    pub fn validate_name(&self, name: &str) -> Vec<String> {
        let mut errors = Vec::new();

        if name.is_empty() {
            errors.push("Source name cannot be empty.".to_string());
        }
        if !name.is_empty() && !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            errors.push(
                "Source name must contain only alphanumeric characters (a-z, A-Z, 0-9)."
                    .to_string(),
            );
        }
        if self.names().any(|existing| existing == name) {
            errors.push(format!("Source with name '{}' already exists.", name));
        }

        errors
    }

    pub fn validate_description(description: &str) -> Vec<String> {
        if description.is_empty() {
            vec!["Source description cannot be empty.".to_string()]
        } else {
            Vec::new()
        }
    }

    pub fn validate_url(url: &str) -> Vec<String> {
        lazy_static! {
            static ref URL_REGEX: Regex =
                Regex::new(r"^https?://[A-Za-z0-9.-]+(:\d+)?(/\S*)?$").expect("a valid regex");
        }

        let mut errors = Vec::new();

        if url.is_empty() {
            errors.push("Source url cannot be empty.".to_string());
        } else if !URL_REGEX.is_match(url) {
            errors.push(
                "Source url must be a valid URL, i.e. start with 'http://' or 'https://' and contain a domain name."
                    .to_string(),
            );
        }

        errors
    }

    pub fn validate_citation(citation: &str) -> Vec<String> {
        if citation.is_empty() {
            vec!["Source citation cannot be empty.".to_string()]
        } else {
            Vec::new()
        }
    }

    pub fn validate(&self, record: &SourceRecord) -> Vec<String> {
        let mut errors = self.validate_name(&record.name);
        errors.extend(Self::validate_description(&record.description));
        errors.extend(Self::validate_url(&record.url));
        errors.extend(Self::validate_citation(&record.citation));

        errors
    }

    fn next_id(&self) -> u64 {
        self.lines
            .iter()
            .skip(1)
            .last()
            .and_then(|line| line.split(';').next())
            .and_then(|id| id.parse::<u64>().ok())
            .map(|id| id + 1)
            .unwrap_or(0)
    }

    /// Validates and appends a record, returning the appended line.
    pub fn append(&mut self, record: &SourceRecord) -> Result<String, LedgerError> {
        let messages = self.validate(record);
        if !messages.is_empty() {
            return Err(LedgerError::Invalid { messages });
        }

        let line = format!(
            "{};'{}';'{}';'{}';'{}'",
            self.next_id(),
            record.name,
            record.description,
            record.url,
            record.citation
        );

        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|error| IoError::new(FileOperation::Write, self.path.clone(), error))?;

        write!(file, "\n{}", line)
            .map_err(|error| IoError::new(FileOperation::Write, self.path.clone(), error))?;

        self.lines.push(line.clone());

        Ok(line)
    }
}
