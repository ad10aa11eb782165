use colored::Colorize;
use inquire::{error::InquireError, required, Confirm, Text};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PromptError {
    #[error("operation cancelled by user")]
    #[diagnostic(code(dskit::prompt::cancelled))]
    Cancelled,

    #[error("error occurred trying to prompt user")]
    #[diagnostic(code(dskit::prompt::io))]
    Io(#[source] InquireError),
}

fn map_inquire(error: InquireError) -> PromptError {
    match error {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            PromptError::Cancelled
        }
        other => PromptError::Io(other),
    }
}

pub fn text(message: &str) -> Result<String, PromptError> {
    Text::new(message)
        .with_validator(required!("a value is required"))
        .prompt()
        .map(|answer| answer.trim().to_string())
        .map_err(map_inquire)
}

pub fn confirm(message: &str) -> Result<bool, PromptError> {
    Confirm::new(message)
        .with_default(false)
        .prompt()
        .map_err(map_inquire)
}

/// Re-prompts until `validate` returns no messages. `initial` lets a value
/// supplied on the command line take the first attempt.
pub fn text_until_valid<F>(
    message: &str,
    initial: Option<String>,
    validate: F,
) -> Result<String, PromptError>
where
    F: Fn(&str) -> Vec<String>,
{
    let mut attempt = initial;

    loop {
        if let Some(value) = attempt {
            let messages = validate(&value);

            if messages.is_empty() {
                return Ok(value);
            }

            for message in messages {
                println!("{}", message.yellow());
            }
        }

        attempt = Some(text(message)?);
    }
}
