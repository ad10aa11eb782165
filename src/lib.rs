pub mod api;
pub mod errors;
pub mod experiment;
pub mod ledger;
pub mod manifest;
pub mod materialize;
pub mod project;
pub mod prompt;
