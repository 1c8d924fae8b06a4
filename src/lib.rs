//! Derive short-term AWS credential profiles with MFA and keep them in the
//! shared credentials file.

pub mod aws;
pub mod cli;
pub mod commands;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod prompt;
