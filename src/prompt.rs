use std::io::{self, BufRead, IsTerminal};

use anyhow::{Context, Result, bail};
use dialoguer::{Confirm, Input, theme::ColorfulTheme};

/// Interactive input needed by the commands
pub trait Prompt {
    /// Blocks until the user supplies an MFA one-time code
    fn read_one_time_code(&mut self) -> Result<String>;

    /// Blocks until the user answers a yes/no question
    fn confirm(&mut self, message: &str) -> Result<bool>;
}

/// Prompts on the terminal, or reads plain lines when stdin is piped
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn read_one_time_code(&mut self) -> Result<String> {
        let code = if io::stdin().is_terminal() {
            Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt("Enter MFA code")
                .interact_text()
                .context("Failed to read MFA code")?
        } else {
            eprintln!("Enter MFA code:");
            read_line()?.unwrap_or_default()
        };

        let code = code.trim();
        if code.is_empty() {
            bail!("No MFA code provided");
        }
        Ok(code.to_string())
    }

    fn confirm(&mut self, message: &str) -> Result<bool> {
        if io::stdin().is_terminal() {
            return Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(message)
                .default(false)
                .interact()
                .context("Failed to read confirmation");
        }

        eprintln!("{message} (y/yes/n/no)");
        Ok(read_line()?.is_some_and(|answer| is_affirmative(&answer)))
    }
}

/// `None` at end of input
fn read_line() -> Result<Option<String>> {
    let mut input = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read from stdin")?;
    Ok((read > 0).then_some(input))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
