use crate::error::{CliError, CliResult};
use crate::format::normalize_digits;
use dialoguer::{Confirm, Input};

/// Blocking interactive input.
pub trait Prompter {
    fn input(&self, label: &str) -> CliResult<String>;
    fn confirm(&self, label: &str, default: bool) -> CliResult<bool>;
}

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn input(&self, label: &str) -> CliResult<String> {
        Input::<String>::new()
            .with_prompt(label)
            .interact_text()
            .map_err(|err| CliError::local_io(format!("failed to read input: {}", err)))
    }

    fn confirm(&self, label: &str, default: bool) -> CliResult<bool> {
        Confirm::new()
            .with_prompt(label)
            .default(default)
            .interact()
            .map_err(|err| CliError::local_io(format!("failed to read input: {}", err)))
    }
}

/// Asks until a number inside `min..=max` is entered.
pub fn choice_prompt(
    prompter: &dyn Prompter,
    label: &str,
    min: usize,
    max: usize,
) -> CliResult<usize> {
    loop {
        let raw = prompter.input(label)?;
        match normalize_digits(raw.trim()).parse::<usize>() {
            Ok(index) if (min..=max).contains(&index) => return Ok(index),
            _ => eprintln!("Invalid choice, try again"),
        }
    }
}

/// Asks until a non-empty run of digits is entered; leading zeros are kept.
pub fn integer_prompt(prompter: &dyn Prompter, label: &str) -> CliResult<String> {
    loop {
        let raw = prompter.input(label)?;
        let digits = normalize_digits(raw.trim());
        if !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()) {
            return Ok(digits);
        }
        eprintln!("Error: '{}' is not a valid integer.", raw.trim());
    }
}
