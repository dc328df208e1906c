//! Line-based interactive prompts.

use std::fmt::Display;
use std::io::{BufRead, Write};
use std::str::FromStr;

use owo_colors::OwoColorize;
use thiserror::Error;

use crate::palette::Color;

#[derive(Debug, Error)]
pub enum PromptError {
    /// Input ended before an answer was given.
    #[error("cancelled")]
    Cancelled,

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Asks questions on `output` and reads answers from `input`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    fn read_answer(&mut self, question: &str, default: &str) -> Result<String, PromptError> {
        write!(self.output, "  {question} {}: ", format!("({default})").dimmed())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Err(PromptError::Cancelled);
        }
        let answer = line.trim_end_matches(&['\r', '\n'][..]);
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer.to_string()
        })
    }

    /// Free text; an empty line takes `default`, whitespace is kept.
    pub fn text(&mut self, question: &str, default: &str) -> Result<String, PromptError> {
        self.read_answer(question, default)
    }

    /// Yes/no, re-asked until the answer is recognisable.
    pub fn confirm(&mut self, question: &str, default: bool) -> Result<bool, PromptError> {
        let shown = if default { "y" } else { "n" };
        loop {
            let answer = self.read_answer(&format!("{question} [y/n]"), shown)?;
            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "  {}", "Please enter y or n".red())?,
            }
        }
    }

    /// A positive finite number, re-asked until one is given.
    pub fn positive<T>(&mut self, question: &str, default: T) -> Result<T, PromptError>
    where
        T: FromStr + Display + PartialOrd + Default + Copy + Into<f64>,
    {
        loop {
            let answer = self.read_answer(question, &default.to_string())?;
            match answer.trim().parse::<T>() {
                Ok(value) if value > T::default() && value.into().is_finite() => return Ok(value),
                _ => writeln!(self.output, "  {}", "Please enter a positive number".red())?,
            }
        }
    }

    /// Pick one colour from a numbered list; defaults to the first.
    pub fn select_color(&mut self, kind: &str, colors: &[Color]) -> Result<Color, PromptError> {
        writeln!(self.output, "  Available {kind} colors:")?;
        for (i, color) in colors.iter().enumerate() {
            writeln!(self.output, "    {} {}", format!("{})", i + 1).cyan(), color.name)?;
        }

        loop {
            let answer = self.read_answer(&format!("Select {kind} color"), "1")?;
            match answer.trim().parse::<usize>() {
                Ok(n) if (1..=colors.len()).contains(&n) => {
                    let color = colors[n - 1];
                    writeln!(self.output, "  Selected: {}", color.name.green())?;
                    return Ok(color);
                }
                Ok(_) => writeln!(
                    self.output,
                    "  {}",
                    format!("Please enter a number between 1 and {}", colors.len()).red()
                )?,
                Err(_) => writeln!(self.output, "  {}", "Please enter a valid number".red())?,
            }
        }
    }
}
