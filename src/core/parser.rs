//! Turns a line of input into a `Command`.
//!
//! Tokens are separated by whitespace. `>` and `<` take the following token as
//! a redirection target, `&` marks the command for the background wherever it
//! appears, and a token starting with `$` is replaced by the value of that
//! environment variable. Everything else is an argument.

use log::debug;

use crate::core::environment;
use crate::errors::{Error, Result};

const OUTPUT_REDIRECT: &str = ">";
const INPUT_REDIRECT: &str = "<";
const BACKGROUND: &str = "&";

/// A parsed line. `arguments[0]` is the program name.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Command {
    pub arguments: Vec<String>,
    pub output_target: Option<String>,
    pub input_target: Option<String>,
    pub background: bool,
}

impl Command {
    /// Parses `input`. Fails without a partial result if a redirection has no
    /// target or a variable is undefined.
    pub fn parse(input: &str) -> Result<Self> {
        let result = parse_tokens(input.split_whitespace());
        debug!("parsed Command: {:?}", result);
        result
    }

    /// An empty command has nothing to run; the line is a no-op.
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    pub fn program(&self) -> Option<&str> {
        self.arguments.first().map(String::as_str)
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        self.arguments.get(1..).unwrap_or(&[])
    }

    /// The arguments joined by single spaces, as shown in job listings.
    pub fn command_line(&self) -> String {
        self.arguments.join(" ")
    }
}

fn parse_tokens<'a, I>(tokens: I) -> Result<Command>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut command = Command::default();
    let mut tokens = tokens.into_iter();

    while let Some(token) = tokens.next() {
        match token {
            OUTPUT_REDIRECT => {
                let target = tokens
                    .next()
                    .ok_or_else(|| Error::malformed_redirection(OUTPUT_REDIRECT))?;
                command.output_target = Some(target.to_string());
            }
            INPUT_REDIRECT => {
                let target = tokens
                    .next()
                    .ok_or_else(|| Error::malformed_redirection(INPUT_REDIRECT))?;
                command.input_target = Some(target.to_string());
            }
            BACKGROUND => command.background = true,
            variable if variable.starts_with('$') => {
                command.arguments.push(environment::expand(variable)?);
            }
            argument => command.arguments.push(argument.to_string()),
        }
    }

    Ok(command)
}
