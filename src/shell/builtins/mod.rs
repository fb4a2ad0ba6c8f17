//! Shell builtins
//!
//! Builtins run inside the shell process. They ignore `&`, write to the
//! `> file` target when one is given, and ignore `< file`.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;

use log::debug;

use self::prelude::*;

use self::cd::Cd;
use self::echo::Echo;
use self::exit::Exit;
use self::jobs::Jobs;
use crate::core::parser::Command;
use crate::shell::execute_command;

pub mod prelude {
    pub use std::io::Write;

    pub use failure::ResultExt;

    pub use crate::errors::{Error, ErrorKind, Result};
    pub use crate::shell::Shell;
}

mod cd;
mod echo;
mod exit;
mod jobs;

const CD_NAME: &str = "cd";
const ECHO_NAME: &str = "echo";
const EXIT_NAME: &str = "exit";
const JOBS_NAME: &str = "jobs";

/// Represents a builtin command such as cd or jobs.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// The help string; its first line is the usage.
    const HELP: &'static str;
    /// The usage string to display to the user.
    fn usage() -> String {
        Self::HELP.lines().next().unwrap_or(Self::NAME).to_owned()
    }
    /// Runs the command with the given arguments in the `shell` environment.
    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()>;
}

pub fn is_builtin<T: AsRef<str>>(program: T) -> bool {
    [CD_NAME, ECHO_NAME, EXIT_NAME, JOBS_NAME].contains(&program.as_ref())
}

/// precondition: command is a non-empty builtin.
pub fn run(shell: &mut Shell, command: &Command) -> Result<()> {
    let program = command.program().unwrap_or_default();
    debug_assert!(is_builtin(program));
    if command.background {
        debug!("{} is a builtin, running it in the foreground", program);
    }

    match command.output_target {
        Some(ref path) => {
            let mut file = open_output_target(path)?;
            run_builtin(shell, program, command.args(), &mut file)
        }
        None => {
            let stdout = io::stdout();
            let mut stdout = stdout.lock();
            run_builtin(shell, program, command.args(), &mut stdout)
        }
    }
}

fn run_builtin<T: AsRef<str>>(
    shell: &mut Shell,
    program: &str,
    args: &[T],
    stdout: &mut dyn Write,
) -> Result<()> {
    match program {
        CD_NAME => Cd::run(shell, args, stdout),
        ECHO_NAME => Echo::run(shell, args, stdout),
        EXIT_NAME => Exit::run(shell, args, stdout),
        JOBS_NAME => Jobs::run(shell, args, stdout),
        _ => unreachable!(),
    }
}

/// Opens `path` the way output redirection does for external commands:
/// created if missing, truncated otherwise.
fn open_output_target(path: &str) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(execute_command::output_target_mode().bits().into())
        .open(path)
        .map_err(|e| Error::redirection(path, e))
}
