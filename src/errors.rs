//! Error module. See the [failure](https://crates.io/crates/failure) crate for details.

use std::fmt;
use std::result;

use failure::{Backtrace, Context, Fail};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    ctx: Context<ErrorKind>,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.ctx.get_context()
    }

    pub(crate) fn malformed_redirection<T: AsRef<str>>(operator: T) -> Error {
        Error::from(ErrorKind::MalformedRedirection(operator.as_ref().to_string()))
    }

    pub(crate) fn undefined_variable<T: AsRef<str>>(token: T) -> Error {
        Error::from(ErrorKind::UndefinedVariable(token.as_ref().to_string()))
    }

    pub(crate) fn search_path_unset<T: AsRef<str>>(command: T) -> Error {
        Error::from(ErrorKind::SearchPathUnset(command.as_ref().to_string()))
    }

    pub(crate) fn command_not_found<T: AsRef<str>>(command: T) -> Error {
        Error::from(ErrorKind::CommandNotFound(command.as_ref().to_string()))
    }

    pub(crate) fn redirection<T: AsRef<str>, R: fmt::Display>(path: T, reason: R) -> Error {
        Error::from(ErrorKind::Redirection {
            path: path.as_ref().to_string(),
            reason: reason.to_string(),
        })
    }

    pub(crate) fn spawn<T: AsRef<str>, R: fmt::Display>(program: T, reason: R) -> Error {
        Error::from(ErrorKind::Spawn {
            program: program.as_ref().to_string(),
            reason: reason.to_string(),
        })
    }

    pub(crate) fn builtin_usage<T: AsRef<str>>(message: T) -> Error {
        Error::from(ErrorKind::BuiltinUsage(message.as_ref().to_string()))
    }

    pub(crate) fn startup<T: AsRef<str>>(message: T) -> Error {
        Error::from(ErrorKind::Startup(message.as_ref().to_string()))
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.ctx.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.ctx.backtrace()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ctx.fmt(f)
    }
}

/// `fail` and each of its causes, separated by `: `.
pub fn display_chain<F: Fail>(fail: &F) -> String {
    let fail: &dyn Fail = fail;
    fail.iter_chain()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}

/// Which part of a command's life an error belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorCategory {
    Parse,
    Resolution,
    Redirection,
    Spawn,
    BuiltinUsage,
    Startup,
    Internal,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// `>` or `<` was the last token on the line.
    MalformedRedirection(String),
    /// A `$NAME` token named a variable missing from the environment.
    UndefinedVariable(String),
    /// The search path is unset or empty, so a bare command name can't be looked up.
    SearchPathUnset(String),
    CommandNotFound(String),
    Redirection { path: String, reason: String },
    Spawn { program: String, reason: String },
    BuiltinUsage(String),
    Startup(String),
    Io,
    Nix,
    Readline,
}

impl ErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match *self {
            ErrorKind::MalformedRedirection(_) | ErrorKind::UndefinedVariable(_) => {
                ErrorCategory::Parse
            }
            ErrorKind::SearchPathUnset(_) | ErrorKind::CommandNotFound(_) => {
                ErrorCategory::Resolution
            }
            ErrorKind::Redirection { .. } => ErrorCategory::Redirection,
            ErrorKind::Spawn { .. } => ErrorCategory::Spawn,
            ErrorKind::BuiltinUsage(_) => ErrorCategory::BuiltinUsage,
            ErrorKind::Startup(_) => ErrorCategory::Startup,
            ErrorKind::Io | ErrorKind::Nix | ErrorKind::Readline => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ErrorKind::MalformedRedirection(ref operator) => {
                write!(f, "syntax error: expected a file name after '{}'", operator)
            }
            ErrorKind::UndefinedVariable(ref token) => write!(f, "{}: Undefined variable.", token),
            ErrorKind::SearchPathUnset(ref command) => {
                write!(f, "{}: unable to search for command: PATH is not set", command)
            }
            ErrorKind::CommandNotFound(ref command) => write!(f, "{}: Command not found.", command),
            ErrorKind::Redirection {
                ref path,
                ref reason,
            } => write!(f, "{}: {}", path, reason),
            ErrorKind::Spawn {
                ref program,
                ref reason,
            } => write!(f, "{}: unable to run command: {}", program, reason),
            ErrorKind::BuiltinUsage(ref message) => write!(f, "{}", message),
            ErrorKind::Startup(ref message) => write!(f, "{}", message),
            ErrorKind::Io => write!(f, "I/O error occurred"),
            ErrorKind::Nix => write!(f, "Nix error occurred"),
            ErrorKind::Readline => write!(f, "Readline error occurred"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error::from(Context::new(kind))
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(ctx: Context<ErrorKind>) -> Error {
        Error { ctx }
    }
}
