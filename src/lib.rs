//! myshell - a small interactive command shell
//!
//! Lines are split on whitespace, support `<` / `>` redirection, `$VAR`
//! substitution and `&` background jobs. `cd`, `echo`, `jobs` and `exit` run
//! inside the shell; everything else is looked up on `PATH` and run as a child.
#![deny(
    missing_debug_implementations,
    trivial_casts,
    unused_import_braces
)]

/// Logs `$result` at error level if it is an `Err`, prefixed with a message.
/// The error's causes are logged with it.
macro_rules! log_if_err {
    ($result:expr, $fmt:expr) => {{
        if let Err(ref e) = $result {
            log::error!("{}: {}", $fmt, $crate::errors::display_chain(e));
        }
    }};
    ($result:expr, $fmt:expr, $($arg:tt)*) => {{
        if let Err(ref e) = $result {
            log::error!(
                "{}: {}",
                format_args!($fmt, $($arg)*),
                $crate::errors::display_chain(e)
            );
        }
    }};
}

pub mod core;
pub mod editor;
pub mod errors;
pub mod shell;
pub mod util;

pub use crate::shell::{Shell, ShellConfig};
