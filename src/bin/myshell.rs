use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process;

use log::{debug, error};
use nix::unistd::Pid;

use myshell::errors::Error;
use myshell::shell::SHELL_NAME;
use myshell::{util, Shell, ShellConfig};

const COMMAND_HISTORY_CAPACITY: usize = 100;
const LOG_FILE_NAME: &str = ".myshell_log";
const LOG_PATH_VAR: &str = "MYSHELL_LOG";

fn main() {
    init_logger(env::var_os(LOG_PATH_VAR));

    let shell_config = if util::isatty() {
        ShellConfig::interactive(COMMAND_HISTORY_CAPACITY)
    } else {
        ShellConfig::noninteractive()
    };
    debug!("{:?}", shell_config);

    let mut shell = Shell::new(shell_config).unwrap_or_else(|e| display_error_and_exit(&e));
    shell.execute_from_stdin();
    shell.exit()
}

/// Logs go to a file so they never mix with command output. If the file
/// can't be opened the shell runs without a log.
fn init_logger(path: Option<OsString>) {
    let log_path = match path.filter(|path| !path.is_empty()) {
        Some(path) => PathBuf::from(path),
        None => match dirs::home_dir() {
            Some(home) => home.join(LOG_FILE_NAME),
            None => {
                eprintln!("{}: HOME not set, logging disabled", SHELL_NAME);
                return;
            }
        },
    };

    let log_file = match fern::log_file(&log_path) {
        Ok(log_file) => log_file,
        Err(e) => {
            eprintln!(
                "{}: unable to open log file {}: {}",
                SHELL_NAME,
                log_path.display(),
                e
            );
            return;
        }
    };

    let pid = Pid::this();
    let result = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                pid,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Trace)
        .chain(log_file)
        .apply();

    if let Err(e) = result {
        eprintln!("{}: unable to initialize logging: {}", SHELL_NAME, e);
    }
}

fn display_error_and_exit(error: &Error) -> ! {
    error!("failed to create shell: {}", error);
    eprintln!("{}: {}", SHELL_NAME, error);
    process::exit(1);
}
