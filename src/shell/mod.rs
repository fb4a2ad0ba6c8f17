//! Shell Module
//!
//! The Shell reads lines, dispatches them to builtins or external programs,
//! and owns the table of background jobs. Jobs are reaped before every
//! prompt.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::io::{self, Write};
use std::process;

use failure::ResultExt;
use log::{debug, error, info, warn};
use nix::sys::signal::{self, SigHandler, Signal};
use nix::unistd::{self, User};

use crate::core::{environment, parser::Command};
use crate::editor::Editor;
use crate::errors::{self, Error, ErrorKind, Result};

use self::job_table::JobTable;

pub mod builtins;
pub mod execute_command;
pub mod job_table;

pub const SHELL_NAME: &str = "myshell";
const USER_VAR: &str = "USER";

/// Interactive command interpreter.
pub struct Shell {
    /// Responsible for reading lines, with history when line editing is on.
    editor: Editor,
    job_table: JobTable,
    user: String,
    config: ShellConfig,
}

impl Shell {
    /// Constructs a new Shell for the invoking user.
    ///
    /// Fails if the user or the current directory can't be determined.
    pub fn new(config: ShellConfig) -> Result<Shell> {
        let user = current_user(env::var_os(USER_VAR))?;
        Self::with_user(config, user)
    }

    /// Constructs a new Shell showing `user` in its prompt.
    pub fn with_user<S: Into<String>>(config: ShellConfig, user: S) -> Result<Shell> {
        env::current_dir().map_err(|e| {
            Error::startup(format!("unable to determine current directory: {}", e))
        })?;

        if config.ignore_interrupts {
            ignore_interrupts()?;
        }

        let editor = if config.enable_line_editing {
            Editor::with_line_editing(config.command_history_capacity)
        } else {
            Editor::plain()
        };

        let shell = Shell {
            editor,
            job_table: JobTable::default(),
            user: user.into(),
            config,
        };

        info!("{} started up", SHELL_NAME);
        Ok(shell)
    }

    pub fn job_table(&self) -> &JobTable {
        &self.job_table
    }

    #[cfg(test)]
    pub(crate) fn job_table_mut(&mut self) -> &mut JobTable {
        &mut self.job_table
    }

    /// `<user>@myshell:<cwd>> `
    pub fn prompt_string(&self) -> String {
        let cwd = match env::current_dir() {
            Ok(cwd) => cwd.display().to_string(),
            Err(e) => {
                warn!("unable to determine current directory: {}", e);
                String::from("?")
            }
        };

        format!("{}@{}:{}> ", self.user, SHELL_NAME, cwd)
    }

    /// Returns `None` when end of file is reached.
    fn prompt(&mut self) -> Result<Option<String>> {
        let prompt = self.prompt_string();
        self.editor.readline(&prompt)
    }

    /// Parses and runs one line. An empty line is a no-op.
    pub fn execute_command_string(&mut self, input: &str) -> Result<()> {
        let command = Command::parse(input)?;
        if command.is_empty() {
            return Ok(());
        }

        self.execute_command(&command)
    }

    fn execute_command(&mut self, command: &Command) -> Result<()> {
        let program = match command.program() {
            Some(program) => program,
            None => return Ok(()),
        };

        if builtins::is_builtin(program) {
            return builtins::run(self, command);
        }

        let program_path = environment::resolve_executable(program)?;
        let stdout = io::stdout();
        let mut stdout = stdout.lock();
        execute_command::launch(command, &program_path, &mut self.job_table, &mut stdout)
    }

    /// Runs lines from stdin until EOF is received or stdin can't be read.
    ///
    /// An interrupted line reads as empty. Any other read error is reported
    /// and exits the shell the same way EOF does.
    pub fn execute_from_stdin(&mut self) {
        loop {
            // Report and remove background jobs that have finished.
            let temp_result = self.job_table.reap(&mut io::stdout());
            log_if_err!(temp_result, "reap");

            let input = match self.prompt() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!("unable to read input: {}", errors::display_chain(&e));
                    eprintln!("{}: {}", SHELL_NAME, errors::display_chain(&e));
                    self.exit();
                }
            };

            if !input.trim().is_empty() {
                self.editor.add_history_entry(input.trim());
            }

            if let Err(e) = self.execute_command_string(&input) {
                debug!("{:?} while running '{}'", e.kind().category(), input.trim());
                eprintln!("{}: {}", SHELL_NAME, e);
            }
        }
    }

    /// Exit the shell with status 0.
    ///
    /// Background jobs are neither waited for nor signaled; they keep running
    /// after the shell is gone.
    pub fn exit(&mut self) -> ! {
        if self.config.display_messages {
            println!("exit");
        }

        if self.job_table.has_jobs() {
            info!(
                "leaving {} background job(s) running: {:?}",
                self.job_table.len(),
                self.job_table
            );
        }

        let temp_result = io::stdout().flush();
        log_if_err!(temp_result, "failed to flush stdout during shutdown");

        info!("{} has shut down", SHELL_NAME);
        process::exit(0);
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "user: {}\n{:?}\n{:?}",
            self.user, self.config, self.job_table
        )
    }
}

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Read lines with the line editor rather than plain buffered stdin.
    enable_line_editing: bool,

    /// Number of entries to keep in the line editor's history.
    command_history_capacity: usize,

    /// Ignore SIGINT and SIGQUIT in the shell itself.
    ignore_interrupts: bool,

    /// Determines if some messages (e.g. "exit") should be displayed.
    display_messages: bool,
}

impl ShellConfig {
    /// Creates an interactive shell, e.g. line editing, in-memory history
    ///
    /// # Complete List
    /// - Lines are read with the line editor and kept in its history
    /// - Keyboard interrupts don't terminate the shell
    /// - Some additional messages are displayed
    pub fn interactive(command_history_capacity: usize) -> Self {
        Self {
            enable_line_editing: true,
            command_history_capacity,
            ignore_interrupts: true,
            display_messages: true,
        }
    }

    /// Creates a noninteractive shell, e.g. when stdin is a pipe or a file
    ///
    /// # Complete List
    /// - Lines are read from plain stdin, nothing is kept in history
    /// - Signal dispositions are left alone
    /// - Fewer messages are displayed
    pub fn noninteractive() -> Self {
        Default::default()
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            enable_line_editing: false,
            command_history_capacity: 0,
            ignore_interrupts: false,
            display_messages: false,
        }
    }
}

/// Login name from `$USER`, falling back to the password database.
fn current_user(user_var: Option<OsString>) -> Result<String> {
    if let Some(user) = user_var.filter(|user| !user.is_empty()) {
        return Ok(user.to_string_lossy().into_owned());
    }

    match User::from_uid(unistd::getuid()) {
        Ok(Some(user)) => Ok(user.name),
        Ok(None) => Err(Error::startup("unable to determine the invoking user")),
        Err(e) => Err(Error::startup(format!(
            "unable to determine the invoking user: {}",
            e
        ))),
    }
}

fn ignore_interrupts() -> Result<()> {
    unsafe {
        signal::signal(Signal::SIGINT, SigHandler::SigIgn).context(ErrorKind::Nix)?;
        signal::signal(Signal::SIGQUIT, SigHandler::SigIgn).context(ErrorKind::Nix)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::TempDir;

    use crate::errors::ErrorCategory;

    fn new_shell() -> Shell {
        Shell::with_user(ShellConfig::noninteractive(), "tester").expect("shell should start")
    }

    #[test]
    fn test_prompt_string() {
        let shell = new_shell();
        let cwd = env::current_dir().unwrap();
        assert_eq!(
            shell.prompt_string(),
            format!("tester@myshell:{}> ", cwd.display())
        );
    }

    #[test]
    fn test_current_user_prefers_environment() {
        assert_eq!(
            current_user(Some(OsString::from("alice"))).unwrap(),
            "alice"
        );
    }

    #[test]
    fn test_current_user_falls_back_to_password_database() {
        // only checks that a missing $USER is not by itself a startup failure
        // when the uid has a password entry
        if let Ok(Some(user)) = User::from_uid(unistd::getuid()) {
            assert_eq!(current_user(None).unwrap(), user.name);
            assert_eq!(current_user(Some(OsString::new())).unwrap(), user.name);
        }
    }

    #[test]
    fn test_empty_line_is_a_noop() {
        let mut shell = new_shell();
        shell.execute_command_string("").unwrap();
        shell.execute_command_string("   \t  ").unwrap();
        shell.execute_command_string("&").unwrap();
        assert!(!shell.job_table().has_jobs());
    }

    #[test]
    fn test_redirection_without_command_creates_nothing() {
        let mut shell = new_shell();
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        shell
            .execute_command_string(&format!("> {}", out.display()))
            .unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn test_parse_errors_abort_the_line() {
        let mut shell = new_shell();
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");

        let line = format!("echo $MYSHELL_SURELY_UNDEFINED_VARIABLE > {}", out.display());
        let err = shell.execute_command_string(&line).unwrap_err();
        assert_eq!(err.kind().category(), ErrorCategory::Parse);
        assert!(!out.exists());

        let err = shell.execute_command_string("echo hi >").unwrap_err();
        assert_eq!(err.kind().category(), ErrorCategory::Parse);
    }

    #[test]
    fn test_unknown_command_is_a_resolution_error() {
        let mut shell = new_shell();
        let err = shell
            .execute_command_string("myshell-surely-not-a-real-command")
            .unwrap_err();
        assert_eq!(
            *err.kind(),
            ErrorKind::CommandNotFound("myshell-surely-not-a-real-command".to_string())
        );
    }

    #[test]
    fn test_builtins_take_precedence() {
        let mut shell = new_shell();
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");

        // echo & still runs in the foreground as a builtin
        shell
            .execute_command_string(&format!("echo a b c & > {}", out.display()))
            .unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "a b c\n");
        assert!(!shell.job_table().has_jobs());
    }

    #[test]
    fn test_external_foreground_command() {
        let mut shell = new_shell();
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");

        shell
            .execute_command_string(&format!("printf %s-%s x y > {}", out.display()))
            .unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "x-y");
        assert!(!shell.job_table().has_jobs());
    }
}
