//! Launching external programs.
//!
//! Redirection happens in the child between fork and exec, so the shell's
//! own standard streams are never touched.

use std::ffi::CString;
use std::io::Write;
use std::os::unix::io::RawFd;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process;

use failure::{Fail, ResultExt};
use log::debug;
use nix::errno::Errno;
use nix::fcntl::{self, OFlag};
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::stat::Mode;
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::{self, Pid};

use crate::core::job::ProcessId;
use crate::core::parser::Command;
use crate::errors::{Error, ErrorKind, Result};
use crate::shell::job_table::JobTable;

/// Exit status of a child whose redirection target could not be opened.
const REDIRECTION_FAILURE_STATUS: i32 = 1;

/// Permissions for files created by output redirection.
pub fn output_target_mode() -> Mode {
    Mode::S_IRUSR | Mode::S_IWUSR
}

/// Standard stream replacements for one child.
///
/// Everything the child needs is prepared up front because only
/// async-signal-safe calls are allowed between fork and exec.
#[derive(Debug)]
pub struct Redirector {
    output: Option<Target>,
    input: Option<Target>,
}

#[derive(Debug)]
struct Target {
    path: CString,
    fd: RawFd,
    flags: OFlag,
    /// `myshell: <path>: `, completed in the child with the errno text.
    message_prefix: Vec<u8>,
}

impl Redirector {
    pub fn new(command: &Command) -> Result<Self> {
        let output = match command.output_target {
            Some(ref path) => Some(Target::new(
                path,
                libc::STDOUT_FILENO,
                OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
            )?),
            None => None,
        };
        let input = match command.input_target {
            Some(ref path) => Some(Target::new(path, libc::STDIN_FILENO, OFlag::O_RDONLY)?),
            None => None,
        };

        Ok(Self { output, input })
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_none() && self.input.is_none()
    }

    /// Replaces stdout and then stdin with the redirection targets.
    ///
    /// Only call this in a forked child before exec. If a target can't be
    /// opened the child reports it on stderr and exits; this never returns
    /// in that case.
    pub fn apply(&self) {
        for target in self.output.iter().chain(self.input.iter()) {
            if let Err(errno) = target.install() {
                target.fail(errno);
            }
        }
    }
}

impl Target {
    fn new(path: &str, fd: RawFd, flags: OFlag) -> Result<Self> {
        let c_path =
            CString::new(path).map_err(|_| Error::redirection(path, "invalid file name"))?;
        Ok(Self {
            path: c_path,
            fd,
            flags,
            message_prefix: format!("myshell: {}: ", path).into_bytes(),
        })
    }

    fn install(&self) -> nix::Result<()> {
        let fd = fcntl::open(self.path.as_c_str(), self.flags, output_target_mode())?;
        if fd != self.fd {
            unistd::dup2(fd, self.fd)?;
            unistd::close(fd)?;
        }

        Ok(())
    }

    fn fail(&self, errno: Errno) -> ! {
        // nothing useful can be done if stderr is gone as well
        let _ = unistd::write(libc::STDERR_FILENO, &self.message_prefix);
        let _ = unistd::write(libc::STDERR_FILENO, errno.desc().as_bytes());
        let _ = unistd::write(libc::STDERR_FILENO, b"\n");
        unsafe { libc::_exit(REDIRECTION_FAILURE_STATUS) }
    }
}

/// Runs `command` from `program_path`.
///
/// `arguments[0]` is passed through unchanged as the child's argv[0]. A
/// foreground command is waited for and its status discarded. A background
/// command is added to `job_table` and its `[<id>] <pid>` line written to
/// `stdout`.
pub fn launch(
    command: &Command,
    program_path: &Path,
    job_table: &mut JobTable,
    stdout: &mut dyn Write,
) -> Result<()> {
    let program = match command.program() {
        Some(program) => program,
        None => return Ok(()),
    };

    let redirector = Redirector::new(command)?;
    if !redirector.is_empty() {
        debug!("redirecting {}: {:?}", program, redirector);
    }
    let background = command.background;

    let mut process_command = process::Command::new(program_path);
    process_command.arg0(program).args(command.args());
    unsafe {
        process_command.pre_exec(move || {
            redirector.apply();
            set_child_interrupt_handling(background);
            Ok(())
        });
    }

    let child = process_command
        .spawn()
        .map_err(|e| Error::spawn(program, e))?;
    let pid = ProcessId::from(child.id());
    debug!(
        "spawned {} as {} (background: {})",
        program_path.display(),
        pid,
        background
    );

    if background {
        let job = job_table.create_job(pid, &command.command_line());
        writeln!(stdout, "{}", job.launch_notice()).context(ErrorKind::Io)?;
    } else {
        wait_for_process(pid)?;
    }

    Ok(())
}

/// Blocks until `pid` terminates. Its exit status is only logged.
pub fn wait_for_process(pid: ProcessId) -> Result<()> {
    loop {
        match wait::waitpid(Pid::from(pid), None) {
            Ok(WaitStatus::Exited(_, status_code)) => {
                debug!("{} exited with {}.", pid, status_code);
                return Ok(());
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                debug!("{} terminated by signal {:?}.", pid, signal);
                return Ok(());
            }
            Ok(status) => debug!("ignoring wait status {:?}", status),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.context(ErrorKind::Nix).into()),
        }
    }
}

/// Foreground children get the default SIGINT/SIGQUIT behavior back; background
/// children ignore both so a keyboard interrupt only reaches the foreground.
fn set_child_interrupt_handling(background: bool) {
    let handler = if background {
        SigHandler::SigIgn
    } else {
        SigHandler::SigDfl
    };

    for &sig in &[Signal::SIGINT, Signal::SIGQUIT] {
        // signal(2) only fails for invalid signal numbers
        let _ = unsafe { signal::signal(sig, handler) };
    }
}
