use std::fmt;

use nix::unistd::Pid;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ProcessId(u32);

impl From<u32> for ProcessId {
    fn from(value: u32) -> Self {
        ProcessId(value)
    }
}

impl From<Pid> for ProcessId {
    fn from(value: Pid) -> Self {
        libc::pid_t::from(value).into()
    }
}

impl From<libc::pid_t> for ProcessId {
    fn from(value: libc::pid_t) -> Self {
        ProcessId(value as u32)
    }
}

impl From<ProcessId> for Pid {
    fn from(value: ProcessId) -> Self {
        Pid::from_raw(value.0 as libc::pid_t)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User-facing job number, assigned once when the job is created.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct JobId(pub u32);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A background process the shell is tracking until it is reaped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Job {
    id: JobId,
    pid: ProcessId,
    command_line: String,
}

impl Job {
    pub fn new(id: JobId, pid: ProcessId, command_line: &str) -> Self {
        Self {
            id,
            pid,
            command_line: command_line.to_string(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// The line printed when the job is started in the background.
    pub fn launch_notice(&self) -> String {
        format!("[{}] {}", self.id, self.pid)
    }

    /// The line printed once the job has been reaped.
    pub fn done_notice(&self) -> String {
        format!("[{}] Done {}", self.id, self.command_line)
    }
}

/// The `jobs` listing format.
impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.id, self.pid, self.command_line)
    }
}
