//! Background jobs and their reaping.
//!
//! Jobs are reaped by polling once per prompt cycle rather than from a
//! SIGCHLD handler, so a "Done" notice appears no earlier than the prompt
//! after the job actually finished.

use std::fmt;
use std::io::Write;

use failure::{Fail, ResultExt};
use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};

use crate::core::job::{Job, JobId, ProcessId};
use crate::errors::{ErrorKind, Result};

/// Insertion-ordered background jobs. Job ids increase for the lifetime of
/// the table and are never reused.
#[derive(Default)]
pub struct JobTable {
    jobs: Vec<Job>,
    job_count: u32,
}

impl JobTable {
    pub fn create_job(&mut self, pid: ProcessId, command_line: &str) -> &Job {
        debug_assert!(self.find_job_with_process(pid).is_none());
        let job_id = self.get_next_job_id();
        self.jobs.push(Job::new(job_id, pid, command_line));
        debug!("created job [{}] for {}", job_id, pid);
        &self.jobs[self.jobs.len() - 1]
    }

    pub fn has_jobs(&self) -> bool {
        !self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Removes the job running `pid`, keeping the others in order.
    pub fn remove_job(&mut self, pid: ProcessId) -> Option<Job> {
        self.find_job_with_process(pid)
            .map(|job_index| self.jobs.remove(job_index))
    }

    /// Reaps every child that has terminated, without blocking, and prints a
    /// completion notice for each tracked job.
    pub fn reap(&mut self, stdout: &mut dyn Write) -> Result<()> {
        self.reap_with(poll_terminated_child, stdout)
    }

    /// Like `reap`, but takes terminated process ids from `poll` until it
    /// returns `None`. `poll` is not called when there are no jobs.
    pub fn reap_with<F>(&mut self, mut poll: F, stdout: &mut dyn Write) -> Result<()>
    where
        F: FnMut() -> Result<Option<ProcessId>>,
    {
        if !self.has_jobs() {
            return Ok(());
        }

        while let Some(pid) = poll()? {
            match self.remove_job(pid) {
                Some(job) => {
                    debug!("job [{}] ({}) is done", job.id(), pid);
                    writeln!(stdout, "{}", job.done_notice()).context(ErrorKind::Io)?;
                }
                None => warn!("reaped {} which is not a background job", pid),
            }
        }

        Ok(())
    }

    fn get_next_job_id(&mut self) -> JobId {
        self.job_count += 1;
        JobId(self.job_count)
    }

    fn find_job_with_process(&self, pid: ProcessId) -> Option<usize> {
        self.jobs.iter().position(|job| job.pid() == pid)
    }
}

impl fmt::Debug for JobTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} jobs\tjob_count: {}", self.jobs.len(), self.job_count)?;
        for job in &self.jobs {
            writeln!(f, "{:?}", job)?;
        }

        Ok(())
    }
}

/// Returns the id of one terminated child, or `None` if no child has
/// terminated (or there are no children at all).
fn poll_terminated_child() -> Result<Option<ProcessId>> {
    loop {
        match wait::waitpid(None, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => return Ok(None),
            Ok(WaitStatus::Exited(pid, status_code)) => {
                debug!("{} exited with {}.", pid, status_code);
                return Ok(Some(pid.into()));
            }
            Ok(WaitStatus::Signaled(pid, signal, _)) => {
                debug!("{} terminated by signal {:?}.", pid, signal);
                return Ok(Some(pid.into()));
            }
            Ok(status) => debug!("ignoring wait status {:?}", status),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.context(ErrorKind::Nix).into()),
        }
    }
}
