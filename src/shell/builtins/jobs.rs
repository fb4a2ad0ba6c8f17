use crate::shell::builtins::{self, prelude::*};

pub struct Jobs;

impl builtins::BuiltinCommand for Jobs {
    const NAME: &'static str = builtins::JOBS_NAME;

    const HELP: &'static str = "\
jobs: jobs
    Display status of jobs.

    Lists the active background jobs in the order they were started, one
    per line as `[<job id>] <pid> <command line>`.";

    fn run<T: AsRef<str>>(shell: &mut Shell, _args: &[T], stdout: &mut dyn Write) -> Result<()> {
        for job in shell.job_table().jobs() {
            writeln!(stdout, "{}", job).context(ErrorKind::Io)?;
        }

        Ok(())
    }
}
