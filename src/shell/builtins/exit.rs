use crate::shell::builtins::{self, prelude::*};

pub struct Exit;

impl builtins::BuiltinCommand for Exit {
    const NAME: &'static str = builtins::EXIT_NAME;

    const HELP: &'static str = "\
exit: exit
    Exit the shell with a status of 0. Background jobs are left running.";

    fn run<T: AsRef<str>>(shell: &mut Shell, _args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        shell.exit()
    }
}
