use crate::shell::builtins::{self, prelude::*};

pub struct Echo;

impl builtins::BuiltinCommand for Echo {
    const NAME: &'static str = builtins::ECHO_NAME;

    const HELP: &'static str = "\
echo: echo [arg ...]
    Write the arguments, separated by single spaces, followed by a newline.";

    fn run<T: AsRef<str>>(_shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        let line = args.iter().map(AsRef::as_ref).collect::<Vec<&str>>().join(" ");
        writeln!(stdout, "{}", line).context(ErrorKind::Io)?;
        Ok(())
    }
}
