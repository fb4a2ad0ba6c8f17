use std::path::PathBuf;

use log::debug;
use nix::unistd;

use crate::shell::builtins::{self, prelude::*};

pub struct Cd;

impl builtins::BuiltinCommand for Cd {
    const NAME: &'static str = builtins::CD_NAME;

    const HELP: &'static str = "\
cd: cd [dir]
    Change the current directory to DIR. The default DIR is the value of
    the HOME shell variable.";

    fn run<T: AsRef<str>>(_shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let dir = match args {
            [] => dirs::home_dir().ok_or_else(|| Error::builtin_usage("cd: HOME not set"))?,
            [dir] => PathBuf::from(dir.as_ref()),
            _ => {
                return Err(Error::builtin_usage(format!(
                    "cd: too many arguments\nusage: {}",
                    Self::usage()
                )))
            }
        };

        unistd::chdir(&dir).map_err(|errno| {
            Error::builtin_usage(format!("{}: {}", dir.display(), errno.desc()))
        })?;
        debug!("changed directory to {}", dir.display());
        Ok(())
    }
}
