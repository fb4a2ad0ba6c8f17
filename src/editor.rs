use std::fmt;
use std::io::{self, BufRead, Write};

use failure::{Fail, ResultExt};
use rustyline::{
    self,
    completion::{Completer, FilenameCompleter, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    validate::Validator,
    CompletionType, Config, Helper,
};

use crate::errors::{ErrorKind, Result};

struct EditorHelper(FilenameCompleter);

impl Completer for EditorHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &rustyline::Context<'_>,
    ) -> ::std::result::Result<(usize, Vec<Pair>), ReadlineError> {
        self.0.complete(line, pos, ctx)
    }
}

impl Hinter for EditorHelper {
    type Hint = String;
}

impl Highlighter for EditorHelper {}

impl Helper for EditorHelper {}

impl Validator for EditorHelper {}

/// Reads command lines, either through the line editor or from plain stdin.
pub struct Editor {
    internal: Option<rustyline::Editor<EditorHelper>>,
    history_capacity: usize,
}

impl Editor {
    /// Line editing with filename completion and `history_capacity` entries
    /// of in-memory history.
    pub fn with_line_editing(history_capacity: usize) -> Editor {
        let config = Config::builder()
            .max_history_size(history_capacity)
            .history_ignore_space(true)
            .completion_type(CompletionType::Circular)
            .build();

        let mut internal = rustyline::Editor::with_config(config);
        internal.set_helper(Some(EditorHelper(FilenameCompleter::new())));

        Editor {
            internal: Some(internal),
            history_capacity,
        }
    }

    /// Lines are read from stdin as-is; the prompt is still written to stdout.
    pub fn plain() -> Editor {
        Editor {
            internal: None,
            history_capacity: 0,
        }
    }

    /// Returns `None` at end of file. An interrupted line reads as empty.
    pub fn readline(&mut self, prompt: &str) -> Result<Option<String>> {
        let internal = match self.internal {
            Some(ref mut internal) => internal,
            None => {
                let stdin = io::stdin();
                let stdout = io::stdout();
                return read_plain_line(&mut stdin.lock(), &mut stdout.lock(), prompt);
            }
        };

        match internal.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(e) => Err(e.context(ErrorKind::Readline).into()),
        }
    }

    pub fn add_history_entry(&mut self, line: &str) {
        if let Some(ref mut internal) = self.internal {
            internal.add_history_entry(line);
        }
    }

    pub fn history_len(&self) -> usize {
        self.internal
            .as_ref()
            .map_or(0, |internal| internal.history().len())
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "line editing: {}", self.internal.is_some())?;
        writeln!(f, "count: {}", self.history_len())?;
        write!(f, "capacity: {}", self.history_capacity)
    }
}

/// Writes `prompt`, then reads one line without its line terminator.
///
/// Bytes that aren't valid UTF-8 become U+FFFD.
pub fn read_plain_line<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    prompt: &str,
) -> Result<Option<String>> {
    write!(writer, "{}", prompt).context(ErrorKind::Io)?;
    writer.flush().context(ErrorKind::Io)?;

    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf).context(ErrorKind::Io)? == 0 {
        return Ok(None);
    }

    if buf.ends_with(b"\n") {
        buf.pop();
        if buf.ends_with(b"\r") {
            buf.pop();
        }
    }

    // invalid UTF-8 is replaced rather than dropping the whole line
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}
