//! Command line parsing.
//!
//! Tokenization deliberately splits on spaces only: there is no quoting and
//! no escaping, so an argument can never contain a space. Lines starting
//! with `#` are comments.

use std::fmt;

/// Upper bound on the number of tokens in one command line.
pub const MAX_ARGS: usize = 512;

/// One parsed command line, consumed by a single loop iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Program name, also used as `argv[0]` for external programs.
    pub program: String,
    /// Arguments after the program name, redirection and `&` tokens removed.
    pub args: Vec<String>,
    /// Target of the last `<` redirection, if any.
    pub input_path: Option<String>,
    /// Target of the last `>` redirection, if any.
    pub output_path: Option<String>,
    /// Whether the command runs without the shell waiting for it.
    pub background: bool,
}

/// Errors that can occur while parsing a command line.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    /// A `<` or `>` operator with no file name token after it.
    MissingRedirectTarget(char),
    /// More than [`MAX_ARGS`] tokens on one line.
    TooManyArguments,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingRedirectTarget(op) => {
                write!(f, "syntax error: expected a file name after `{}`", op)
            }
            ParseError::TooManyArguments => {
                write!(f, "too many arguments (limit {})", MAX_ARGS)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse an already pid-expanded line into a [`Command`].
///
/// Returns `Ok(None)` for empty lines, comment lines, and lines that are
/// nothing but redirections or a background marker.
///
/// A trailing `&` is always stripped, but marks the command as background
/// only while `foreground_only` is off; under foreground-only mode the
/// marker is a silent no-op, not an error. When a redirection of the same
/// kind appears twice, the last one wins.
pub fn parse(line: &str, foreground_only: bool) -> Result<Option<Command>, ParseError> {
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut tokens: Vec<&str> = line.split(' ').filter(|t| !t.is_empty()).collect();
    if tokens.len() > MAX_ARGS {
        return Err(ParseError::TooManyArguments);
    }

    let mut background = false;
    if tokens.last() == Some(&"&") {
        tokens.pop();
        background = !foreground_only;
    }

    let mut args = Vec::new();
    let mut input_path = None;
    let mut output_path = None;
    let mut iter = tokens.into_iter();
    while let Some(token) = iter.next() {
        match token {
            "<" => match iter.next() {
                Some(path) => input_path = Some(path.to_string()),
                None => return Err(ParseError::MissingRedirectTarget('<')),
            },
            ">" => match iter.next() {
                Some(path) => output_path = Some(path.to_string()),
                None => return Err(ParseError::MissingRedirectTarget('>')),
            },
            _ => args.push(token.to_string()),
        }
    }

    if args.is_empty() {
        return Ok(None);
    }

    let program = args.remove(0);
    Ok(Some(Command {
        program,
        args,
        input_path,
        output_path,
        background,
    }))
}
