//! Expansion of the `$$` pid token.

use std::fmt;

/// Upper bound on a command line, in bytes, after expansion.
pub const MAX_LINE: usize = 2048;

/// Errors that can occur while expanding a command line.
#[derive(Debug, PartialEq, Eq)]
pub enum ExpandError {
    /// The line exceeds [`MAX_LINE`] bytes, either as typed or after
    /// `$$` expansion.
    LineTooLong,
}

impl fmt::Display for ExpandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpandError::LineTooLong => {
                write!(f, "input line exceeds {} bytes after expansion", MAX_LINE)
            }
        }
    }
}

impl std::error::Error for ExpandError {}

/// Replace every non-overlapping `$$` in `line` with the decimal `pid`.
///
/// All other characters pass through unchanged, including a lone trailing
/// `$` with no partner. The result may be longer than the input; a result
/// over [`MAX_LINE`] bytes is an error rather than a silent truncation.
pub fn expand_pid(line: &str, pid: u32) -> Result<String, ExpandError> {
    if line.len() > MAX_LINE {
        return Err(ExpandError::LineTooLong);
    }

    let pid = pid.to_string();
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(at) = rest.find("$$") {
        out.push_str(&rest[..at]);
        out.push_str(&pid);
        rest = &rest[at + 2..];
    }
    out.push_str(rest);

    if out.len() > MAX_LINE {
        return Err(ExpandError::LineTooLong);
    }
    Ok(out)
}
