//! Command line parsing

use core::fmt;

/// Argument of the `fuse` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuseArg {
    /// Restore factory defaults
    Reset,
    /// Program the low byte
    Low,
    /// Program the high byte
    High,
    /// Program the extended byte
    Extended,
    /// Program the lock byte
    Lock,
}

impl FuseArg {
    /// Parse a keyword, exact match only
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "reset" => Some(FuseArg::Reset),
            "low" => Some(FuseArg::Low),
            "high" => Some(FuseArg::High),
            "extended" => Some(FuseArg::Extended),
            "lock" => Some(FuseArg::Lock),
            _ => None,
        }
    }

    /// Keyword as typed
    pub const fn keyword(self) -> &'static str {
        match self {
            FuseArg::Reset => "reset",
            FuseArg::Low => "low",
            FuseArg::High => "high",
            FuseArg::Extended => "extended",
            FuseArg::Lock => "lock",
        }
    }
}

/// A parsed command line
///
/// The `fuse` argument is kept as typed: it is only validated once the
/// session knows the target is in programming mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Enter high-voltage programming mode
    Enter,
    /// Leave programming or running mode and power down
    Exit,
    /// Power the target and let it run
    Run,
    /// Show or program fuse/lock bytes
    Fuse(Option<&'a str>),
}

/// Why a line could not be turned into a [`Command`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError<'a> {
    /// First word is not a known command
    Unrecognized(&'a str),
    /// `enter`, `exit` or `run` followed by more words
    UnexpectedArguments,
}

impl fmt::Display for ParseError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Unrecognized(word) => write!(f, "Unrecognized command '{}'", word),
            ParseError::UnexpectedArguments => write!(f, "Command does not accept arguments"),
        }
    }
}

/// Parse one input line
///
/// Returns `Ok(None)` for a blank line. Words after the first `fuse`
/// argument are ignored.
pub fn parse(line: &str) -> Result<Option<Command<'_>>, ParseError<'_>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let command = match verb {
        "enter" => Command::Enter,
        "exit" => Command::Exit,
        "run" => Command::Run,
        "fuse" => return Ok(Some(Command::Fuse(words.next()))),
        other => return Err(ParseError::Unrecognized(other)),
    };

    if words.next().is_some() {
        return Err(ParseError::UnexpectedArguments);
    }
    Ok(Some(command))
}
