//! Response lines of the command channel
//!
//! Every line is `<status>\t<message>`, with the status left-aligned in a
//! ten character column so consoles show the messages lined up.

use core::fmt;

/// Width of the status column
pub const STATUS_WIDTH: usize = 10;

/// Status tag at the start of a response line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed
    Ok,
    /// Command rejected or failed
    Error,
    /// Command completed with a caveat
    Warning,
    /// Progress report during a longer operation
    Status,
    /// Signature read from the target
    Signature,
    /// Name of the recognized device
    Device,
    /// Fuse low byte
    Low,
    /// Fuse high byte
    High,
    /// Extended fuse byte
    Extended,
    /// Lock byte
    Lock,
}

impl Status {
    /// Tag as printed
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Error => "error",
            Status::Warning => "warning",
            Status::Status => "status",
            Status::Signature => "signature",
            Status::Device => "device",
            Status::Low => "low",
            Status::High => "high",
            Status::Extended => "extended",
            Status::Lock => "lock",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() so callers can align with {:<10}
        f.pad(self.as_str())
    }
}

/// Write the status column and separator, leaving the message to the caller
pub fn write_status<W: fmt::Write + ?Sized>(out: &mut W, status: Status) -> fmt::Result {
    write!(out, "{:<width$}\t", status, width = STATUS_WIDTH)
}

/// Write one complete response line
pub fn respond<W: fmt::Write + ?Sized>(
    out: &mut W,
    status: Status,
    message: fmt::Arguments<'_>,
) -> fmt::Result {
    write_status(out, status)?;
    out.write_fmt(message)?;
    out.write_char('\n')
}
