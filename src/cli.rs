//! CLI argument parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hvprog")]
#[command(
    author,
    version,
    about = "AVR high-voltage parallel programmer",
    long_about = None
)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the programming console on stdin/stdout
    ///
    /// Commands: enter, exit, run, fuse [reset|low|high|extended|lock].
    /// One response line per status, "<status>\t<message>".
    Console {
        /// Programmer to use, as name[:key=value,...] (see list-programmers)
        #[arg(short, long, default_value = "dummy")]
        programmer: String,

        /// Do not color fuse bits that differ from factory defaults
        #[arg(long)]
        no_color: bool,
    },

    /// List devices in the database
    ListDevices,

    /// List supported programmers
    ListProgrammers,
}
