//! hvprog - AVR high-voltage parallel programmer
//!
//! Host front end for the `hvprog-core` session. The console subcommand
//! feeds stdin to a [`Session`] line by line and prints its responses, so
//! a Linux board with a programming socket on its GPIO header behaves like
//! the standalone USB programmer.
//!
//! # Architecture
//!
//! - `hvprog-core` holds the protocol, power sequencing, device database
//!   and the command session; it is `no_std` and shared with the firmware
//! - backends (`hvprog-dummy`, `hvprog-linux-gpio`) implement `HvppMaster`
//! - this binary only selects a backend and moves lines in and out

mod cli;
mod programmers;

use std::io::{self, BufRead, Write};

use clap::Parser;
use cli::{Cli, Commands};
use hvprog_core::chip::DEVICES;
use hvprog_core::session::Session;

/// Log filter for the `-v` count; `RUST_LOG` still takes precedence
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter(cli.verbose)),
    )
    .init();

    let result = match cli.command {
        Commands::Console {
            programmer,
            no_color,
        } => run_console(&programmer, !no_color),
        Commands::ListDevices => {
            list_devices();
            Ok(())
        }
        Commands::ListProgrammers => {
            print!("{}", programmers::programmer_help());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Run the command session until stdin is closed
fn run_console(programmer: &str, color: bool) -> Result<(), Box<dyn std::error::Error>> {
    let master = programmers::open_programmer(programmer)?;
    let mut session = Session::new(master).with_color(color);

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    let mut response = String::new();

    for line in stdin.lock().lines() {
        let line = line?;
        response.clear();
        session.execute(&line, &mut response)?;
        stdout.write_all(response.as_bytes())?;
        stdout.flush()?;
    }

    log::debug!("Input closed in {} mode", session.mode());

    // Never leave the socket powered when the console goes away
    let mut master = session.into_master();
    master.release_all();
    Ok(())
}

/// Print the device database
fn list_devices() {
    println!(
        "{:<8} {:<28} {:>4} {:>4} {:>4} {:>4}  Notes",
        "Sig", "Name", "Low", "High", "Ext", "Lock"
    );
    println!("{}", "-".repeat(64));

    for dev in DEVICES {
        let ext = if dev.has_extended_fuse() {
            format!("{:02X}", dev.fuse_extended)
        } else {
            "-".to_string()
        };
        let notes = if dev.is_supported() {
            ""
        } else {
            "no factory defaults"
        };
        println!(
            "{:06X}   {:<28} {:>4} {:>4} {:>4} {:>4}  {}",
            dev.signature,
            dev.name,
            format!("{:02X}", dev.fuse_low),
            format!("{:02X}", dev.fuse_high),
            ext,
            format!("{:02X}", dev.lock),
            notes
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_filter() {
        assert_eq!(default_filter(0), "info");
        assert_eq!(default_filter(1), "debug");
        assert_eq!(default_filter(2), "trace");
        assert_eq!(default_filter(5), "trace");
    }

    #[test]
    fn test_verbose_flag_reaches_filter() {
        let cli = Cli::parse_from(["hvprog", "-vv", "list-devices"]);
        assert_eq!(default_filter(cli.verbose), "trace");

        let cli = Cli::parse_from(["hvprog", "console", "-v"]);
        assert_eq!(default_filter(cli.verbose), "debug");
    }
}
