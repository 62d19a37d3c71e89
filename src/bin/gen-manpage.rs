//! Writes the hvprog man pages
//!
//! One page for the tool itself and one `hvprog-<subcommand>.1` page per
//! subcommand, all rendered from the same clap definition as the binary.
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "../cli.rs"]
mod cli;

/// File name and page for every man page of the tool
fn pages() -> Vec<(String, Man)> {
    let cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();

    let mut pages = vec![(format!("{}.1", name), Man::new(cmd.clone()))];
    for sub in cmd.get_subcommands().filter(|sub| !sub.is_hide_set()) {
        let title = format!("{}-{}", name, sub.get_name());
        let page = Man::new(sub.clone()).title(title.to_uppercase());
        pages.push((format!("{}.1", title), page));
    }
    pages
}

fn write_pages(dir: &Path) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for (file, page) in pages() {
        let mut buffer = Vec::new();
        page.render(&mut buffer)?;
        let path = dir.join(file);
        fs::write(&path, buffer)?;
        written.push(path);
    }
    Ok(written)
}

fn main() -> io::Result<()> {
    let dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));

    for path in write_pages(&dir)? {
        println!("wrote {}", path.display());
    }
    println!("\nView with `man -l {}/hvprog.1`", dir.display());
    Ok(())
}
