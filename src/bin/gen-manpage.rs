//! Man page generator for nandio
//!
//! Writes `nandio.1` plus one `nandio-<command>.1` page per subcommand.
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use std::fs;
use std::path::{Path, PathBuf};

#[path = "../cli.rs"]
mod cli;

fn render(cmd: clap::Command, title: &str, path: &Path) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd).title(title).render(&mut buffer)?;
    fs::write(path, buffer)?;
    println!("  {}", path.display());
    Ok(())
}

fn main() -> std::io::Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));

    fs::create_dir_all(&output_dir)?;

    let cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();

    println!("Generating man pages:");
    render(cmd.clone(), &name, &output_dir.join(format!("{}.1", name)))?;
    for sub in cmd.get_subcommands() {
        let sub_name = format!("{}-{}", name, sub.get_name());
        render(sub.clone(), &sub_name, &output_dir.join(format!("{}.1", sub_name)))?;
    }

    println!("\nTo view the man page:");
    println!("  man -l {}", output_dir.join(format!("{}.1", name)).display());

    Ok(())
}
