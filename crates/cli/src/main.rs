use anyhow::Result;
use clap::{Args, Parser};
use spatch::{ApplyOption, SourceFile};
use spatch_cli::read_source;
use tracing_subscriber::EnvFilter;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

mod cli;

/// Apply a semantic patch to a Go source file.
#[derive(Parser)]
#[command(version, about)]
struct Opts {
    /// The patch file to apply.
    patch: PathBuf,

    /// The Go file to rewrite. Stdin will be read if no file is provided.
    input: Option<PathBuf>,

    /// Write the result back to the input file instead of stdout.
    #[arg(short, long, requires = "input")]
    write: bool,

    /// Leave import declarations as they are.
    #[arg(long)]
    skip_imports: bool,

    #[command(flatten)]
    show: Show,
}

#[derive(Args)]
pub struct Show {
    /// Print both sides of every patch as parsed.
    #[arg(long)]
    dump_patch: bool,
    /// Print the syntax tree of the rewritten file.
    #[arg(long)]
    dump_tree: bool,
}

type CliInput = (SourceFile, SourceFile, ApplyOption, Show);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("SPATCH_LOG"))
        .with_writer(io::stderr)
        .init();

    let opts: Opts = Opts::parse();
    let patch = read_source(&opts.patch)?;
    let source = if let Some(path) = &opts.input {
        read_source(path)?
    } else {
        let mut s = String::new();
        io::stdin().read_to_string(&mut s)?;
        SourceFile::new("<stdin>", s)
    };
    let option = ApplyOption {
        fix_imports: !opts.skip_imports,
        ..ApplyOption::default()
    };

    let output = cli::rewrite((patch, source, option, opts.show))?;
    match opts.input {
        Some(path) if opts.write => fs::write(path, output)?,
        _ => print!("{}", output),
    }
    Ok(())
}
