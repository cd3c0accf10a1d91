//! Command line front end.
//!
//! Reads a source file (or stdin), prints cheat-code lines to stdout or
//! `--output`, and warnings/errors to stderr. Logging is controlled by
//! `RUST_LOG`.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use cheatasm::codegen::GeckoWriter;
use cheatasm::{Dialect, PassPipeline, Session};
use clap::{ArgAction, Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DialectArg {
    ActionReplay,
    Gecko,
    Bytes,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::ActionReplay => Dialect::ActionReplay,
            DialectArg::Gecko => Dialect::Gecko,
            DialectArg::Bytes => Dialect::Bytes,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "cheatasm",
    version,
    about = "Assemble PowerPC source and patch directives into cheat codes"
)]
struct Cli {
    /// Source file; reads stdin when omitted.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = DialectArg::ActionReplay)]
    dialect: DialectArg,

    /// Gecko register used as scratch by arithmetic codes.
    #[arg(long, value_name = "N", default_value_t = 15, value_parser = clap::value_parser!(u8).range(0..16))]
    register: u8,

    /// Skip the optimizer passes.
    #[arg(long = "no-optimize", action = ArgAction::SetTrue)]
    no_optimize: bool,

    /// Print the optimized IR tree to stderr before writing code.
    #[arg(long = "print-ir", action = ArgAction::SetTrue)]
    print_ir: bool,

    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let source = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let lines: Vec<&str> = source.lines().collect();

    let dialect = Dialect::from(cli.dialect);
    let mut session = match dialect {
        Dialect::Gecko => Session::with_writer(Box::new(GeckoWriter::with_register(cli.register))),
        other => Session::new(other),
    };
    if cli.no_optimize {
        session = session.with_pipeline(PassPipeline::empty());
    }

    if cli.print_ir {
        match session.build(&lines) {
            Ok(block) => eprint!("{}", block.print()),
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }

    let output = match session.compile(&lines) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    for warning in &output.warnings {
        eprintln!("warning: {}", warning);
    }
    for error in &output.errors {
        eprintln!("error: {}", error);
    }

    let mut text = output.lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    match &cli.output {
        Some(path) => fs::write(path, text)?,
        None => io::stdout().write_all(text.as_bytes())?,
    }

    if !output.is_ok() {
        std::process::exit(1);
    }
    Ok(())
}
