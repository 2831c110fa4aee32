use aslc::args::Args;
use clap::Parser;
use std::fmt;
use std::io;
use std::process::ExitCode;
use std::{fs, path::Path};

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode, AslcError> {
    let source = fs::read_to_string(&args.file).map_err(AslcError::Io)?;

    let Some(compilation) = aslc::compile(&source, args.stage).map_err(AslcError::Compile)?
    else {
        return Ok(ExitCode::SUCCESS);
    };

    for error in &compilation.errors {
        eprintln!("{error}");
    }
    if !compilation.errors.is_empty() {
        return Ok(ExitCode::FAILURE);
    }

    if let Some(code) = &compilation.code {
        if args.out_file {
            write_listing(&args.file, &code.to_string()).map_err(AslcError::Io)?;
        } else {
            print!("{code}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn write_listing(input: &Path, listing: &str) -> io::Result<()> {
    let output = input.with_extension("t");
    fs::write(output, listing)
}

#[derive(Debug)]
enum AslcError {
    Io(io::Error),
    Compile(aslc::Error),
}

impl fmt::Display for AslcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "aslc: {e}"),
            Self::Compile(e) => write!(f, "aslc: {e}"),
        }
    }
}
