use crate::CompileStage;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Compile Asl source to three-address code")]
pub struct Args {
    /// Path to the Asl file to compile.
    pub file: PathBuf,
    /// Stop after this stage instead of generating code.
    #[arg(long, value_enum)]
    pub stage: Option<CompileStage>,
    /// Write the generated code next to the input instead of stdout.
    #[arg(short = 'o', long = "out-file")]
    pub out_file: bool,
}
