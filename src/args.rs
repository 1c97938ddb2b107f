use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Grape2 WWV raw-sample transform and spectral graphing",
    long_about = None,
    arg_required_else_help = true,
    after_help = "Examples:\n  grape_wwv transform raw/2024-02-10T15_node7.csv wwv_all3.csv\n  grape_wwv graph 2024-02-10T15_wwv_all3.csv\n  grape_wwv graph 2024-02-10T15_wwv_all3.csv --out-dir plots\n"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode and calibrate a raw recording, appending batches to a wide CSV table
    Transform {
        /// Path to the raw recording (calibration header plus hex body lines)
        input: PathBuf,

        /// Output CSV table; created with a header on first use, appended thereafter
        output: PathBuf,
    },
    /// Render per-station amplitude-spectrum and spectrogram PNGs from a transformed table
    Graph {
        /// Path to the transformed table; its file name must carry a YYYY-MM-DDTHH token
        table: PathBuf,

        /// Directory for the PNG artifacts
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}
