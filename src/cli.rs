use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "filqc",
    version,
    about = "Filament quality instrument-export ingestion tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Ingest(IngestArgs),
    Materials(MaterialsArgs),
    Parts(PartsArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = ".cache/filament")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Directory of pressure logs ("Parts Quality").
    #[arg(long)]
    pub parts_quality: Option<PathBuf>,

    /// Directory of benchtop filament diameter scans.
    #[arg(long)]
    pub diameter: Option<PathBuf>,

    /// Directory of TGA/DSC thermal spreadsheets.
    #[arg(long)]
    pub characteristics: Option<PathBuf>,

    #[arg(long)]
    pub live_print: Option<PathBuf>,

    /// JSON upload request(s); each one runs on its own connection.
    #[arg(long = "request")]
    pub requests: Vec<PathBuf>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl IngestArgs {
    pub fn has_directory_flags(&self) -> bool {
        self.parts_quality.is_some()
            || self.diameter.is_some()
            || self.characteristics.is_some()
            || self.live_print.is_some()
    }
}

#[derive(Args, Debug, Clone)]
pub struct MaterialsArgs {
    #[arg(long, default_value = ".cache/filament")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PartsArgs {
    #[arg(long, default_value = ".cache/filament")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Look up a single part (case-insensitive).
    #[arg(long)]
    pub part_id: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/filament")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

pub fn resolve_db_path(data_root: &std::path::Path, db_path: Option<&PathBuf>) -> PathBuf {
    db_path
        .cloned()
        .unwrap_or_else(|| data_root.join("filament_quality.sqlite"))
}
