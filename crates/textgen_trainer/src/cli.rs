use crate::data::DataArgs;
use crate::train::TrainArgs;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Text-Generation Pretraining Toolchain", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a model on a plain-text corpus
    Train(TrainArgs),

    /// Inspect how a corpus splits into training windows
    Data(DataArgs),
}
