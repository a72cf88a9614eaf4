use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

pub mod dataset;
pub mod loader;
pub mod pairs;
pub mod sampler;

#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Plain-text corpus to inspect
    #[arg(long)]
    pub corpus: PathBuf,
}

/// Report how the extractor windows a corpus without training anything.
pub fn run(args: DataArgs) -> Result<()> {
    let dataset = dataset::WindowDataset::from_text_file(&args.corpus)?;

    println!("Corpus:           {:?}", args.corpus);
    println!("Words per window: {}", dataset::WINDOW_WORDS);
    println!("Windows:          {}", dataset.len());
    println!("Words dropped:    {} (trailing partial window)", dataset.discarded_words());

    if let Some(first) = dataset.windows().first() {
        let preview: String = first.chars().take(80).collect();
        println!("First window:     {preview}...");
    }

    Ok(())
}
