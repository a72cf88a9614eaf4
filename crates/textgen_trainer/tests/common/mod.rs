#![allow(dead_code)]

use std::path::{Path, PathBuf};

use textgen_trainer::vocab::TextTokenizer;

pub const PAD: u32 = 0;
pub const EOS: u32 = 1;
pub const UNK: u32 = 2;

/// Write a WordLevel tokenizer.json over `words` (ids start at 3) into `dir`.
pub fn write_toy_tokenizer(dir: &Path, words: &[&str]) -> PathBuf {
    let mut vocab = serde_json::Map::new();
    vocab.insert("<pad>".to_string(), PAD.into());
    vocab.insert("<eos>".to_string(), EOS.into());
    vocab.insert("<unk>".to_string(), UNK.into());
    for (i, word) in words.iter().enumerate() {
        vocab.insert((*word).to_string(), serde_json::Value::from(3 + i as u64));
    }

    let manifest = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "WhitespaceSplit"},
        "post_processor": null,
        "decoder": null,
        "model": {"type": "WordLevel", "vocab": vocab, "unk_token": "<unk>"}
    });

    let path = dir.join("tokenizer.json");
    std::fs::write(&path, manifest.to_string()).unwrap();
    path
}

/// Load the toy tokenizer through the production code path.
pub fn toy_tokenizer(dir: &Path, words: &[&str]) -> TextTokenizer {
    let path = write_toy_tokenizer(dir, words);
    TextTokenizer::from_file(path).unwrap()
}
