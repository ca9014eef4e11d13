// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads the WordPiece tokenizer that belongs to the model.
//
// HuggingFace model folders ship either a ready `tokenizer.json`
// or only the BERT `vocab.txt`. For the latter we write a
// tokenizer JSON by hand (BertNormalizer + BertPreTokenizer +
// WordPiece + [CLS]/[SEP] post-processor), save it next to the
// vocabulary, and load it back through Tokenizer::from_file.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use tokenizers::Tokenizer;

pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const VOCAB_FILE:     &str = "vocab.txt";

const SPECIAL_TOKENS: [&str; 5] = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]"];

pub struct TokenizerStore {
    dir:       PathBuf,
    lowercase: bool,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), lowercase: true }
    }

    /// Whether a generated tokenizer lower-cases its input (uncased models).
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// Load `tokenizer.json`, generating it from `vocab.txt` first if needed.
    pub fn load_or_build(&self) -> Result<Tokenizer> {
        let tok_path = self.dir.join(TOKENIZER_FILE);
        if tok_path.exists() {
            tracing::info!("Loading tokenizer from '{}'", tok_path.display());
            self.load()
        } else {
            tracing::info!("No {} found, building one from {}", TOKENIZER_FILE, VOCAB_FILE);
            self.build_and_save()
        }
    }

    /// Load a previously saved tokenizer from JSON file
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join(TOKENIZER_FILE);
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    fn build_and_save(&self) -> Result<Tokenizer> {
        let vocab_path = self.dir.join(VOCAB_FILE);
        let raw = fs::read_to_string(&vocab_path)
            .with_context(|| format!("Cannot read vocabulary '{}'", vocab_path.display()))?;

        // ── Step 1: vocab.txt is one token per line, id = line number ────────
        let mut vocab = serde_json::Map::new();
        for (id, token) in raw.lines().enumerate() {
            let token = token.trim_end_matches('\r');
            if token.is_empty() || vocab.contains_key(token) {
                continue;
            }
            vocab.insert(token.to_string(), serde_json::json!(id));
        }

        let id_of = |token: &str| -> Result<u64> {
            vocab
                .get(token)
                .and_then(|v| v.as_u64())
                .with_context(|| format!("'{}' is missing special token {}", vocab_path.display(), token))
        };
        let cls_id = id_of("[CLS]")?;
        let sep_id = id_of("[SEP]")?;
        id_of("[UNK]")?;

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .filter_map(|t| vocab.get(*t).map(|id| (t, id.clone())))
            .map(|(t, id)| serde_json::json!({
                "id": id, "content": t, "single_word": false, "lstrip": false,
                "rstrip": false, "normalized": false, "special": true
            }))
            .collect();

        // ── Step 2: Write tokenizer JSON in HuggingFace format ────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": self.lowercase
            },
            "pre_tokenizer": {
                "type": "BertPreTokenizer"
            },
            "post_processor": {
                "type": "BertProcessing",
                "sep": ["[SEP]", sep_id],
                "cls": ["[CLS]", cls_id]
            },
            "decoder": {
                "type": "WordPiece",
                "prefix": "##",
                "cleanup": true
            },
            "model": {
                "type": "WordPiece",
                "unk_token": "[UNK]",
                "continuing_subword_prefix": "##",
                "max_input_chars_per_word": 100,
                "vocab": vocab
            }
        });

        let tok_path = self.dir.join(TOKENIZER_FILE);
        fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write tokenizer JSON '{}'", tok_path.display()))?;

        tracing::info!(
            "Tokenizer built from {} vocabulary entries, saved to '{}'",
            raw.lines().count(),
            tok_path.display()
        );

        Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}
