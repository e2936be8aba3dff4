use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// Result for one text of a translation batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Ok(String),
    Failed(String),
}

impl TranslationOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            TranslationOutcome::Ok(text) => Some(text),
            TranslationOutcome::Failed(_) => None,
        }
    }
}

/// Batch translation. Implementations report per-item failures through
/// [`TranslationOutcome::Failed`] instead of failing the whole batch.
pub trait Translate {
    fn translate(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Vec<TranslationOutcome>;
}

/// Returns the input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Translate for Passthrough {
    fn translate(&self, texts: &[String], _: &str, _: &str) -> Vec<TranslationOutcome> {
        texts.iter().cloned().map(TranslationOutcome::Ok).collect()
    }
}

/// Translations prepared ahead of time, aligned with cluster order.
///
/// Loaded from a JSON array where `null` marks an item the translator
/// could not handle, e.g. `["Hallo", null, "Tschüss"]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TranslationTable {
    entries: Vec<Option<String>>,
}

impl TranslationTable {
    pub fn new(entries: Vec<Option<String>>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read translations: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse translations: {}", path.display()))
    }
}

impl Translate for TranslationTable {
    fn translate(&self, texts: &[String], _: &str, _: &str) -> Vec<TranslationOutcome> {
        texts
            .iter()
            .enumerate()
            .map(|(idx, _)| match self.entries.get(idx) {
                Some(Some(text)) => TranslationOutcome::Ok(text.clone()),
                Some(None) => TranslationOutcome::Failed("translation unavailable".to_string()),
                None => TranslationOutcome::Failed("missing translation".to_string()),
            })
            .collect()
    }
}

/// Runs `translator` and forces a 1:1 result for `texts`.
pub fn translate_batch(
    translator: &dyn Translate,
    texts: &[String],
    source_lang: &str,
    target_lang: &str,
) -> Vec<TranslationOutcome> {
    if texts.is_empty() {
        return Vec::new();
    }
    let mut outcomes = translator.translate(texts, source_lang, target_lang);
    if outcomes.len() != texts.len() {
        warn!(
            "translator returned {} results for {} texts",
            outcomes.len(),
            texts.len()
        );
    }
    outcomes.truncate(texts.len());
    while outcomes.len() < texts.len() {
        outcomes.push(TranslationOutcome::Failed("missing translation".to_string()));
    }
    outcomes
}
