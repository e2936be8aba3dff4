use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::settings::Settings;

/// Maps target language codes to font files.
#[derive(Debug, Clone)]
pub struct FontResolver {
    font_dir: PathBuf,
    fonts: BTreeMap<String, String>,
}

impl FontResolver {
    pub fn new(font_dir: impl Into<PathBuf>, fonts: BTreeMap<String, String>) -> Self {
        let fonts = fonts
            .into_iter()
            .map(|(lang, path)| (lang.trim().to_uppercase(), path))
            .collect();
        Self {
            font_dir: font_dir.into(),
            fonts,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.font_dir.clone(), settings.fonts.clone())
    }

    /// Font path for `lang` (case-insensitive). The file must exist.
    pub fn resolve(&self, lang: &str) -> Result<PathBuf> {
        let key = lang.trim().to_uppercase();
        let relative = self
            .fonts
            .get(&key)
            .ok_or_else(|| anyhow!("no font configured for language code: {}", lang))?;
        let path = self.font_dir.join(relative);
        if !path.is_file() {
            return Err(anyhow!("font file not found: {}", path.display()));
        }
        Ok(path)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.fonts.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn resolver(dir: &std::path::Path) -> FontResolver {
        let mut fonts = BTreeMap::new();
        fonts.insert("de".to_string(), "Bangers.ttf".to_string());
        fonts.insert("JA".to_string(), "missing/NotoSansJP.ttf".to_string());
        FontResolver::new(dir, fonts)
    }

    #[test]
    fn resolves_case_insensitively() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join("Bangers.ttf"), b"font").expect("write font");
        let resolver = resolver(dir.path());
        assert_eq!(
            resolver.resolve("De").expect("resolve"),
            dir.path().join("Bangers.ttf")
        );
        assert_eq!(resolver.languages().collect::<Vec<_>>(), vec!["DE", "JA"]);
    }

    #[test]
    fn unknown_language_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let err = resolver(dir.path()).resolve("xx").unwrap_err();
        assert!(err.to_string().contains("no font configured"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let err = resolver(dir.path()).resolve("ja").unwrap_err();
        assert!(err.to_string().contains("font file not found"));
    }
}
