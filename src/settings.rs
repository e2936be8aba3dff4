use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cluster::DEFAULT_PROXIMITY_THRESHOLD;
use crate::fit::FitConfig;
use crate::pipeline::FailurePolicy;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub proximity_threshold: f32,
    pub fit: FitConfig,
    pub font_dir: PathBuf,
    /// Upper-cased language code to font file, relative to `font_dir`.
    pub fonts: BTreeMap<String, String>,
    pub failure_policy: FailurePolicy,
    pub placeholder: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            fit: FitConfig::default(),
            font_dir: PathBuf::from(".fonts"),
            fonts: BTreeMap::new(),
            failure_policy: FailurePolicy::Placeholder,
            placeholder: "[translation unavailable]".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    cluster: Option<ClusterSettings>,
    fit: Option<FitSettings>,
    render: Option<RenderSettings>,
    fonts: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ClusterSettings {
    proximity_threshold: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct FitSettings {
    min_font_size: Option<u32>,
    max_font_size: Option<u32>,
    padding: Option<i32>,
    fill_alpha: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderSettings {
    font_dir: Option<String>,
    failure_policy: Option<FailurePolicy>,
    placeholder: Option<String>,
}

/// Built-in defaults, then `settings.toml` / `settings.local.toml` in the
/// working directory, then the same pair under `~/.bubble-translator`, then
/// `extra_path`. Later files win key by key.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    load_settings_from(&ordered_paths)
}

/// Merges the embedded defaults with whichever of `paths` exist.
pub fn load_settings_from(paths: &[PathBuf]) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse built-in settings")?;
    settings.merge(defaults);

    for path in paths {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    if settings.fit.min_font_size == 0 || settings.fit.min_font_size > settings.fit.max_font_size {
        return Err(anyhow!(
            "invalid font size range {}..={}",
            settings.fit.min_font_size,
            settings.fit.max_font_size
        ));
    }
    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(cluster) = incoming.cluster {
            if let Some(threshold) = cluster.proximity_threshold {
                if threshold >= 0.0 {
                    self.proximity_threshold = threshold;
                }
            }
        }
        if let Some(fit) = incoming.fit {
            if let Some(size) = fit.min_font_size {
                self.fit.min_font_size = size;
            }
            if let Some(size) = fit.max_font_size {
                self.fit.max_font_size = size;
            }
            if let Some(padding) = fit.padding {
                if padding >= 0 {
                    self.fit.padding = padding;
                }
            }
            if let Some(alpha) = fit.fill_alpha {
                self.fit.fill_alpha = alpha;
            }
        }
        if let Some(render) = incoming.render {
            if let Some(dir) = render.font_dir {
                if !dir.trim().is_empty() {
                    self.font_dir = PathBuf::from(dir);
                }
            }
            if let Some(policy) = render.failure_policy {
                self.failure_policy = policy;
            }
            if let Some(placeholder) = render.placeholder {
                self.placeholder = placeholder;
            }
        }
        if let Some(fonts) = incoming.fonts {
            for (lang, path) in fonts {
                if !path.trim().is_empty() {
                    self.fonts.insert(lang.trim().to_uppercase(), path);
                }
            }
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".bubble-translator"))
        }
    })
}
