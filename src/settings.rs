//! User configuration: default variant, print spacing, raster output and
//! per-variant template overrides.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::pagination::PrintSpacing;
use crate::core::record::CardVariant;
use crate::core::templates::{CardTemplate, TemplateOverrides, TemplateRegistry};
use crate::error::SettingsError;

pub const DEFAULT_DPI: u32 = 300;
const SETTINGS_ENV: &str = "IDCARD_SETTINGS";

/// Spacing preset as written in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "preset", rename_all = "lowercase")]
pub enum SpacingChoice {
    #[default]
    Normal,
    Tight,
    Custom {
        gap_px: f32,
        frame_offset_px: f32,
    },
}

impl SpacingChoice {
    pub fn resolve(&self) -> PrintSpacing {
        match *self {
            SpacingChoice::Normal => PrintSpacing::NORMAL,
            SpacingChoice::Tight => PrintSpacing::TIGHT,
            SpacingChoice::Custom {
                gap_px,
                frame_offset_px,
            } => PrintSpacing::custom(gap_px, frame_offset_px),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub variant: CardVariant,
    pub spacing: SpacingChoice,
    pub dpi: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<PathBuf>,
    pub regular: TemplateOverrides,
    pub safety: TemplateOverrides,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            variant: CardVariant::default(),
            spacing: SpacingChoice::default(),
            dpi: DEFAULT_DPI,
            font: None,
            regular: TemplateOverrides::default(),
            safety: TemplateOverrides::default(),
        }
    }
}

impl Settings {
    pub fn overrides(&self, variant: CardVariant) -> &TemplateOverrides {
        match variant {
            CardVariant::Regular => &self.regular,
            CardVariant::Safety => &self.safety,
        }
    }

    pub fn overrides_mut(&mut self, variant: CardVariant) -> &mut TemplateOverrides {
        match variant {
            CardVariant::Regular => &mut self.regular,
            CardVariant::Safety => &mut self.safety,
        }
    }

    /// Built-in template of `variant` with this file's overrides applied.
    pub fn template(&self, variant: CardVariant) -> CardTemplate {
        TemplateRegistry::get(variant).resolve(self.overrides(variant))
    }
}

/// Persistence for [`Settings`].
pub trait SettingsStore {
    fn load(&self) -> Result<Settings, SettingsError>;
    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Settings kept as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$IDCARD_SETTINGS`, else `<config dir>/idcard/settings.json`, else
    /// `./idcard-settings.json`.
    pub fn default_location() -> Self {
        if let Ok(path) = std::env::var(SETTINGS_ENV) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Self::new(trimmed);
            }
        }
        match dirs::config_dir() {
            Some(dir) => Self::new(dir.join("idcard").join("settings.json")),
            None => Self::new("idcard-settings.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SettingsStore for JsonSettingsStore {
    /// A missing file yields the defaults; missing keys are filled in.
    fn load(&self) -> Result<Settings, SettingsError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no settings file; using defaults");
                return Ok(Settings::default());
            }
            Err(err) => return Err(self.io_error(err)),
        };
        serde_json::from_str(&text).map_err(|source| SettingsError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let json = serde_json::to_string_pretty(settings).map_err(|source| {
            SettingsError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, json).map_err(|err| self.io_error(err))
    }
}
