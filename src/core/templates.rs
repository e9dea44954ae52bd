use serde::{Deserialize, Serialize};

use crate::core::record::{CardVariant, PhotoRef};

/// Describes the look of one card variant and the source columns it reads.
#[derive(Debug, Clone)]
pub struct Template {
    pub variant: CardVariant,
    pub description: &'static str,
    pub columns: &'static [TemplateColumn],
    pub company_name: &'static str,
    pub theme_color: &'static str,
    pub secondary_color: &'static str,
}

/// Source column consumed by a [`Template`].
#[derive(Debug, Clone)]
pub struct TemplateColumn {
    pub index: usize,
    pub letter: &'static str,
    pub label: &'static str,
}

/// User overrides for a template, as stored in the settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TemplateOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_background: Option<PhotoRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_background: Option<PhotoRef>,
}

/// A template with overrides applied; this is what layout and rendering use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardTemplate {
    pub variant: CardVariant,
    pub company_name: String,
    pub theme_color: Color,
    pub secondary_color: Color,
    pub front_background: Option<PhotoRef>,
    pub back_background: Option<PhotoRef>,
}

impl Template {
    /// Apply overrides; colors that fail to parse fall back to the built-in value.
    pub fn resolve(&self, overrides: &TemplateOverrides) -> CardTemplate {
        let default_theme = Color::parse(self.theme_color).unwrap_or(Color::WHITE);
        let default_secondary = Color::parse(self.secondary_color).unwrap_or(Color::WHITE);
        CardTemplate {
            variant: self.variant,
            company_name: overrides
                .company_name
                .clone()
                .unwrap_or_else(|| self.company_name.to_string()),
            theme_color: overrides
                .theme_color
                .as_deref()
                .and_then(Color::parse)
                .unwrap_or(default_theme),
            secondary_color: overrides
                .secondary_color
                .as_deref()
                .and_then(Color::parse)
                .unwrap_or(default_secondary),
            front_background: overrides.front_background.clone(),
            back_background: overrides.back_background.clone(),
        }
    }

    pub fn builtin(&self) -> CardTemplate {
        self.resolve(&TemplateOverrides::default())
    }
}

/// Registry of the built-in card templates.
pub struct TemplateRegistry;

impl TemplateRegistry {
    pub fn list() -> Vec<&'static Template> {
        vec![&REGULAR, &SAFETY]
    }

    pub fn get(variant: CardVariant) -> &'static Template {
        match variant {
            CardVariant::Regular => &REGULAR,
            CardVariant::Safety => &SAFETY,
        }
    }
}

/// Opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb`.
    pub fn parse(input: &str) -> Option<Self> {
        let hex = input.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let mut it = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Self::rgb(it.next()??, it.next()??, it.next()??))
            }
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

macro_rules! tpl_col {
    ($index:expr, $letter:expr, $label:expr) => {
        TemplateColumn {
            index: $index,
            letter: $letter,
            label: $label,
        }
    };
}

static REGULAR_COLUMNS: &[TemplateColumn] = &[
    tpl_col!(3, "D", "Branch code"),
    tpl_col!(4, "E", "Branch name"),
    tpl_col!(5, "F", "Employee code (printed as ID code)"),
    tpl_col!(9, "J", "First name"),
    tpl_col!(10, "K", "Last name"),
    tpl_col!(14, "O", "Already printed flag (TRUE/FALSE)"),
];

static SAFETY_COLUMNS: &[TemplateColumn] = &[
    tpl_col!(1, "B", "Safety passport ID"),
    tpl_col!(2, "C", "Full name"),
    tpl_col!(3, "D", "Issue date (text or serial date)"),
    tpl_col!(4, "E", "Training module date (text or serial date)"),
    tpl_col!(5, "F", "Back-of-card details"),
];

static REGULAR: Template = Template {
    variant: CardVariant::Regular,
    description: "Employee ID card; photo and four text lines, theme-colored back.",
    columns: REGULAR_COLUMNS,
    company_name: "IMPACT ID Card Generator",
    theme_color: "#68c5bc",
    secondary_color: "#3e87c6",
};

static SAFETY: Template = Template {
    variant: CardVariant::Safety,
    description: "Safety passport; dates, training badge and back-side details.",
    columns: SAFETY_COLUMNS,
    company_name: "SAFETY PASSPORT",
    theme_color: "#d9aa38",
    secondary_color: "#bb8d1e",
};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn overrides_replace_builtin_values() {
        let overrides = TemplateOverrides {
            company_name: Some("ACME".into()),
            theme_color: Some("#112233".into()),
            secondary_color: Some("not a color".into()),
            ..TemplateOverrides::default()
        };
        let tpl = TemplateRegistry::get(CardVariant::Regular).resolve(&overrides);
        assert_eq!(tpl.company_name, "ACME");
        assert_eq!(tpl.theme_color, Color::rgb(0x11, 0x22, 0x33));
        assert_eq!(tpl.secondary_color, Color::rgb(0x3e, 0x87, 0xc6));
    }

    #[test]
    fn short_hex_colors_expand() {
        assert_eq!(Color::parse("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse("fff"), None);
        assert_eq!(Color::rgb(0xd9, 0xaa, 0x38).to_hex(), "#d9aa38");
    }

    #[test]
    fn registry_returns_template_per_variant() {
        for variant in CardVariant::ALL {
            assert_eq!(TemplateRegistry::get(variant).variant, variant);
        }
        assert_eq!(TemplateRegistry::list().len(), 2);
    }
}
