//! Shared clap helper types for CLI commands.

use clap::ValueEnum;
use idcard::core::LayoutMode;
use idcard::{CardVariant, PrintSpacing};

/// Card variant flag accepted by several commands.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum VariantArg {
    Regular,
    Safety,
}

impl From<VariantArg> for CardVariant {
    fn from(value: VariantArg) -> CardVariant {
        match value {
            VariantArg::Regular => CardVariant::Regular,
            VariantArg::Safety => CardVariant::Safety,
        }
    }
}

/// Print spacing presets; omit the flag to use the settings file.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum SpacingArg {
    Normal,
    Tight,
}

impl From<SpacingArg> for PrintSpacing {
    fn from(value: SpacingArg) -> PrintSpacing {
        match value {
            SpacingArg::Normal => PrintSpacing::NORMAL,
            SpacingArg::Tight => PrintSpacing::TIGHT,
        }
    }
}

/// Geometry target for `idcard layout`.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ModeArg {
    Preview,
    Print,
}

impl From<ModeArg> for LayoutMode {
    fn from(value: ModeArg) -> LayoutMode {
        match value {
            ModeArg::Preview => LayoutMode::Preview,
            ModeArg::Print => LayoutMode::Print,
        }
    }
}
