//! Template discovery commands (`idcard template ...`).

use anyhow::Result;
use clap::{Args, Subcommand};
use idcard::{CardVariant, Settings, TemplateRegistry};

use crate::cli::common::VariantArg;

/// Template subcommands.
#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// List the built-in card templates.
    List,
    /// Show source columns and resolved styling for a variant.
    Show(TemplateShowArgs),
}

/// Arguments for `idcard template show`.
#[derive(Args, Debug)]
pub struct TemplateShowArgs {
    #[arg(value_enum)]
    pub variant: VariantArg,
}

/// Execute a template command.
pub fn handle(command: TemplateCommand, settings: &Settings) -> Result<()> {
    match command {
        TemplateCommand::List => list(),
        TemplateCommand::Show(args) => show(args, settings),
    }
}

fn list() -> Result<()> {
    println!("Available templates:");
    for tpl in TemplateRegistry::list() {
        println!("  - {}: {}", tpl.variant, tpl.description);
    }
    Ok(())
}

fn show(args: TemplateShowArgs, settings: &Settings) -> Result<()> {
    let variant = CardVariant::from(args.variant);
    let tpl = TemplateRegistry::get(variant);
    let resolved = settings.template(variant);
    println!("Template: {}", tpl.variant);
    println!("{}", tpl.description);
    println!("Company: {}", resolved.company_name);
    println!(
        "Colors: {} / {}",
        resolved.theme_color.to_hex(),
        resolved.secondary_color.to_hex()
    );
    for (side, background) in [
        ("Front", &resolved.front_background),
        ("Back", &resolved.back_background),
    ] {
        if let Some(background) = background {
            println!("{side} background: {}", background.as_str());
        }
    }
    println!("Source columns (header row skipped):");
    for column in tpl.columns {
        println!("  {:>2} ({}): {}", column.index, column.letter, column.label);
    }
    Ok(())
}
