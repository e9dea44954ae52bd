//! Card-level operations on a batch (`idcard card ...`).

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Subcommand};
use idcard::core::PhotoRef;
use idcard::core::record::DEFAULT_POSITION;
use idcard::{CardRecord, CardVariant, RegularCard, SafetyCard};

use crate::cli::utils::{load_batch, print_records, zero_based};

/// Supported `idcard card` subcommands.
#[derive(Subcommand, Debug)]
pub enum CardCommand {
    /// Add a hand-entered card of the batch's variant.
    Add(CardAddArgs),
    /// Change fields of an existing card.
    Edit(CardEditArgs),
    /// Remove a card by index.
    Remove(CardIndexArgs),
    /// Show one card, or list all of them.
    Show(CardShowArgs),
}

/// Field values; flags that do not apply to the card's variant are ignored.
#[derive(Args, Debug, Default)]
pub struct CardFields {
    #[arg(long)]
    pub name: Option<String>,
    /// Regular: job title (defaults to "พนักงาน").
    #[arg(long)]
    pub position: Option<String>,
    /// Regular: printed employee code.
    #[arg(long = "id-code")]
    pub id_code: Option<String>,
    /// Regular: printed branch line.
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long = "branch-code")]
    pub branch_code: Option<String>,
    #[arg(long = "branch-name")]
    pub branch_name: Option<String>,
    /// Safety: passport id.
    #[arg(long = "safety-id")]
    pub safety_id: Option<String>,
    #[arg(long = "issue-date")]
    pub issue_date: Option<String>,
    #[arg(long = "training-module")]
    pub training_module: Option<String>,
    #[arg(long = "back-details")]
    pub back_details: Option<String>,
    #[arg(long = "expiry-date")]
    pub expiry_date: Option<String>,
    /// Portrait image path or URL; an empty value removes it.
    #[arg(long)]
    pub photo: Option<String>,
}

/// Arguments for `idcard card add`.
#[derive(Args, Debug)]
pub struct CardAddArgs {
    /// Batch file to modify.
    pub batch: PathBuf,
    #[command(flatten)]
    pub fields: CardFields,
}

/// Arguments for `idcard card edit`.
#[derive(Args, Debug)]
pub struct CardEditArgs {
    /// Batch file to modify.
    pub batch: PathBuf,
    /// 1-based index of the card to edit.
    #[arg(short = 'i', long = "index")]
    pub index: usize,
    #[command(flatten)]
    pub fields: CardFields,
}

/// Arguments for `idcard card remove`.
#[derive(Args, Debug)]
pub struct CardIndexArgs {
    /// Batch file to modify.
    pub batch: PathBuf,
    /// 1-based index.
    #[arg(short = 'i', long = "index")]
    pub index: usize,
}

/// Arguments for `idcard card show`.
#[derive(Args, Debug)]
pub struct CardShowArgs {
    /// Batch file to read.
    pub batch: PathBuf,
    /// 1-based index; omit to list every card.
    #[arg(short = 'i', long = "index")]
    pub index: Option<usize>,
    /// Print the card as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute a card command.
pub fn handle(command: CardCommand) -> Result<()> {
    match command {
        CardCommand::Add(args) => add(args),
        CardCommand::Edit(args) => edit(args),
        CardCommand::Remove(args) => remove(args),
        CardCommand::Show(args) => show(args),
    }
}

fn add(args: CardAddArgs) -> Result<()> {
    let mut batch = load_batch(&args.batch)?;
    let mut record = blank_record(batch.variant());
    apply_fields(&mut record, &args.fields);

    let mut workspace = batch.to_workspace();
    if !workspace.add_manual(record) {
        return Err(anyhow!("card rejected: a non-blank --name is required"));
    }
    let total = workspace.working_set().len();
    batch.update_from(workspace);
    batch.save(&args.batch)?;
    println!("Added card {} to {}", total, args.batch.display());
    Ok(())
}

fn edit(args: CardEditArgs) -> Result<()> {
    let mut batch = load_batch(&args.batch)?;
    let idx = zero_based(args.index, batch.cards.len())?;
    let mut record = batch.cards[idx].clone();
    apply_fields(&mut record, &args.fields);

    let mut workspace = batch.to_workspace();
    if !workspace.update(idx, record) {
        return Err(anyhow!("card {} could not be updated", args.index));
    }
    batch.update_from(workspace);
    batch.save(&args.batch)?;
    println!("Updated card {} in {}", args.index, args.batch.display());
    Ok(())
}

fn remove(args: CardIndexArgs) -> Result<()> {
    let mut batch = load_batch(&args.batch)?;
    let idx = zero_based(args.index, batch.cards.len())?;
    let mut workspace = batch.to_workspace();
    let removed = workspace
        .remove(idx)
        .with_context(|| format!("card {} not found", args.index))?;
    batch.update_from(workspace);
    batch.save(&args.batch)?;
    println!("Removed card {}: {}", args.index, removed.summary());
    Ok(())
}

fn show(args: CardShowArgs) -> Result<()> {
    let batch = load_batch(&args.batch)?;
    let Some(index) = args.index else {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&batch.cards)?);
        } else {
            print_records(&batch.cards, |_| " ");
        }
        return Ok(());
    };
    let idx = zero_based(index, batch.cards.len())?;
    let record = &batch.cards[idx];
    if args.json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }
    println!("Card {} ({}) id {}", index, record.variant(), record.id());
    match record {
        CardRecord::Regular(card) => {
            println!("Name: {}", card.name);
            println!("Position: {}", card.position);
            println!("ID code: {}", card.id_code);
            println!("Department: {}", card.department);
            if card.has_printed {
                println!("Already printed: yes");
            }
        }
        CardRecord::Safety(card) => {
            println!("Safety ID: {}", card.safety_id);
            println!("Name: {}", card.name);
            println!("Issued: {}", card.issue_date);
            println!("Expires: {}", card.expiry_date);
            println!("Training module: {}", card.training_module);
            println!("Back: {}", card.back_details);
        }
    }
    if let Some(photo) = record.photo() {
        println!("Photo: {}", photo.as_str());
    }
    Ok(())
}

fn blank_record(variant: CardVariant) -> CardRecord {
    match variant {
        CardVariant::Regular => RegularCard {
            position: DEFAULT_POSITION.to_string(),
            ..RegularCard::default()
        }
        .into(),
        CardVariant::Safety => SafetyCard::default().into(),
    }
}

fn apply_fields(record: &mut CardRecord, fields: &CardFields) {
    fn set(target: &mut String, value: &Option<String>) {
        if let Some(value) = value {
            *target = value.trim().to_string();
        }
    }

    match record {
        CardRecord::Regular(card) => {
            set(&mut card.name, &fields.name);
            set(&mut card.position, &fields.position);
            set(&mut card.id_code, &fields.id_code);
            set(&mut card.branch_code, &fields.branch_code);
            set(&mut card.branch_name, &fields.branch_name);
            let branch_changed = fields.branch_code.is_some() || fields.branch_name.is_some();
            if fields.department.is_none() && branch_changed {
                card.department = if card.branch_name.is_empty() || card.branch_code.is_empty() {
                    String::new()
                } else {
                    format!("{} ({})", card.branch_name, card.branch_code)
                };
            }
            set(&mut card.department, &fields.department);
        }
        CardRecord::Safety(card) => {
            set(&mut card.safety_id, &fields.safety_id);
            set(&mut card.name, &fields.name);
            set(&mut card.issue_date, &fields.issue_date);
            set(&mut card.training_module, &fields.training_module);
            set(&mut card.back_details, &fields.back_details);
            set(&mut card.expiry_date, &fields.expiry_date);
        }
    }
    if let Some(photo) = &fields.photo {
        let photo = photo.trim();
        record.set_photo((!photo.is_empty()).then(|| PhotoRef(photo.to_string())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fields_apply_to_matching_variant_only() {
        let mut record = blank_record(CardVariant::Regular);
        let fields = CardFields {
            name: Some(" Anan ".into()),
            safety_id: Some("S1".into()),
            photo: Some("me.jpg".into()),
            ..CardFields::default()
        };
        apply_fields(&mut record, &fields);
        let CardRecord::Regular(card) = &record else {
            panic!("expected regular card");
        };
        assert_eq!(card.name, "Anan");
        assert_eq!(card.position, DEFAULT_POSITION);
        assert_eq!(record.photo().map(|p| p.as_str()), Some("me.jpg"));

        apply_fields(
            &mut record,
            &CardFields {
                photo: Some(String::new()),
                ..CardFields::default()
            },
        );
        assert!(record.photo().is_none());
    }
}
