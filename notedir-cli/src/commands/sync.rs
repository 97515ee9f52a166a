use std::path::PathBuf;

use anyhow::Result;
use dialoguer::Select;
use notedir_core::Event;
use notedir_core::drive::{CommandCatalog, FileCatalog};
use notedir_core::filter::{DecisionOverrides, Tier};
use notedir_core::people::{CommandDirectory, Directory};
use notedir_core::sync::{Reconciler, SyncOptions};
use notedir_core::vault::Vault;
use owo_colors::OwoColorize;
use tracing::debug;

use super::{load_events, parse_date};
use crate::render::{Render, render_report};
use crate::utils::tui;

pub struct SyncArgs {
    pub vault: PathBuf,
    pub events: PathBuf,
    pub date: Option<String>,
    pub dry_run: bool,
    pub limit: Option<usize>,
    pub decisions: Option<PathBuf>,
    pub interactive: bool,
}

pub async fn run(args: SyncArgs, verbose: bool) -> Result<()> {
    let vault = Vault::load(&args.vault)?;
    let (events, rejected) = load_events(&args.events)?;
    let target_date = parse_date(args.date.as_deref())?;
    debug!(
        events = events.len(),
        rejected = rejected.len(),
        %target_date,
        "Loaded calendar events"
    );

    let mut overrides = match &args.decisions {
        Some(path) => DecisionOverrides::load(path)?,
        None => DecisionOverrides::default(),
    };

    let directory = CommandDirectory::from_config(&vault.config().directory);
    let options = SyncOptions {
        dry_run: args.dry_run,
        limit: args.limit,
    };
    let catalog = CommandCatalog::from_config(&vault.config().drive);
    let reconciler = Reconciler::new(&vault, &directory, options)?.with_catalog(&catalog);

    if args.interactive {
        prompt_overrides(&reconciler, &events, &mut overrides)?;
    }

    let spinner = tui::create_spinner(format!("Reconciling {} events", events.len()));
    let result = reconciler.run(events, target_date, &overrides).await;
    spinner.finish_and_clear();

    let mut report = result?;
    report.add_rejected(&rejected);

    println!("{}", render_report(&report, vault.root(), verbose));

    Ok(())
}

const TIER_CHOICES: [Tier; 3] = [Tier::FullDocument, Tier::LinkOnly, Tier::Skip];

/// Ask for a tier for every event decided by a judgment rule. Escape stops
/// prompting; the remaining events keep their automatic decision.
fn prompt_overrides<D: Directory, C: FileCatalog>(
    reconciler: &Reconciler<'_, D, C>,
    events: &[Event],
    overrides: &mut DecisionOverrides,
) -> Result<()> {
    let planned = reconciler.plan(events.to_vec(), overrides);
    let items: Vec<String> = TIER_CHOICES.iter().map(|t| t.render()).collect();

    for entry in planned {
        if !entry.decision.overridable || overrides.get(&entry.event.id).is_some() {
            continue;
        }

        let default = TIER_CHOICES
            .iter()
            .position(|t| *t == entry.decision.tier)
            .unwrap_or(0);

        let prompt = format!(
            "  {} {} {}",
            entry.event.date(),
            entry.event,
            format!("({})", entry.decision.reason).dimmed()
        );

        let selection = Select::new()
            .with_prompt(prompt)
            .items(&items)
            .default(default)
            .interact_opt()?;

        match selection {
            Some(index) if TIER_CHOICES[index] != entry.decision.tier => {
                overrides.insert(entry.event.id.clone(), TIER_CHOICES[index]);
            }
            Some(_) => {}
            None => {
                println!("  {}", "Remaining events use automatic tiers".dimmed());
                break;
            }
        }
    }

    Ok(())
}
