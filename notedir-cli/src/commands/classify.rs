use std::path::Path;

use anyhow::Result;
use notedir_core::filter::{DecisionOverrides, Tier};
use notedir_core::people::NoDirectory;
use notedir_core::sync::{Reconciler, SyncOptions};
use notedir_core::vault::Vault;
use owo_colors::OwoColorize;

use super::load_events;
use crate::render::Render;

pub fn run(vault: &Path, events: &Path) -> Result<()> {
    let vault = Vault::load(vault)?;
    let (events, rejected) = load_events(events)?;

    let reconciler = Reconciler::new(&vault, &NoDirectory, SyncOptions::default())?;
    let planned = reconciler.plan(events, &DecisionOverrides::default());

    for entry in &planned {
        println!(
            "{} {} {}",
            entry.event.start.to_string().dimmed(),
            entry.event,
            entry.decision.render()
        );
    }

    for event in &rejected {
        println!("{} {}", event.summary.red(), format!("({})", event.reason).dimmed());
    }

    let count = |tier: Tier| planned.iter().filter(|p| p.decision.tier == tier).count();
    println!(
        "\n{} full, {} link-only, {} skipped",
        count(Tier::FullDocument),
        count(Tier::LinkOnly),
        count(Tier::Skip)
    );

    Ok(())
}
