//! Dry-run plan rendering.
//!
//! Consumes evaluator output only; performs no mutation and no probing of
//! its own, so it is safe to run arbitrarily often without privileges.
use crate::units::UnitStatus;
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PlanRow<'a> {
    unit: &'static str,
    classification: &'static str,
    reason: &'a str,
}

pub fn render(statuses: &[UnitStatus], json: bool) -> Result<()> {
    if json {
        let rows: Vec<PlanRow> = statuses
            .iter()
            .map(|status| PlanRow {
                unit: status.id.as_str(),
                classification: status.class.as_str(),
                reason: &status.reason,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for status in statuses {
        println!(
            "{:<20} {:<14} {}",
            status.id.as_str(),
            status.class.as_str(),
            status.reason
        );
    }
    let pending = statuses.iter().filter(|s| s.class.pending()).count();
    println!(
        "{} unit(s) pending, {} up-to-date",
        pending,
        statuses.len() - pending
    );
    Ok(())
}
