//! Access Commands
//!
//! List what a user may see, or check a single unit.
//!
//! Usage:
//!   aarlens units --user <id|name> [-f json]
//!   aarlens users --user <id|name> [-f json]
//!   aarlens aars  --user <id|name> [-f json]
//!   aarlens check --user <id|name> --unit <id>

use serde::Serialize;

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::hierarchy::{AccessAggregator, AccessResolver};
use crate::types::{Result, UnitId};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn aggregator(ctx: &CommandContext) -> AccessAggregator<'_> {
    AccessAggregator::new(ctx.db.as_ref(), &ctx.policy).with_admin_username(ctx.admin_username())
}

pub fn units(user_ref: &str, format: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.resolve_user(user_ref)?;
    let units = aggregator(&ctx).accessible_units(user.id)?;

    if format == "json" {
        return print_json(&units);
    }

    let out = Output::new();
    out.section(&format!("Units visible to {} ({})", user.username, user.role));
    for unit in &units {
        let parent = unit
            .parent_id
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>5}  {:<10} {:<30} parent {}",
            unit.id,
            unit.echelon.as_str(),
            unit.name,
            parent
        );
    }
    out.info(&format!("{} unit(s)", units.len()));
    Ok(())
}

pub fn users(user_ref: &str, format: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.resolve_user(user_ref)?;
    let people = aggregator(&ctx).accessible_users(user.id)?;

    if format == "json" {
        return print_json(&people);
    }

    let out = Output::new();
    out.section(&format!("Users visible to {}", user.username));
    for person in &people {
        let unit = person
            .unit_id
            .map(|u| u.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>5}  {:<24} {:<20} unit {}",
            person.id,
            person.username,
            person.role.as_str(),
            unit
        );
    }
    out.info(&format!("{} user(s)", people.len()));
    Ok(())
}

pub fn aars(user_ref: &str, format: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.resolve_user(user_ref)?;
    let aars = aggregator(&ctx).accessible_aars(user.id)?;

    if format == "json" {
        return print_json(&aars);
    }

    let out = Output::new();
    out.section(&format!("AARs visible to {}", user.username));
    for aar in &aars {
        println!(
            "  {:>5}  event {:<6} unit {:<6} by {:<6} {}/{}/{} items",
            aar.id,
            aar.event_id,
            aar.unit_id,
            aar.created_by,
            aar.sustain_items.len(),
            aar.improve_items.len(),
            aar.action_items.len()
        );
    }
    out.info(&format!("{} AAR(s)", aars.len()));
    Ok(())
}

pub fn check(user_ref: &str, unit_id: UnitId) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.resolve_user(user_ref)?;
    let tree = aggregator(&ctx).load_tree()?;
    let resolver =
        AccessResolver::new(&tree, &ctx.policy).with_admin_username(ctx.admin_username());

    let out = Output::new();
    if !ctx.policy.has_entry(user.role) {
        out.warning(&format!(
            "No hierarchy policy entry for role '{}'; only the home unit is visible",
            user.role
        ));
    }

    let Some(unit) = tree.get_unit(unit_id) else {
        out.error(&format!("DENIED: unit {} does not exist or is deleted", unit_id));
        return Ok(());
    };

    if !user.is_deleted && resolver.can_access_unit(&user, unit) {
        out.success(&format!("ALLOWED: {} → {} ({})", user.username, unit.name, unit.echelon));
    } else {
        out.error(&format!("DENIED: {} → {} ({})", user.username, unit.name, unit.echelon));
    }
    Ok(())
}
