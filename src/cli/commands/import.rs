//! Import Command
//!
//! Load a JSON organization fixture into the project database.

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::storage::Fixture;
use crate::types::Result;

pub fn run(file: &Path) -> Result<()> {
    let ctx = CommandContext::load()?;
    let fixture = Fixture::load(file)?;
    let summary = fixture.import(&ctx.db)?;

    let out = Output::new();
    out.success(&format!("Imported {}", file.display()));
    out.field("Units", summary.units);
    out.field("Users", summary.users);
    out.field("Assignments", summary.assignments);
    out.field("Events", summary.events);
    out.field("Participants", summary.participants);
    out.field("AARs", summary.aars);

    Ok(())
}
