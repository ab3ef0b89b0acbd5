//! Insights Command
//!
//! Generate an insight report over the AARs a user may see.

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::hierarchy::AccessAggregator;
use crate::insights::{InsightAnalyzer, RuleBasedAnalyzer};
use crate::types::{InsightReport, Result};

pub fn run(user_ref: &str, format: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.resolve_user(user_ref)?;

    let aars = AccessAggregator::new(ctx.db.as_ref(), &ctx.policy)
        .with_admin_username(ctx.admin_username())
        .accessible_aars(user.id)?;

    let analyzer = RuleBasedAnalyzer::new(ctx.config.insights.clone());
    tracing::debug!(analyzer = analyzer.name(), aars = aars.len(), "Running analyzer");
    let report = analyzer.analyze(&aars);

    if format == "json" {
        println!("{}", report.to_json_pretty()?);
    } else {
        print_report(&report, &user.username, aars.len());
    }
    Ok(())
}

fn print_report(report: &InsightReport, username: &str, aar_count: usize) {
    let out = Output::new();
    out.header(&format!("AAR insights for {} ({} AARs)", username, aar_count));

    out.section("Trends");
    if report.trends.is_empty() {
        println!("  (none)");
    }
    for trend in &report.trends {
        println!(
            "  {} {} ×{}",
            out.level(trend.severity),
            trend.category,
            trend.frequency
        );
        println!("      {}", trend.description);
    }

    out.section("Friction Points");
    if report.friction_points.is_empty() {
        println!("  (none)");
    }
    for point in &report.friction_points {
        println!("  {} {}", out.level(point.impact), point.category);
        println!("      {}", point.description);
    }

    out.section("Recommendations");
    if report.recommendations.is_empty() {
        println!("  (none)");
    }
    for rec in &report.recommendations {
        println!("  {} {}", out.level(rec.priority), rec.category);
        println!("      {}", rec.description);
    }
}
