//! Plain-text rendering of a dashboard snapshot and of the load-failure view.

use crate::domain::{CategoryCount, Dimension, LoadFailure};
use crate::usecases::DashboardSnapshot;
use std::fmt::Write;

const BAR_WIDTH: usize = 30;

pub fn render_snapshot(snap: &DashboardSnapshot) -> String {
    let mut out = String::new();
    let agg = &snap.aggregates;
    let k = &agg.kpis;

    let _ = writeln!(
        out,
        "\n{} of {} companies match ({} active filters)",
        k.total,
        snap.total_companies,
        snap.filters.active_count()
    );
    for dim in Dimension::ALL {
        if let Some(values) = snap.filters.selected(dim) {
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            let _ = writeln!(out, "  {}: {}", dim.title(), values.join(", "));
        }
    }

    if agg.is_no_data() {
        out.push_str("\nNo data: no companies match the selected filters.\n");
        return out;
    }

    out.push_str("\n== KPIs ==\n");
    let _ = writeln!(out, "  Total companies        {}", k.total);
    let _ = writeln!(out, "  SDG commitment         {} ({}%)", k.with_sdg, k.sdg_rate);
    let _ = writeln!(
        out,
        "  International          {} ({}%)",
        k.international, k.international_rate
    );
    let _ = writeln!(
        out,
        "  Family businesses      {} ({}%)",
        k.family_owned, k.family_owned_rate
    );
    let _ = writeln!(
        out,
        "  Sustainable            {} ({}%)",
        k.sustainable, k.sustainable_rate
    );
    let _ = writeln!(
        out,
        "  Social impact          {} ({}%)",
        k.social_impact, k.social_impact_rate
    );
    let _ = writeln!(out, "  Changed sector/type    {}", k.with_changes);
    let _ = writeln!(out, "  Avg branches           {:.1}", k.avg_branches);
    let _ = writeln!(out, "  Avg age (years)        {:.1}", k.avg_age_years);
    let _ = writeln!(out, "  SDGs per committed     {:.1}", k.avg_sdg_per_committed);

    render_breakdown(&mut out, "By sector", &agg.by_sector);
    render_breakdown(&mut out, "By size", &agg.by_size);
    render_breakdown(&mut out, "By legal type", &agg.by_legal_type);
    render_breakdown(&mut out, "By branch location", &agg.by_branch_location);
    render_breakdown(&mut out, "Top SDG commitments", &agg.top_sdgs);

    out.push_str("\n== SDG commitment by size ==\n");
    for row in &agg.sdg_by_size {
        let _ = writeln!(
            out,
            "  {:<24} with {:>4}  without {:>4}",
            row.size_class, row.with_sdg, row.without_sdg
        );
    }

    out.push_str("\n== Founded per year ==\n");
    for yc in &agg.founded_per_year {
        let _ = writeln!(out, "  {}  {}", yc.year, yc.count);
    }

    out.push_str("\n== Profile ==\n");
    for m in &agg.profile {
        let _ = writeln!(
            out,
            "  {:<22} {:>5.1}  {}",
            m.axis.label(),
            m.value,
            bar(m.value, 100.0)
        );
    }
    out
}

fn render_breakdown(out: &mut String, title: &str, rows: &[CategoryCount]) {
    let _ = writeln!(out, "\n== {} ==", title);
    let max = rows.iter().map(|r| r.count).max().unwrap_or(0) as f64;
    for row in rows {
        let _ = writeln!(
            out,
            "  {:<24} {:>5}  {}",
            row.label,
            row.count,
            bar(row.count as f64, max)
        );
    }
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return String::new();
    }
    let width = ((value / max) * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64) as usize;
    "█".repeat(width)
}

/// The failure view: user message plus where to go next.
pub fn render_failure(failure: &LoadFailure) -> String {
    format!(
        "\nCould not load the data.\n{}\n(after {} attempts; last error: {})\nYou can retry or go back to {}\n",
        failure.user_message, failure.attempts, failure.cause, failure.recovery_hint
    )
}
