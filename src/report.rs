use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::models::{Member, StatEntry};
use crate::stats::StatisticsIndex;

pub const NO_MATCHING_MEMBERS: &str = "No matching faction members found.";

pub fn format_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn format_executed_at(executed_at: i64, offset: &FixedOffset) -> String {
    match DateTime::from_timestamp(executed_at, 0) {
        Some(at) => format_timestamp(&at.with_timezone(offset)),
        None => executed_at.to_string(),
    }
}

fn position_line(position: &str, entry: &StatEntry, offset: &FixedOffset) -> String {
    if entry.pass_rate == 0 {
        format!("    {position:<15} -")
    } else {
        format!(
            "    {position:<15} {:>3}% (executed_at {})",
            entry.pass_rate,
            format_executed_at(entry.executed_at, offset)
        )
    }
}

/// Renders one report for `selection`. Output depends only on the inputs;
/// `generated_at` also fixes the offset used for execution timestamps.
pub fn render_report(
    selection: &[Member],
    index: &StatisticsIndex,
    generated_at: DateTime<FixedOffset>,
) -> Vec<String> {
    let offset = *generated_at.offset();
    let mut lines = vec![format!(
        "Report generated at: {}",
        format_timestamp(&generated_at)
    )];

    let mut members: Vec<&Member> = selection.iter().collect();
    members.sort_by_cached_key(|member| member.name.to_lowercase());

    for (i, member) in members.into_iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(format!(
            "Member: {} ({}) - Last seen: {} ({})",
            member.name, member.id, member.last_action.status, member.last_action.relative
        ));

        if !index.has_member(member.id) {
            lines.push("  No historical OC participation recorded.".to_string());
            continue;
        }

        for (difficulty, positions) in index.tiers_for(member.id) {
            lines.push(format!("  Difficulty {difficulty}:"));
            for (position, entry) in positions {
                lines.push(position_line(position, &entry, &offset));
            }
        }
    }

    lines
}
