use std::collections::HashSet;

use crate::models::{Member, ReportKind};

/// Members the given report covers, in roster order.
pub fn select_members(roster: &[Member], kind: ReportKind) -> Vec<Member> {
    roster
        .iter()
        .filter(|member| match kind {
            ReportKind::All => true,
            ReportKind::NotInOc => !member.is_in_oc,
        })
        .cloned()
        .collect()
}

pub fn member_ids(selection: &[Member]) -> HashSet<i64> {
    selection.iter().map(|member| member.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportMode;
    use crate::models::LastAction;

    fn member(id: i64, name: &str, is_in_oc: bool) -> Member {
        Member {
            id,
            name: name.to_string(),
            is_in_oc,
            last_action: LastAction::default(),
        }
    }

    fn roster() -> Vec<Member> {
        vec![
            member(1, "Avery", false),
            member(2, "Jules", true),
            member(3, "Kiara", false),
            member(4, "Moreno", true),
            member(5, "Patel", false),
        ]
    }

    #[test]
    fn not_in_oc_skips_enrolled_members() {
        let selected = select_members(&roster(), ReportKind::NotInOc);
        let ids: Vec<i64> = selected.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn all_keeps_everyone() {
        assert_eq!(select_members(&roster(), ReportKind::All).len(), 5);
    }

    #[test]
    fn both_mode_selects_independently_from_one_snapshot() {
        let snapshot = roster();
        let sizes: Vec<usize> = ReportMode::Both
            .kinds()
            .iter()
            .map(|kind| select_members(&snapshot, *kind).len())
            .collect();
        assert_eq!(sizes, vec![3, 5]);
    }

    #[test]
    fn empty_roster_selects_nothing() {
        assert!(select_members(&[], ReportKind::NotInOc).is_empty());
        assert!(member_ids(&[]).is_empty());
    }
}
