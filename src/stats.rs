use std::collections::{BTreeMap, HashSet};

use crate::models::{CrimeRecord, StatEntry};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatKey {
    pub member_id: i64,
    pub difficulty: i32,
    pub position: String,
}

/// Tiers of one member: difficulty ascending, positions ascending within each.
pub type MemberTiers<'a> = Vec<(i32, Vec<(&'a str, StatEntry)>)>;

/// Most recent checkpoint pass rate per (member, difficulty, position).
#[derive(Debug, Clone, Default)]
pub struct StatisticsIndex {
    entries: BTreeMap<StatKey, StatEntry>,
}

impl StatisticsIndex {
    /// Folds the crime history into the index. When `members` is given, slots
    /// held by anyone outside it are skipped.
    pub fn build(crimes: &[CrimeRecord], members: Option<&HashSet<i64>>) -> Self {
        let mut index = Self::default();
        for crime in crimes {
            index.observe(crime, members);
        }
        index
    }

    fn observe(&mut self, crime: &CrimeRecord, members: Option<&HashSet<i64>>) {
        for slot in &crime.slots {
            let Some(member_id) = slot.member_id() else {
                continue;
            };
            if members.is_some_and(|filter| !filter.contains(&member_id)) {
                continue;
            }

            let entry = self
                .entries
                .entry(StatKey {
                    member_id,
                    difficulty: crime.difficulty,
                    position: slot.position.clone(),
                })
                .or_default();
            // strictly newer only: equal timestamps keep the first one seen
            if crime.executed_at > entry.executed_at {
                entry.pass_rate = slot.checkpoint_pass_rate;
                entry.executed_at = crime.executed_at;
            }
        }
    }

    pub fn has_member(&self, member_id: i64) -> bool {
        self.member_entries(member_id).next().is_some()
    }

    pub fn tiers_for(&self, member_id: i64) -> MemberTiers<'_> {
        let mut rows: Vec<(&StatKey, &StatEntry)> = self.member_entries(member_id).collect();
        rows.sort_by(|a, b| {
            a.0.difficulty
                .cmp(&b.0.difficulty)
                .then_with(|| a.0.position.cmp(&b.0.position))
        });

        let mut tiers: MemberTiers<'_> = Vec::new();
        for (key, entry) in rows {
            if tiers.last().map(|(difficulty, _)| *difficulty) != Some(key.difficulty) {
                tiers.push((key.difficulty, Vec::new()));
            }
            if let Some((_, positions)) = tiers.last_mut() {
                positions.push((key.position.as_str(), *entry));
            }
        }
        tiers
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn member_entries(&self, member_id: i64) -> impl Iterator<Item = (&StatKey, &StatEntry)> + '_ {
        let start = StatKey {
            member_id,
            difficulty: i32::MIN,
            position: String::new(),
        };
        self.entries
            .range(start..)
            .take_while(move |(key, _)| key.member_id == member_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Slot, SlotUser};

    fn slot(position: &str, member_id: i64, rate: i32) -> Slot {
        Slot {
            position: position.to_string(),
            user: Some(SlotUser { id: member_id }),
            checkpoint_pass_rate: rate,
        }
    }

    fn entry_for(
        index: &StatisticsIndex,
        member_id: i64,
        difficulty: i32,
        position: &str,
    ) -> Option<StatEntry> {
        index
            .tiers_for(member_id)
            .into_iter()
            .filter(|(tier, _)| *tier == difficulty)
            .flat_map(|(_, positions)| positions)
            .find(|(name, _)| *name == position)
            .map(|(_, entry)| entry)
    }

    fn crime(difficulty: i32, executed_at: i64, slots: Vec<Slot>) -> CrimeRecord {
        CrimeRecord {
            id: executed_at,
            name: "Mob Mentality".to_string(),
            difficulty,
            executed_at,
            slots,
        }
    }

    #[test]
    fn newest_execution_wins_in_any_order() {
        let older = crime(3, 100, vec![slot("Looter #1", 7, 55)]);
        let newer = crime(3, 200, vec![slot("Looter #1", 7, 82)]);

        for crimes in [vec![older.clone(), newer.clone()], vec![newer, older]] {
            let index = StatisticsIndex::build(&crimes, None);
            assert_eq!(
                entry_for(&index, 7, 3, "Looter #1"),
                Some(StatEntry {
                    pass_rate: 82,
                    executed_at: 200
                })
            );
            assert_eq!(index.len(), 1);
        }
    }

    #[test]
    fn equal_timestamps_keep_first_seen() {
        let crimes = vec![
            crime(2, 500, vec![slot("Enforcer", 4, 61)]),
            crime(2, 500, vec![slot("Enforcer", 4, 90)]),
        ];
        let index = StatisticsIndex::build(&crimes, None);
        assert_eq!(entry_for(&index, 4, 2, "Enforcer").map(|e| e.pass_rate), Some(61));
    }

    #[test]
    fn unfilled_slots_are_skipped() {
        let mut open = slot("Hacker", 0, 0);
        open.user = None;
        let crimes = vec![crime(5, 300, vec![open, slot("Hacker", 0, 33)])];
        let index = StatisticsIndex::build(&crimes, None);
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn filter_limits_indexed_members() {
        let crimes = vec![crime(1, 10, vec![slot("Kidnapper", 1, 70), slot("Muscle", 2, 65)])];
        let filter: HashSet<i64> = [2].into_iter().collect();
        let index = StatisticsIndex::build(&crimes, Some(&filter));
        assert!(!index.has_member(1));
        assert!(index.has_member(2));
    }

    #[test]
    fn zero_rate_is_stored_like_any_other_rate() {
        let crimes = vec![
            crime(4, 100, vec![slot("Bomber", 9, 74)]),
            crime(4, 150, vec![slot("Bomber", 9, 0)]),
        ];
        let index = StatisticsIndex::build(&crimes, None);
        assert_eq!(
            entry_for(&index, 9, 4, "Bomber"),
            Some(StatEntry {
                pass_rate: 0,
                executed_at: 150
            })
        );
    }

    #[test]
    fn tiers_are_sorted_by_difficulty_then_position() {
        let crimes = vec![
            crime(8, 40, vec![slot("Robber", 3, 50)]),
            crime(2, 30, vec![slot("Thief #2", 3, 60), slot("Lookout", 3, 45)]),
            crime(8, 20, vec![slot("Engineer", 3, 77)]),
            crime(2, 10, vec![slot("Lookout", 6, 99)]),
        ];
        let index = StatisticsIndex::build(&crimes, None);
        let tiers = index.tiers_for(3);

        let shape: Vec<(i32, Vec<&str>)> = tiers
            .iter()
            .map(|(difficulty, positions)| {
                (*difficulty, positions.iter().map(|(p, _)| *p).collect())
            })
            .collect();
        assert_eq!(
            shape,
            vec![
                (2, vec!["Lookout", "Thief #2"]),
                (8, vec!["Engineer", "Robber"]),
            ]
        );
        assert!(index.tiers_for(42).is_empty());
    }
}
