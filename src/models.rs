use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastAction {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub relative: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub is_in_oc: bool,
    #[serde(default)]
    pub last_action: LastAction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotUser {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Slot {
    pub position: String,
    #[serde(default)]
    pub user: Option<SlotUser>,
    #[serde(default)]
    pub checkpoint_pass_rate: i32,
}

impl Slot {
    /// Id of the member holding this slot, `None` when the slot was never filled.
    pub fn member_id(&self) -> Option<i64> {
        self.user.as_ref().map(|user| user.id).filter(|id| *id != 0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrimeRecord {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub difficulty: i32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub executed_at: i64,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

#[derive(Debug, Deserialize)]
pub struct MembersResponse {
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Deserialize)]
pub struct CrimesResponse {
    #[serde(default)]
    pub crimes: Vec<CrimeRecord>,
}

/// Error object the API embeds in an otherwise successful response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatEntry {
    pub pass_rate: i32,
    pub executed_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    NotInOc,
    All,
}

impl ReportKind {
    pub fn heading(self) -> &'static str {
        match self {
            Self::NotInOc => "Members not in OC",
            Self::All => "All Members",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NotInOc => "not_in_oc",
            Self::All => "all",
        }
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_crime_with_open_slots_and_null_execution() {
        let body = r#"{
            "crimes": [{
                "id": 7,
                "name": "Blast from the Past",
                "difficulty": 8,
                "executed_at": null,
                "slots": [
                    {"position": "Muscle #1", "user": {"id": 12, "outcome": "Successful"}, "checkpoint_pass_rate": 71},
                    {"position": "Hacker", "user": null, "checkpoint_pass_rate": 0},
                    {"position": "Picklock"}
                ]
            }]
        }"#;

        let parsed: CrimesResponse = serde_json::from_str(body).unwrap();
        let crime = &parsed.crimes[0];
        assert_eq!(crime.executed_at, 0);
        assert_eq!(crime.slots[0].member_id(), Some(12));
        assert_eq!(crime.slots[1].member_id(), None);
        assert_eq!(crime.slots[2].member_id(), None);
        assert_eq!(crime.slots[2].checkpoint_pass_rate, 0);
    }

    #[test]
    fn slot_with_zero_user_id_is_unfilled() {
        let slot: Slot =
            serde_json::from_str(r#"{"position": "Thief", "user": {"id": 0}, "checkpoint_pass_rate": 40}"#)
                .unwrap();
        assert_eq!(slot.member_id(), None);
    }

    #[test]
    fn decodes_member_roster() {
        let body = r#"{"members": [{
            "id": 3,
            "name": "Kiara",
            "is_in_oc": true,
            "last_action": {"status": "Idle", "timestamp": 1760000000, "relative": "5 minutes ago"}
        }]}"#;
        let parsed: MembersResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.members.len(), 1);
        assert!(parsed.members[0].is_in_oc);
        assert_eq!(parsed.members[0].last_action.timestamp, 1760000000);
        assert_eq!(parsed.members[0].last_action.relative, "5 minutes ago");
    }
}
