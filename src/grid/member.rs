//! Member identity
//!
//! Members are the server-side processes of the grid that host and execute
//! functions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Unique identifier of a member in the grid
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MemberId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A set of members targeted by a single fan-out call
pub type MemberSet = BTreeSet<MemberId>;

/// Build a member set from member names
pub fn member_set<I, S>(names: I) -> MemberSet
where
    I: IntoIterator<Item = S>,
    S: Into<MemberId>,
{
    names.into_iter().map(Into::into).collect()
}

/// Render a member set as `[a, b, c]` for log and error messages
pub fn display_members(members: &MemberSet) -> String {
    let names: Vec<&str> = members.iter().map(MemberId::as_str).collect();
    format!("[{}]", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_set_is_ordered_and_deduplicated() {
        let members = member_set(["server2", "server1", "server2"]);
        assert_eq!(members.len(), 2);
        assert_eq!(display_members(&members), "[server1, server2]");
    }

    #[test]
    fn test_member_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&MemberId::new("server1")).unwrap();
        assert_eq!(json, "\"server1\"");
    }
}
