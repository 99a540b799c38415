use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::enums::lenient_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileType {
    Venue,
    Artist,
    Other,
}

impl ProfileType {
    pub const ALL: [ProfileType; 3] = [ProfileType::Venue, ProfileType::Artist, ProfileType::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileType::Venue => "VENUE",
            ProfileType::Artist => "ARTIST",
            ProfileType::Other => "OTHER",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProfileType::Venue => "Venue",
            ProfileType::Artist => "Artist",
            ProfileType::Other => "Other",
        }
    }
}

impl FromStr for ProfileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "VENUE" => Ok(ProfileType::Venue),
            "ARTIST" => Ok(ProfileType::Artist),
            "OTHER" => Ok(ProfileType::Other),
            other => Err(format!("unknown profile type: {}", other)),
        }
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_id: Option<String>,
    pub display_name: String,
    /// Gates privileged actions such as event creation.
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body for profile create / replace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<ProfileType>,
    /// Only sent for venues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub socials: Vec<String>,
    #[serde(default)]
    pub websites: Vec<String>,
}

/// Body for `PATCH /profile`; absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<ProfileType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socials: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub websites: Option<Vec<String>>,
}
