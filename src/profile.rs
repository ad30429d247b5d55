//! Twitch user profile as returned by `GET /helix/users`

use serde::{Deserialize, Deserializer, Serialize};

/// The authenticated user's identity record.
///
/// Helix sends `id` as a JSON string; numeric ids are accepted as well and
/// normalised to their decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable Twitch user id
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    /// Display name, with the user's chosen capitalisation
    pub display_name: String,

    /// Verified email; only present with the `user:read:email` scope
    #[serde(default)]
    pub email: Option<String>,

    /// Avatar URL
    #[serde(default)]
    pub profile_image_url: String,
}

/// Envelope around every Helix list response.
#[derive(Debug, Deserialize)]
pub(crate) struct UsersEnvelope {
    #[serde(default)]
    pub data: Vec<User>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
