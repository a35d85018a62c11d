//! Payload shapes of the GitLab push and merge request webhooks.
//!
//! Every record decodes leniently: unknown fields are ignored and missing
//! fields, as well as fields sent as `null`, fall back to their zero value.

use std::fmt;

use serde::{Deserialize, Deserializer};

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Repository {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default", alias = "home")]
    pub homepage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Author {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Commit {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: Author,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct PushEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub before: String,
    #[serde(deserialize_with = "null_as_default")]
    pub after: String,
    #[serde(deserialize_with = "null_as_default", rename = "ref")]
    pub reference: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_username: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub project_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub commits: Vec<Commit>,
    #[serde(deserialize_with = "null_as_default")]
    pub total_commits_count: i64,
}

/// Acting user or assignee. The zero value stands for "nobody".
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct User {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
}

impl User {
    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}

/// Merge request state. Unrecognized values are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(from = "String", into = "String")]
pub enum MergeRequestState {
    Opened,
    Closed,
    Locked,
    Merged,
    Other(String),
}

impl MergeRequestState {
    pub fn as_str(&self) -> &str {
        match self {
            MergeRequestState::Opened => "opened",
            MergeRequestState::Closed => "closed",
            MergeRequestState::Locked => "locked",
            MergeRequestState::Merged => "merged",
            MergeRequestState::Other(state) => state,
        }
    }
}

impl Default for MergeRequestState {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for MergeRequestState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "opened" => Self::Opened,
            "closed" => Self::Closed,
            "locked" => Self::Locked,
            "merged" => Self::Merged,
            _ => Self::Other(state),
        }
    }
}

impl From<MergeRequestState> for String {
    fn from(state: MergeRequestState) -> Self {
        match state {
            MergeRequestState::Other(state) => state,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for MergeRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ObjectAttributes {
    #[serde(deserialize_with = "null_as_default")]
    pub last_commit: Commit,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub assignee: User,
    #[serde(deserialize_with = "null_as_default")]
    pub state: MergeRequestState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct MergeRequestEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub user: User,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub object_attributes: ObjectAttributes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_keeps_unknown_values() {
        let state: MergeRequestState = serde_json::from_str(r#""reopened""#).unwrap();
        assert_eq!(state, MergeRequestState::Other("reopened".into()));
        assert_eq!(serde_json::to_string(&state).unwrap(), r#""reopened""#);

        let state: MergeRequestState = serde_json::from_str(r#""merged""#).unwrap();
        assert_eq!(state, MergeRequestState::Merged);
        assert_eq!(state.to_string(), "merged");
    }

    #[test]
    fn repository_accepts_home_alias() {
        let repo: Repository =
            serde_json::from_str(r#"{"name":"demo","home":"http://x/demo"}"#).unwrap();
        assert_eq!(repo.homepage, "http://x/demo");
        assert_eq!(repo.url, "");
    }

    #[test]
    fn zero_user_is_unset() {
        assert!(User::default().is_unset());
        let user = User {
            name: String::new(),
            username: "bob".into(),
        };
        assert!(!user.is_unset());
    }

    #[test]
    fn null_fields_take_zero_values() {
        let event: MergeRequestEvent = serde_json::from_str(
            r#"{
                "user": null,
                "repository": {"name": "demo", "description": null, "homepage": null},
                "object_attributes": {
                    "url": "http://x/1",
                    "state": null,
                    "assignee": null,
                    "last_commit": {"id": "abc", "message": null, "author": null}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(event.user, User::default());
        assert_eq!(event.repository.name, "demo");
        assert_eq!(event.repository.description, "");
        assert_eq!(event.repository.homepage, "");
        assert!(event.object_attributes.assignee.is_unset());
        assert_eq!(event.object_attributes.state, MergeRequestState::default());
        assert_eq!(event.object_attributes.last_commit.id, "abc");
        assert_eq!(event.object_attributes.last_commit.message, "");
        assert_eq!(event.object_attributes.last_commit.author, Author::default());

        let event: MergeRequestEvent = serde_json::from_str(r#"{"object_attributes": null}"#).unwrap();
        assert_eq!(event, MergeRequestEvent::default());
    }

    #[test]
    fn null_push_fields_take_zero_values() {
        let event: PushEvent = serde_json::from_str(
            r#"{"ref": "refs/heads/master", "user_id": null, "commits": null, "repository": null}"#,
        )
        .unwrap();
        assert_eq!(event.reference, "refs/heads/master");
        assert_eq!(event.user_id, 0);
        assert!(event.commits.is_empty());
        assert_eq!(event.repository, Repository::default());
    }
}
