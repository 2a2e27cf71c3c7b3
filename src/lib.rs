use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod batch;
pub mod entry;
pub mod form;
pub mod normalize;
pub mod serialize;
pub mod submit;
pub mod suggest;

pub use entry::{
    AuthorEntry, ContributorEntry, EntryType, InstitutionAuthor, InstitutionContributor, PersonAuthor,
    PersonContributor,
};
pub use form::{FormLimits, ResourceForm};
pub use serialize::SavePayload;

/// Opaque identity of one entry in the editing form. Never derived from list position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// An institutional affiliation. `value` is the organization name shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliationTag {
    pub value: String,
    pub ror_id: Option<String>,
}

impl AffiliationTag {
    pub fn new(value: impl Into<String>, ror_id: Option<String>) -> Self {
        Self {
            value: value.into(),
            ror_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleTag {
    pub value: String,
}

impl RoleTag {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Candidate organization returned by the suggestion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliationSuggestion {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ror_id: Option<String>,
}
