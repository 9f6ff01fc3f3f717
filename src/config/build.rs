use serde::{Deserialize, Serialize};

/// Build identification captured once at startup and served verbatim by
/// the health endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BuildInfo {
    #[serde(default)]
    pub revision: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub branch: String,
}

impl BuildInfo {
    pub fn new(
        revision: impl Into<String>,
        tag: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        BuildInfo {
            revision: revision.into(),
            tag: tag.into(),
            branch: branch.into(),
        }
    }
}
