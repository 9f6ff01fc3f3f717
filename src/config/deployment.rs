use serde::Deserialize;

/// Whether the process runs as a deployed instance or on a developer machine.
///
/// Development mode relaxes TLS enforcement (no redirect, no
/// Strict-Transport-Security, non-secure session cookies) and wires the
/// always-allow admin authorizer. A deployed instance must run in
/// production mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    #[default]
    Development,
    Production,
}

impl DeploymentMode {
    /// Reads the `NAT_ENV` indicator: only `production` selects production.
    pub fn from_indicator(value: Option<&str>) -> Self {
        match value {
            Some("production") => DeploymentMode::Production,
            _ => DeploymentMode::Development,
        }
    }

    pub fn is_development(self) -> bool {
        self == DeploymentMode::Development
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_production_is_production() {
        assert_eq!(
            DeploymentMode::from_indicator(Some("production")),
            DeploymentMode::Production
        );
        assert_eq!(
            DeploymentMode::from_indicator(Some("staging")),
            DeploymentMode::Development
        );
        assert_eq!(
            DeploymentMode::from_indicator(Some("Production")),
            DeploymentMode::Development
        );
        assert_eq!(DeploymentMode::from_indicator(None), DeploymentMode::Development);
    }
}
