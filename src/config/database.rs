use {
    crate::{Error, Result, Sensitive},
    serde::Deserialize,
};

/// Data-source connection string handed to the schema and identity
/// collaborators. The server itself never opens a connection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Usually supplied through `DATABASE_URL`.
    #[serde(default)]
    pub url: Sensitive<String>,
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.as_str().trim().is_empty() {
            return Err(Error::config(
                "DATABASE_URL is empty. Set DATABASE_URL or [database] url in config.",
            ));
        }
        url::Url::parse(self.url.as_str())
            .map_err(|e| Error::config(format!("DATABASE_URL is not a valid URL: {e}")))?;
        Ok(())
    }
}
