use {
    crate::{Error, Result, Sensitive},
    serde::Deserialize,
};

/// Accounts for the in-memory development identity store.
///
/// ```toml
/// [[auth.users]]
/// login = "admin"
/// password = "{{ ADMIN_PASSWORD }}"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub users: Vec<UserCredential>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCredential {
    pub login: String,
    pub password: Sensitive<String>,
}

impl AuthConfig {
    pub fn validate(&self) -> Result<()> {
        for (i, user) in self.users.iter().enumerate() {
            if user.login.trim().is_empty() {
                return Err(Error::config(format!("auth.users[{i}] has an empty login")));
            }
            if user.password.as_str().is_empty() {
                return Err(Error::config(format!(
                    "auth.users[{i}] ({}) has an empty password",
                    user.login
                )));
            }
        }
        Ok(())
    }
}
