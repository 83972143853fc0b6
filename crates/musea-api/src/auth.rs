//! Password-grant credentials

/// Credentials for the one-shot token exchange at `/connect/token`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub scope: String,
}

impl Credentials {
    /// The form-encoded body of the exchange, `grant_type=password` included.
    pub(crate) fn form_params(&self) -> [(&'static str, &str); 6] {
        [
            ("grant_type", "password"),
            ("scope", &self.scope),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("username", &self.username),
            ("password", &self.password),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_params_carry_the_password_grant() {
        let credentials = Credentials {
            client_id: "app".to_string(),
            client_secret: "secret".to_string(),
            username: "visitor".to_string(),
            password: "pw".to_string(),
            scope: "password".to_string(),
        };
        let params = credentials.form_params();
        assert!(params.contains(&("grant_type", "password")));
        assert!(params.contains(&("username", "visitor")));
    }
}
