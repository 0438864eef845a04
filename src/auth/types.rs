// Authentication types

use serde::{Deserialize, Serialize};

use crate::models::UserProfile;

/// Base URL with any embedded credentials moved into a header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    /// Base URL, free of user-info
    pub base_url: String,

    /// `Basic <base64(user:pass)>` when the configured URL carried credentials
    pub static_auth: Option<String>,
}

/// Token response returned by login and signup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResult {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: UserProfile,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Login form body, sent `application/x-www-form-urlencoded`
#[derive(Debug, Serialize)]
pub struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl LoginForm<'_> {
    /// Encode as `username=...&password=...`
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", self.username)
            .append_pair("password", self.password)
            .finish()
    }
}

/// Signup request body
#[derive(Serialize)]
pub struct SignupRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_form_encoding() {
        let form = LoginForm {
            username: "alice@example.com",
            password: "p@ss word&more",
        };
        assert_eq!(
            form.encode(),
            "username=alice%40example.com&password=p%40ss+word%26more"
        );
    }

    #[test]
    fn test_signup_omits_missing_name() {
        let body = SignupRequest {
            email: "alice@example.com",
            password: "pw",
            name: None,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"email":"alice@example.com","password":"pw"}"#
        );
    }
}
