use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 72;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl User {
    pub fn display_name(&self) -> &str {
        let name = self.full_name.trim();
        if name.is_empty() {
            &self.email
        } else {
            name
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    pub id: i64,
    pub email: String,
    pub full_name: String,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"********")
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signup {
    pub email: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter your full name")]
    MissingName,
    #[error("Please enter an email address")]
    MissingEmail,
    #[error("The password must be at least {} characters", MIN_PASSWORD_LEN)]
    PasswordTooShort,
    #[error("The password can't be longer than {} characters", MAX_PASSWORD_LEN)]
    PasswordTooLong,
    #[error("The passwords don't match")]
    PasswordMismatch,
}

fn check_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        Err(ValidationError::PasswordTooShort)
    } else if len > MAX_PASSWORD_LEN {
        Err(ValidationError::PasswordTooLong)
    } else {
        Ok(())
    }
}

impl Credentials {
    /// Validate login input. The email is trimmed, the password is kept as is.
    pub fn for_login(email: &str, password: &str) -> Result<Self, ValidationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        check_password(password)?;
        Ok(Self {
            email: email.to_string(),
            password: password.to_string(),
        })
    }
}

impl Signup {
    pub fn new(
        full_name: &str,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<Self, ValidationError> {
        let full_name = full_name.trim();
        let email = email.trim();
        if full_name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        if email.is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        check_password(password)?;
        if password != confirmation {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(Self {
            email: email.to_string(),
            full_name: full_name.to_string(),
            password: password.to_string(),
        })
    }
}

/// Value of the `Authorization` header sent with admin requests.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminToken(String);

impl fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminToken(..)")
    }
}

impl AdminToken {
    pub fn from_credentials(credentials: &Credentials) -> Self {
        let raw = format!("{}:{}", credentials.email, credentials.password);
        Self(format!("Basic {}", STANDARD.encode(raw)))
    }

    pub fn header_value(&self) -> &str {
        &self.0
    }

    /// Recover the credentials inside a Basic token, if it is one.
    pub fn decode(&self) -> Option<Credentials> {
        let (scheme, encoded) = self.0.split_once(char::is_whitespace)?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (email, password) = decoded.split_once(':')?;
        if email.is_empty() {
            return None;
        }
        Some(Credentials {
            email: email.to_string(),
            password: password.to_string(),
        })
    }
}

impl From<String> for AdminToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            email: "admin@fieldfinder.ca".to_string(),
            password: "s3cret:pass".to_string(),
        }
    }

    #[test]
    fn token_is_basic_auth() {
        let token = AdminToken::from_credentials(&Credentials {
            email: "a".to_string(),
            password: "b".to_string(),
        });
        assert_eq!(token.header_value(), "Basic YTpi");
    }

    #[test]
    fn token_decodes_back_to_credentials() {
        let token = AdminToken::from_credentials(&credentials());
        assert_eq!(token.decode(), Some(credentials()));
    }

    #[test]
    fn decode_rejects_other_tokens() {
        assert_eq!(AdminToken::from("Bearer abc".to_string()).decode(), None);
        assert_eq!(AdminToken::from("Basic".to_string()).decode(), None);
        assert_eq!(AdminToken::from("Basic !!!".to_string()).decode(), None);
        // "nocolon"
        assert_eq!(AdminToken::from("Basic bm9jb2xvbg==".to_string()).decode(), None);
        // ":pass"
        assert_eq!(AdminToken::from("Basic OnBhc3M=".to_string()).decode(), None);
    }

    #[test]
    fn decode_accepts_lowercase_scheme() {
        let token = AdminToken::from("basic YTpi".to_string());
        assert_eq!(token.decode().map(|c| c.email), Some("a".to_string()));
    }

    #[test]
    fn debug_hides_secrets() {
        let token = AdminToken::from_credentials(&credentials());
        assert!(!format!("{token:?}").contains("Basic"));
        assert!(!format!("{:?}", credentials()).contains("s3cret"));
    }

    #[test]
    fn signup_validation() {
        assert_eq!(
            Signup::new(" ", "a@b.c", "password", "password"),
            Err(ValidationError::MissingName)
        );
        assert_eq!(
            Signup::new("Ana", "  ", "password", "password"),
            Err(ValidationError::MissingEmail)
        );
        assert_eq!(
            Signup::new("Ana", "a@b.c", "short", "short"),
            Err(ValidationError::PasswordTooShort)
        );
        let long = "x".repeat(MAX_PASSWORD_LEN + 1);
        assert_eq!(
            Signup::new("Ana", "a@b.c", &long, &long),
            Err(ValidationError::PasswordTooLong)
        );
        assert_eq!(
            Signup::new("Ana", "a@b.c", "password", "passw0rd"),
            Err(ValidationError::PasswordMismatch)
        );
        let signup = Signup::new(" Ana ", " a@b.c ", "password", "password").unwrap();
        assert_eq!(signup.full_name, "Ana");
        assert_eq!(signup.email, "a@b.c");
    }

    #[test]
    fn login_validation() {
        assert_eq!(
            Credentials::for_login("", "password"),
            Err(ValidationError::MissingEmail)
        );
        assert!(Credentials::for_login(" a@b.c ", "password").is_ok());
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let mut user = User {
            id: 1,
            email: "ana@example.com".to_string(),
            full_name: "  ".to_string(),
            is_active: None,
        };
        assert_eq!(user.display_name(), "ana@example.com");
        user.full_name = " Ana ".to_string();
        assert_eq!(user.display_name(), "Ana");
    }
}
