//! Credential verification for the login form.
//!
//! Unknown usernames and wrong passwords produce the same message, and an
//! unknown username still pays for one hash verification against a dummy
//! hash so response timing does not reveal which case occurred.

use crate::models::{LoginForm, SessionUser, User};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::{error, warn};

pub const USERNAME_REQUIRED: &str = "Username is required";
pub const PASSWORD_REQUIRED: &str = "Password is required";
pub const INVALID_COMBINATION: &str = "Invalid combination of username/password";

static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("not-a-real-password").ok());

/// A trimmed, non-empty username/password pair.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("{}", .0.join(", "))]
    Validation(Vec<&'static str>),
    #[error("Invalid combination of username/password")]
    InvalidCombination,
}

impl LoginError {
    /// Flat list of messages rendered above the login form.
    pub fn messages(&self) -> Vec<String> {
        match self {
            LoginError::Validation(errors) => errors.iter().map(|e| e.to_string()).collect(),
            LoginError::InvalidCombination => vec![INVALID_COMBINATION.to_string()],
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to hash password: {0}")]
pub struct HashError(String);

/// Checks both fields, reporting every missing one.
pub fn validate(form: &LoginForm) -> Result<Credentials, LoginError> {
    let username = form.username.trim();
    let password = form.password.trim();

    let mut errors = Vec::new();
    if username.is_empty() {
        errors.push(USERNAME_REQUIRED);
    }
    if password.is_empty() {
        errors.push(PASSWORD_REQUIRED);
    }
    if !errors.is_empty() {
        return Err(LoginError::Validation(errors));
    }

    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Compares `credentials` against the stored record, if any. CPU-heavy; call
/// from a blocking context.
pub fn verify_credentials(
    credentials: &Credentials,
    stored: Option<&User>,
) -> Result<SessionUser, LoginError> {
    let Some(user) = stored else {
        if let Some(dummy) = DUMMY_HASH.as_deref() {
            let _ = verify_password(&credentials.password, dummy);
        }
        warn!("login rejected");
        return Err(LoginError::InvalidCombination);
    };

    if verify_password(&credentials.password, &user.password_hash) {
        Ok(SessionUser::from(user))
    } else {
        warn!(user_id = user.id, "login rejected");
        Err(LoginError::InvalidCombination)
    }
}

/// Returns a PHC-format Argon2id hash.
pub fn hash_password(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| HashError(err.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            error!("stored password hash is malformed: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static STORED: Lazy<User> = Lazy::new(|| User {
        id: 7,
        username: "ana".into(),
        email: "ana@example.com".into(),
        password_hash: hash_password("Secr3t!pass").unwrap(),
    });

    fn form(username: &str, password: &str) -> LoginForm {
        LoginForm {
            username: username.into(),
            password: password.into(),
        }
    }

    #[test]
    fn collects_every_missing_field() {
        let err = validate(&form("   ", "")).unwrap_err();
        assert_eq!(
            err.messages(),
            vec![USERNAME_REQUIRED.to_string(), PASSWORD_REQUIRED.to_string()]
        );
        let err = validate(&form("ana", " \t")).unwrap_err();
        assert_eq!(err, LoginError::Validation(vec![PASSWORD_REQUIRED]));
    }

    #[test]
    fn trims_fields() {
        let creds = validate(&form("  ana ", " Secr3t!pass\n")).unwrap();
        assert_eq!(creds.username, "ana");
        assert_eq!(creds.password, "Secr3t!pass");
    }

    #[test]
    fn unknown_user_and_wrong_password_look_the_same() {
        let unknown = validate(&form("nobody", "Secr3t!pass")).unwrap();
        let wrong = validate(&form("ana", "wrong-pass")).unwrap();

        let unknown_err = verify_credentials(&unknown, None).unwrap_err();
        let wrong_err = verify_credentials(&wrong, Some(&*STORED)).unwrap_err();

        assert_eq!(unknown_err, wrong_err);
        assert_eq!(unknown_err.messages(), vec![INVALID_COMBINATION.to_string()]);
    }

    #[test]
    fn valid_pair_yields_identity() {
        let creds = validate(&form("ana", "Secr3t!pass")).unwrap();
        let identity = verify_credentials(&creds, Some(&*STORED)).unwrap();
        assert_eq!(
            identity,
            SessionUser {
                id: 7,
                username: "ana".into(),
                email: "ana@example.com".into(),
            }
        );
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        let mut user = STORED.clone();
        user.password_hash = "plaintext".into();
        let creds = validate(&form("ana", "plaintext")).unwrap();
        assert_eq!(
            verify_credentials(&creds, Some(&user)),
            Err(LoginError::InvalidCombination)
        );
    }
}
