//! Option modifiers for [`UserPool::apply_user`](super::UserPool::apply_user).
//!
//! Modifiers are applied in order to an owned [`ApplyOptions`] value; a
//! modifier that conflicts with a field already set fails the whole fold,
//! before any directory call is made.

use crate::error::{Result, UserPoolError};

/// A single field-setter for [`ApplyOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOption {
    /// Set this password instead of the record's own
    Password(String),
    /// Generate a password that satisfies the pool's password policy
    RandomPassword,
    /// Mark the password permanent instead of temporary
    PermanentPassword,
    /// Ask the directory to send a password reset code
    SendPasswordResetCode,
}

impl ApplyOption {
    fn apply(&self, options: &mut ApplyOptions) -> Result<()> {
        match self {
            Self::Password(password) => {
                if options.random_password {
                    return Err(conflict());
                }
                options.password = password.clone();
            }
            Self::RandomPassword => {
                if !options.password.is_empty() {
                    return Err(conflict());
                }
                options.random_password = true;
            }
            Self::PermanentPassword => options.permanent_password = true,
            Self::SendPasswordResetCode => options.send_password_reset_code = true,
        }
        Ok(())
    }

    /// Modifiers for the `apply-users` command-line flags.
    pub fn from_flags(
        password: Option<&str>,
        random_password: bool,
        permanent_password: bool,
        send_password_reset_code: bool,
    ) -> Vec<Self> {
        let mut modifiers = Vec::new();
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            modifiers.push(Self::Password(password.to_string()));
        }
        if random_password {
            modifiers.push(Self::RandomPassword);
        }
        if permanent_password {
            modifiers.push(Self::PermanentPassword);
        }
        if send_password_reset_code {
            modifiers.push(Self::SendPasswordResetCode);
        }
        modifiers
    }
}

fn conflict() -> UserPoolError {
    UserPoolError::Validation("cannot specify password with random password".to_string())
}

/// Effective options for one reconciliation.
///
/// An empty `password` means no explicit password was given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    pub password: String,
    pub random_password: bool,
    pub permanent_password: bool,
    pub send_password_reset_code: bool,
}

impl ApplyOptions {
    /// Fold `modifiers` in order onto default options.
    pub fn resolve(modifiers: &[ApplyOption]) -> Result<Self> {
        let mut options = Self::default();
        for modifier in modifiers {
            modifier.apply(&mut options)?;
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_sets_every_field() {
        let options = ApplyOptions::resolve(&[
            ApplyOption::Password("Secret1!".into()),
            ApplyOption::PermanentPassword,
            ApplyOption::SendPasswordResetCode,
        ])
        .unwrap();

        assert_eq!(options.password, "Secret1!");
        assert!(!options.random_password);
        assert!(options.permanent_password);
        assert!(options.send_password_reset_code);
    }

    #[test]
    fn test_password_and_random_conflict_in_either_order() {
        let err = ApplyOptions::resolve(&[
            ApplyOption::Password("Secret1!".into()),
            ApplyOption::RandomPassword,
        ])
        .unwrap_err();
        assert!(matches!(err, UserPoolError::Validation(_)));

        let err = ApplyOptions::resolve(&[
            ApplyOption::RandomPassword,
            ApplyOption::Password("Secret1!".into()),
        ])
        .unwrap_err();
        assert!(matches!(err, UserPoolError::Validation(_)));
    }

    #[test]
    fn test_from_flags_ignores_empty_password() {
        let modifiers = ApplyOption::from_flags(Some(""), true, false, false);
        assert_eq!(modifiers, vec![ApplyOption::RandomPassword]);
        assert!(ApplyOptions::resolve(&modifiers).is_ok());
    }
}
