//! Random password generation from a pool's password policy.
//!
//! The generated password is always `minimum_length + 8` characters long,
//! drawn only from the character classes the policy requires, with at least
//! one character of each required class. Visually ambiguous glyphs are never
//! used. Randomness comes from the operating system CSPRNG.

use crate::error::{Result, UserPoolError};
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Extra characters added on top of the policy minimum.
pub const LENGTH_PADDING: usize = 8;

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!#$%&*+-.:=?@^_~";
/// Glyphs that are easily confused with one another when read or typed
pub const AMBIGUOUS: &str = "0O1Il5S";

/// Password policy of a user pool, as returned by `DescribeUserPool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PasswordPolicy {
    #[serde(default = "default_minimum_length")]
    pub minimum_length: usize,
    #[serde(default)]
    pub require_lowercase: bool,
    #[serde(default)]
    pub require_uppercase: bool,
    #[serde(default)]
    pub require_numbers: bool,
    #[serde(default)]
    pub require_symbols: bool,
}

fn default_minimum_length() -> usize {
    8
}

impl Default for PasswordPolicy {
    /// Cognito's default policy: eight characters, every class required.
    fn default() -> Self {
        Self {
            minimum_length: default_minimum_length(),
            require_lowercase: true,
            require_uppercase: true,
            require_numbers: true,
            require_symbols: true,
        }
    }
}

/// What to generate: length, the allowed universe, and the classes that must appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSpec {
    pub length: usize,
    pub required: Vec<Vec<char>>,
    pub universe: Vec<char>,
}

impl GenerationSpec {
    pub fn from_policy(policy: &PasswordPolicy) -> Self {
        let classes = [
            (policy.require_lowercase, LOWERCASE),
            (policy.require_numbers, DIGITS),
            (policy.require_symbols, SYMBOLS),
            (policy.require_uppercase, UPPERCASE),
        ];

        let required: Vec<Vec<char>> = classes
            .iter()
            .filter(|(wanted, _)| *wanted)
            .map(|(_, chars)| chars.chars().filter(|c| !AMBIGUOUS.contains(*c)).collect())
            .collect();
        let universe = required.iter().flatten().copied().collect();

        Self {
            length: policy.minimum_length + LENGTH_PADDING,
            required,
            universe,
        }
    }

    pub fn generate(&self) -> Result<String> {
        if self.universe.is_empty() {
            return Err(UserPoolError::Generation(
                "password policy does not require any character class".to_string(),
            ));
        }
        if self.required.len() > self.length {
            return Err(UserPoolError::Generation(format!(
                "cannot fit {} required character classes into {} characters",
                self.required.len(),
                self.length
            )));
        }

        let mut rng = OsRng;
        let mut password = Vec::with_capacity(self.length);
        for class in &self.required {
            let c = class.choose(&mut rng).ok_or_else(|| {
                UserPoolError::Generation("empty character class".to_string())
            })?;
            password.push(*c);
        }
        while password.len() < self.length {
            if let Some(c) = self.universe.choose(&mut rng) {
                password.push(*c);
            }
        }
        password.shuffle(&mut rng);

        Ok(password.into_iter().collect())
    }
}

/// Generate one password that satisfies `policy`.
pub fn generate_password(policy: &PasswordPolicy) -> Result<String> {
    GenerationSpec::from_policy(policy).generate()
}
