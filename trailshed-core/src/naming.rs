//! Safe identifiers for output collections and table columns.
//!
//! [`NameSanitizer::sanitize`] is pure: every character outside
//! `[A-Za-z0-9_]` becomes an underscore, underscore runs collapse to one,
//! a leading digit gets the [`DIGIT_PREFIX`] and the result is cut to the
//! identifier length limit. [`NameRegistry`] adds per-run uniqueness on top.

use hashbrown::HashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{DEFAULT_MAX_IDENTIFIER_LEN, Error};

/// Prepended to names that would otherwise start with a digit
pub const DIGIT_PREFIX: &str = "n_";
/// Name used when nothing of the input survives sanitizing
pub const EMPTY_NAME: &str = "unnamed";
/// Smallest identifier length limit a sanitizer accepts
pub const MIN_IDENTIFIER_LEN: usize = 8;

/// Sanitizes `raw` with the default identifier length limit.
pub fn sanitize_name(raw: &str) -> String {
    NameSanitizer::default().sanitize(raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameSanitizer {
    max_len: usize,
}

impl Default for NameSanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDENTIFIER_LEN)
    }
}

impl NameSanitizer {
    /// Limits below [`MIN_IDENTIFIER_LEN`] are raised to it.
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(MIN_IDENTIFIER_LEN),
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn sanitize(&self, raw: &str) -> String {
        truncate(&self.sanitize_full(raw), self.max_len).to_string()
    }

    /// Sanitized name before the length limit is applied
    fn sanitize_full(&self, raw: &str) -> String {
        let mut name = String::with_capacity(raw.len());
        for c in raw.chars() {
            let c = if c.is_ascii_alphanumeric() { c } else { '_' };
            if c == '_' && name.ends_with('_') {
                continue;
            }
            name.push(c);
        }

        if name.is_empty() {
            return EMPTY_NAME.to_string();
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            name.insert_str(0, DIGIT_PREFIX);
        }
        name
    }
}

// Sanitized names are ASCII, so byte slicing stays on char boundaries.
fn truncate(name: &str, max_len: usize) -> &str {
    &name[..name.len().min(max_len)]
}

/// What to do when two inputs sanitize to the same full name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Reuse the name; the later output replaces the earlier one
    Overwrite,
    /// Append a numeric suffix to the later name
    #[default]
    Disambiguate,
    /// Fail the run
    Abort,
}

/// How a detected collision was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionResolution {
    Overwritten,
    Renamed(String),
}

/// Two inputs that sanitize to the same name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollision {
    pub raw: String,
    pub name: String,
    pub resolution: CollisionResolution,
}

/// Result of [`NameRegistry::claim`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedName {
    pub name: String,
    pub collision: Option<NameCollision>,
}

/// Hands out run-unique identifiers.
///
/// Truncation collisions (different names cut to the same prefix) are
/// always disambiguated with a `_<n>` suffix. Exact collisions are reported
/// and resolved by the [`CollisionPolicy`].
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    sanitizer: NameSanitizer,
    policy: CollisionPolicy,
    /// issued identifier -> untruncated sanitized name it stands for
    issued: HashMap<String, String>,
    /// untruncated sanitized name -> identifier of its first claim
    claimed: HashMap<String, String>,
}

impl NameRegistry {
    pub fn new(sanitizer: NameSanitizer, policy: CollisionPolicy) -> Self {
        Self {
            sanitizer,
            policy,
            issued: HashMap::new(),
            claimed: HashMap::new(),
        }
    }

    pub fn sanitizer(&self) -> NameSanitizer {
        self.sanitizer
    }

    pub fn is_issued(&self, name: &str) -> bool {
        self.issued.contains_key(name)
    }

    /// Returns the identifier for `raw`.
    ///
    /// # Errors
    ///
    /// `NameCollision` under [`CollisionPolicy::Abort`] when `raw`
    /// sanitizes to a name already claimed by another input.
    pub fn claim(&mut self, raw: &str) -> Result<ClaimedName, Error> {
        let full = self.sanitizer.sanitize_full(raw);

        let Some(name) = self.claimed.get(&full).cloned() else {
            let truncated = truncate(&full, self.sanitizer.max_len).to_string();
            let name = if self.issued.contains_key(&truncated) {
                let unique = self.next_free(&full);
                debug!("Truncated name '{truncated}' already in use, '{raw}' becomes '{unique}'");
                unique
            } else {
                truncated
            };
            self.issued.insert(name.clone(), full.clone());
            self.claimed.insert(full, name.clone());
            return Ok(ClaimedName {
                name,
                collision: None,
            });
        };

        match self.policy {
            CollisionPolicy::Abort => Err(Error::NameCollision {
                raw: raw.to_string(),
                name,
            }),
            CollisionPolicy::Overwrite => {
                warn!("'{raw}' sanitizes to '{name}', previous output will be overwritten");
                Ok(ClaimedName {
                    collision: Some(NameCollision {
                        raw: raw.to_string(),
                        name: name.clone(),
                        resolution: CollisionResolution::Overwritten,
                    }),
                    name,
                })
            }
            CollisionPolicy::Disambiguate => {
                let unique = self.next_free(&full);
                warn!("'{raw}' sanitizes to '{name}', which is taken; using '{unique}'");
                self.issued.insert(unique.clone(), full);
                Ok(ClaimedName {
                    name: unique.clone(),
                    collision: Some(NameCollision {
                        raw: raw.to_string(),
                        name,
                        resolution: CollisionResolution::Renamed(unique),
                    }),
                })
            }
        }
    }

    /// First `<base>_<n>` (n >= 2) within the length limit that is unused
    fn next_free(&self, full: &str) -> String {
        (2..)
            .map(|n| {
                let suffix = format!("_{n}");
                let room = self.sanitizer.max_len.saturating_sub(suffix.len());
                let base = truncate(full, room).trim_end_matches('_');
                format!("{base}{suffix}")
            })
            .find(|candidate| !self.issued.contains_key(candidate))
            .unwrap_or_default()
    }
}
