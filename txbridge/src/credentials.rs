// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Connection credentials
//!
//! Credentials travel to the coordinator as a property set. The lookup layer
//! needs a value even when the caller supplied nothing, so the absence of
//! credentials is the empty set rather than `None`.

use std::collections::BTreeMap;
use std::fmt;

/// Property key carrying the user name
pub const USER_KEY: &str = "user";

/// Property key carrying the password
pub const PASSWORD_KEY: &str = "password";

/// Property set handed to the coordinator's enlistment-aware connect
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    properties: BTreeMap<String, String>,
}

impl Credentials {
    /// The empty credential set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Credentials for a user/password pair
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(USER_KEY.to_string(), user.into());
        properties.insert(PASSWORD_KEY.to_string(), password.into());
        Self { properties }
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn user(&self) -> Option<&str> {
        self.get(USER_KEY)
    }

    pub fn password(&self) -> Option<&str> {
        self.get(PASSWORD_KEY)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Add an arbitrary driver property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.properties {
            if key == PASSWORD_KEY {
                map.entry(key, &"<redacted>");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_credentials() {
        let creds = Credentials::empty();
        assert!(creds.is_empty());
        assert_eq!(creds.user(), None);
        assert_eq!(creds.password(), None);
    }

    #[test]
    fn test_user_password() {
        let creds = Credentials::new("scott", "tiger");
        assert_eq!(creds.user(), Some("scott"));
        assert_eq!(creds.password(), Some("tiger"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("scott", "tiger"));
        assert!(rendered.contains("scott"));
        assert!(!rendered.contains("tiger"));
    }
}
