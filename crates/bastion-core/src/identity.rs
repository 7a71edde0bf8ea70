//! Principals and subjects
//!
//! A [`Subject`] is passed explicitly through every call; there is no ambient
//! or thread-bound security context.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name-bearing token of an authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Principal {
    name: String,
}

impl Principal {
    /// Create a principal
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Principal name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Authenticated entity: principals plus opaque credentials
///
/// The first principal added is the caller principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    principals: Vec<Principal>,
    #[serde(default)]
    credentials: BTreeMap<String, String>,
}

impl Subject {
    /// Subject with a single caller principal
    pub fn new(caller: Principal) -> Self {
        Self {
            principals: vec![caller],
            credentials: BTreeMap::new(),
        }
    }

    /// Subject with no principals (unauthenticated)
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Add a principal, ignoring duplicates
    pub fn with_principal(mut self, principal: Principal) -> Self {
        if !self.principals.contains(&principal) {
            self.principals.push(principal);
        }
        self
    }

    /// Attach a named credential
    pub fn with_credential(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.credentials.insert(name.into(), value.into());
        self
    }

    /// The caller principal, if the subject is authenticated
    pub fn caller(&self) -> Option<&Principal> {
        self.principals.first()
    }

    /// All principals in insertion order
    pub fn principals(&self) -> &[Principal] {
        &self.principals
    }

    /// Whether a principal with this name is present
    pub fn has_principal(&self, name: &str) -> bool {
        self.principals.iter().any(|p| p.name() == name)
    }

    /// Look up a credential
    pub fn credential(&self, name: &str) -> Option<&str> {
        self.credentials.get(name).map(String::as_str)
    }

    /// Whether the subject carries no principals
    pub fn is_anonymous(&self) -> bool {
        self.principals.is_empty()
    }

    /// Replace the caller principal, keeping the remaining principals
    pub fn replace_caller(&mut self, caller: Principal) {
        if self.principals.first() == Some(&caller) {
            return;
        }
        self.principals.retain(|p| p != &caller);
        match self.principals.first_mut() {
            Some(first) => *first = caller,
            None => self.principals.push(caller),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_is_first_principal() {
        let subject = Subject::new(Principal::new("alice")).with_principal(Principal::new("ops"));
        assert_eq!(subject.caller().map(Principal::name), Some("alice"));
        assert!(subject.has_principal("ops"));
        assert!(!subject.is_anonymous());
        assert!(Subject::anonymous().caller().is_none());
    }

    #[test]
    fn replace_caller_keeps_other_principals() {
        let mut subject =
            Subject::new(Principal::new("alice")).with_principal(Principal::new("ops"));
        subject.replace_caller(Principal::new("svc-alice"));
        assert_eq!(subject.caller().map(Principal::name), Some("svc-alice"));
        assert_eq!(subject.principals().len(), 2);
        assert!(!subject.has_principal("alice"));
    }

    #[test]
    fn replacing_caller_with_itself_is_a_no_op() {
        let mut subject =
            Subject::new(Principal::new("alice")).with_principal(Principal::new("group:hr"));
        let before = subject.clone();
        subject.replace_caller(Principal::new("alice"));
        assert_eq!(subject, before);
    }

    #[test]
    fn promoting_another_principal_does_not_duplicate_it() {
        let mut subject = Subject::new(Principal::new("alice"))
            .with_principal(Principal::new("ops"))
            .with_principal(Principal::new("group:hr"));
        subject.replace_caller(Principal::new("group:hr"));
        let names: Vec<&str> = subject.principals().iter().map(Principal::name).collect();
        assert_eq!(names, vec!["group:hr", "ops"]);
    }

    #[test]
    fn credentials_are_opaque() {
        let subject = Subject::new(Principal::new("alice")).with_credential("token", "abc");
        assert_eq!(subject.credential("token"), Some("abc"));
        assert_eq!(subject.credential("password"), None);
    }
}
