use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Hostnames the user has enabled form saving for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleSiteSet(BTreeSet<String>);

impl EligibleSiteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, hostname: &str) -> bool {
        self.0.contains(hostname)
    }

    pub fn insert(&mut self, hostname: &str) -> bool {
        self.0.insert(hostname.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for EligibleSiteSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        EligibleSiteSet(iter.into_iter().map(|s| s.as_ref().to_string()).collect())
    }
}

pub fn is_eligible(hostname: &str, sites: &EligibleSiteSet) -> bool {
    sites.contains(hostname)
}
