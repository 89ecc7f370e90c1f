use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::page::eligibility::EligibleSiteSet;
use crate::page::page_id::PageIdentifier;
use crate::snapshot::snapshot_model::PageSnapshot;
use crate::store::error::StoreError;
use crate::store::store::KeyValueStore;

pub const PROTECTED_SITES_KEY: &str = "protectedSites";
pub const FORM_DATA_KEY: &str = "formData";

/// Saved snapshots keyed by page.
pub type FormData = BTreeMap<PageIdentifier, PageSnapshot>;

/// Counts shown by the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub sites: usize,
    /// Saved pages whose identifier mentions one of the protected sites
    pub forms: usize,
}

/// Typed view over the two top-level records in a `KeyValueStore`.
///
/// Missing records read as empty. Updates are read-modify-write with no
/// locking; concurrent writers race and the last one wins.
pub struct StoreAdapter<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> Clone for StoreAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KeyValueStore> StoreAdapter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    async fn read<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, StoreError> {
        let mut values = self.store.get(&[key]).await?;
        match values.remove(key) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(v) => serde_json::from_value(v).map_err(|e| StoreError::Json {
                context: format!("decoding '{key}'"),
                source: e,
            }),
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|e| StoreError::Json {
            context: format!("encoding '{key}'"),
            source: e,
        })?;
        let mut items = Map::new();
        items.insert(key.to_string(), value);
        self.store.set(items).await
    }

    /// Write empty records for any that are missing. Returns whether
    /// anything was written.
    pub async fn initialize(&self) -> Result<bool, StoreError> {
        let existing = self.store.get(&[PROTECTED_SITES_KEY, FORM_DATA_KEY]).await?;
        let mut items = Map::new();
        if !existing.contains_key(PROTECTED_SITES_KEY) {
            items.insert(PROTECTED_SITES_KEY.into(), Value::Array(vec![]));
        }
        if !existing.contains_key(FORM_DATA_KEY) {
            items.insert(FORM_DATA_KEY.into(), Value::Object(Map::new()));
        }
        if items.is_empty() {
            return Ok(false);
        }
        self.store.set(items).await?;
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // protectedSites
    // ------------------------------------------------------------------------

    pub async fn protected_sites(&self) -> Result<Vec<String>, StoreError> {
        self.read(PROTECTED_SITES_KEY).await
    }

    pub async fn eligible_sites(&self) -> Result<EligibleSiteSet, StoreError> {
        Ok(self.protected_sites().await?.into_iter().collect())
    }

    pub async fn set_protected_sites(&self, sites: &[String]) -> Result<(), StoreError> {
        self.write(PROTECTED_SITES_KEY, &sites).await
    }

    /// Returns `false` when the site was already present.
    pub async fn add_site(&self, host: &str) -> Result<bool, StoreError> {
        let mut sites = self.protected_sites().await?;
        if sites.iter().any(|s| s == host) {
            return Ok(false);
        }
        sites.push(host.to_string());
        self.set_protected_sites(&sites).await?;
        Ok(true)
    }

    /// Returns `false` when the site was not present.
    pub async fn remove_site(&self, host: &str) -> Result<bool, StoreError> {
        let mut sites = self.protected_sites().await?;
        let before = sites.len();
        sites.retain(|s| s != host);
        if sites.len() == before {
            return Ok(false);
        }
        self.set_protected_sites(&sites).await?;
        Ok(true)
    }

    /// Flip protection for `host`; returns whether it is now enabled.
    pub async fn toggle_site(&self, host: &str) -> Result<bool, StoreError> {
        if self.remove_site(host).await? {
            return Ok(false);
        }
        self.add_site(host).await?;
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // formData
    // ------------------------------------------------------------------------

    pub async fn form_data(&self) -> Result<FormData, StoreError> {
        self.read(FORM_DATA_KEY).await
    }

    pub async fn page_snapshot(
        &self,
        page: &PageIdentifier,
    ) -> Result<Option<PageSnapshot>, StoreError> {
        Ok(self.form_data().await?.remove(page))
    }

    pub async fn save_page(
        &self,
        page: &PageIdentifier,
        snapshot: PageSnapshot,
    ) -> Result<(), StoreError> {
        let mut data = self.form_data().await?;
        data.insert(page.clone(), snapshot);
        self.write(FORM_DATA_KEY, &data).await
    }

    /// Drop every saved page whose identifier contains `host`. Returns the
    /// number of pages removed.
    pub async fn clear_site_data(&self, host: &str) -> Result<usize, StoreError> {
        let mut data = self.form_data().await?;
        let before = data.len();
        data.retain(|page, _| !page.as_str().contains(host));
        let removed = before - data.len();
        if removed > 0 {
            self.write(FORM_DATA_KEY, &data).await?;
        }
        Ok(removed)
    }

    /// Wipe sites and saved data alike.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        self.store.clear().await
    }

    pub async fn stats(&self) -> Result<StoreStats, StoreError> {
        let sites = self.protected_sites().await?;
        let data = self.form_data().await?;
        let forms = data
            .keys()
            .filter(|page| sites.iter().any(|s| page.as_str().contains(s.as_str())))
            .count();
        Ok(StoreStats {
            sites: sites.len(),
            forms,
        })
    }
}
