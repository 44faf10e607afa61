use crate::domain::application::{ApplicationId, ApplicationRecord};
use crate::domain::payment::SubmissionKey;
use crate::domain::ports::{ApplicationReader, ApplicationWriter, ScholarshipCatalog};
use crate::domain::scholarship::{ScholarshipId, ScholarshipOffer};
use crate::domain::session::BearerToken;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

/// A thread-safe in-memory application store.
///
/// Clones share the same records, so one handle can be given to the checkout as
/// its writer while another is kept for reading back. Writes can be switched to
/// fail to exercise the partial-failure paths.
#[derive(Default, Clone)]
pub struct InMemoryApplicationStore {
    records: Arc<RwLock<HashMap<ApplicationId, ApplicationRecord>>>,
    next_id: Arc<AtomicU64>,
    write_attempts: Arc<AtomicU64>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Every `create` call, including the ones that failed.
    pub fn write_attempts(&self) -> u64 {
        self.write_attempts.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn all(&self) -> Vec<(ApplicationId, ApplicationRecord)> {
        let records = self.records.read().await;
        let mut all: Vec<_> = records
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect();
        all.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        all
    }
}

#[async_trait]
impl ApplicationWriter for InMemoryApplicationStore {
    async fn create(
        &self,
        application: &ApplicationRecord,
        _credential: &BearerToken,
        _key: &SubmissionKey,
    ) -> Result<ApplicationId> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CheckoutError::ApiError {
                status: 503,
                message: "application store unavailable".to_string(),
            });
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = ApplicationId::new(format!("app-{n:06}"));
        let stored = ApplicationRecord {
            id: Some(id.clone()),
            ..application.clone()
        };
        let mut records = self.records.write().await;
        records.insert(id.clone(), stored);
        Ok(id)
    }
}

#[async_trait]
impl ApplicationReader for InMemoryApplicationStore {
    async fn get(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }
}

/// Scholarship offers held in memory, optionally loaded from a JSON array.
#[derive(Default, Clone)]
pub struct InMemoryScholarshipCatalog {
    offers: Arc<RwLock<HashMap<ScholarshipId, ScholarshipOffer>>>,
}

impl InMemoryScholarshipCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts either a single offer object or an array of offers.
    pub fn from_json_reader<R: Read>(source: R) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_reader(source)?;
        let offers: Vec<ScholarshipOffer> = if value.is_array() {
            serde_json::from_value(value)?
        } else {
            vec![serde_json::from_value(value)?]
        };
        let map = offers.into_iter().map(|o| (o.id.clone(), o)).collect();
        Ok(Self {
            offers: Arc::new(RwLock::new(map)),
        })
    }

    pub async fn insert(&self, offer: ScholarshipOffer) {
        let mut offers = self.offers.write().await;
        offers.insert(offer.id.clone(), offer);
    }
}

#[async_trait]
impl ScholarshipCatalog for InMemoryScholarshipCatalog {
    async fn get(&self, id: &ScholarshipId) -> Result<ScholarshipOffer> {
        let offers = self.offers.read().await;
        offers
            .get(id)
            .cloned()
            .ok_or_else(|| CheckoutError::NotFoundError(format!("scholarship {id}")))
    }
}
