// In-process stand-in for the product API, backed by the server's own repository.

use crate::modules::offline_sync::core::ports::{ProductRemote, RemoteError};
use crate::modules::products::adapters::outbound::product_repository::ProductRepository;
use crate::modules::products::adapters::outbound::product_repository_in_memory::InMemoryProductRepository;
use crate::modules::products::core::listing::ListQuery;
use crate::modules::products::core::product::{Product, ProductDraft};
use crate::modules::products::use_cases::list_products::queries_port::ProductQueries;
use async_trait::async_trait;
use chrono::Local;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct InProcessProductRemote {
    pub repository: Arc<InMemoryProductRepository>,
    online: AtomicBool,
    delay_ms: AtomicU64,
    mutations: AtomicUsize,
    rejection: Mutex<Option<Vec<String>>>,
}

impl Default for InProcessProductRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl InProcessProductRemote {
    pub fn new() -> Self {
        Self {
            repository: Arc::new(InMemoryProductRepository::new()),
            online: AtomicBool::new(true),
            delay_ms: AtomicU64::new(0),
            mutations: AtomicUsize::new(0),
            rejection: Mutex::new(None),
        }
    }

    pub fn go_offline(&self) {
        self.online.store(false, Ordering::SeqCst);
    }

    pub fn go_online(&self) {
        self.online.store(true, Ordering::SeqCst);
    }

    /// Every call sleeps this long before it touches the repository.
    pub fn set_delay_ms(&self, ms: u64) {
        self.delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Makes create and update answer 400 with these messages.
    pub fn reject_writes_with(&self, errors: Option<Vec<&str>>) {
        *self.rejection.lock().unwrap() =
            errors.map(|errors| errors.into_iter().map(str::to_string).collect());
    }

    /// Create, update and delete calls that reached the repository.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub async fn stored(&self) -> Vec<Product> {
        self.repository
            .list(&ListQuery::default(), Local::now().date_naive())
            .await
            .unwrap()
    }

    async fn reach(&self) -> Result<(), RemoteError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if !self.online.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    fn rejected(&self) -> Result<(), RemoteError> {
        match self.rejection.lock().unwrap().clone() {
            Some(errors) => Err(RemoteError::Validation(errors)),
            None => Ok(()),
        }
    }
}

fn server_failure(error: anyhow::Error) -> RemoteError {
    RemoteError::Transport(format!("unexpected status 500 Internal Server Error: {error}"))
}

#[async_trait]
impl ProductRemote for InProcessProductRemote {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Product>, RemoteError> {
        self.reach().await?;
        self.repository
            .list(query, Local::now().date_naive())
            .await
            .map_err(server_failure)
    }

    async fn get(&self, id: i64) -> Result<Product, RemoteError> {
        self.reach().await?;
        self.repository
            .get(id)
            .await
            .map_err(server_failure)?
            .ok_or(RemoteError::NotFound(id))
    }

    async fn create(&self, draft: &ProductDraft) -> Result<Product, RemoteError> {
        self.reach().await?;
        self.rejected()?;
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.repository
            .insert(draft.clone())
            .await
            .map_err(server_failure)
    }

    async fn update(&self, id: i64, draft: &ProductDraft) -> Result<(), RemoteError> {
        self.reach().await?;
        self.rejected()?;
        self.mutations.fetch_add(1, Ordering::SeqCst);
        match self
            .repository
            .update(id, draft.clone())
            .await
            .map_err(server_failure)?
        {
            Some(_) => Ok(()),
            None => Err(RemoteError::NotFound(id)),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        self.reach().await?;
        self.mutations.fetch_add(1, Ordering::SeqCst);
        if self.repository.delete(id).await.map_err(server_failure)? {
            Ok(())
        } else {
            Err(RemoteError::NotFound(id))
        }
    }

    async fn probe(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
