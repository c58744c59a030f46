use crate::error::AppResult;
use crate::models::{Compte, CompteChanges, NewCompte};
use async_trait::async_trait;
use std::sync::Arc;

/// Storage for bank accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// All accounts, ordered by id
    async fn list(&self) -> AppResult<Vec<Compte>>;

    async fn get(&self, id: i64) -> AppResult<Option<Compte>>;

    async fn create(&self, compte: NewCompte) -> AppResult<Compte>;

    /// Returns `None` when no account has this id
    async fn update(&self, id: i64, changes: CompteChanges) -> AppResult<Option<Compte>>;

    /// Returns whether an account was removed
    async fn delete(&self, id: i64) -> AppResult<bool>;

    /// Check that the backend is reachable
    async fn ping(&self) -> AppResult<()>;

    /// Backend name reported by the health endpoint
    fn backend(&self) -> &'static str;
}

pub type SharedStore = Arc<dyn AccountStore>;
