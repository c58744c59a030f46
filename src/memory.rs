//! In-memory account store, used when no database is configured.

use crate::error::AppResult;
use crate::models::{Compte, CompteChanges, NewCompte};
use crate::store::AccountStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug, Default)]
pub struct MemoryStore {
    comptes: DashMap<i64, Compte>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.comptes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comptes.is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Compte>> {
        let mut comptes: Vec<Compte> = self.comptes.iter().map(|e| e.value().clone()).collect();
        comptes.sort_by_key(|c| c.id);
        Ok(comptes)
    }

    async fn get(&self, id: i64) -> AppResult<Option<Compte>> {
        Ok(self.comptes.get(&id).map(|e| e.value().clone()))
    }

    async fn create(&self, compte: NewCompte) -> AppResult<Compte> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let compte = Compte {
            id,
            date_creation: compte.date_creation,
            solde: compte.solde,
            account_type: compte.account_type,
        };
        self.comptes.insert(id, compte.clone());
        Ok(compte)
    }

    async fn update(&self, id: i64, changes: CompteChanges) -> AppResult<Option<Compte>> {
        Ok(self.comptes.get_mut(&id).map(|mut entry| {
            changes.apply_to(entry.value_mut());
            entry.value().clone()
        }))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.comptes.remove(&id).is_some())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountType;
    use chrono::NaiveDate;

    fn new_compte(solde: f64) -> NewCompte {
        NewCompte {
            date_creation: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            solde,
            account_type: AccountType::Courant,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let first = store.create(new_compte(1.0)).await.unwrap();
        let second = store.create(new_compte(2.0)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.create(new_compte(i as f64)).await.unwrap();
        }

        let ids: Vec<i64> = store.list().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::new();
        let created = store.create(new_compte(10.0)).await.unwrap();

        let updated = store
            .update(
                created.id,
                CompteChanges {
                    date_creation: None,
                    solde: Some(25.0),
                    account_type: AccountType::Epargne,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.solde, 25.0);
        assert_eq!(updated.date_creation, created.date_creation);
        assert_eq!(store.get(created.id).await.unwrap(), Some(updated));

        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let store = MemoryStore::new();
        let result = store
            .update(
                42,
                CompteChanges {
                    date_creation: None,
                    solde: None,
                    account_type: AccountType::Courant,
                },
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let store = MemoryStore::new();
        let first = store.create(new_compte(1.0)).await.unwrap();
        store.delete(first.id).await.unwrap();
        let second = store.create(new_compte(2.0)).await.unwrap();
        assert_eq!(second.id, 2);
    }
}
