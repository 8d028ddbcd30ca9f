use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use itembox_auth::{ActiveUserLookup, LookupError};
use itembox_core::{Item, ItemId, NewItem, NewUser, Page, User, UserId, select_replacement_owner};

use super::r#trait::{Store, StoreError, StoreTx};

#[derive(Debug, Clone)]
struct UserRow {
    user: User,
    // Mirrors the `users.hashed_password` column; no endpoint reads it back.
    #[allow(dead_code)]
    hashed_password: String,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, UserRow>,
    items: BTreeMap<ItemId, Item>,
    last_user_id: i64,
    last_item_id: i64,
}

impl Tables {
    fn active_user(&self, user_id: UserId) -> Option<User> {
        self.users
            .get(&user_id)
            .map(|row| &row.user)
            .filter(|u| u.is_active)
            .cloned()
    }
}

/// In-memory user/item store.
///
/// Intended for tests/dev. A transaction holds the table lock for its whole
/// lifetime and mutates a private copy, so readers only ever see committed state.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActiveUserLookup for InMemoryStore {
    async fn find_active_user(&self, user_id: UserId) -> Result<Option<User>, LookupError> {
        Ok(self.tables.lock().await.active_user(user_id))
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.lock().await;

        if tables.users.values().any(|row| row.user.email == new_user.email) {
            return Err(StoreError::Conflict(format!(
                "email '{}' already registered",
                new_user.email
            )));
        }

        tables.last_user_id += 1;
        let user = User {
            id: UserId::new(tables.last_user_id),
            email: new_user.email,
            is_active: true,
        };
        tables.users.insert(
            user.id,
            UserRow {
                user: user.clone(),
                hashed_password: new_user.hashed_password,
            },
        );
        Ok(user)
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&user_id).map(|row| row.user.clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|row| row.user.email == email)
            .map(|row| row.user.clone()))
    }

    async fn list_users(&self, page: Page) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(page.apply(tables.users.values().map(|row| row.user.clone())).collect())
    }

    async fn create_item(&self, owner_id: UserId, new_item: NewItem) -> Result<Item, StoreError> {
        let mut tables = self.tables.lock().await;

        if !tables.users.contains_key(&owner_id) {
            return Err(StoreError::Conflict(format!("owner {owner_id} does not exist")));
        }

        tables.last_item_id += 1;
        let item = Item {
            id: ItemId::new(tables.last_item_id),
            title: new_item.title,
            description: new_item.description,
            owner_id,
        };
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn list_items(&self, page: Page) -> Result<Vec<Item>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(page.apply(tables.items.values().cloned()).collect())
    }

    async fn list_user_items(&self, owner_id: UserId, page: Page) -> Result<Vec<Item>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(page
            .apply(tables.items.values().filter(|i| i.owner_id == owner_id).cloned())
            .collect())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(InMemoryTx { guard, working }))
    }
}

struct InMemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn active_user(&mut self, user_id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.working.active_user(user_id))
    }

    async fn min_active_user_excluding(&mut self, excluded: UserId) -> Result<Option<User>, StoreError> {
        let users = self.working.users.values().map(|row| &row.user);
        Ok(select_replacement_owner(users, excluded).and_then(|id| self.working.active_user(id)))
    }

    async fn reassign_items(&mut self, from: UserId, to: UserId) -> Result<u64, StoreError> {
        if !self.working.users.contains_key(&to) {
            return Err(StoreError::Conflict(format!("owner {to} does not exist")));
        }

        let mut moved = 0;
        for item in self.working.items.values_mut().filter(|i| i.owner_id == from) {
            item.owner_id = to;
            moved += 1;
        }
        Ok(moved)
    }

    async fn set_active(&mut self, user_id: UserId, is_active: bool) -> Result<(), StoreError> {
        let row = self
            .working
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::Conflict(format!("user {user_id} does not exist")))?;
        row.user.is_active = is_active;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn seed_user(store: &InMemoryStore, email: &str) -> User {
        store.create_user(NewUser::new(email, "pw").unwrap()).await.unwrap()
    }

    fn item(title: &str) -> NewItem {
        NewItem {
            title: title.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_monotonically() {
        let store = InMemoryStore::new();
        let a = seed_user(&store, "a@example.com").await;
        let b = seed_user(&store, "b@example.com").await;
        assert_eq!(a.id, UserId::new(1));
        assert_eq!(b.id, UserId::new(2));
        assert!(a.is_active && b.is_active);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryStore::new();
        seed_user(&store, "a@example.com").await;
        let err = store
            .create_user(NewUser::new("a@example.com", "pw").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn user_items_are_filtered_and_paged() {
        let store = InMemoryStore::new();
        let a = seed_user(&store, "a@example.com").await;
        let b = seed_user(&store, "b@example.com").await;
        for title in ["Item 1", "Item 2", "Item 3", "Item 4"] {
            store.create_item(a.id, item(title)).await.unwrap();
        }
        store.create_item(b.id, item("Other")).await.unwrap();

        let all = store.list_user_items(a.id, Page::default()).await.unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|i| i.owner_id == a.id));

        let window = store.list_user_items(a.id, Page::new(1, 2)).await.unwrap();
        let titles: Vec<_> = window.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Item 2", "Item 3"]);

        assert_eq!(store.list_items(Page::default()).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn item_for_unknown_owner_conflicts() {
        let store = InMemoryStore::new();
        let err = store.create_item(UserId::new(5), item("x")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn uncommitted_changes_are_discarded() {
        let store = InMemoryStore::new();
        let a = seed_user(&store, "a@example.com").await;

        let mut tx = store.begin().await.unwrap();
        tx.set_active(a.id, false).await.unwrap();
        drop(tx);
        assert!(store.get_user(a.id).await.unwrap().unwrap().is_active);

        let mut tx = store.begin().await.unwrap();
        tx.set_active(a.id, false).await.unwrap();
        tx.rollback().await.unwrap();
        assert!(store.get_user(a.id).await.unwrap().unwrap().is_active);

        let mut tx = store.begin().await.unwrap();
        tx.set_active(a.id, false).await.unwrap();
        tx.commit().await.unwrap();
        assert!(!store.get_user(a.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn readers_wait_for_open_transactions() {
        let store = InMemoryStore::new();
        let a = seed_user(&store, "a@example.com").await;

        let mut tx = store.begin().await.unwrap();
        tx.set_active(a.id, false).await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), store.get_user(a.id)).await;
        assert!(blocked.is_err(), "read must not observe an open transaction");

        tx.commit().await.unwrap();
        assert!(!store.get_user(a.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn find_active_user_hides_inactive_users() {
        let store = InMemoryStore::new();
        let a = seed_user(&store, "a@example.com").await;
        assert!(store.find_active_user(a.id).await.unwrap().is_some());

        let mut tx = store.begin().await.unwrap();
        tx.set_active(a.id, false).await.unwrap();
        tx.commit().await.unwrap();

        assert!(store.find_active_user(a.id).await.unwrap().is_none());
        assert!(store.find_active_user(UserId::new(99)).await.unwrap().is_none());
    }
}
