use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::users::repo::{StoreError, UserStore};
use crate::users::repo_types::{NewUser, User, UserPatch};

#[derive(Default)]
struct Inner {
    by_id: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
}

/// Dictionary-backed store. Lost on restart.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted(mut users: Vec<User>) -> Vec<User> {
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    users
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_identity(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_email
            .get(email)
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(sorted(inner.by_id.values().cloned().collect()))
    }

    async fn search_by_name(&self, name: &str) -> Result<Vec<User>, StoreError> {
        let needle = name.to_lowercase();
        let inner = self.inner.read().await;
        Ok(sorted(
            inner
                .by_id
                .values()
                .filter(|u| u.name.to_lowercase() == needle)
                .cloned()
                .collect(),
        ))
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_email.contains_key(&new.email) {
            return Err(StoreError::Conflict);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            role: new.role,
            website: new.website,
            age: new.age,
            photo: new.photo,
            password_hash: new.password_hash,
            is_active: new.is_active,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.by_email.insert(user.email.clone(), user.id);
        inner.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(current) = inner.by_id.get(&id) else {
            return Err(StoreError::NotFound);
        };
        let old_email = current.email.clone();
        if let Some(email) = patch.email.as_deref() {
            if email != old_email && inner.by_email.contains_key(email) {
                return Err(StoreError::Conflict);
            }
        }

        let mut updated = current.clone();
        patch.apply(&mut updated);
        if updated.email != old_email {
            inner.by_email.remove(&old_email);
            inner.by_email.insert(updated.email.clone(), id);
        }
        inner.by_id.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner.by_id.remove(&id).ok_or(StoreError::NotFound)?;
        inner.by_email.remove(&user.email);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.into(),
            email: email.into(),
            role: "user".into(),
            website: None,
            age: None,
            photo: None,
            password_hash: "$argon2id$placeholder".into(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn create_then_find_by_identity_and_id() {
        let store = MemoryUserStore::new();
        let created = store
            .create(new_user("Queens", "queens@example.com"))
            .await
            .expect("create");

        let by_email = store
            .find_by_identity("queens@example.com")
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(by_email.id, created.id);

        let by_id = store.find_by_id(created.id).await.expect("lookup");
        assert_eq!(by_id.map(|u| u.email), Some("queens@example.com".to_string()));
        assert!(store.find_by_identity("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_identity_conflicts() {
        let store = MemoryUserStore::new();
        store.create(new_user("A", "a@example.com")).await.expect("first");
        let err = store.create(new_user("B", "a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    async fn update_moves_email_index() {
        let store = MemoryUserStore::new();
        let u = store.create(new_user("A", "a@example.com")).await.unwrap();
        store.create(new_user("B", "b@example.com")).await.unwrap();

        let clash = UserPatch {
            email: Some("b@example.com".into()),
            ..Default::default()
        };
        assert!(matches!(store.update(u.id, clash).await, Err(StoreError::Conflict)));

        let patch = UserPatch {
            email: Some("c@example.com".into()),
            age: Some(30),
            ..Default::default()
        };
        let updated = store.update(u.id, patch).await.expect("update");
        assert_eq!(updated.email, "c@example.com");
        assert_eq!(updated.age, Some(30));
        assert_eq!(updated.name, "A");
        assert!(store.find_by_identity("a@example.com").await.unwrap().is_none());
        assert!(store.find_by_identity("c@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_and_delete_unknown_id_is_not_found() {
        let store = MemoryUserStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.update(id, UserPatch::default()).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(store.delete(id).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn delete_frees_identity() {
        let store = MemoryUserStore::new();
        let u = store.create(new_user("A", "a@example.com")).await.unwrap();
        let removed = store.delete(u.id).await.expect("delete");
        assert_eq!(removed.id, u.id);
        assert!(store.list().await.unwrap().is_empty());
        store
            .create(new_user("A again", "a@example.com"))
            .await
            .expect("identity reusable after delete");
    }

    #[tokio::test]
    async fn search_is_case_insensitive_exact_match() {
        let store = MemoryUserStore::new();
        store.create(new_user("Nafsan", "n@example.com")).await.unwrap();
        store.create(new_user("Kings", "k@example.com")).await.unwrap();

        let hits = store.search_by_name("nafSAN").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].email, "n@example.com");
        assert!(store.search_by_name("Naf").await.unwrap().is_empty());
    }
}
