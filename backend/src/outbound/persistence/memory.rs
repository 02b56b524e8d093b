//! In-process document store adapters.
//!
//! One map per collection and no coordination across collections, matching
//! the consistency model of the production document store: each call commits
//! a single document, and nothing spans the two writes of a cross-aggregate
//! mutation. `BTreeMap` keeps iteration deterministic, so the open-classes
//! read is stable within one pass.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{
    ClassRepository, ClassRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{Class, ClassId, User, UserId, Username};

/// User collection keyed by surrogate id with a username unique index.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    documents: RwLock<BTreeMap<UserId, User>>,
}

impl MemoryUserRepository {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }
}

fn username_taken(
    documents: &BTreeMap<UserId, User>,
    username: &Username,
    except: &UserId,
) -> bool {
    documents
        .values()
        .any(|existing| existing.username() == username && existing.id() != except)
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserRepositoryError> {
        Ok(self
            .documents
            .read()
            .await
            .values()
            .find(|user| user.username() == username)
            .cloned())
    }

    async fn save(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(user.id()) {
            return Err(UserRepositoryError::query(format!(
                "user {} already exists",
                user.id()
            )));
        }
        if username_taken(&documents, user.username(), user.id()) {
            return Err(UserRepositoryError::conflict(format!(
                "username {} is already taken",
                user.username()
            )));
        }
        documents.insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<bool, UserRepositoryError> {
        let mut documents = self.documents.write().await;
        if !documents.contains_key(user.id()) {
            return Ok(false);
        }
        if username_taken(&documents, user.username(), user.id()) {
            return Err(UserRepositoryError::conflict(format!(
                "username {} is already taken",
                user.username()
            )));
        }
        documents.insert(user.id().clone(), user.clone());
        Ok(true)
    }
}

/// Class collection keyed by id.
#[derive(Debug, Default)]
pub struct MemoryClassRepository {
    documents: RwLock<BTreeMap<ClassId, Class>>,
}

impl MemoryClassRepository {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClassRepository for MemoryClassRepository {
    async fn find_by_id(&self, id: &ClassId) -> Result<Option<Class>, ClassRepositoryError> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn find_all_open(&self) -> Result<Vec<Class>, ClassRepositoryError> {
        Ok(self
            .documents
            .read()
            .await
            .values()
            .filter(|class| class.open())
            .cloned()
            .collect())
    }

    async fn save(&self, class: &Class) -> Result<(), ClassRepositoryError> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(class.id()) {
            return Err(ClassRepositoryError::query(format!(
                "class {} already exists",
                class.id()
            )));
        }
        documents.insert(class.id().clone(), class.clone());
        Ok(())
    }

    async fn update(&self, class: &Class) -> Result<bool, ClassRepositoryError> {
        let mut documents = self.documents.write().await;
        if !documents.contains_key(class.id()) {
            return Ok(false);
        }
        documents.insert(class.id().clone(), class.clone());
        Ok(true)
    }

    async fn delete_by_id(&self, id: &ClassId) -> Result<bool, ClassRepositoryError> {
        Ok(self.documents.write().await.remove(id).is_some())
    }
}
