//! In-memory storage backend
//!
//! Implements every storage trait over a single mutex-guarded state, so the
//! same ownership rules hold as with PostgreSQL. Used when no database is
//! configured, and by the test suite.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::core::db::models::{
    CreateTodoItem, CreateTodoList, CreateUser, RefreshSession, TodoItem, TodoList,
    UpdateTodoItem, UpdateTodoList, User,
};
use crate::core::db::repositories::{
    CredentialStore, ItemStore, ListStore, SessionRepositoryError, SessionStore,
    TodoRepositoryError, UserRepositoryError, hash_token,
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    /// Keyed by user id: one session per user
    sessions: HashMap<Uuid, RefreshSession>,
    lists: HashMap<Uuid, TodoList>,
    /// list id -> owning user id
    users_lists: HashMap<Uuid, Uuid>,
    items: HashMap<Uuid, TodoItem>,
    /// item id -> owning list id
    lists_items: HashMap<Uuid, Uuid>,
}

impl MemoryState {
    fn owns_list(&self, user_id: Uuid, list_id: Uuid) -> bool {
        self.users_lists.get(&list_id) == Some(&user_id)
    }

    fn owns_item(&self, user_id: Uuid, item_id: Uuid) -> bool {
        self.lists_items
            .get(&item_id)
            .is_some_and(|list_id| self.owns_list(user_id, *list_id))
    }
}

/// Shared in-memory store; clones point at the same state
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live refresh sessions for `user_id` (0 or 1)
    pub async fn session_count(&self, user_id: Uuid) -> usize {
        let state = self.state.lock().await;
        usize::from(state.sessions.contains_key(&user_id))
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create_user(&self, user: &CreateUser) -> Result<Uuid, UserRepositoryError> {
        let mut state = self.state.lock().await;

        if state.users.values().any(|u| u.email == user.email) {
            return Err(UserRepositoryError::EmailAlreadyExists);
        }

        let id = Uuid::new_v4();
        state.users.insert(
            id,
            User {
                id,
                name: user.name.clone(),
                email: user.email.clone(),
                password_digest: user.password_digest.clone(),
                registered_at: user.registered_at,
            },
        );

        Ok(id)
    }

    async fn find_user_id_by_credential(
        &self,
        email: &str,
        digest: &str,
    ) -> Result<Uuid, UserRepositoryError> {
        let state = self.state.lock().await;

        state
            .users
            .values()
            .find(|u| u.email == email && u.password_digest == digest)
            .map(|u| u.id)
            .ok_or(UserRepositoryError::InvalidCredentials)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn put_session(&self, session: &RefreshSession) -> Result<(), SessionRepositoryError> {
        let mut state = self.state.lock().await;
        state.sessions.insert(session.user_id, session.clone());
        Ok(())
    }

    async fn redeem_session(&self, token: &str) -> Result<RefreshSession, SessionRepositoryError> {
        let token_hash = hash_token(token);
        let mut state = self.state.lock().await;

        let user_id = state
            .sessions
            .values()
            .find(|s| s.token_hash == token_hash)
            .map(|s| s.user_id)
            .ok_or(SessionRepositoryError::NotFound)?;

        state
            .sessions
            .remove(&user_id)
            .ok_or(SessionRepositoryError::NotFound)
    }
}

#[async_trait]
impl ListStore for MemoryStore {
    async fn create_list(
        &self,
        user_id: Uuid,
        list: &CreateTodoList,
    ) -> Result<Uuid, TodoRepositoryError> {
        let mut state = self.state.lock().await;

        let id = Uuid::new_v4();
        state.lists.insert(
            id,
            TodoList {
                id,
                title: list.title.clone(),
                description: list.description.clone(),
            },
        );
        state.users_lists.insert(id, user_id);

        Ok(id)
    }

    async fn get_all_lists(&self, user_id: Uuid) -> Result<Vec<TodoList>, TodoRepositoryError> {
        let state = self.state.lock().await;

        let mut lists: Vec<TodoList> = state
            .users_lists
            .iter()
            .filter(|(_, owner)| **owner == user_id)
            .filter_map(|(list_id, _)| state.lists.get(list_id).cloned())
            .collect();
        lists.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));

        Ok(lists)
    }

    async fn get_list_by_id(
        &self,
        user_id: Uuid,
        list_id: Uuid,
    ) -> Result<TodoList, TodoRepositoryError> {
        let state = self.state.lock().await;

        if !state.owns_list(user_id, list_id) {
            return Err(TodoRepositoryError::NotFound);
        }

        state
            .lists
            .get(&list_id)
            .cloned()
            .ok_or(TodoRepositoryError::NotFound)
    }

    async fn update_list(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        input: &UpdateTodoList,
    ) -> Result<TodoList, TodoRepositoryError> {
        if input.is_empty() {
            return Err(TodoRepositoryError::EmptyUpdate);
        }

        let mut state = self.state.lock().await;

        if !state.owns_list(user_id, list_id) {
            return Err(TodoRepositoryError::NotFound);
        }

        let list = state
            .lists
            .get_mut(&list_id)
            .ok_or(TodoRepositoryError::NotFound)?;
        if let Some(title) = &input.title {
            list.title = title.clone();
        }
        if let Some(description) = &input.description {
            list.description = Some(description.clone());
        }

        Ok(list.clone())
    }

    async fn delete_list(&self, user_id: Uuid, list_id: Uuid) -> Result<(), TodoRepositoryError> {
        let mut state = self.state.lock().await;

        if !state.owns_list(user_id, list_id) {
            return Err(TodoRepositoryError::NotFound);
        }

        let item_ids: Vec<Uuid> = state
            .lists_items
            .iter()
            .filter(|(_, list)| **list == list_id)
            .map(|(item_id, _)| *item_id)
            .collect();
        for item_id in item_ids {
            state.lists_items.remove(&item_id);
            state.items.remove(&item_id);
        }

        state.users_lists.remove(&list_id);
        state.lists.remove(&list_id);

        Ok(())
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn create_item(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        item: &CreateTodoItem,
    ) -> Result<Uuid, TodoRepositoryError> {
        let mut state = self.state.lock().await;

        if !state.owns_list(user_id, list_id) {
            return Err(TodoRepositoryError::NotFound);
        }

        let id = Uuid::new_v4();
        state.items.insert(
            id,
            TodoItem {
                id,
                title: item.title.clone(),
                description: item.description.clone(),
                done: item.done,
            },
        );
        state.lists_items.insert(id, list_id);

        Ok(id)
    }

    async fn get_all_items(
        &self,
        user_id: Uuid,
        list_id: Uuid,
    ) -> Result<Vec<TodoItem>, TodoRepositoryError> {
        let state = self.state.lock().await;

        if !state.owns_list(user_id, list_id) {
            return Err(TodoRepositoryError::NotFound);
        }

        let mut items: Vec<TodoItem> = state
            .lists_items
            .iter()
            .filter(|(_, list)| **list == list_id)
            .filter_map(|(item_id, _)| state.items.get(item_id).cloned())
            .collect();
        items.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));

        Ok(items)
    }

    async fn get_item_by_id(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<TodoItem, TodoRepositoryError> {
        let state = self.state.lock().await;

        if !state.owns_item(user_id, item_id) {
            return Err(TodoRepositoryError::NotFound);
        }

        state
            .items
            .get(&item_id)
            .cloned()
            .ok_or(TodoRepositoryError::NotFound)
    }

    async fn update_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        input: &UpdateTodoItem,
    ) -> Result<TodoItem, TodoRepositoryError> {
        if input.is_empty() {
            return Err(TodoRepositoryError::EmptyUpdate);
        }

        let mut state = self.state.lock().await;

        if !state.owns_item(user_id, item_id) {
            return Err(TodoRepositoryError::NotFound);
        }

        let item = state
            .items
            .get_mut(&item_id)
            .ok_or(TodoRepositoryError::NotFound)?;
        if let Some(title) = &input.title {
            item.title = title.clone();
        }
        if let Some(description) = &input.description {
            item.description = Some(description.clone());
        }
        if let Some(done) = input.done {
            item.done = done;
        }

        Ok(item.clone())
    }

    async fn delete_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), TodoRepositoryError> {
        let mut state = self.state.lock().await;

        if !state.owns_item(user_id, item_id) {
            return Err(TodoRepositoryError::NotFound);
        }

        state.lists_items.remove(&item_id);
        state.items.remove(&item_id);

        Ok(())
    }
}
