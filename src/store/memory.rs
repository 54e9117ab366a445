//! In-memory storage implementations

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::Utc;
use uuid::Uuid;

use super::{
    FeedEntry, Joke, JokeId, LoginState, Provider, Session, SessionId, SessionStore, StoreResult,
    User, UserId, UserStore, DEFAULT_SESSION_TTL_DAYS,
};
use crate::error::AppError;

/// In-memory user store
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
    jokes: RwLock<HashMap<UserId, Vec<Joke>>>,
    login_states: RwLock<HashMap<String, LoginState>>,
    next_user_id: AtomicU64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            jokes: RwLock::new(HashMap::new()),
            login_states: RwLock::new(HashMap::new()),
            next_user_id: AtomicU64::new(1),
        }
    }

    /// Number of accounts in the store (for testing purposes)
    pub fn user_count(&self) -> usize {
        self.users.read().unwrap().len()
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryUserStore {
    fn create_local_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let normalized = email.to_lowercase();
        // One write lock across the uniqueness check and the insert
        let mut users = self.users.write().unwrap();
        if users
            .values()
            .any(|u| u.email.as_deref() == Some(normalized.as_str()))
        {
            return Err(AppError::DuplicateEmail);
        }
        let id = UserId(self.next_user_id.fetch_add(1, Ordering::SeqCst));
        let user = User {
            id,
            email: Some(normalized),
            password_hash: Some(password_hash.to_string()),
            google_id: None,
            facebook_id: None,
            created_at: Utc::now(),
        };
        users.insert(id, user.clone());
        Ok(user)
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().unwrap().get(&user_id).cloned())
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let normalized = email.to_lowercase();
        let users = self.users.read().unwrap();
        Ok(users
            .values()
            .find(|u| u.email.as_deref() == Some(normalized.as_str()))
            .cloned())
    }

    fn find_or_create_federated(&self, provider: Provider, subject: &str) -> StoreResult<User> {
        // One write lock across lookup and insert, so first logins racing
        // each other resolve to a single account
        let mut users = self.users.write().unwrap();
        let existing = users
            .values()
            .find(|u| match provider {
                Provider::Google => u.google_id.as_deref() == Some(subject),
                Provider::Facebook => u.facebook_id.as_deref() == Some(subject),
            })
            .cloned();
        if let Some(user) = existing {
            return Ok(user);
        }
        let id = UserId(self.next_user_id.fetch_add(1, Ordering::SeqCst));
        let mut user = User {
            id,
            email: None,
            password_hash: None,
            google_id: None,
            facebook_id: None,
            created_at: Utc::now(),
        };
        match provider {
            Provider::Google => user.google_id = Some(subject.to_string()),
            Provider::Facebook => user.facebook_id = Some(subject.to_string()),
        }
        users.insert(id, user.clone());
        Ok(user)
    }

    fn list_feed(&self) -> StoreResult<Vec<FeedEntry>> {
        let users = self.users.read().unwrap();
        let jokes = self.jokes.read().unwrap();
        let mut ids: Vec<UserId> = users.keys().copied().collect();
        ids.sort_by_key(|id| id.0);
        let mut feed = Vec::new();
        for id in ids {
            let user = match users.get(&id) {
                Some(user) => user,
                None => continue,
            };
            match jokes.get(&id) {
                Some(list) if !list.is_empty() => feed.push(FeedEntry {
                    user: user.clone(),
                    jokes: list.clone(),
                }),
                _ => {}
            }
        }
        Ok(feed)
    }

    fn add_joke(&self, user_id: UserId, text: &str) -> StoreResult<Joke> {
        let joke = Joke {
            id: JokeId(Uuid::new_v4().to_string()),
            text: text.to_string(),
            liked: false,
            flagged: false,
            created_at: Utc::now(),
        };
        self.jokes
            .write()
            .unwrap()
            .entry(user_id)
            .or_default()
            .push(joke.clone());
        Ok(joke)
    }

    fn list_jokes(&self, user_id: UserId) -> StoreResult<Vec<Joke>> {
        Ok(self
            .jokes
            .read()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    fn get_joke(&self, user_id: UserId, joke_id: &JokeId) -> StoreResult<Option<Joke>> {
        let jokes = self.jokes.read().unwrap();
        Ok(jokes
            .get(&user_id)
            .and_then(|list| list.iter().find(|j| &j.id == joke_id))
            .cloned())
    }

    fn update_joke_text(&self, user_id: UserId, joke_id: &JokeId, text: &str) -> StoreResult<()> {
        let mut jokes = self.jokes.write().unwrap();
        if let Some(list) = jokes.get_mut(&user_id) {
            if let Some(joke) = list.iter_mut().find(|j| &j.id == joke_id) {
                joke.text = text.to_string();
                return Ok(());
            }
        }
        Err(AppError::JokeNotFound)
    }

    fn delete_joke(&self, user_id: UserId, joke_id: &JokeId) -> StoreResult<()> {
        let mut jokes = self.jokes.write().unwrap();
        if let Some(list) = jokes.get_mut(&user_id) {
            list.retain(|j| &j.id != joke_id);
        }
        Ok(())
    }

    fn toggle_liked(&self, joke_id: &JokeId) -> StoreResult<()> {
        let mut jokes = self.jokes.write().unwrap();
        for list in jokes.values_mut() {
            if let Some(joke) = list.iter_mut().find(|j| &j.id == joke_id) {
                joke.liked = !joke.liked;
                break;
            }
        }
        Ok(())
    }

    fn toggle_flagged(&self, joke_id: &JokeId) -> StoreResult<()> {
        let mut jokes = self.jokes.write().unwrap();
        for list in jokes.values_mut() {
            if let Some(joke) = list.iter_mut().find(|j| &j.id == joke_id) {
                joke.flagged = !joke.flagged;
                break;
            }
        }
        Ok(())
    }

    fn create_login_state(&self, state: LoginState) -> StoreResult<()> {
        self.login_states
            .write()
            .unwrap()
            .insert(state.token.clone(), state);
        Ok(())
    }

    fn take_login_state(&self, token: &str) -> StoreResult<Option<LoginState>> {
        Ok(self.login_states.write().unwrap().remove(token))
    }

    fn cleanup_expired_login_states(&self, max_age_minutes: i64) -> StoreResult<u64> {
        let cutoff = Utc::now() - chrono::Duration::minutes(max_age_minutes);
        let mut states = self.login_states.write().unwrap();
        let before = states.len();
        states.retain(|_, s| s.created_at > cutoff);
        Ok((before - states.len()) as u64)
    }
}

/// In-memory session store
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    ttl: chrono::Duration,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::with_ttl(chrono::Duration::days(DEFAULT_SESSION_TTL_DAYS))
    }

    pub fn with_ttl(ttl: chrono::Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, user_id: UserId) -> StoreResult<Session> {
        let session = Session {
            id: SessionId(Uuid::new_v4().to_string()),
            user_id,
            created_at: Utc::now(),
        };
        self.sessions
            .write()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        let mut sessions = self.sessions.write().unwrap();
        if let Some(session) = sessions.get(session_id).cloned() {
            if Utc::now() - session.created_at > self.ttl {
                // Expired sessions are dropped on read
                sessions.remove(session_id);
                return Ok(None);
            }
            return Ok(Some(session));
        }
        Ok(None)
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        self.sessions.write().unwrap().remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_create_user_and_lookup() {
        let store = InMemoryUserStore::new();

        let user = store.create_local_user("Test@Example.com", "hash").unwrap();

        let found = store.get_user_by_email("test@example.com").unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().id, user.id);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = InMemoryUserStore::new();

        store.create_local_user("test@example.com", "hash").unwrap();
        let result = store.create_local_user("TEST@example.com", "other");

        assert!(matches!(result, Err(AppError::DuplicateEmail)));
        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn test_find_or_create_federated_is_idempotent() {
        let store = InMemoryUserStore::new();

        let first = store
            .find_or_create_federated(Provider::Google, "sub-1")
            .unwrap();
        let second = store
            .find_or_create_federated(Provider::Google, "sub-1")
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn test_same_subject_on_other_provider_is_distinct() {
        let store = InMemoryUserStore::new();

        let google = store
            .find_or_create_federated(Provider::Google, "sub-1")
            .unwrap();
        let facebook = store
            .find_or_create_federated(Provider::Facebook, "sub-1")
            .unwrap();

        assert_ne!(google.id, facebook.id);
    }

    #[test]
    fn test_concurrent_federated_logins_create_one_user() {
        let store = Arc::new(InMemoryUserStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .find_or_create_federated(Provider::Google, "shared-sub")
                        .unwrap()
                        .id
                })
            })
            .collect();

        let ids: Vec<UserId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn test_update_joke_scoped_to_owner() {
        let store = InMemoryUserStore::new();
        let alice = store.create_local_user("alice@example.com", "h").unwrap();
        let bob = store.create_local_user("bob@example.com", "h").unwrap();
        let joke = store.add_joke(alice.id, "why did the crab cross the road").unwrap();

        let result = store.update_joke_text(bob.id, &joke.id, "stolen");
        assert!(matches!(result, Err(AppError::JokeNotFound)));

        store.update_joke_text(alice.id, &joke.id, "revised").unwrap();
        let fetched = store.get_joke(alice.id, &joke.id).unwrap().unwrap();
        assert_eq!(fetched.text, "revised");
    }

    #[test]
    fn test_delete_missing_joke_is_noop() {
        let store = InMemoryUserStore::new();
        let alice = store.create_local_user("alice@example.com", "h").unwrap();
        let bob = store.create_local_user("bob@example.com", "h").unwrap();
        let joke = store.add_joke(alice.id, "knock knock").unwrap();

        // Bob deleting Alice's joke does nothing, and succeeds
        store.delete_joke(bob.id, &joke.id).unwrap();
        assert!(store.get_joke(alice.id, &joke.id).unwrap().is_some());

        store.delete_joke(alice.id, &joke.id).unwrap();
        assert!(store.get_joke(alice.id, &joke.id).unwrap().is_none());

        // Deleting again is still fine
        store.delete_joke(alice.id, &joke.id).unwrap();
    }

    #[test]
    fn test_feed_orders_users_and_jokes() {
        let store = InMemoryUserStore::new();
        let alice = store.create_local_user("alice@example.com", "h").unwrap();
        let bob = store.create_local_user("bob@example.com", "h").unwrap();
        // Carol never posts, so she should not appear
        store.create_local_user("carol@example.com", "h").unwrap();

        store.add_joke(bob.id, "bob one").unwrap();
        store.add_joke(alice.id, "alice one").unwrap();
        store.add_joke(alice.id, "alice two").unwrap();

        let feed = store.list_feed().unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].user.id, alice.id);
        assert_eq!(feed[0].jokes[0].text, "alice one");
        assert_eq!(feed[0].jokes[1].text, "alice two");
        assert_eq!(feed[1].user.id, bob.id);
    }

    #[test]
    fn test_toggle_liked_flips_flag() {
        let store = InMemoryUserStore::new();
        let alice = store.create_local_user("alice@example.com", "h").unwrap();
        let joke = store.add_joke(alice.id, "a pun").unwrap();

        store.toggle_liked(&joke.id).unwrap();
        assert!(store.get_joke(alice.id, &joke.id).unwrap().unwrap().liked);

        store.toggle_liked(&joke.id).unwrap();
        assert!(!store.get_joke(alice.id, &joke.id).unwrap().unwrap().liked);

        // Unknown ids are ignored
        store.toggle_liked(&JokeId("missing".to_string())).unwrap();
    }

    #[test]
    fn test_login_state_single_use() {
        let store = InMemoryUserStore::new();
        store
            .create_login_state(LoginState {
                token: "tok".to_string(),
                pkce_verifier: "ver".to_string(),
                provider: Provider::Google,
                created_at: Utc::now(),
            })
            .unwrap();

        assert!(store.take_login_state("tok").unwrap().is_some());
        assert!(store.take_login_state("tok").unwrap().is_none());
    }

    #[test]
    fn test_cleanup_expired_login_states() {
        let store = InMemoryUserStore::new();
        store
            .create_login_state(LoginState {
                token: "old".to_string(),
                pkce_verifier: "ver".to_string(),
                provider: Provider::Google,
                created_at: Utc::now() - chrono::Duration::minutes(30),
            })
            .unwrap();
        store
            .create_login_state(LoginState {
                token: "fresh".to_string(),
                pkce_verifier: "ver".to_string(),
                provider: Provider::Facebook,
                created_at: Utc::now(),
            })
            .unwrap();

        let removed = store.cleanup_expired_login_states(10).unwrap();
        assert_eq!(removed, 1);
        assert!(store.take_login_state("old").unwrap().is_none());
        assert!(store.take_login_state("fresh").unwrap().is_some());
    }

    #[test]
    fn test_session_lifecycle() {
        let store = InMemorySessionStore::new();

        let session = store.create(UserId(1)).unwrap();
        assert!(store.get(&session.id).unwrap().is_some());

        store.delete(&session.id).unwrap();
        assert!(store.get(&session.id).unwrap().is_none());
    }

    #[test]
    fn test_expired_session_reads_as_absent() {
        let store = InMemorySessionStore::with_ttl(chrono::Duration::zero());

        let session = store.create(UserId(1)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(store.get(&session.id).unwrap().is_none());
    }
}
