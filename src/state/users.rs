use crate::api::UserSource;
use crate::models::User;
use crate::util::lock;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

#[derive(Default)]
struct Directory {
    users: Arc<Vec<User>>,
    loaded: bool,
}

/// Read-only cache of the remote user list, fetched once on start.
pub(crate) struct UserDirectory<S> {
    source: Arc<S>,
    dir: Arc<Mutex<Directory>>,
    listeners: Arc<Mutex<Vec<Arc<dyn Fn() + Send + Sync>>>>,
}

impl<S> Clone for UserDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            dir: Arc::clone(&self.dir),
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<S: UserSource> UserDirectory<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            dir: Arc::new(Mutex::new(Directory::default())),
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn users(&self) -> Arc<Vec<User>> {
        Arc::clone(&lock(&self.dir).users)
    }

    pub fn is_loaded(&self) -> bool {
        lock(&self.dir).loaded
    }

    pub fn find_by_username(&self, username: &str) -> Option<User> {
        lock(&self.dir)
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    pub fn subscribe(&self, f: impl Fn() + Send + Sync + 'static) {
        lock(&self.listeners).push(Arc::new(f));
    }

    /// Fetch the directory unless it is already loaded.
    pub async fn init(&self) {
        if self.is_loaded() {
            return;
        }
        self.refresh().await;
    }

    /// Re-fetch the directory. On failure the previous list is kept and
    /// mention suggestions simply stay empty until a later refresh works.
    pub async fn refresh(&self) {
        match self.source.list_users().await {
            Ok(users) => {
                debug!(count = users.len(), "users loaded");
                {
                    let mut dir = lock(&self.dir);
                    dir.users = Arc::new(users);
                    dir.loaded = true;
                }
                let listeners = lock(&self.listeners).clone();
                for f in listeners {
                    f();
                }
            }
            Err(e) => warn!(error = %e, "loading users failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user;
    use crate::state::fake::FakeStore;
    use futures::executor::block_on;

    #[test]
    fn test_init_fetches_once() {
        let store = FakeStore::default();
        store.set_users(vec![user("alice"), user("bob")]);
        let dir = UserDirectory::new(store.clone());

        block_on(dir.init());
        block_on(dir.init());
        assert_eq!(store.user_fetches(), 1);
        assert_eq!(dir.users().len(), 2);
        assert!(dir.is_loaded());
    }

    #[test]
    fn test_failed_fetch_leaves_directory_empty_and_retryable() {
        let store = FakeStore::default();
        store.set_users(vec![user("alice")]);
        store.fail_reads(true);
        let dir = UserDirectory::new(store.clone());

        block_on(dir.init());
        assert!(dir.users().is_empty());
        assert!(!dir.is_loaded());

        store.fail_reads(false);
        block_on(dir.init());
        assert_eq!(dir.users().len(), 1);
    }

    #[test]
    fn test_refresh_failure_keeps_cached_users() {
        let store = FakeStore::default();
        store.set_users(vec![user("alice")]);
        let dir = UserDirectory::new(store.clone());
        block_on(dir.init());

        store.fail_reads(true);
        block_on(dir.refresh());
        assert_eq!(dir.users().len(), 1);
    }

    #[test]
    fn test_find_by_username_is_exact() {
        let store = FakeStore::default();
        store.set_users(vec![user("alice"), user("alicia")]);
        let dir = UserDirectory::new(store);
        block_on(dir.init());

        assert_eq!(dir.find_by_username("alicia").map(|u| u.username), Some("alicia".to_string()));
        assert!(dir.find_by_username("ALICE").is_none());
        assert!(dir.find_by_username("ali").is_none());
    }

    #[test]
    fn test_listeners_run_after_load() {
        let store = FakeStore::default();
        let dir = UserDirectory::new(store);
        let hits = Arc::new(Mutex::new(0));
        let h = hits.clone();
        dir.subscribe(move || *h.lock().unwrap() += 1);

        block_on(dir.init());
        assert_eq!(*hits.lock().unwrap(), 1);
    }
}
