//! In-memory storage implementation
//!
//! Fast, non-persistent storage for development and testing. Uses
//! DashMap for lock-free concurrent access. Data is lost on restart and
//! not shared across processes; use SqliteStorage for anything real.

use super::*;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory storage implementation
#[derive(Clone)]
pub struct MemoryStorage {
    logins: Arc<DashMap<String, LoginRecord>>,
    events: Arc<DashMap<String, Event>>,
    users: Arc<DashMap<String, User>>,
}

impl MemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self {
            logins: Arc::new(DashMap::new()),
            events: Arc::new(DashMap::new()),
            users: Arc::new(DashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put_login(&self, login: &LoginRecord) -> Result<()> {
        self.logins.insert(login.login_id.clone(), login.clone());
        Ok(())
    }

    async fn get_login(&self, login_id: &str) -> Result<Option<LoginRecord>> {
        Ok(self.logins.get(login_id).map(|r| r.clone()))
    }

    async fn delete_login(&self, login_id: &str) -> Result<()> {
        self.logins.remove(login_id);
        Ok(())
    }

    async fn update_last_login(&self, login_id: &str, at: DateTime<Utc>) -> Result<()> {
        // Conditional write: the entry lock makes check-and-set atomic
        // with respect to concurrent deletes.
        match self.logins.get_mut(login_id) {
            Some(mut record) => {
                record.last_login = at;
                Ok(())
            }
            None => Err(StorageError::NotFound {
                entity: "login",
                id: login_id.to_string(),
            }
            .into()),
        }
    }

    async fn create_event(&self, event: &Event) -> Result<()> {
        use dashmap::mapref::entry::Entry;

        match self.events.entry(event.short_name.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(event.clone());
                Ok(())
            }
            Entry::Occupied(_) => Err(StorageError::AlreadyExists {
                entity: "event",
                id: event.short_name.clone(),
            }
            .into()),
        }
    }

    async fn get_event(&self, short_name: &str) -> Result<Option<Event>> {
        Ok(self.events.get(short_name).map(|e| e.clone()))
    }

    async fn list_events(&self, limit: usize, start_after: Option<LastKey>) -> Result<Page<Event>> {
        let mut events: Vec<Event> = self.events.iter().map(|e| e.value().clone()).collect();
        // Second granularity matches the page-key encoding
        events.sort_unstable_by(|a, b| {
            (a.starts_at.timestamp(), &a.short_name).cmp(&(b.starts_at.timestamp(), &b.short_name))
        });

        if let Some(key) = start_after {
            let (starts_at, short_name) = parse_event_key(&key)?;
            events.retain(|e| (e.starts_at.timestamp(), e.short_name.as_str()) > (starts_at, short_name.as_str()));
        }

        let more = events.len() > limit;
        events.truncate(limit);
        let last_key = if more {
            events.last().map(event_last_key)
        } else {
            None
        };
        Ok(Page {
            items: events,
            last_key,
        })
    }

    async fn put_user(&self, user: &User) -> Result<()> {
        self.users.insert(user.nick_name.clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, nick_name: &str) -> Result<Option<User>> {
        Ok(self.users.get(nick_name).map(|u| u.clone()))
    }

    async fn list_users(&self, limit: usize, start_after: Option<LastKey>) -> Result<Page<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        // Leaderboard: highest packed sort key first
        users.sort_unstable_by(|a, b| b.leaderboard_sort_key().cmp(&a.leaderboard_sort_key()));

        if let Some(key) = start_after {
            let sort_key = parse_user_key(&key)?;
            users.retain(|u| format!("{:032x}", u.leaderboard_sort_key()) < sort_key);
        }

        let more = users.len() > limit;
        users.truncate(limit);
        let last_key = if more { users.last().map(user_last_key) } else { None };
        Ok(Page {
            items: users,
            last_key,
        })
    }
}
