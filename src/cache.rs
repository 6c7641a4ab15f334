//! An owner-scoped, read-through cache of category name lookups.
//!
//! Building the name map once per import run keeps category resolution off the
//! database for every row. The cache has no time-based expiry: correctness
//! depends on [CategoryCache::invalidate] being called by every collaborator
//! that creates, renames or deletes a category.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;

use crate::{
    Error,
    category::{Category, get_categories_by_user},
    user::UserID,
};

/// An immutable snapshot mapping normalized category names to categories for
/// one owner.
///
/// Names are normalized by trimming whitespace and lowercasing. There is at
/// most one entry per normalized name.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CategoryIndex {
    by_name: HashMap<String, Category>,
}

impl CategoryIndex {
    /// Build an index from an owner's categories, keyed by normalized name.
    pub fn from_categories(categories: Vec<Category>) -> Self {
        let by_name = categories
            .into_iter()
            .map(|category| (normalize(category.name.as_ref()), category))
            .collect();

        Self { by_name }
    }

    /// Look up a decoded category name.
    ///
    /// Returns `None` when `name` is absent or does not match any of the
    /// owner's categories. An unrecognized name is not an error: the caller
    /// imports the row as uncategorized.
    pub fn resolve(&self, name: Option<&str>) -> Option<&Category> {
        name.and_then(|name| self.by_name.get(&normalize(name)))
    }

    /// The number of categories in the index.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the index contains no categories.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Storage for cached category indexes, keyed by owner.
///
/// This is the seam for test doubles; the default implementation is
/// [InMemoryIndexStore].
pub trait IndexStore {
    /// Get the cached index for `user_id`, if one is stored.
    fn get(&self, user_id: UserID) -> Option<Arc<CategoryIndex>>;

    /// Store `index` as the cached index for `user_id`.
    fn set(&self, user_id: UserID, index: Arc<CategoryIndex>);

    /// Remove the cached index for `user_id`, if one is stored.
    fn delete(&self, user_id: UserID);
}

/// An [IndexStore] backed by a mutex-guarded hash map.
#[derive(Debug, Default)]
pub struct InMemoryIndexStore {
    entries: Mutex<HashMap<UserID, Arc<CategoryIndex>>>,
}

impl IndexStore for InMemoryIndexStore {
    fn get(&self, user_id: UserID) -> Option<Arc<CategoryIndex>> {
        self.entries.lock().unwrap().get(&user_id).cloned()
    }

    fn set(&self, user_id: UserID, index: Arc<CategoryIndex>) {
        self.entries.lock().unwrap().insert(user_id, index);
    }

    fn delete(&self, user_id: UserID) {
        self.entries.lock().unwrap().remove(&user_id);
    }
}

/// A read-through cache of per-owner [CategoryIndex] snapshots.
///
/// The first [CategoryCache::get_index] call for an owner loads all of their
/// categories and stores the built index; subsequent calls return the stored
/// snapshot without touching the database. Two concurrent runs for the same
/// owner are unsafe if either invalidates mid-run: a snapshot is not
/// re-validated per row.
pub struct CategoryCache {
    store: Box<dyn IndexStore + Send + Sync>,
}

impl CategoryCache {
    /// Create a cache backed by `store`.
    pub fn new(store: Box<dyn IndexStore + Send + Sync>) -> Self {
        Self { store }
    }

    /// Create a cache backed by an [InMemoryIndexStore].
    pub fn in_memory() -> Self {
        Self::new(Box::new(InMemoryIndexStore::default()))
    }

    /// Get the category index for `user_id`, loading it from the database on
    /// the first call.
    ///
    /// # Errors
    /// This function will return an error if loading the owner's categories
    /// fails with an SQL error.
    ///
    /// # Panics
    /// Panics if the lock inside the backing store is poisoned.
    pub fn get_index(
        &self,
        user_id: UserID,
        connection: &Connection,
    ) -> Result<Arc<CategoryIndex>, Error> {
        if let Some(index) = self.store.get(user_id) {
            return Ok(index);
        }

        let categories = get_categories_by_user(user_id, connection)?;
        let index = Arc::new(CategoryIndex::from_categories(categories));
        self.store.set(user_id, index.clone());

        Ok(index)
    }

    /// Drop the cached index for `user_id` so the next [CategoryCache::get_index]
    /// call rebuilds it.
    pub fn invalidate(&self, user_id: UserID) {
        self.store.delete(user_id);
    }
}


#[cfg(test)]
mod category_cache_tests {
    use rusqlite::Connection;

    use crate::{
        cache::CategoryCache,
        category::{CategoryName, create_category},
        db::initialize,
        user::{User, create_user},
    };

    fn get_test_connection() -> (Connection, User) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user("test", &connection).expect("Could not create test user");

        (connection, user)
    }

    /// Inserts a category without going through [create_category], so the
    /// cache is not invalidated.
    fn insert_category_behind_caches_back(name: &str, user_id: i64, connection: &Connection) {
        connection
            .execute(
                "INSERT INTO category (name, user_id) VALUES (?1, ?2);",
                (name, user_id),
            )
            .expect("Could not insert category");
    }

    #[test]
    fn get_index_returns_cached_snapshot_until_invalidated() {
        let (connection, user) = get_test_connection();
        let cache = CategoryCache::in_memory();
        create_category(
            CategoryName::new_unchecked("Dining"),
            user.id,
            &connection,
            &cache,
        )
        .expect("Could not create test category");

        let first = cache
            .get_index(user.id, &connection)
            .expect("Could not build index");
        insert_category_behind_caches_back("Groceries", user.id.as_i64(), &connection);
        let second = cache
            .get_index(user.id, &connection)
            .expect("Could not get cached index");

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1, "want the stale cached snapshot");

        cache.invalidate(user.id);
        let rebuilt = cache
            .get_index(user.id, &connection)
            .expect("Could not rebuild index");
        assert_eq!(rebuilt.len(), 2);
    }

    #[test]
    fn category_mutations_invalidate_the_cache() {
        let (connection, user) = get_test_connection();
        let cache = CategoryCache::in_memory();

        let empty_index = cache
            .get_index(user.id, &connection)
            .expect("Could not build index");
        assert!(empty_index.is_empty());

        create_category(
            CategoryName::new_unchecked("Dining"),
            user.id,
            &connection,
            &cache,
        )
        .expect("Could not create test category");

        let rebuilt = cache
            .get_index(user.id, &connection)
            .expect("Could not rebuild index");
        assert_eq!(rebuilt.len(), 1);
    }

    #[test]
    fn indexes_are_scoped_per_owner() {
        let (connection, user) = get_test_connection();
        let other_user = create_user("other", &connection).expect("Could not create test user");
        let cache = CategoryCache::in_memory();
        create_category(
            CategoryName::new_unchecked("Dining"),
            user.id,
            &connection,
            &cache,
        )
        .expect("Could not create test category");
        create_category(
            CategoryName::new_unchecked("Travel"),
            other_user.id,
            &connection,
            &cache,
        )
        .expect("Could not create test category");

        let index = cache
            .get_index(user.id, &connection)
            .expect("Could not build index");
        let other_index = cache
            .get_index(other_user.id, &connection)
            .expect("Could not build index");

        assert!(index.resolve(Some("Dining")).is_some());
        assert!(index.resolve(Some("Travel")).is_none());
        assert!(other_index.resolve(Some("Travel")).is_some());
    }

    #[test]
    fn invalidate_only_affects_the_given_owner() {
        let (connection, user) = get_test_connection();
        let other_user = create_user("other", &connection).expect("Could not create test user");
        let cache = CategoryCache::in_memory();

        cache
            .get_index(user.id, &connection)
            .expect("Could not build index");
        cache
            .get_index(other_user.id, &connection)
            .expect("Could not build index");

        insert_category_behind_caches_back("Dining", user.id.as_i64(), &connection);
        insert_category_behind_caches_back("Travel", other_user.id.as_i64(), &connection);
        cache.invalidate(user.id);

        let rebuilt = cache
            .get_index(user.id, &connection)
            .expect("Could not rebuild index");
        let still_cached = cache
            .get_index(other_user.id, &connection)
            .expect("Could not get cached index");

        assert_eq!(rebuilt.len(), 1);
        assert!(still_cached.is_empty(), "want the stale cached snapshot");
    }
}
