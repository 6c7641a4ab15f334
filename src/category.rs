//! This file defines the `Category` type and the database functions for
//! creating, renaming and deleting categories.
//!
//! Every mutation invalidates the owner's cached [CategoryIndex] so the next
//! import run rebuilds it. Forgetting to do so would leave imports resolving
//! against a stale snapshot, which is why the cache handle is a required
//! argument rather than something callers may remember to update.
//!
//! [CategoryIndex]: crate::cache::CategoryIndex

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, cache::CategoryCache, database_id::DatabaseID, user::UserID};

/// The name of a category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an error if `name` is an empty string.
    pub fn new(name: &str) -> Result<Self, Error> {
        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because
    /// if the non-empty invariant is violated it will cause incorrect behaviour
    /// but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A category for expenses and income, e.g., 'Groceries', 'Eating Out', 'Wages'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    /// The id of the category.
    pub id: DatabaseID,

    /// The name of the category.
    pub name: CategoryName,

    /// The id of the user that owns the category.
    pub user_id: UserID,
}

/// Create a category in the database and invalidate the owner's cached
/// category index.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn create_category(
    name: CategoryName,
    user_id: UserID,
    connection: &Connection,
    cache: &CategoryCache,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, user_id) VALUES (?1, ?2);",
        (name.as_ref(), user_id.as_i64()),
    )?;

    let id = connection.last_insert_rowid();

    cache.invalidate(user_id);

    Ok(Category { id, name, user_id })
}

/// Rename the category with `category_id` and invalidate the owner's cached
/// category index.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `category_id` does not refer to a valid category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn rename_category(
    category_id: DatabaseID,
    name: CategoryName,
    connection: &Connection,
    cache: &CategoryCache,
) -> Result<Category, Error> {
    let category = get_category(category_id, connection)?;

    connection.execute(
        "UPDATE category SET name = ?1 WHERE id = ?2;",
        (name.as_ref(), category_id),
    )?;

    cache.invalidate(category.user_id);

    Ok(Category { name, ..category })
}

/// Delete the category with `category_id` and invalidate the owner's cached
/// category index.
///
/// Transactions that reference the category keep their reference; resolving
/// them afterwards is up to the caller.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `category_id` does not refer to a valid category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_category(
    category_id: DatabaseID,
    connection: &Connection,
    cache: &CategoryCache,
) -> Result<(), Error> {
    let category = get_category(category_id, connection)?;

    connection.execute("DELETE FROM category WHERE id = ?1;", (category_id,))?;

    cache.invalidate(category.user_id);

    Ok(())
}

/// Retrieve the category with `category_id` from the database.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `category_id` does not refer to a valid category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_category(category_id: DatabaseID, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, user_id FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories owned by the user with `user_id`.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_categories_by_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, user_id FROM category WHERE user_id = :user_id;")?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

pub(crate) fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                user_id INTEGER NOT NULL REFERENCES user(id),
                UNIQUE(name, user_id)
            );",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = CategoryName::new_unchecked(&raw_name);
    let user_id = UserID::new(row.get(2)?);

    Ok(Category { id, name, user_id })
}
