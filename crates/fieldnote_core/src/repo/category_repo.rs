//! Category repository.
//!
//! Categories are looked up by name from configuration; the first lookup of
//! a name creates it.

use crate::model::category::{Category, CategoryId};
use crate::repo::{ensure_schema_ready, RepoResult};
use rusqlite::{Connection, OptionalExtension};

pub trait CategoryRepository {
    /// Returns the category called `name`, creating it when missing.
    fn find_or_create(&self, name: &str) -> RepoResult<Category>;
    /// Read-only lookup by name.
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Category>>;
    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    /// Lists categories sorted by name.
    fn list_categories(&self) -> RepoResult<Vec<Category>>;
}

pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn find_or_create(&self, name: &str) -> RepoResult<Category> {
        self.conn.execute(
            "INSERT OR IGNORE INTO categories (name) VALUES (?1);",
            [name],
        )?;
        let category = self.conn.query_row(
            "SELECT id, name FROM categories WHERE name = ?1;",
            [name],
            |row| {
                Ok(Category {
                    id: row.get("id")?,
                    name: row.get("name")?,
                })
            },
        )?;
        Ok(category)
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        let category = self
            .conn
            .query_row(
                "SELECT id, name FROM categories WHERE name = ?1;",
                [name],
                |row| {
                    Ok(Category {
                        id: row.get("id")?,
                        name: row.get("name")?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        let category = self
            .conn
            .query_row(
                "SELECT id, name FROM categories WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Category {
                        id: row.get("id")?,
                        name: row.get("name")?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM categories ORDER BY name COLLATE NOCASE ASC;")?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(Category {
                id: row.get("id")?,
                name: row.get("name")?,
            });
        }
        Ok(categories)
    }
}
