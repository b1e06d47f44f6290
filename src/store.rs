use std::collections::{BTreeMap, HashMap};

use rusqlite::{params, Transaction};
use rusqlite_migration::{Migrations, M};
use serde::{Deserialize, Serialize};

use crate::db::Db;
use crate::error::{Result, StoreError};
use crate::model::{Blog, Language, NewBlog, PublicBlog, Translation, UpdateBlog};

/// Transactional access to the blog aggregate: one `blogs` row plus its
/// per-language `blog_translations` and ordered `blog_images` rows, read
/// and written as a single consistency unit. Each write is one database
/// transaction; a failure at any step rolls the whole operation back, so
/// no partially-written aggregate is ever observable.
#[derive(Clone)]
pub struct BlogStore {
    db: Db,
}

pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "
        CREATE TABLE blogs (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            type       TEXT NOT NULL CHECK (type IN ('interview', 'article', 'fact')),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE blog_translations (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            blog_id    INTEGER NOT NULL REFERENCES blogs(id) ON DELETE CASCADE,
            language   TEXT NOT NULL CHECK (language IN ('ru', 'en', 'es', 'fr')),
            title      TEXT NOT NULL,
            date       TEXT NOT NULL,
            source     TEXT,
            content    TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (blog_id, language)
        );

        CREATE TABLE blog_images (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            blog_id     INTEGER NOT NULL REFERENCES blogs(id) ON DELETE CASCADE,
            language    TEXT NOT NULL CHECK (language IN ('ru', 'en', 'es', 'fr')),
            image_url   TEXT NOT NULL,
            image_order INTEGER NOT NULL,
            is_array    INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (blog_id, language, image_order)
        );

        CREATE INDEX idx_blog_translations_blog_id ON blog_translations(blog_id);
        CREATE INDEX idx_blog_translations_language ON blog_translations(language);
        CREATE INDEX idx_blog_images_blog_id ON blog_images(blog_id);
        CREATE INDEX idx_blogs_type ON blogs(type);
        ",
    )])
}

impl BlogStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn migrate(&self) -> Result<()> {
        self.db.migrate(&migrations())
    }

    pub fn ping(&self) -> Result<()> {
        self.db.ping()
    }

    /// Creates a blog with a translation for every supported language.
    /// Validation runs before the transaction begins; on success the new
    /// blog's generated id is returned.
    pub fn create(&self, new: &NewBlog) -> Result<i64> {
        for lang in Language::ALL {
            let translation = new.translations.get(&lang).ok_or_else(|| {
                StoreError::Validation(format!("missing translation for language '{lang}'"))
            })?;
            validate_translation(lang, translation)?;
        }

        let id = self.db.transaction(|txn| {
            txn.execute(
                "INSERT INTO blogs (type) VALUES (?1)",
                params![new.kind.as_str()],
            )?;
            let blog_id = txn.last_insert_rowid();

            for lang in Language::ALL {
                insert_translation(txn, blog_id, lang, &new.translations[&lang])?;
            }
            for (lang, urls) in &new.images {
                insert_images(txn, blog_id, *lang, urls)?;
            }
            Ok(blog_id)
        })?;

        log::info!("blog {id} created");
        Ok(id)
    }

    /// Applies a partial update. Languages absent from the payload keep
    /// their stored translations; a present image map replaces the stored
    /// image lists of every language in full, so the stored order is
    /// always exactly the submitted order.
    pub fn update(&self, id: i64, update: &UpdateBlog) -> Result<()> {
        for (lang, translation) in &update.translations {
            validate_translation(*lang, translation)?;
        }

        self.db.transaction(|txn| {
            // Touching the root row both applies the optional type change
            // and advances updated_at; zero rows means the id is unknown.
            let touched = txn.execute(
                "UPDATE blogs
                 SET type = COALESCE(?1, type), updated_at = datetime('now')
                 WHERE id = ?2",
                params![update.kind.map(|k| k.as_str()), id],
            )?;
            if touched == 0 {
                return Err(StoreError::NotFound);
            }

            for (lang, translation) in &update.translations {
                upsert_translation(txn, id, *lang, translation)?;
            }

            if let Some(images) = &update.images {
                txn.execute("DELETE FROM blog_images WHERE blog_id = ?1", params![id])?;
                for (lang, urls) in images {
                    insert_images(txn, id, *lang, urls)?;
                }
            }
            Ok(())
        })?;

        log::info!("blog {id} updated");
        Ok(())
    }

    /// Deletes a blog; translations and images go with it via cascade.
    pub fn delete(&self, id: i64) -> Result<()> {
        self.db.transaction(|txn| {
            let deleted = txn.execute("DELETE FROM blogs WHERE id = ?1", params![id])?;
            if deleted == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })?;

        log::info!("blog {id} deleted");
        Ok(())
    }

    /// Every blog with all stored translations, newest first.
    pub fn get_all_for_admin(&self) -> Result<Vec<Blog>> {
        let blogs: Vec<BlogRow> = self.db.query(
            "SELECT id, type, created_at, updated_at FROM blogs ORDER BY id DESC",
            [],
        )?;
        let translations: Vec<TranslationRow> = self.db.query(
            "SELECT blog_id, language, title, date, source, content FROM blog_translations",
            [],
        )?;

        let mut by_blog: HashMap<i64, BTreeMap<Language, Translation>> = HashMap::new();
        for row in translations {
            let lang: Language = row.language.parse()?;
            by_blog
                .entry(row.blog_id)
                .or_default()
                .insert(lang, row.into_translation()?);
        }

        blogs
            .into_iter()
            .map(|row| {
                Ok(Blog {
                    id: row.id,
                    kind: row.kind.parse()?,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                    translations: by_blog.remove(&row.id).unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Every blog projected onto one language, newest first, with that
    /// language's images in stored order.
    pub fn get_public(&self, lang: Language) -> Result<Vec<PublicBlog>> {
        let rows: Vec<PublicRow> = self.db.query(
            "SELECT b.id, b.type, bt.title, bt.date, bt.source, bt.content,
                    b.created_at, b.updated_at
             FROM blogs b
             LEFT JOIN blog_translations bt
                 ON bt.blog_id = b.id AND bt.language = ?1
             ORDER BY b.id DESC",
            params![lang.as_str()],
        )?;

        let images: Vec<ImageRow> = self.db.query(
            "SELECT blog_id, image_url FROM blog_images
             WHERE language = ?1
             ORDER BY blog_id, image_order",
            params![lang.as_str()],
        )?;
        let mut by_blog: HashMap<i64, Vec<String>> = HashMap::new();
        for row in images {
            by_blog.entry(row.blog_id).or_default().push(row.image_url);
        }

        rows.into_iter()
            .map(|row| {
                let images = by_blog.remove(&row.id).unwrap_or_default();
                row.into_public(images)
            })
            .collect()
    }

    /// One blog projected onto one language. A missing translation gives
    /// empty fields; a missing blog is `NotFound`.
    pub fn get_public_by_id(&self, lang: Language, id: i64) -> Result<PublicBlog> {
        let rows: Vec<PublicRow> = self.db.query(
            "SELECT b.id, b.type, bt.title, bt.date, bt.source, bt.content,
                    b.created_at, b.updated_at
             FROM blogs b
             LEFT JOIN blog_translations bt
                 ON bt.blog_id = b.id AND bt.language = ?1
             WHERE b.id = ?2",
            params![lang.as_str(), id],
        )?;
        let row = rows.into_iter().next().ok_or(StoreError::NotFound)?;

        let images: Vec<ImageRow> = self.db.query(
            "SELECT blog_id, image_url FROM blog_images
             WHERE blog_id = ?1 AND language = ?2
             ORDER BY image_order",
            params![id, lang.as_str()],
        )?;
        row.into_public(images.into_iter().map(|r| r.image_url).collect())
    }
}

fn validate_translation(lang: Language, translation: &Translation) -> Result<()> {
    if translation.title.trim().is_empty() {
        return Err(StoreError::Validation(format!(
            "empty title for language '{lang}'"
        )));
    }
    if translation.date.trim().is_empty() {
        return Err(StoreError::Validation(format!(
            "empty date for language '{lang}'"
        )));
    }
    Ok(())
}

fn insert_translation(
    txn: &Transaction,
    blog_id: i64,
    lang: Language,
    translation: &Translation,
) -> Result<()> {
    txn.execute(
        "INSERT INTO blog_translations (blog_id, language, title, date, source, content)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            blog_id,
            lang.as_str(),
            translation.title,
            translation.date,
            translation.source,
            serde_json::to_string(&translation.content)?,
        ],
    )?;
    Ok(())
}

fn upsert_translation(
    txn: &Transaction,
    blog_id: i64,
    lang: Language,
    translation: &Translation,
) -> Result<()> {
    txn.execute(
        "INSERT INTO blog_translations (blog_id, language, title, date, source, content)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (blog_id, language) DO UPDATE SET
             title = excluded.title,
             date = excluded.date,
             source = excluded.source,
             content = excluded.content,
             updated_at = datetime('now')",
        params![
            blog_id,
            lang.as_str(),
            translation.title,
            translation.date,
            translation.source,
            serde_json::to_string(&translation.content)?,
        ],
    )?;
    Ok(())
}

fn insert_images(txn: &Transaction, blog_id: i64, lang: Language, urls: &[String]) -> Result<()> {
    let mut stmt = txn.prepare(
        "INSERT INTO blog_images (blog_id, language, image_url, image_order, is_array)
         VALUES (?1, ?2, ?3, ?4, 0)",
    )?;
    for (order, url) in urls.iter().enumerate() {
        stmt.execute(params![blog_id, lang.as_str(), url, order as i64])?;
    }
    Ok(())
}

#[derive(Serialize, Deserialize)]
struct BlogRow {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
    created_at: String,
    updated_at: String,
}

#[derive(Serialize, Deserialize)]
struct TranslationRow {
    blog_id: i64,
    language: String,
    title: String,
    date: String,
    source: Option<String>,
    content: String,
}

impl TranslationRow {
    fn into_translation(self) -> Result<Translation> {
        Ok(Translation {
            title: self.title,
            date: self.date,
            source: self.source,
            content: serde_json::from_str(&self.content)?,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct PublicRow {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
    title: Option<String>,
    date: Option<String>,
    source: Option<String>,
    content: Option<String>,
    created_at: String,
    updated_at: String,
}

impl PublicRow {
    fn into_public(self, images: Vec<String>) -> Result<PublicBlog> {
        Ok(PublicBlog {
            id: self.id,
            kind: self.kind.parse()?,
            title: self.title,
            date: self.date,
            source: self.source,
            content: self
                .content
                .map(|c| serde_json::from_str(&c))
                .transpose()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            images,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct ImageRow {
    blog_id: i64,
    image_url: String,
}
