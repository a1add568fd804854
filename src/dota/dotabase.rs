//! Read-only queries over the `dotabase` SQLite file.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};

/// A spoken line.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub text: String,
    /// vpk path of the clip, e.g. `/sounds/vo/axe/axe_attack_01.mp3`.
    pub mp3: String,
    pub voice_id: Option<i64>,
    pub hero: Option<String>,
}

/// A hero or announcer voice.
#[derive(Clone, Debug, PartialEq)]
pub struct VoiceInfo {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub url: Option<String>,
    pub voice_actor: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Hero {
    pub name: String,
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ability {
    pub name: String,
    pub hero: String,
    pub lore: Option<String>,
    pub icon: Option<String>,
    pub innate: bool,
    pub from_facet: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Facet {
    pub name: String,
    pub hero: String,
    pub icon: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Item {
    pub name: String,
    pub cost: Option<i64>,
    pub neutral: bool,
    pub neutral_enhancement: bool,
    pub base_level: Option<i64>,
    pub lore: Option<String>,
    pub icon: Option<String>,
}

impl Item {
    /// Whether the item is something a player can buy or find: not an
    /// internal entry, recipe, enhancement or upgraded level.
    pub fn in_shop(&self) -> bool {
        if self.name.is_empty() || self.name.contains('_') {
            return false;
        }
        if self.cost.unwrap_or(0) == 0 && !self.neutral {
            return false;
        }
        if self.neutral_enhancement || self.name.contains("Recipe") {
            return false;
        }
        self.base_level.map_or(true, |level| level <= 1)
    }
}

pub struct Dotabase {
    conn: Mutex<Connection>,
}

const RESPONSE_COLUMNS: &str =
    "SELECT r.text, r.mp3, r.voice_id, h.localized_name FROM responses r
     LEFT JOIN heroes h ON h.id = r.hero_id";

fn response_from_row(row: &Row<'_>) -> rusqlite::Result<Response> {
    Ok(Response {
        text: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
        mp3: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        voice_id: row.get(2)?,
        hero: row.get(3)?,
    })
}

impl Dotabase {
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn responses_where(&self, clause: &str, value: &str) -> rusqlite::Result<Vec<Response>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("{RESPONSE_COLUMNS} WHERE {clause} ORDER BY r.rowid"))?;
        let rows = stmt.query_map(params![value], response_from_row)?;
        rows.collect()
    }

    /// Responses whose text is exactly `text`.
    pub fn responses_exact(&self, text: &str) -> rusqlite::Result<Vec<Response>> {
        self.responses_where("r.text = ?1", text)
    }

    /// Responses containing `text`, ignoring case.
    pub fn responses_containing(&self, text: &str) -> rusqlite::Result<Vec<Response>> {
        self.responses_where("instr(lower(r.text), lower(?1)) > 0", text)
    }

    pub fn responses_by_hero(&self, hero: &str) -> rusqlite::Result<Vec<Response>> {
        self.responses_where("lower(h.localized_name) = lower(?1)", hero)
    }

    pub fn voice(&self, id: i64) -> rusqlite::Result<Option<VoiceInfo>> {
        self.conn()
            .query_row(
                "SELECT id, name, image, url, voice_actor FROM voices WHERE id = ?1",
                params![id],
                |row| {
                    Ok(VoiceInfo {
                        id: row.get(0)?,
                        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        image: row.get(2)?,
                        url: row.get(3)?,
                        voice_actor: row.get(4)?,
                    })
                },
            )
            .optional()
    }

    pub fn heroes(&self) -> rusqlite::Result<Vec<Hero>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT localized_name, portrait FROM heroes
             WHERE localized_name IS NOT NULL ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Hero {
                name: row.get(0)?,
                image: row.get(1)?,
            })
        })?;
        rows.collect()
    }

    /// Hero abilities, with their hero's name.
    pub fn abilities(&self) -> rusqlite::Result<Vec<Ability>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT a.localized_name, h.localized_name, a.lore, a.icon,
                    COALESCE(a.innate, 0) != 0, a.facet_id IS NOT NULL
             FROM abilities a JOIN heroes h ON h.id = a.hero_id
             ORDER BY a.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Ability {
                name: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                hero: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                lore: row.get(2)?,
                icon: row.get(3)?,
                innate: row.get(4)?,
                from_facet: row.get(5)?,
            })
        })?;
        rows.collect()
    }

    pub fn facets(&self) -> rusqlite::Result<Vec<Facet>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT f.localized_name, h.localized_name, f.icon
             FROM facets f JOIN heroes h ON h.id = f.hero_id
             WHERE f.localized_name IS NOT NULL
             ORDER BY f.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Facet {
                name: row.get(0)?,
                hero: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                icon: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    /// Items that pass [`Item::in_shop`].
    pub fn shop_items(&self) -> rusqlite::Result<Vec<Item>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT localized_name, cost, neutral_tier IS NOT NULL,
                    COALESCE(is_neutral_enhancement, 0) != 0, base_level, lore, icon
             FROM items ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Item {
                name: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                cost: row.get(1)?,
                neutral: row.get(2)?,
                neutral_enhancement: row.get(3)?,
                base_level: row.get(4)?,
                lore: row.get(5)?,
                icon: row.get(6)?,
            })
        })?;
        let items: Vec<Item> = rows.collect::<rusqlite::Result<_>>()?;
        Ok(items.into_iter().filter(Item::in_shop).collect())
    }
}
