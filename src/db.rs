//! Database schema and operations for the recipe catalog

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::catalog::RecipeCatalog;
use crate::models::{ItemId, ItemInfo, Recipe};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Every known item, raw or manufactured
        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            time REAL NOT NULL DEFAULT 0
        );

        -- Recipe ingredients in declared order
        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            item_id TEXT NOT NULL,
            ingredient_id TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (item_id, ingredient_id)
        );

        -- Facilities able to make an item, preferred first
        CREATE TABLE IF NOT EXISTS item_producers (
            item_id TEXT NOT NULL,
            producer TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (item_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_item ON recipe_ingredients(item_id);
        CREATE INDEX IF NOT EXISTS idx_item_producers_item ON item_producers(item_id);
        "#,
    )?;
    Ok(())
}

/// Clear the whole catalog (for re-extraction)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM item_producers;
        DELETE FROM recipe_ingredients;
        DELETE FROM items;
        "#,
    )?;
    Ok(())
}

/// Insert or replace an item
pub fn upsert_item(conn: &Connection, id: &ItemId, time: f64) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO items (id, time) VALUES (?1, ?2)",
        (id.as_str(), time),
    )?;
    Ok(())
}

/// Insert a recipe ingredient
pub fn insert_ingredient(
    conn: &Connection,
    item: &ItemId,
    ingredient: &ItemId,
    quantity: u32,
    position: usize,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO recipe_ingredients (item_id, ingredient_id, quantity, position)
         VALUES (?1, ?2, ?3, ?4)",
        (item.as_str(), ingredient.as_str(), quantity, position as i64),
    )?;
    Ok(())
}

/// Insert a producer facility
pub fn insert_producer(
    conn: &Connection,
    item: &ItemId,
    producer: &str,
    position: usize,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO item_producers (item_id, producer, position)
         VALUES (?1, ?2, ?3)",
        (item.as_str(), producer, position as i64),
    )?;
    Ok(())
}

/// Replace a full item record: time, recipe and producers
pub fn store_item(conn: &Connection, id: &ItemId, info: &ItemInfo) -> Result<()> {
    upsert_item(conn, id, info.time)?;
    conn.execute("DELETE FROM recipe_ingredients WHERE item_id = ?1", [id.as_str()])?;
    conn.execute("DELETE FROM item_producers WHERE item_id = ?1", [id.as_str()])?;

    for (position, (ingredient, quantity)) in info.recipe.iter().enumerate() {
        insert_ingredient(conn, id, ingredient, *quantity, position)?;
    }
    for (position, producer) in info.producers.iter().enumerate() {
        insert_producer(conn, id, producer, position)?;
    }
    Ok(())
}

/// Write every item of a catalog in one transaction
pub fn store_catalog(conn: &mut Connection, catalog: &RecipeCatalog) -> Result<usize> {
    let tx = conn.transaction()?;
    for (id, info) in catalog.items() {
        store_item(&tx, id, info).with_context(|| format!("Failed to store {}", id))?;
    }
    tx.commit()?;
    Ok(catalog.len())
}

fn get_recipe(conn: &Connection, id: &str) -> Result<Recipe> {
    let mut stmt = conn.prepare(
        "SELECT ingredient_id, quantity FROM recipe_ingredients
         WHERE item_id = ?1
         ORDER BY position",
    )?;

    let rows = stmt.query_map([id], |row| {
        Ok((ItemId::new(row.get::<_, String>(0)?), row.get::<_, u32>(1)?))
    })?;

    let mut recipe = Recipe::new();
    for row in rows {
        let (ingredient, quantity) = row?;
        recipe.insert(ingredient, quantity);
    }
    Ok(recipe)
}

fn get_producers(conn: &Connection, id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT producer FROM item_producers WHERE item_id = ?1 ORDER BY position",
    )?;

    let rows = stmt.query_map([id], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Get the full record for one item
pub fn get_item_info(conn: &Connection, id: &str) -> Result<Option<ItemInfo>> {
    let time: Option<f64> = conn
        .query_row("SELECT time FROM items WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;

    let Some(time) = time else {
        return Ok(None);
    };

    Ok(Some(ItemInfo::new(
        get_recipe(conn, id)?,
        get_producers(conn, id)?,
        time,
    )))
}

/// List all item ids in the database
pub fn list_items(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM items ORDER BY id")?;

    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List items that have no recipe of their own
pub fn list_raw_items(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM items
         WHERE id NOT IN (SELECT DISTINCT item_id FROM recipe_ingredients)
         ORDER BY id",
    )?;

    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Load the whole catalog into memory
pub fn load_catalog(conn: &Connection) -> Result<RecipeCatalog> {
    let mut catalog = RecipeCatalog::new();
    for id in list_items(conn)? {
        let info = get_item_info(conn, &id)?
            .with_context(|| format!("Item {} vanished while loading", id))?;
        catalog.insert(ItemId::new(id), info);
    }
    Ok(catalog)
}
