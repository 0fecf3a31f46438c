//! Lua prototype extraction for recipe data
//!
//! Scans game prototype files (`data/base/prototypes/recipe/*.lua` and the
//! like) for `type = "recipe"` tables and turns them into catalog records.
//! Ingredients that no recipe produces become raw items.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use rusqlite::Connection;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::catalog::RecipeCatalog;
use crate::db;
use crate::models::{ItemId, ItemInfo, Recipe};

/// Recipe data before catalog insertion
#[derive(Debug, Default, PartialEq)]
struct ExtractedRecipe {
    name: String,
    result: String,
    category: String,
    time: f64,
    ingredients: Vec<(String, u32)>,
}

struct Patterns {
    recipe_start: Regex,
    name: Regex,
    category: Regex,
    energy: Regex,
    result: Regex,
    results: Regex,
    ingredients: Regex,
    ingredient: Regex,
}

impl Patterns {
    fn new() -> Result<Self> {
        Ok(Self {
            recipe_start: Regex::new(r#"type\s*=\s*"recipe""#)?,
            name: Regex::new(r#"\bname\s*=\s*"([\w-]+)""#)?,
            category: Regex::new(r#"\bcategory\s*=\s*"([\w-]+)""#)?,
            energy: Regex::new(r"\benergy_required\s*=\s*([\d.]+)")?,
            result: Regex::new(r#"\bresult\s*=\s*"([\w-]+)""#)?,
            results: Regex::new(r#"\bresults\s*=\s*\{\s*\{[^{}]*?name\s*=\s*"([\w-]+)""#)?,
            ingredients: Regex::new(r"\bingredients\s*=\s*\{")?,
            // {"iron-plate", 2} or {type="item", name="iron-plate", amount=2}
            ingredient: Regex::new(
                r#"\{\s*"([\w-]+)"\s*,\s*([\d.]+)\s*\}|\{[^{}]*?name\s*=\s*"([\w-]+)"[^{}]*?amount\s*=\s*([\d.]+)[^{}]*\}"#,
            )?,
        })
    }
}

/// Convert a prototype name to an item identifier: `iron-gear-wheel` -> `IronGearWheel`
pub fn item_id_from_prototype(name: &str) -> ItemId {
    let id: String = name
        .split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    ItemId::new(id)
}

/// Facilities for a crafting category, preferred first
fn producers_for_category(category: &str) -> Vec<String> {
    let producers: &[&str] = match category {
        "smelting" => &["StoneFurnace", "SteelFurnace", "ElectricFurnace"],
        "chemistry" => &["ChemicalPlant"],
        "oil-processing" => &["OilRefinery"],
        "centrifuging" => &["Centrifuge"],
        "rocket-building" => &["RocketSilo"],
        _ => &["AssemblingMachine1", "AssemblingMachine2", "AssemblingMachine3"],
    };
    producers.iter().map(|p| p.to_string()).collect()
}

/// Facilities that gather a raw resource
fn producers_for_resource(name: &str) -> Vec<String> {
    let producers: &[&str] = if name.ends_with("-ore") || name == "stone" || name == "coal" {
        &["BurnerMiningDrill", "ElectricMiningDrill"]
    } else if name == "crude-oil" {
        &["Pumpjack"]
    } else if name == "water" {
        &["OffshorePump"]
    } else {
        &[]
    };
    producers.iter().map(|p| p.to_string()).collect()
}

/// Contents of the brace group opening at `open`, without the outer braces
fn brace_group(text: &str, open: usize) -> Option<&str> {
    let mut depth = 0usize;
    for (offset, ch) in text[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open + 1..open + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_quantity(raw: &str) -> u32 {
    raw.parse::<f64>().map_or(1, |q| q.ceil().max(1.0) as u32)
}

fn parse_recipe_block(patterns: &Patterns, block: &str) -> Option<ExtractedRecipe> {
    let name = patterns.name.captures(block)?[1].to_string();

    let result = if let Some(cap) = patterns.result.captures(block) {
        cap[1].to_string()
    } else if let Some(cap) = patterns.results.captures(block) {
        cap[1].to_string()
    } else {
        name.clone()
    };

    let category = patterns
        .category
        .captures(block)
        .map_or_else(|| "crafting".to_string(), |cap| cap[1].to_string());

    let time = patterns
        .energy
        .captures(block)
        .and_then(|cap| cap[1].parse::<f64>().ok())
        .unwrap_or(0.5);

    // With normal/expensive variants the first ingredients table is the normal one.
    let mut ingredients = Vec::new();
    if let Some(m) = patterns.ingredients.find(block) {
        let group = brace_group(block, m.end() - 1)?;
        for cap in patterns.ingredient.captures_iter(group) {
            let (item, amount) = match (cap.get(1), cap.get(2), cap.get(3), cap.get(4)) {
                (Some(item), Some(amount), _, _) => (item.as_str(), amount.as_str()),
                (_, _, Some(item), Some(amount)) => (item.as_str(), amount.as_str()),
                _ => continue,
            };
            if !ingredients.iter().any(|(existing, _)| existing == item) {
                ingredients.push((item.to_string(), parse_quantity(amount)));
            }
        }
    }

    Some(ExtractedRecipe {
        name,
        result,
        category,
        time,
        ingredients,
    })
}

/// Parse every recipe table in one prototype file
fn parse_recipe_file(patterns: &Patterns, filepath: &Path) -> Result<Vec<ExtractedRecipe>> {
    let content = fs::read_to_string(filepath)
        .with_context(|| format!("Failed to read {}", filepath.display()))?;

    let starts: Vec<usize> = patterns
        .recipe_start
        .find_iter(&content)
        .map(|m| m.end())
        .collect();

    let mut recipes = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(content.len());
        if let Some(recipe) = parse_recipe_block(patterns, &content[start..end]) {
            recipes.push(recipe);
        }
    }
    Ok(recipes)
}

/// Find all *.lua files under `prototype_dir`. Entries that cannot be
/// walked are logged and counted in `stats.errors`.
pub fn find_prototype_files(prototype_dir: &Path, stats: &mut ExtractStats) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(prototype_dir)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(
                    dir = %prototype_dir.display(),
                    error = %e,
                    "failed to walk prototype directory"
                );
                stats.errors += 1;
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "lua") {
            files.push(path.to_path_buf());
        }
    }

    files
}

/// Extract every recipe under `prototype_dir` into an in-memory catalog
pub fn extract_catalog(prototype_dir: &Path) -> Result<(RecipeCatalog, ExtractStats)> {
    let patterns = Patterns::new()?;
    let mut stats = ExtractStats::default();
    let mut catalog = RecipeCatalog::new();
    let mut ingredient_names = Vec::new();

    info!(dir = %prototype_dir.display(), "scanning for recipe prototypes");
    let files = find_prototype_files(prototype_dir, &mut stats);
    info!(count = files.len(), "found prototype files");

    for filepath in &files {
        stats.files += 1;
        let recipes = match parse_recipe_file(&patterns, filepath) {
            Ok(recipes) => recipes,
            Err(e) => {
                warn!(file = %filepath.display(), error = %e, "failed to parse prototype file");
                stats.errors += 1;
                continue;
            }
        };

        for recipe in recipes {
            let id = item_id_from_prototype(&recipe.result);
            if catalog.contains(&id) {
                // Only the first recipe for an item is used.
                debug!(recipe = %recipe.name, item = %id, "skipping alternative recipe");
                stats.skipped += 1;
                continue;
            }
            if recipe.ingredients.is_empty() {
                debug!(recipe = %recipe.name, "skipping recipe without ingredients");
                stats.skipped += 1;
                continue;
            }

            let mut ingredients = Recipe::new();
            for (name, quantity) in &recipe.ingredients {
                ingredients.insert(item_id_from_prototype(name), *quantity);
                ingredient_names.push(name.clone());
            }

            debug!(
                recipe = %recipe.name,
                item = %id,
                ingredients = ingredients.len(),
                "parsed recipe"
            );
            catalog.insert(
                id,
                ItemInfo::new(ingredients, producers_for_category(&recipe.category), recipe.time),
            );
            stats.recipes += 1;
        }
    }

    for name in ingredient_names {
        let id = item_id_from_prototype(&name);
        if !catalog.contains(&id) {
            catalog.insert(id, ItemInfo::new(Recipe::new(), producers_for_resource(&name), 0.0));
            stats.raw_items += 1;
        }
    }

    Ok((catalog, stats))
}

/// Extract all recipe data from prototype files and populate database
pub fn extract_to_database(conn: &mut Connection, prototype_dir: &Path) -> Result<ExtractStats> {
    let (catalog, stats) = extract_catalog(prototype_dir)?;
    db::store_catalog(conn, &catalog)?;
    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ExtractStats {
    pub files: usize,
    pub recipes: usize,
    pub raw_items: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ExtractStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Extracted {} recipes ({} raw items) from {} files. Skipped: {}, Errors: {}",
            self.recipes, self.raw_items, self.files, self.skipped, self.errors
        )
    }
}
