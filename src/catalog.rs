//! Read-only recipe catalog keyed by item identifier

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{GraphError, Result};
use crate::models::{ItemId, ItemInfo, Recipe};

/// The closed set of items a graph can be built from.
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    items: IndexMap<ItemId, Arc<ItemInfo>>,
}

impl RecipeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for an item
    pub fn insert(&mut self, id: ItemId, info: ItemInfo) {
        self.items.insert(id, Arc::new(info));
    }

    /// Shorthand used by the sample catalog and tests
    pub fn define(
        &mut self,
        id: &str,
        ingredients: &[(&str, u32)],
        producers: &[&str],
        time: f64,
    ) -> &mut Self {
        let recipe: Recipe = ingredients
            .iter()
            .map(|(name, qty)| (ItemId::from(*name), *qty))
            .collect();
        let producers = producers.iter().map(|p| p.to_string()).collect();
        self.insert(ItemId::from(id), ItemInfo::new(recipe, producers, time));
        self
    }

    pub fn get(&self, id: &ItemId) -> Option<&Arc<ItemInfo>> {
        self.items.get(id)
    }

    /// Look up an item, failing with `UnknownItem` if it is not in the catalog
    pub fn info(&self, id: &ItemId) -> Result<&Arc<ItemInfo>> {
        self.items
            .get(id)
            .ok_or_else(|| GraphError::UnknownItem(id.clone()))
    }

    /// Resolve a user-supplied name to a catalog identifier
    pub fn lookup(&self, name: &str) -> Result<ItemId> {
        self.items
            .get_key_value(name)
            .map(|(id, _)| id.clone())
            .ok_or_else(|| GraphError::UnknownItem(ItemId::from(name)))
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = (&ItemId, &Arc<ItemInfo>)> {
        self.items.iter()
    }

    pub fn raw_items(&self) -> impl Iterator<Item = &ItemId> {
        self.items
            .iter()
            .filter(|(_, info)| info.is_raw())
            .map(|(id, _)| id)
    }

    pub fn producible_items(&self) -> impl Iterator<Item = &ItemId> {
        self.items
            .iter()
            .filter(|(_, info)| !info.is_raw())
            .map(|(id, _)| id)
    }

    /// Check that every ingredient named by a recipe is itself in the catalog
    pub fn check(&self) -> Result<()> {
        for (id, info) in &self.items {
            if let Some(missing) = info.ingredients().find(|ing| !self.contains(ing)) {
                return Err(GraphError::UnknownIngredient {
                    item: id.clone(),
                    ingredient: missing.clone(),
                });
            }
        }
        Ok(())
    }

    /// Early-game catalog usable without an extracted database
    pub fn sample() -> Self {
        const MINERS: &[&str] = &["BurnerMiningDrill", "ElectricMiningDrill"];
        const FURNACES: &[&str] = &["StoneFurnace", "SteelFurnace", "ElectricFurnace"];
        const ASSEMBLERS: &[&str] = &["AssemblingMachine1", "AssemblingMachine2", "AssemblingMachine3"];

        let mut catalog = Self::new();
        catalog
            .define("IronOre", &[], MINERS, 1.0)
            .define("CopperOre", &[], MINERS, 1.0)
            .define("Stone", &[], MINERS, 1.0)
            .define("Coal", &[], MINERS, 1.0)
            .define("Wood", &[], &[], 0.5)
            .define("Water", &[], &["OffshorePump"], 1.0)
            .define("CrudeOil", &[], &["Pumpjack"], 1.0)
            .define("IronPlate", &[("IronOre", 1)], FURNACES, 3.2)
            .define("CopperPlate", &[("CopperOre", 1)], FURNACES, 3.2)
            .define("StoneBrick", &[("Stone", 2)], FURNACES, 3.2)
            .define("SteelPlate", &[("IronPlate", 5)], FURNACES, 16.0)
            .define("IronGearWheel", &[("IronPlate", 2)], ASSEMBLERS, 0.5)
            .define("IronStick", &[("IronPlate", 1)], ASSEMBLERS, 0.5)
            .define("CopperCable", &[("CopperPlate", 1)], ASSEMBLERS, 0.5)
            .define("Pipe", &[("IronPlate", 1)], ASSEMBLERS, 0.5)
            .define(
                "ElectronicCircuit",
                &[("IronPlate", 1), ("CopperCable", 3)],
                ASSEMBLERS,
                0.5,
            )
            .define("PetroleumGas", &[("CrudeOil", 100)], &["OilRefinery"], 5.0)
            .define(
                "PlasticBar",
                &[("PetroleumGas", 20), ("Coal", 1)],
                &["ChemicalPlant"],
                1.0,
            )
            .define(
                "AdvancedCircuit",
                &[("ElectronicCircuit", 2), ("PlasticBar", 2), ("CopperCable", 4)],
                ASSEMBLERS,
                6.0,
            )
            .define(
                "TransportBelt",
                &[("IronPlate", 1), ("IronGearWheel", 1)],
                ASSEMBLERS,
                0.5,
            )
            .define(
                "BurnerInserter",
                &[("IronPlate", 1), ("IronGearWheel", 1)],
                ASSEMBLERS,
                0.5,
            )
            .define(
                "Inserter",
                &[("ElectronicCircuit", 1), ("IronGearWheel", 1), ("IronPlate", 1)],
                ASSEMBLERS,
                0.5,
            )
            .define("WoodenChest", &[("Wood", 4)], ASSEMBLERS, 0.5)
            .define("IronChest", &[("IronPlate", 8)], ASSEMBLERS, 0.5)
            .define("StoneFurnace", &[("Stone", 5)], ASSEMBLERS, 0.5)
            .define(
                "SmallElectricPole",
                &[("Wood", 2), ("CopperCable", 2)],
                ASSEMBLERS,
                0.5,
            )
            .define(
                "SciencePack1",
                &[("CopperPlate", 1), ("IronGearWheel", 1)],
                ASSEMBLERS,
                5.0,
            )
            .define(
                "SciencePack2",
                &[("Inserter", 1), ("TransportBelt", 1)],
                ASSEMBLERS,
                6.0,
            );
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_catalog_is_consistent() {
        let catalog = RecipeCatalog::sample();
        catalog.check().unwrap();
        assert!(catalog.len() > 20);
    }

    #[test]
    fn raw_and_producible_items_partition_the_catalog() {
        let catalog = RecipeCatalog::sample();
        let raw: Vec<_> = catalog.raw_items().map(ItemId::as_str).collect();
        assert!(raw.contains(&"IronOre"));
        assert!(!raw.contains(&"IronPlate"));
        assert_eq!(
            catalog.raw_items().count() + catalog.producible_items().count(),
            catalog.len()
        );
    }

    #[test]
    fn check_reports_dangling_ingredient() {
        let mut catalog = RecipeCatalog::new();
        catalog.define("IronPlate", &[("IronOre", 1)], &[], 3.2);

        let err = catalog.check().unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownIngredient {
                item: "IronPlate".into(),
                ingredient: "IronOre".into(),
            }
        );
    }

    #[test]
    fn lookup_unknown_name_fails() {
        let catalog = RecipeCatalog::sample();
        assert_eq!(catalog.lookup("IronPlate").unwrap(), ItemId::from("IronPlate"));
        assert!(matches!(
            catalog.lookup("Unobtainium"),
            Err(GraphError::UnknownItem(_))
        ));
    }
}
