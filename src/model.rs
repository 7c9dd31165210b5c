use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

const MISSING_ORDER_INFO: &str = "Ordering information not available.";

/// Menu sections, in the order they are displayed and searched.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    IcedCoffee,
    NonCoffee,
    EspressoBased,
    Refreshment,
    #[default]
    Others,
    Pastry,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::IcedCoffee,
        Category::NonCoffee,
        Category::EspressoBased,
        Category::Refreshment,
        Category::Others,
        Category::Pastry,
    ];

    /// The key used in the menu file and the HTTP API.
    pub fn key(self) -> &'static str {
        match self {
            Category::IcedCoffee => "iced_coffee",
            Category::NonCoffee => "non_coffee",
            Category::EspressoBased => "espresso_based",
            Category::Refreshment => "refreshment",
            Category::Others => "others",
            Category::Pastry => "pastry",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Category::IcedCoffee => "Iced Coffee",
            Category::NonCoffee => "Non Coffee",
            Category::EspressoBased => "Espresso Based",
            Category::Refreshment => "Refreshment",
            Category::Others => "Others",
            Category::Pastry => "Pastry",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Category::IcedCoffee => "☕",
            Category::NonCoffee => "🍵",
            Category::EspressoBased => "🫕",
            Category::Refreshment => "🍸",
            Category::Others => "🥤",
            Category::Pastry => "🥐",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace([' ', '-'], "_");
        Category::ALL
            .into_iter()
            .find(|c| c.key() == wanted)
            .ok_or_else(|| CatalogError::UnknownCategory(s.to_string()))
    }
}

/// A single sellable item. Prices are whole currency units.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub price: u32,
    #[serde(default)]
    pub description: String,
    /// Filled in from the list the item is stored under when a menu is loaded.
    #[serde(default)]
    pub category: Category,
}

impl MenuItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: u32,
        description: impl Into<String>,
        category: Category,
    ) -> Result<Self, CatalogError> {
        let id = id.into();
        let name = name.into();
        if id.trim().is_empty() {
            return Err(CatalogError::InvalidItem("item id must not be empty".into()));
        }
        if name.trim().is_empty() {
            return Err(CatalogError::InvalidItem(format!(
                "item '{}' must have a name",
                id
            )));
        }
        Ok(Self {
            id,
            name,
            price,
            description: description.into(),
            category,
        })
    }
}

fn default_order_info() -> String {
    MISSING_ORDER_INFO.to_string()
}

/// The full menu as stored in the menu file: one list per category plus a
/// free-text ordering information blurb.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Menu {
    #[serde(default)]
    pub iced_coffee: Vec<MenuItem>,
    #[serde(default)]
    pub non_coffee: Vec<MenuItem>,
    #[serde(default)]
    pub espresso_based: Vec<MenuItem>,
    #[serde(default)]
    pub refreshment: Vec<MenuItem>,
    #[serde(default)]
    pub others: Vec<MenuItem>,
    #[serde(default)]
    pub pastry: Vec<MenuItem>,
    #[serde(default = "default_order_info")]
    pub order_info: String,
}

impl Default for Menu {
    fn default() -> Self {
        Self::with_order_info(MISSING_ORDER_INFO)
    }
}

impl Menu {
    pub fn with_order_info(order_info: impl Into<String>) -> Self {
        Self {
            iced_coffee: Vec::new(),
            non_coffee: Vec::new(),
            espresso_based: Vec::new(),
            refreshment: Vec::new(),
            others: Vec::new(),
            pastry: Vec::new(),
            order_info: order_info.into(),
        }
    }

    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let menu_json = std::fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read menu file {:?}", path_ref))?;
        let mut menu: Menu = serde_json::from_str(&menu_json)
            .with_context(|| format!("Failed to parse menu file {:?}", path_ref))?;
        menu.assign_categories();
        Ok(menu)
    }

    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), CatalogError> {
        let menu_json = serde_json::to_string_pretty(&self)?;
        std::fs::write(path, menu_json)?;
        Ok(())
    }

    pub fn items(&self, category: Category) -> &[MenuItem] {
        match category {
            Category::IcedCoffee => &self.iced_coffee,
            Category::NonCoffee => &self.non_coffee,
            Category::EspressoBased => &self.espresso_based,
            Category::Refreshment => &self.refreshment,
            Category::Others => &self.others,
            Category::Pastry => &self.pastry,
        }
    }

    pub fn items_mut(&mut self, category: Category) -> &mut Vec<MenuItem> {
        match category {
            Category::IcedCoffee => &mut self.iced_coffee,
            Category::NonCoffee => &mut self.non_coffee,
            Category::EspressoBased => &mut self.espresso_based,
            Category::Refreshment => &mut self.refreshment,
            Category::Others => &mut self.others,
            Category::Pastry => &mut self.pastry,
        }
    }

    /// Every item, category by category in display order.
    pub fn all_items(&self) -> Vec<MenuItem> {
        Category::ALL
            .into_iter()
            .flat_map(|c| self.items(c).iter().cloned())
            .collect()
    }

    pub fn find_by_id(&self, item_id: &str) -> Option<&MenuItem> {
        Category::ALL
            .into_iter()
            .flat_map(|c| self.items(c).iter())
            .find(|item| item.id == item_id)
    }

    /// Stamps each item with the category of the list it lives in.
    pub fn assign_categories(&mut self) {
        for category in Category::ALL {
            for item in self.items_mut(category) {
                item.category = category;
            }
        }
    }
}
