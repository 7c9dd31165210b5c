//! Menu catalog: the read-only view the dialogue needs, plus a JSON file
//! backed implementation with simple editing operations.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CatalogError;
use crate::model::{Category, Menu, MenuItem};

/// Read access to the menu.
pub trait MenuCatalog: Send + Sync {
    fn all_items(&self) -> Result<Vec<MenuItem>, CatalogError>;

    fn items_by_category(&self, category: Category) -> Result<Vec<MenuItem>, CatalogError>;

    fn ordering_info_text(&self) -> Result<String, CatalogError>;

    /// The whole menu structure, for clients that render it themselves.
    fn menu_snapshot(&self) -> Result<Menu, CatalogError>;
}

/// Outcome of an editing operation: success flag plus a message for the caller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CatalogOutcome {
    pub success: bool,
    pub message: String,
}

impl From<Result<String, CatalogError>> for CatalogOutcome {
    fn from(result: Result<String, CatalogError>) -> Self {
        match result {
            Ok(message) => Self {
                success: true,
                message,
            },
            Err(e) => Self {
                success: false,
                message: e.to_string(),
            },
        }
    }
}

/// Partial update for an existing item.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub price: Option<u32>,
    pub description: Option<String>,
}

/// Catalog kept in memory and written back to a JSON file on every edit.
pub struct JsonMenuCatalog {
    path: Option<PathBuf>,
    menu: RwLock<Menu>,
}

impl JsonMenuCatalog {
    /// Loads `path`. A missing or unreadable file yields an empty menu whose
    /// ordering info explains the problem; edits will recreate the file.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let menu = Self::load_or_empty(&path);
        Self {
            path: Some(path),
            menu: RwLock::new(menu),
        }
    }

    /// A catalog that lives only in memory; edits never touch disk.
    pub fn from_menu(mut menu: Menu) -> Self {
        menu.assign_categories();
        Self {
            path: None,
            menu: RwLock::new(menu),
        }
    }

    fn load_or_empty(path: &Path) -> Menu {
        if !path.exists() {
            log::error!("Menu data file not found at {:?}", path);
            return Menu::with_order_info("Menu data not available.");
        }
        match Menu::load_from_file(path) {
            Ok(menu) => {
                log::info!("Loaded {} menu items from {:?}", menu.all_items().len(), path);
                menu
            }
            Err(e) => {
                log::error!("Failed to read menu data: {:#}", e);
                Menu::with_order_info("Menu data corrupted.")
            }
        }
    }

    /// Re-reads the backing file, replacing the in-memory menu.
    pub fn reload(&self) {
        if let Some(path) = &self.path {
            *self.menu.write() = Self::load_or_empty(path);
        }
    }

    fn save(&self, menu: &Menu) -> Result<(), CatalogError> {
        match &self.path {
            Some(path) => menu.save_to_file(path),
            None => Ok(()),
        }
    }

    pub fn find_item(&self, item_id: &str) -> Option<MenuItem> {
        self.menu.read().find_by_id(item_id).cloned()
    }

    pub fn add_item(
        &self,
        category: Category,
        name: &str,
        price: u32,
        description: &str,
    ) -> CatalogOutcome {
        self.try_add_item(category, name, price, description).into()
    }

    fn try_add_item(
        &self,
        category: Category,
        name: &str,
        price: u32,
        description: &str,
    ) -> Result<String, CatalogError> {
        let mut menu = self.menu.write();
        let duplicate = menu
            .items(category)
            .iter()
            .any(|i| i.name.to_lowercase() == name.to_lowercase());
        if duplicate {
            return Err(CatalogError::DuplicateName {
                name: name.to_string(),
                category: category.to_string(),
            });
        }

        let item = MenuItem::new(generate_item_id(category), name, price, description, category)?;
        let item_id = item.id.clone();
        menu.items_mut(category).push(item);
        if let Err(e) = self.save(&menu) {
            menu.items_mut(category).pop();
            log::error!("Failed to save menu after adding '{}': {}", name, e);
            return Err(e);
        }
        log::info!("Added menu item {} ({}) to {}", item_id, name, category);
        Ok(item_id)
    }

    pub fn update_item(&self, item_id: &str, update: ItemUpdate) -> CatalogOutcome {
        self.try_update_item(item_id, update)
            .map(|_| "Item successfully updated.".to_string())
            .into()
    }

    fn try_update_item(&self, item_id: &str, update: ItemUpdate) -> Result<(), CatalogError> {
        let mut menu = self.menu.write();
        let (category, index) = locate(&menu, item_id)
            .ok_or_else(|| CatalogError::NotFound(item_id.to_string()))?;

        if let Some(new_name) = &update.name {
            if new_name.trim().is_empty() {
                return Err(CatalogError::InvalidItem("item name must not be empty".into()));
            }
            let clash = menu.items(category).iter().any(|i| {
                i.id != item_id && i.name.to_lowercase() == new_name.to_lowercase()
            });
            if clash {
                return Err(CatalogError::DuplicateName {
                    name: new_name.clone(),
                    category: category.to_string(),
                });
            }
        }

        let previous = menu.items(category)[index].clone();
        {
            let item = &mut menu.items_mut(category)[index];
            if let Some(name) = update.name {
                item.name = name;
            }
            if let Some(price) = update.price {
                item.price = price;
            }
            if let Some(description) = update.description {
                item.description = description;
            }
        }
        if let Err(e) = self.save(&menu) {
            menu.items_mut(category)[index] = previous;
            log::error!("Failed to save menu after updating {}: {}", item_id, e);
            return Err(e);
        }
        Ok(())
    }

    pub fn delete_item(&self, item_id: &str) -> CatalogOutcome {
        self.try_delete_item(item_id)
            .map(|_| "Item successfully deleted.".to_string())
            .into()
    }

    fn try_delete_item(&self, item_id: &str) -> Result<(), CatalogError> {
        let mut menu = self.menu.write();
        let (category, index) = locate(&menu, item_id)
            .ok_or_else(|| CatalogError::NotFound(item_id.to_string()))?;
        let removed = menu.items_mut(category).remove(index);
        if let Err(e) = self.save(&menu) {
            menu.items_mut(category).insert(index, removed);
            log::error!("Failed to save menu after deleting {}: {}", item_id, e);
            return Err(e);
        }
        Ok(())
    }

    pub fn update_ordering_info(&self, new_info: &str) -> CatalogOutcome {
        let mut menu = self.menu.write();
        let previous = std::mem::replace(&mut menu.order_info, new_info.to_string());
        let result = match self.save(&menu) {
            Ok(()) => Ok("Ordering info successfully updated.".to_string()),
            Err(e) => {
                menu.order_info = previous;
                log::error!("Failed to save ordering info: {}", e);
                Err(e)
            }
        };
        result.into()
    }
}

impl MenuCatalog for JsonMenuCatalog {
    fn all_items(&self) -> Result<Vec<MenuItem>, CatalogError> {
        Ok(self.menu.read().all_items())
    }

    fn items_by_category(&self, category: Category) -> Result<Vec<MenuItem>, CatalogError> {
        Ok(self.menu.read().items(category).to_vec())
    }

    fn ordering_info_text(&self) -> Result<String, CatalogError> {
        Ok(self.menu.read().order_info.clone())
    }

    fn menu_snapshot(&self) -> Result<Menu, CatalogError> {
        Ok(self.menu.read().clone())
    }
}

fn locate(menu: &Menu, item_id: &str) -> Option<(Category, usize)> {
    Category::ALL.into_iter().find_map(|category| {
        menu.items(category)
            .iter()
            .position(|i| i.id == item_id)
            .map(|index| (category, index))
    })
}

/// `<category initial>_<6 hex chars>`, e.g. `P_1A2B3C`.
///
/// Categories sharing an initial share a prefix; uniqueness rests on the
/// random part.
pub fn generate_item_id(category: Category) -> String {
    let prefix = category
        .key()
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('I');
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, random[..6].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_menu() -> Menu {
        let mut menu = Menu::with_order_info("Order at the counter.");
        menu.iced_coffee.push(
            MenuItem::new("I_1", "Iced Coffee", 18_000, "Cold and strong", Category::IcedCoffee)
                .unwrap(),
        );
        menu.pastry
            .push(MenuItem::new("P_1", "Croissant", 15_000, "Buttery", Category::Pastry).unwrap());
        menu
    }

    #[test]
    fn test_read_operations() {
        let catalog = JsonMenuCatalog::from_menu(sample_menu());
        assert_eq!(catalog.all_items().unwrap().len(), 2);
        assert_eq!(catalog.items_by_category(Category::Pastry).unwrap()[0].name, "Croissant");
        assert!(catalog.items_by_category(Category::NonCoffee).unwrap().is_empty());
        assert_eq!(catalog.ordering_info_text().unwrap(), "Order at the counter.");
    }

    #[test]
    fn test_missing_file_gives_empty_menu() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = JsonMenuCatalog::open(dir.path().join("missing.json"));
        assert!(catalog.all_items().unwrap().is_empty());
        assert_eq!(catalog.ordering_info_text().unwrap(), "Menu data not available.");
    }

    #[test]
    fn test_corrupt_file_gives_empty_menu() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu.json");
        std::fs::write(&path, "{ not json").unwrap();
        let catalog = JsonMenuCatalog::open(&path);
        assert!(catalog.all_items().unwrap().is_empty());
        assert_eq!(catalog.ordering_info_text().unwrap(), "Menu data corrupted.");
    }

    #[test]
    fn test_add_update_delete_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu.json");
        sample_menu().save_to_file(&path).unwrap();
        let catalog = JsonMenuCatalog::open(&path);

        let added = catalog.add_item(Category::Pastry, "Pain au Chocolat", 21_000, "Flaky");
        assert!(added.success, "{}", added.message);
        let new_id = added.message.clone();
        assert!(new_id.starts_with("P_"));
        assert_eq!(new_id.len(), 8);

        let dup = catalog.add_item(Category::Pastry, "croissant", 1, "");
        assert!(!dup.success);

        let updated = catalog.update_item(
            &new_id,
            ItemUpdate {
                price: Some(22_000),
                ..Default::default()
            },
        );
        assert!(updated.success);

        let reopened = JsonMenuCatalog::open(&path);
        let item = reopened.find_item(&new_id).unwrap();
        assert_eq!(item.price, 22_000);
        assert_eq!(item.category, Category::Pastry);

        assert!(reopened.delete_item(&new_id).success);
        assert!(!reopened.delete_item(&new_id).success);
        assert!(JsonMenuCatalog::open(&path).find_item(&new_id).is_none());
    }

    #[test]
    fn test_update_rejects_duplicate_name() {
        let mut menu = sample_menu();
        menu.pastry
            .push(MenuItem::new("P_2", "Bagel", 12_000, "", Category::Pastry).unwrap());
        let catalog = JsonMenuCatalog::from_menu(menu);
        let outcome = catalog.update_item(
            "P_2",
            ItemUpdate {
                name: Some("Croissant".into()),
                ..Default::default()
            },
        );
        assert!(!outcome.success);
        assert_eq!(catalog.find_item("P_2").unwrap().name, "Bagel");
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        // The backing path is a directory, so every write fails.
        let catalog = JsonMenuCatalog {
            path: Some(dir.path().to_path_buf()),
            menu: RwLock::new(sample_menu()),
        };

        let outcome = catalog.add_item(Category::Pastry, "Bagel", 12_000, "");
        assert!(!outcome.success);
        assert_eq!(catalog.items_by_category(Category::Pastry).unwrap().len(), 1);

        assert!(!catalog.delete_item("P_1").success);
        assert!(catalog.find_item("P_1").is_some());

        assert!(!catalog.update_ordering_info("new info").success);
        assert_eq!(catalog.ordering_info_text().unwrap(), "Order at the counter.");
    }
}
