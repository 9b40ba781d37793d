//! Closed tenant-category taxonomy.
//!
//! The upstream corpus stores tenant categories as free text. Everything in
//! the engine works over this fixed set instead; [`Category::from_label`]
//! folds raw labels into it, and operators can extend the mapping with a
//! YAML alias file without a code change. Unmapped labels become
//! [`Category::Other`] so a noisy corpus can never fail snapshot loading.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Fashion,
    FoodAndBeverage,
    Grocery,
    HealthAndBeauty,
    HomeAndGarden,
    ElectronicsAndTechnology,
    EntertainmentAndLeisure,
    SportsAndOutdoors,
    JewelleryAndAccessories,
    DepartmentStore,
    Services,
    Other,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Fashion,
        Category::FoodAndBeverage,
        Category::Grocery,
        Category::HealthAndBeauty,
        Category::HomeAndGarden,
        Category::ElectronicsAndTechnology,
        Category::EntertainmentAndLeisure,
        Category::SportsAndOutdoors,
        Category::JewelleryAndAccessories,
        Category::DepartmentStore,
        Category::Services,
        Category::Other,
    ];

    /// Human-readable name used in rationales and spoken replies.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Fashion => "Fashion",
            Category::FoodAndBeverage => "Food & Beverage",
            Category::Grocery => "Grocery",
            Category::HealthAndBeauty => "Health & Beauty",
            Category::HomeAndGarden => "Home & Garden",
            Category::ElectronicsAndTechnology => "Electronics & Technology",
            Category::EntertainmentAndLeisure => "Entertainment & Leisure",
            Category::SportsAndOutdoors => "Sports & Outdoors",
            Category::JewelleryAndAccessories => "Jewellery & Accessories",
            Category::DepartmentStore => "Department Store",
            Category::Services => "Services",
            Category::Other => "Other",
        }
    }

    /// Canonical slug, matching the serde representation.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Category::Fashion => "fashion",
            Category::FoodAndBeverage => "food-and-beverage",
            Category::Grocery => "grocery",
            Category::HealthAndBeauty => "health-and-beauty",
            Category::HomeAndGarden => "home-and-garden",
            Category::ElectronicsAndTechnology => "electronics-and-technology",
            Category::EntertainmentAndLeisure => "entertainment-and-leisure",
            Category::SportsAndOutdoors => "sports-and-outdoors",
            Category::JewelleryAndAccessories => "jewellery-and-accessories",
            Category::DepartmentStore => "department-store",
            Category::Services => "services",
            Category::Other => "other",
        }
    }

    fn from_slug(slug: &str) -> Option<Self> {
        Category::ALL.iter().copied().find(|c| c.slug() == slug)
    }

    /// Fold a free-text category label into the closed taxonomy.
    ///
    /// Matching is over a lowercased, trimmed label: first the canonical
    /// slugs, then caller-supplied aliases, then the built-in alias table.
    /// Anything unrecognised maps to [`Category::Other`].
    #[must_use]
    pub fn from_label(label: &str, aliases: &CategoryAliases) -> Self {
        let key = label.trim().to_lowercase();
        if key.is_empty() {
            return Category::Other;
        }
        if let Some(c) = Category::from_slug(&key) {
            return c;
        }
        if let Some(c) = aliases.lookup(&key) {
            return c;
        }
        builtin_alias(&key).unwrap_or(Category::Other)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Labels seen in real shopping-centre directories, folded to the taxonomy.
fn builtin_alias(key: &str) -> Option<Category> {
    let category = match key {
        "clothing" | "clothes" | "apparel" | "womenswear" | "menswear" | "childrenswear"
        | "footwear" | "shoes" | "lingerie" => Category::Fashion,
        "food" | "restaurant" | "restaurants" | "cafe" | "coffee" | "coffee shop"
        | "fast food" | "food & drink" | "food and drink" | "dining" | "takeaway"
        | "bakery" => Category::FoodAndBeverage,
        "supermarket" | "groceries" | "convenience" | "food store" => Category::Grocery,
        "beauty" | "health" | "pharmacy" | "chemist" | "cosmetics" | "hairdresser"
        | "opticians" | "optician" => Category::HealthAndBeauty,
        "home" | "homeware" | "homewares" | "furniture" | "diy" | "garden"
        | "garden centre" | "kitchenware" => Category::HomeAndGarden,
        "electronics" | "technology" | "tech" | "mobile" | "mobile phones" | "computing"
        | "gadgets" => Category::ElectronicsAndTechnology,
        "entertainment" | "leisure" | "cinema" | "bowling" | "toys" | "games" | "gaming"
        | "books" | "music" => Category::EntertainmentAndLeisure,
        "sports" | "sport" | "sportswear" | "outdoor" | "outdoors" | "fitness" | "gym" => {
            Category::SportsAndOutdoors
        }
        "jewellery" | "jewelry" | "jeweller" | "accessories" | "watches" | "handbags" => {
            Category::JewelleryAndAccessories
        }
        "department store" | "variety store" => Category::DepartmentStore,
        "services" | "bank" | "banking" | "travel agent" | "travel" | "post office"
        | "phone repair" | "dry cleaning" => Category::Services,
        _ => return None,
    };
    Some(category)
}

/// Operator-supplied label → category overrides, keyed by lowercased label.
#[derive(Debug, Clone, Default)]
pub struct CategoryAliases {
    map: HashMap<String, Category>,
}

impl CategoryAliases {
    fn lookup(&self, key: &str) -> Option<Category> {
        self.map.get(key).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct AliasFile {
    aliases: Vec<AliasEntry>,
}

#[derive(Debug, Deserialize)]
struct AliasEntry {
    label: String,
    category: String,
}

/// Load and validate category alias overrides from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, an alias
/// names an unknown category, or the same label is mapped twice.
pub fn load_category_aliases(path: &Path) -> Result<CategoryAliases, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::AliasFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_category_aliases(&content)
}

/// Parse and validate alias YAML already in memory.
///
/// # Errors
///
/// Same conditions as [`load_category_aliases`], minus file I/O.
pub fn parse_category_aliases(content: &str) -> Result<CategoryAliases, ConfigError> {
    let file: AliasFile = serde_yaml::from_str(content)?;

    let mut map = HashMap::new();
    for entry in file.aliases {
        let label = entry.label.trim().to_lowercase();
        if label.is_empty() {
            return Err(ConfigError::Validation(
                "alias label must be non-empty".to_string(),
            ));
        }
        let Some(category) = Category::from_slug(entry.category.trim()) else {
            return Err(ConfigError::Validation(format!(
                "alias '{}' names unknown category '{}'",
                entry.label, entry.category
            )));
        };
        if map.insert(label, category).is_some() {
            return Err(ConfigError::Validation(format!(
                "duplicate alias label: '{}'",
                entry.label
            )));
        }
    }

    Ok(CategoryAliases { map })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_matches_serde_representation() {
        for c in Category::ALL {
            let json = serde_json::to_string(&c).unwrap();
            assert_eq!(json, format!("\"{}\"", c.slug()));
        }
    }

    #[test]
    fn from_label_accepts_canonical_slug() {
        let aliases = CategoryAliases::default();
        assert_eq!(
            Category::from_label("food-and-beverage", &aliases),
            Category::FoodAndBeverage
        );
    }

    #[test]
    fn from_label_folds_builtin_aliases() {
        let aliases = CategoryAliases::default();
        assert_eq!(Category::from_label("Womenswear", &aliases), Category::Fashion);
        assert_eq!(Category::from_label("  CINEMA ", &aliases), Category::EntertainmentAndLeisure);
        assert_eq!(Category::from_label("Chemist", &aliases), Category::HealthAndBeauty);
    }

    #[test]
    fn from_label_unknown_falls_back_to_other() {
        let aliases = CategoryAliases::default();
        assert_eq!(Category::from_label("zorbing", &aliases), Category::Other);
        assert_eq!(Category::from_label("", &aliases), Category::Other);
    }

    #[test]
    fn operator_aliases_take_priority_over_builtin() {
        let mut map = HashMap::new();
        map.insert("books".to_string(), Category::Services);
        let aliases = CategoryAliases { map };
        assert_eq!(Category::from_label("books", &aliases), Category::Services);
    }

    #[test]
    fn alias_file_rejects_unknown_category() {
        let yaml = "aliases:\n  - label: nails\n    category: nail-bars\n";
        let err = parse_category_aliases(yaml).unwrap_err();
        assert!(err.to_string().contains("unknown category"));
    }

    #[test]
    fn alias_file_rejects_duplicate_label() {
        let yaml = "aliases:\n\
                    \x20 - label: nails\n\
                    \x20   category: health-and-beauty\n\
                    \x20 - label: Nails\n\
                    \x20   category: services\n";
        let err = parse_category_aliases(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate alias label"));
    }

    #[test]
    fn alias_file_parses_valid_entries() {
        let yaml = "aliases:\n\
                    \x20 - label: Vape Shop\n\
                    \x20   category: services\n";
        let aliases = parse_category_aliases(yaml).unwrap();
        assert_eq!(aliases.len(), 1);
        assert_eq!(Category::from_label("vape shop", &aliases), Category::Services);
    }
}
