//! Product catalog records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use leafspring_crm_core::ProductId;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Steel grade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    /// Unit price; zero means "on request".
    #[serde(default)]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

struct CatalogEntry {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    spec: &'static str,
    thickness: &'static str,
    width: &'static str,
    description: &'static str,
}

const CATALOG: [CatalogEntry; 5] = [
    CatalogEntry {
        id: "P001",
        name: "Heavy truck leaf spring",
        category: "Heavy vehicle series",
        spec: "60Si2MnA",
        thickness: "12-20mm",
        width: "70-120mm",
        description: "For heavy trucks, high load capacity",
    },
    CatalogEntry {
        id: "P002",
        name: "Light truck leaf spring",
        category: "Light vehicle series",
        spec: "55Si2Mn",
        thickness: "8-14mm",
        width: "50-90mm",
        description: "For light trucks, good elasticity",
    },
    CatalogEntry {
        id: "P003",
        name: "Bus leaf spring",
        category: "Bus series",
        spec: "50CrVA",
        thickness: "10-16mm",
        width: "60-100mm",
        description: "For buses, ride comfort",
    },
    CatalogEntry {
        id: "P004",
        name: "Trailer leaf spring",
        category: "Trailer series",
        spec: "60Si2CrA",
        thickness: "12-22mm",
        width: "80-130mm",
        description: "For trailers, wear resistant",
    },
    CatalogEntry {
        id: "P005",
        name: "Engineering vehicle leaf spring",
        category: "Engineering vehicle series",
        spec: "55SiMnVB",
        thickness: "14-25mm",
        width: "90-140mm",
        description: "For engineering vehicles, very high load bearing",
    },
];

/// The catalog a fresh data file starts with.
#[must_use]
pub fn default_catalog() -> Vec<Product> {
    CATALOG
        .iter()
        .map(|entry| Product {
            id: ProductId::new(entry.id),
            name: entry.name.to_string(),
            category: Some(entry.category.to_string()),
            spec: Some(entry.spec.to_string()),
            thickness: Some(entry.thickness.to_string()),
            width: Some(entry.width.to_string()),
            price: Decimal::ZERO,
            unit: Some("ton".to_string()),
            description: Some(entry.description.to_string()),
            extra: Map::new(),
        })
        .collect()
}
