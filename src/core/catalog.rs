//! Catalog index - the static category → subcategory → [server] → product tree.
//!
//! The tree comes from config.toml and is flattened once at startup into an id-keyed index.
//! Each entry keeps its ancestor chain so breadcrumbs and availability windows can be
//! resolved without walking the tree again. There are no mutation operations.

use crate::{
    config::shop::{AvailabilityConfig, CategoryConfig, ProductConfig},
    errors::{Error, Result},
};
use std::{collections::HashMap, fmt};

/// Node type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Top-level category
    Category,
    /// Second level
    Subcategory,
    /// Optional third level carrying an availability window
    Server,
    /// Purchasable leaf
    Product,
}

impl ItemKind {
    /// Lowercase tag, e.g. `"product"`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Subcategory => "subcategory",
            Self::Server => "server",
            Self::Product => "product",
        }
    }
}

/// Hour-of-day purchase window in the operator's local clock, `[start_hour, end_hour)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityWindow {
    /// Inclusive start hour
    pub start_hour: u32,
    /// Exclusive end hour
    pub end_hour: u32,
}

/// Where the current hour falls relative to a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Inside the window
    Open,
    /// Before the window opens today
    NotYetOpen,
    /// At or after the window end
    Closed,
}

impl AvailabilityWindow {
    /// Whether `hour` lies inside the window.
    #[must_use]
    pub const fn contains(self, hour: u32) -> bool {
        self.start_hour <= hour && hour < self.end_hour
    }

    /// Classifies `hour` relative to the window.
    #[must_use]
    pub const fn status_at(self, hour: u32) -> Availability {
        if hour < self.start_hour {
            Availability::NotYetOpen
        } else if hour >= self.end_hour {
            Availability::Closed
        } else {
            Availability::Open
        }
    }
}

impl fmt::Display for AvailabilityWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:00-{}:00", self.start_hour, self.end_hour)
    }
}

/// Identifier and display name of an ancestor node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    /// Node identifier
    pub id: String,
    /// Node display name
    pub name: String,
}

/// A resolved catalog node with its ancestor chain.
#[derive(Debug, Clone)]
pub struct CatalogItem {
    /// Node type
    pub kind: ItemKind,
    /// Globally unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Price, set for products only
    pub price: Option<f64>,
    /// Owning category (absent for categories themselves)
    pub category: Option<NodeRef>,
    /// Owning subcategory (servers and products)
    pub subcategory: Option<NodeRef>,
    /// Owning server (products sold through a server)
    pub server: Option<NodeRef>,
    /// Window inherited from the server, or the server's own window
    pub availability: Option<AvailabilityWindow>,
    /// Child ids in configuration order
    pub children: Vec<String>,
}

impl CatalogItem {
    /// Ancestor names joined with `" > "`, e.g. `"Games > Free Fire > Server 1"`.
    #[must_use]
    pub fn breadcrumb(&self) -> String {
        [&self.category, &self.subcategory, &self.server]
            .into_iter()
            .flatten()
            .map(|node| node.name.as_str())
            .collect::<Vec<_>>()
            .join(" > ")
    }

    /// Whether this node can be bought
    #[must_use]
    pub fn is_product(&self) -> bool {
        self.kind == ItemKind::Product
    }
}

/// Immutable id → node index over the whole tree
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: HashMap<String, CatalogItem>,
    roots: Vec<String>,
}

impl Catalog {
    /// Builds and validates the index from configured categories.
    ///
    /// # Errors
    /// Returns `Error::Config` when an id appears twice, a price is negative or not finite,
    /// or an availability window is empty or extends past hour 24.
    pub fn from_config(categories: &[CategoryConfig]) -> Result<Self> {
        let mut catalog = Self::default();

        for category in categories {
            let category_ref = node_ref(&category.id, &category.name);
            catalog.roots.push(category.id.clone());
            let mut category_item = item(ItemKind::Category, &category.id, &category.name);

            for sub in &category.subcategories {
                category_item.children.push(sub.id.clone());
                let sub_ref = node_ref(&sub.id, &sub.name);
                let mut sub_item = item(ItemKind::Subcategory, &sub.id, &sub.name);
                sub_item.category = Some(category_ref.clone());

                for server in &sub.servers {
                    sub_item.children.push(server.id.clone());
                    let window = server.availability.map(validate_window).transpose()?;
                    let server_ref = node_ref(&server.id, &server.name);
                    let mut server_item = item(ItemKind::Server, &server.id, &server.name);
                    server_item.category = Some(category_ref.clone());
                    server_item.subcategory = Some(sub_ref.clone());
                    server_item.availability = window;

                    for product in &server.products {
                        server_item.children.push(product.id.clone());
                        let mut product_item = product_node(product)?;
                        product_item.category = Some(category_ref.clone());
                        product_item.subcategory = Some(sub_ref.clone());
                        product_item.server = Some(server_ref.clone());
                        product_item.availability = window;
                        catalog.insert(product_item)?;
                    }
                    catalog.insert(server_item)?;
                }

                for product in &sub.products {
                    sub_item.children.push(product.id.clone());
                    let mut product_item = product_node(product)?;
                    product_item.category = Some(category_ref.clone());
                    product_item.subcategory = Some(sub_ref.clone());
                    catalog.insert(product_item)?;
                }
                catalog.insert(sub_item)?;
            }
            catalog.insert(category_item)?;
        }

        Ok(catalog)
    }

    fn insert(&mut self, item: CatalogItem) -> Result<()> {
        if self.items.contains_key(&item.id) {
            return Err(Error::Config {
                message: format!("Duplicate catalog id '{}'", item.id),
            });
        }
        self.items.insert(item.id.clone(), item);
        Ok(())
    }

    /// Looks up any node by id.
    #[must_use]
    pub fn find_by_id(&self, item_id: &str) -> Option<&CatalogItem> {
        self.items.get(item_id)
    }

    /// Looks up a product by id.
    ///
    /// # Errors
    /// Returns `Error::ProductNotFound` when the id is unknown or names a non-product node.
    pub fn find_product(&self, product_id: &str) -> Result<&CatalogItem> {
        self.find_by_id(product_id)
            .filter(|item| item.is_product())
            .ok_or_else(|| Error::ProductNotFound {
                id: product_id.to_string(),
            })
    }

    /// The availability window restricting a product, if its server has one.
    #[must_use]
    pub fn get_availability_window(&self, product_id: &str) -> Option<AvailabilityWindow> {
        self.find_by_id(product_id)
            .filter(|item| item.is_product())
            .and_then(|item| item.availability)
    }

    /// Top-level categories in configuration order.
    pub fn categories(&self) -> impl Iterator<Item = &CatalogItem> {
        self.roots.iter().filter_map(|id| self.items.get(id))
    }

    /// Direct children of a node in configuration order; empty for unknown ids and products.
    #[must_use]
    pub fn children(&self, item_id: &str) -> Vec<&CatalogItem> {
        self.find_by_id(item_id)
            .map(|item| {
                item.children
                    .iter()
                    .filter_map(|id| self.items.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All products, in no particular order.
    pub fn products(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.values().filter(|item| item.is_product())
    }

    /// Number of indexed nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn node_ref(id: &str, name: &str) -> NodeRef {
    NodeRef {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn item(kind: ItemKind, id: &str, name: &str) -> CatalogItem {
    CatalogItem {
        kind,
        id: id.to_string(),
        name: name.to_string(),
        price: None,
        category: None,
        subcategory: None,
        server: None,
        availability: None,
        children: Vec::new(),
    }
}

fn product_node(product: &ProductConfig) -> Result<CatalogItem> {
    if !product.price.is_finite() || product.price < 0.0 {
        return Err(Error::Config {
            message: format!("Product '{}' has invalid price {}", product.id, product.price),
        });
    }
    let mut node = item(ItemKind::Product, &product.id, &product.name);
    node.price = Some(product.price);
    Ok(node)
}

fn validate_window(window: AvailabilityConfig) -> Result<AvailabilityWindow> {
    if window.start_hour >= window.end_hour || window.end_hour > 24 {
        return Err(Error::Config {
            message: format!(
                "Invalid availability window {}..{}",
                window.start_hour, window.end_hour
            ),
        });
    }
    Ok(AvailabilityWindow {
        start_hour: window.start_hour,
        end_hour: window.end_hour,
    })
}
