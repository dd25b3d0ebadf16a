//! Article Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog article
///
/// `upsell_tiers[i]` is the unit price applied when the order's upsell
/// threshold counter equals `i`. Unset tiers fall back to the next lower
/// configured tier, then to `base_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub name: String,
    pub base_price: Decimal,
    #[serde(default)]
    pub is_upsell: bool,
    #[serde(default)]
    pub upsell_tiers: Vec<Option<Decimal>>,
    /// Available quantity when no variant is referenced
    #[serde(default)]
    pub available_quantity: i64,
    #[serde(default)]
    pub variants: Vec<ArticleVariant>,
}

impl Article {
    pub fn variant(&self, variant_id: i64) -> Option<&ArticleVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    pub fn variant_mut(&mut self, variant_id: i64) -> Option<&mut ArticleVariant> {
        self.variants.iter_mut().find(|v| v.id == variant_id)
    }

    /// Available quantity for the stock slot (article or one of its variants)
    pub fn available(&self, variant_id: Option<i64>) -> Option<i64> {
        match variant_id {
            None => Some(self.available_quantity),
            Some(id) => self.variant(id).map(|v| v.available_quantity),
        }
    }
}

/// Article variant (size, color...). Holds its own stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleVariant {
    pub id: i64,
    pub label: String,
    #[serde(default)]
    pub available_quantity: i64,
}

/// Inventory slot key: the article, or one of its variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub article_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<i64>,
}

impl StockKey {
    pub fn new(article_id: i64, variant_id: Option<i64>) -> Self {
        Self {
            article_id,
            variant_id,
        }
    }
}

impl std::fmt::Display for StockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.variant_id {
            Some(v) => write!(f, "{}/{}", self.article_id, v),
            None => write!(f, "{}", self.article_id),
        }
    }
}
