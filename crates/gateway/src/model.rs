//! Remote record shapes.

use domain::{ClientId, Money, ProductId};
use serde::{Deserialize, Serialize};

/// Current state of a customer as held by the customer directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub id: ClientId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub status: String,
}

impl CustomerSnapshot {
    /// Creates an active customer record.
    pub fn active(id: impl Into<ClientId>) -> Self {
        Self {
            id: id.into(),
            first_name: None,
            last_name: None,
            email: None,
            status: "ACTIVE".to_string(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    /// Returns true if the customer may place orders.
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("ACTIVE")
    }
}

/// Current state of a product as held by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    /// Unit price as a decimal amount.
    pub price: f64,
    pub stock: i64,
    pub available: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

impl ProductSnapshot {
    /// Creates an available product record.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: f64, stock: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock,
            available: true,
            category: None,
            sku: None,
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Returns the unit price in cents, or `None` if the catalog price is
    /// not a finite amount that fits the cent range.
    pub fn unit_price(&self) -> Option<Money> {
        Money::from_decimal(self.price)
    }

    /// Returns the unit price if it is a positive amount.
    pub fn sellable_price(&self) -> Option<Money> {
        self.unit_price().filter(Money::is_positive)
    }

    /// Returns true if the product is sellable at all.
    pub fn is_available(&self) -> bool {
        self.available && self.stock > 0
    }

    /// Returns true if at least `quantity` units are in stock.
    pub fn has_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity as i64
    }
}
