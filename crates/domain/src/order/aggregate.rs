//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{Actor, OrderId, OrderItemId, Version};
use serde::{Deserialize, Serialize};

use super::{
    ClientId, MAX_COMMENT_LENGTH, MAX_PRODUCT_NAME_LENGTH, Money, OrderError, OrderStatus,
    ProductId,
};

/// A line of an order.
///
/// Product name and unit price are copied from the catalog when the order is
/// created and never follow later catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    id: Option<OrderItemId>,
    product_id: ProductId,
    product_name: String,
    quantity: u32,
    unit_price: Money,
    line_total: Money,
    version: Version,
}

impl OrderItem {
    /// Creates a new, not yet persisted, order line.
    ///
    /// Names longer than [`MAX_PRODUCT_NAME_LENGTH`] characters are cut.
    /// Fails with [`OrderError::AmountOverflow`] when the line total does not
    /// fit the amount range.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, OrderError> {
        let line_total = unit_price
            .checked_multiply(quantity)
            .ok_or(OrderError::AmountOverflow { product_id })?;

        let mut product_name = product_name.into();
        if let Some((cut, _)) = product_name.char_indices().nth(MAX_PRODUCT_NAME_LENGTH) {
            product_name.truncate(cut);
        }

        Ok(Self {
            id: None,
            product_id,
            product_name,
            quantity,
            unit_price,
            line_total,
            version: Version::initial(),
        })
    }

    /// Rebuilds a persisted order line. The line total is recomputed.
    pub fn restore(
        id: OrderItemId,
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
        version: Version,
    ) -> Result<Self, OrderError> {
        Ok(Self {
            id: Some(id),
            version,
            ..Self::new(product_id, product_name, quantity, unit_price)?
        })
    }

    pub fn id(&self) -> Option<OrderItemId> {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Returns `quantity * unit_price`.
    pub fn line_total(&self) -> Money {
        self.line_total
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

/// Column values of a persisted order, as read back by a store.
#[derive(Debug, Clone)]
pub struct PersistedOrder {
    pub id: OrderId,
    pub client_id: ClientId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub comment: Option<String>,
    pub total_amount: Money,
    pub version: Version,
    pub created_by: Actor,
    pub updated_by: Actor,
    /// `None` when only the header row was loaded.
    pub items: Option<Vec<OrderItem>>,
}

/// Order aggregate root.
///
/// Owns its lines exclusively. The total amount is always derived from the
/// lines and is never set by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Assigned by the store on first persistence.
    id: Option<OrderId>,

    /// Customer who placed the order.
    client_id: ClientId,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,

    /// Current lifecycle status.
    status: OrderStatus,

    comment: Option<String>,

    /// Lines of the order, in creation order.
    items: Vec<OrderItem>,

    /// False when the order was fetched without its lines.
    items_loaded: bool,

    /// Sum of all line totals.
    total_amount: Money,

    /// Current version for optimistic concurrency.
    version: Version,

    created_by: Actor,
    updated_by: Actor,
}

impl Order {
    /// Starts a new order in `PENDING` for a customer.
    pub fn new(
        client_id: ClientId,
        comment: Option<String>,
        actor: &Actor,
    ) -> Result<Self, OrderError> {
        if !client_id.is_valid() {
            return Err(OrderError::ClientIdRequired);
        }
        check_comment(comment.as_deref())?;

        let now = Utc::now();
        Ok(Self {
            id: None,
            client_id,
            created_at: now,
            updated_at: now,
            status: OrderStatus::Pending,
            comment,
            items: Vec::new(),
            items_loaded: true,
            total_amount: Money::zero(),
            version: Version::initial(),
            created_by: actor.clone(),
            updated_by: actor.clone(),
        })
    }

    /// Rebuilds an order from its persisted columns.
    pub fn from_persisted(record: PersistedOrder) -> Self {
        let items_loaded = record.items.is_some();
        let items = record.items.unwrap_or_default();
        let total_amount = if items_loaded {
            sum_line_totals(&items).unwrap_or(record.total_amount)
        } else {
            record.total_amount
        };

        Self {
            id: Some(record.id),
            client_id: record.client_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            status: record.status,
            comment: record.comment,
            items,
            items_loaded,
            total_amount,
            version: record.version,
            created_by: record.created_by,
            updated_by: record.updated_by,
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> Option<OrderId> {
        self.id
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns the lines of the order. Empty when only the header was loaded.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns true if the lines were loaded with the order.
    pub fn items_loaded(&self) -> bool {
        self.items_loaded
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn created_by(&self) -> &Actor {
        &self.created_by
    }

    pub fn updated_by(&self) -> &Actor {
        &self.updated_by
    }

    /// Returns true while the comment may change and the order may be deleted.
    pub fn can_be_modified(&self) -> bool {
        self.status.can_be_modified()
    }

    /// Returns true while the order may be cancelled.
    pub fn can_be_cancelled(&self) -> bool {
        self.status.can_be_cancelled()
    }

    /// Returns true if the order contains a line for the product.
    pub fn contains_product(&self, product_id: ProductId) -> bool {
        self.items.iter().any(|item| item.product_id == product_id)
    }
}

// Command methods
impl Order {
    /// Appends a line and recomputes the total.
    ///
    /// The order is left untouched when the new total would overflow.
    pub fn add_item(&mut self, item: OrderItem, actor: &Actor) -> Result<(), OrderError> {
        self.ensure_items_mutable()?;

        if item.quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                quantity: item.quantity as i64,
            });
        }

        if !item.unit_price.is_positive() {
            return Err(OrderError::InvalidPrice {
                price: item.unit_price.cents(),
            });
        }

        let total_amount = self.total_amount.checked_add(item.line_total).ok_or(
            OrderError::AmountOverflow {
                product_id: item.product_id,
            },
        )?;

        self.items.push(item);
        self.total_amount = total_amount;
        self.touch(actor);
        Ok(())
    }

    /// Removes the first line for a product and recomputes the total.
    pub fn remove_item(
        &mut self,
        product_id: ProductId,
        actor: &Actor,
    ) -> Result<OrderItem, OrderError> {
        self.ensure_items_mutable()?;

        let position = self
            .items
            .iter()
            .position(|item| item.product_id == product_id)
            .ok_or(OrderError::ItemNotFound { product_id })?;

        let removed = self.items.remove(position);
        self.total_amount = sum_line_totals(&self.items).unwrap_or(self.total_amount);
        self.touch(actor);
        Ok(removed)
    }

    /// Moves the order to `next` if the lifecycle allows it.
    pub fn transition_to(&mut self, next: OrderStatus, actor: &Actor) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        self.touch(actor);
        Ok(())
    }

    /// Cancels the order.
    pub fn cancel(&mut self, actor: &Actor) -> Result<(), OrderError> {
        if !self.can_be_cancelled() {
            return Err(OrderError::NotCancellable {
                status: self.status,
            });
        }

        self.status = OrderStatus::Cancelled;
        self.touch(actor);
        Ok(())
    }

    /// Replaces the comment.
    pub fn update_comment(
        &mut self,
        comment: Option<String>,
        actor: &Actor,
    ) -> Result<(), OrderError> {
        if !self.can_be_modified() {
            return Err(OrderError::NotModifiable {
                status: self.status,
            });
        }
        check_comment(comment.as_deref())?;

        self.comment = comment;
        self.touch(actor);
        Ok(())
    }

    /// Checks that the order may be physically removed.
    pub fn ensure_deletable(&self) -> Result<(), OrderError> {
        if !self.can_be_modified() {
            return Err(OrderError::NotModifiable {
                status: self.status,
            });
        }
        Ok(())
    }
}

// Store hooks
impl Order {
    /// Records the identity assigned on first persistence.
    pub fn mark_persisted(&mut self, id: OrderId) {
        self.id = Some(id);
    }

    /// Records identities for the lines that have none yet, in line order.
    pub fn assign_item_ids(&mut self, ids: impl IntoIterator<Item = OrderItemId>) {
        let unassigned = self.items.iter_mut().filter(|item| item.id.is_none());
        for (item, id) in unassigned.zip(ids) {
            item.id = Some(id);
        }
    }

    /// Returns the number of lines not persisted yet.
    pub fn unassigned_item_count(&self) -> usize {
        self.items.iter().filter(|item| item.id.is_none()).count()
    }

    /// Returns a header-only copy of the order.
    pub fn without_items(&self) -> Order {
        Order {
            items: Vec::new(),
            items_loaded: false,
            ..self.clone()
        }
    }

    /// Attaches persisted lines to a header-only order and recomputes the total.
    pub fn restore_items(&mut self, items: Vec<OrderItem>) {
        self.total_amount = sum_line_totals(&items).unwrap_or(self.total_amount);
        self.items = items;
        self.items_loaded = true;
    }

    /// Sets the version after a successful write.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

impl Order {
    fn ensure_items_mutable(&self) -> Result<(), OrderError> {
        if !self.items_loaded {
            return Err(OrderError::ItemsNotLoaded);
        }
        if !self.can_be_modified() {
            return Err(OrderError::NotModifiable {
                status: self.status,
            });
        }
        Ok(())
    }

    fn touch(&mut self, actor: &Actor) {
        self.updated_at = Utc::now();
        self.updated_by = actor.clone();
    }
}

/// Sums line totals, returning `None` on overflow.
fn sum_line_totals(items: &[OrderItem]) -> Option<Money> {
    items
        .iter()
        .try_fold(Money::zero(), |total, item| total.checked_add(item.line_total))
}

fn check_comment(comment: Option<&str>) -> Result<(), OrderError> {
    if let Some(comment) = comment {
        let length = comment.chars().count();
        if length > MAX_COMMENT_LENGTH {
            return Err(OrderError::CommentTooLong {
                length,
                max: MAX_COMMENT_LENGTH,
            });
        }
    }
    Ok(())
}
