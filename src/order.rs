use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::MenuItem;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiningOption {
    DineIn,
    Takeaway,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TakeoutType {
    Pickup,
    Delivery,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    EWallet,
    Cash,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::EWallet => f.write_str("E-Wallet"),
            PaymentMethod::Cash => f.write_str("Cash"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub item: MenuItem,
    pub quantity: u32,
}

impl OrderLine {
    pub fn subtotal(&self) -> u64 {
        u64::from(self.item.price) * u64::from(self.quantity)
    }
}

/// An order in progress.
///
/// `lines` holds at most one line per item id, in the order items were first
/// added, and `total_price` always equals the sum of the line subtotals.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Order {
    lines: Vec<OrderLine>,
    /// Item chosen by the user that still needs a quantity.
    pub pending_item: Option<MenuItem>,
    pub dining_option: Option<DiningOption>,
    pub takeout_type: Option<TakeoutType>,
    pub payment_method: Option<PaymentMethod>,
    total_price: u64,
    pub order_id: Option<String>,
}

impl Order {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total_price(&self) -> u64 {
        self.total_price
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds `quantity` of `item`, merging into an existing line for the same id.
    ///
    /// Returns `None` and leaves the order untouched when the quantity is zero
    /// or the merged quantity would not fit in a `u32`.
    pub fn add_line(&mut self, item: MenuItem, quantity: u32) -> Option<&OrderLine> {
        if quantity == 0 {
            return None;
        }
        let index = match self.lines.iter().position(|l| l.item.id == item.id) {
            Some(index) => {
                let line = &mut self.lines[index];
                line.quantity = line.quantity.checked_add(quantity)?;
                index
            }
            None => {
                self.lines.push(OrderLine { item, quantity });
                self.lines.len() - 1
            }
        };
        self.recompute_total();
        self.lines.get(index)
    }

    /// Moves the pending item into the order with the given quantity.
    /// Returns `None` when there was no pending item or [`Order::add_line`]
    /// refused the quantity; the pending item is kept in the latter case.
    pub fn commit_pending(&mut self, quantity: u32) -> Option<OrderLine> {
        let item = self.pending_item.clone()?;
        let line = self.add_line(item, quantity).cloned()?;
        self.pending_item = None;
        Some(line)
    }

    pub fn recompute_total(&mut self) -> u64 {
        self.total_price = self.lines.iter().map(OrderLine::subtotal).sum();
        self.total_price
    }

    /// Clears everything: lines, pending item, options and id.
    pub fn reset(&mut self) {
        *self = Order::default();
    }

    /// "2 Iced Coffee, 1 Croissant"
    pub fn summary(&self) -> String {
        if self.lines.is_empty() {
            return "No items yet".to_string();
        }
        self.lines
            .iter()
            .map(|l| format!("{} {}", l.quantity, l.item.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
