use chrono::{DateTime, Duration, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::MenuItem;
use crate::order::Order;

pub const DEFAULT_CONTEXT_EXPIRY_MINUTES: i64 = 30;

/// Where a user is in the ordering workflow.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    #[default]
    General,
    AwaitingQuantity,
    AwaitingMoreItems,
    AwaitingDiningOption,
    AwaitingTakeoutType,
    AwaitingPaymentMethod,
}

impl ConversationState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConversationState::General => "GENERAL",
            ConversationState::AwaitingQuantity => "AWAITING_QUANTITY",
            ConversationState::AwaitingMoreItems => "AWAITING_MORE_ITEMS",
            ConversationState::AwaitingDiningOption => "AWAITING_DINING_OPTION",
            ConversationState::AwaitingTakeoutType => "AWAITING_TAKEOUT_TYPE",
            ConversationState::AwaitingPaymentMethod => "AWAITING_PAYMENT_METHOD",
        }
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything remembered about one user between messages.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConversationContext {
    pub user_id: String,
    pub state: ConversationState,
    pub order: Order,
    /// Last item the user asked about, so "order that" can refer back to it.
    pub last_inquired_item: Option<MenuItem>,
    pub last_activity: DateTime<Local>,
}

impl ConversationContext {
    pub fn new(user_id: impl Into<String>, now: DateTime<Local>) -> Self {
        Self {
            user_id: user_id.into(),
            state: ConversationState::General,
            order: Order::new(),
            last_inquired_item: None,
            last_activity: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Local>, ttl: Duration) -> bool {
        now - self.last_activity >= ttl
    }

    pub fn touch(&mut self, now: DateTime<Local>) {
        self.last_activity = now;
    }

    pub fn transition(&mut self, next: ConversationState) {
        if self.state != next {
            log::info!("State for user {} set to {} (was {}).", self.user_id, next, self.state);
        }
        self.state = next;
    }

    /// Back to GENERAL with an empty order. The last inquired item survives.
    pub fn reset(&mut self) {
        self.transition(ConversationState::General);
        self.order.reset();
        log::info!("Order details for user {} have been reset.", self.user_id);
    }
}

/// Source of "now" for expiry checks and order ids.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    #[test]
    fn test_expiry_boundary() {
        let start = Local::now();
        let ctx = ConversationContext::new("42", start);
        let ttl = Duration::minutes(DEFAULT_CONTEXT_EXPIRY_MINUTES);
        assert!(!ctx.is_expired(start + Duration::minutes(29), ttl));
        assert!(ctx.is_expired(start + Duration::minutes(30), ttl));
    }

    #[test]
    fn test_reset_clears_order() {
        let mut ctx = ConversationContext::new("42", Local::now());
        let item = MenuItem::new("P_1", "Croissant", 15_000, "", Category::Pastry).unwrap();
        ctx.last_inquired_item = Some(item.clone());
        ctx.order.add_line(item, 2);
        ctx.transition(ConversationState::AwaitingDiningOption);

        ctx.reset();
        assert_eq!(ctx.state, ConversationState::General);
        assert!(ctx.order.is_empty());
        assert!(ctx.last_inquired_item.is_some());
    }

    #[test]
    fn test_manual_clock() {
        let start = Local::now();
        let clock = ManualClock::new(start);
        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now(), start + Duration::minutes(5));
    }

    #[test]
    fn test_state_serializes_like_the_wire_names() {
        let json = serde_json::to_string(&ConversationState::AwaitingMoreItems).unwrap();
        assert_eq!(json, "\"AWAITING_MORE_ITEMS\"");
    }
}
