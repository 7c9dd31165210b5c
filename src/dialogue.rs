//! The ordering conversation: routes each message to the handler for the
//! user's current state and decides the next state.
//!
//! ```text
//! GENERAL --order item--> AWAITING_QUANTITY --n>0--> AWAITING_MORE_ITEMS
//!    ^                         ^                        |  item     | done
//!    |                         +------------------------+           v
//!    |                                               AWAITING_DINING_OPTION
//!    |                                            dine in |     | takeaway
//!    |                                                    |     v
//!    |<------------------- delivery (cancel) ----- AWAITING_TAKEOUT_TYPE
//!    |                                                    |     | pickup
//!    |                                                    v     v
//!    +<------------ receipt ----------------------- AWAITING_PAYMENT_METHOD
//! ```

use chrono::{DateTime, Duration, Local};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

use crate::catalog::MenuCatalog;
use crate::conversation::{Clock, ConversationContext, ConversationState, SystemClock};
use crate::error::DialogueError;
use crate::extract::{extract_quantity, resolve_item};
use crate::intent::{Intent, IntentRecognizer};
use crate::model::{Category, Menu, MenuItem};
use crate::order::{DiningOption, PaymentMethod, TakeoutType};
use crate::preprocess::{contains_any, preprocess_text};
use crate::render::{format_price, render_menu, render_receipt, ReceiptDetails};
use crate::store::{ContextStore, InMemoryContextStore};

// Decision keywords, matched as substrings of normalized text. Where two
// lists are checked together the first one listed wins.
const FINISH_KEYWORDS: &[&str] = &[
    "done", "no", "not", "enough", "continue", "pay", "checkout", "finish", "complete",
];
const DINE_IN_KEYWORDS: &[&str] = &[
    "eat here", "dine in", "dine", "here", "dinein", "at the place", "in place", "stay",
];
const TAKEAWAY_KEYWORDS: &[&str] = &[
    "take away", "takeaway", "take", "to go", "carry out", "wrapped", "take out", "pickup",
    "delivery",
];
const PICKUP_KEYWORDS: &[&str] = &[
    "pickup", "self pickup", "selfpickup", "collect", "ill pick up", "take myself",
];
const DELIVERY_KEYWORDS: &[&str] = &["delivery", "deliver", "delivered", "to deliver", "home delivery"];
const EWALLET_KEYWORDS: &[&str] = &[
    "ewallet", "e wallet", "wallet", "qris", "gopay", "ovo", "dana", "linkaja", "digital wallet",
    "electronic wallet",
];
const CASH_KEYWORDS: &[&str] = &["cash", "at counter", "tunai", "kontan", "pay at counter", "cashier"];

// Checked against the raw lowercase message.
const REFERENTIAL_KEYWORDS: &[&str] = &[
    "that", "that item", "the item", "the previous one", "the recent one", "this", "order",
    "want that", "buy that",
];

const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::IcedCoffee, &["iced coffee", "cold coffee", "ice coffee", "cold brew"]),
    (Category::EspressoBased, &["espresso", "latte", "cappuccino", "americano", "hot coffee"]),
    (Category::NonCoffee, &["chocolate", "matcha", "tea", "non coffee"]),
    (Category::Pastry, &["pastry", "croissant", "food", "snack", "cake"]),
    (Category::Refreshment, &["refreshment", "sparkling", "soda", "cold drink"]),
];

const PAYMENT_PROMPT: &str = "Please select payment method: E-Wallet or Cash at Counter?";
const TRY_AGAIN: &str =
    "Sorry, a system error occurred. Please try again or ask me to start over.";

/// What the transport sends back to the user for one message.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Response {
    pub text: String,
    /// Label for what the reply is about, e.g. `view_menu` or `order_completed`.
    pub intent: String,
    pub suggested_items: Vec<MenuItem>,
    pub menu_snapshot: Option<Menu>,
}

impl Response {
    pub fn new(intent: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            intent: intent.into(),
            suggested_items: Vec::new(),
            menu_snapshot: None,
        }
    }

    pub fn with_items(mut self, items: Vec<MenuItem>) -> Self {
        self.suggested_items = items;
        self
    }

    pub fn with_menu(mut self, menu: Menu) -> Self {
        self.menu_snapshot = Some(menu);
        self
    }
}

type TurnResult = Result<Response, DialogueError>;

/// Conversation state machine over a shared context store.
///
/// Messages for one user must be delivered one at a time; messages for
/// different users may be handled concurrently.
pub struct DialogueEngine {
    catalog: Arc<dyn MenuCatalog>,
    store: Arc<dyn ContextStore>,
    recognizer: IntentRecognizer,
    clock: Arc<dyn Clock>,
    shop_name: String,
    order_id_prefix: String,
}

impl DialogueEngine {
    pub fn new(catalog: Arc<dyn MenuCatalog>) -> Self {
        Self {
            catalog,
            store: Arc::new(InMemoryContextStore::new()),
            recognizer: IntentRecognizer::default(),
            clock: Arc::new(SystemClock),
            shop_name: "Mata Kopian".to_string(),
            order_id_prefix: "KC".to_string(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_recognizer(mut self, recognizer: IntentRecognizer) -> Self {
        self.recognizer = recognizer;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_shop_name(mut self, shop_name: impl Into<String>) -> Self {
        self.shop_name = shop_name.into();
        self
    }

    pub fn with_order_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.order_id_prefix = prefix.into();
        self
    }

    /// Handles one inbound message and returns the reply.
    ///
    /// Never fails: a fault inside the turn is logged and answered with a
    /// generic retry message, and the user's stored context is left as it was.
    pub fn handle_message(&self, user_id: &str, text: &str) -> Response {
        let now = self.clock.now();
        let mut ctx = self
            .store
            .get(user_id, now)
            .unwrap_or_else(|| ConversationContext::new(user_id, now));

        log::info!("Message from {} (state {}): {}", user_id, ctx.state, text);

        match self.route(&mut ctx, text, now) {
            Ok(response) => {
                ctx.touch(now);
                self.store.set(ctx);
                response
            }
            Err(e) => {
                log::error!("Error handling message for user {}: {}", user_id, e);
                Response::new("error", TRY_AGAIN)
            }
        }
    }

    /// Drops any order in progress and greets the user.
    pub fn reset_conversation(&self, user_id: &str) -> Response {
        let now = self.clock.now();
        let mut ctx = self
            .store
            .get(user_id, now)
            .unwrap_or_else(|| ConversationContext::new(user_id, now));
        ctx.reset();
        ctx.touch(now);
        self.store.set(ctx);
        log::info!("User {} restarted the conversation", user_id);
        Response::new(
            "greeting",
            format!(
                "Hello! Welcome to {} Bot. How can I help you? \
                 You can ask about menu, prices, or ordering process.",
                self.shop_name
            ),
        )
    }

    /// A snapshot of the user's live context, if any. Does not refresh expiry.
    pub fn current_context(&self, user_id: &str) -> Option<ConversationContext> {
        self.store.get(user_id, self.clock.now())
    }

    fn route(&self, ctx: &mut ConversationContext, text: &str, now: DateTime<Local>) -> TurnResult {
        match ctx.state {
            ConversationState::General => self.handle_general(ctx, text),
            ConversationState::AwaitingQuantity => self.handle_quantity(ctx, text),
            ConversationState::AwaitingMoreItems => self.handle_more_items(ctx, text),
            ConversationState::AwaitingDiningOption => self.handle_dining_option(ctx, text),
            ConversationState::AwaitingTakeoutType => self.handle_takeout_type(ctx, text),
            ConversationState::AwaitingPaymentMethod => self.handle_payment_method(ctx, text, now),
        }
    }

    /// Resets a context whose order data does not match its state.
    fn recover(&self, ctx: &mut ConversationContext, reason: &str, reply: &str) -> TurnResult {
        log::warn!("User {} in {} but {}.", ctx.user_id, ctx.state, reason);
        ctx.reset();
        Ok(Response::new("error", reply))
    }

    fn handle_general(&self, ctx: &mut ConversationContext, text: &str) -> TurnResult {
        if text.trim().is_empty() {
            return Ok(Response::new(
                "greeting",
                format!(
                    "Hello! I'm the {} barista bot. How can I help you today? \
                     You can ask me about our menu, prices, or place an order!",
                    self.shop_name
                ),
            ));
        }

        let recognized = self.recognizer.recognize(text);
        log::debug!(
            "Intent detected for {}: {} (score {})",
            ctx.user_id,
            recognized.label(),
            recognized.score
        );

        match recognized.intent {
            Some(Intent::ViewMenu) => {
                let menu = self.catalog.menu_snapshot()?;
                let samples = sample_items(&menu, 2, 6);
                Ok(Response::new(Intent::ViewMenu.as_str(), render_menu(&menu, &self.shop_name))
                    .with_items(samples)
                    .with_menu(menu))
            }
            Some(Intent::AskPrice) => match resolve_item(text, self.catalog.as_ref())? {
                Some(item) => {
                    let reply = format!(
                        "The price for {} is {}.",
                        item.name,
                        format_price(item.price.into())
                    );
                    ctx.last_inquired_item = Some(item.clone());
                    Ok(Response::new(Intent::AskPrice.as_str(), reply).with_items(vec![item]))
                }
                None => {
                    let menu = self.catalog.menu_snapshot()?;
                    Ok(Response::new(
                        Intent::AskPrice.as_str(),
                        "For price information, please mention a more specific item name. \
                         Here are some popular options with their prices:",
                    )
                    .with_items(sample_items(&menu, 1, 4)))
                }
            },
            Some(Intent::OrderInfo) => self.start_item_order(ctx, text),
            Some(Intent::Greeting) => Ok(Response::new(
                Intent::Greeting.as_str(),
                "Hello there! How can I help you?",
            )),
            Some(Intent::ThankYou) => Ok(Response::new(
                Intent::ThankYou.as_str(),
                "You're welcome! Happy to help. 😊",
            )),
            Some(Intent::AskBot) => Ok(Response::new(
                Intent::AskBot.as_str(),
                format!(
                    "I am the {} bot. I can help you view the menu, check prices, and process orders.",
                    self.shop_name
                ),
            )),
            Some(Intent::ConfirmNo) => Ok(Response::new(
                Intent::ConfirmNo.as_str(),
                "Okay. Is there anything else I can help with?",
            )),
            Some(Intent::ConfirmYes) | None => self.handle_unmatched(ctx, text, recognized.label()),
        }
    }

    fn start_item_order(&self, ctx: &mut ConversationContext, text: &str) -> TurnResult {
        let item = match resolve_item(text, self.catalog.as_ref())? {
            Some(item) => {
                log::info!("User {} wants to order explicit item: {}", ctx.user_id, item.name);
                Some(item)
            }
            None if contains_any(&text.to_lowercase(), REFERENTIAL_KEYWORDS) => {
                let item = ctx.last_inquired_item.clone();
                if let Some(item) = &item {
                    log::info!("User {} wants to order item from context: {}", ctx.user_id, item.name);
                }
                item
            }
            None => None,
        };

        match item {
            Some(item) => {
                let reply = format!("Alright, {}. How many would you like to order?", item.name);
                ctx.last_inquired_item = Some(item.clone());
                ctx.order.pending_item = Some(item);
                ctx.transition(ConversationState::AwaitingQuantity);
                Ok(Response::new(Intent::OrderInfo.as_str(), reply))
            }
            None => {
                let info = self.catalog.ordering_info_text()?;
                Ok(Response::new(
                    Intent::OrderInfo.as_str(),
                    format!(
                        "What would you like to order? Please mention the item name or check the menu first. \
                         General ordering info: {}",
                        info
                    ),
                ))
            }
        }
    }

    /// No intent worth acting on: try an item, then a category, then help.
    fn handle_unmatched(&self, ctx: &mut ConversationContext, text: &str, label: &str) -> TurnResult {
        if let Some(item) = resolve_item(text, self.catalog.as_ref())? {
            let reply = if item.description.is_empty() {
                format!(
                    "Excellent choice! {} is {}. Would you like to order it? 💫",
                    item.name,
                    format_price(item.price.into())
                )
            } else {
                format!(
                    "Excellent choice! {} is {}. Would you like to order it? 💫",
                    item.name, item.description
                )
            };
            ctx.last_inquired_item = Some(item.clone());
            return Ok(Response::new("item_recommendation", reply).with_items(vec![item]));
        }

        let lower_text = text.to_lowercase();
        let category = CATEGORY_KEYWORDS
            .iter()
            .find(|(_, keywords)| contains_any(&lower_text, keywords))
            .map(|(category, _)| *category);
        if let Some(category) = category {
            let items = self.catalog.items_by_category(category)?;
            if !items.is_empty() {
                let menu = self.catalog.menu_snapshot()?;
                return Ok(Response::new(
                    "category_recommendation",
                    format!(
                        "Great choice! Here are our {} options. Which one catches your eye? 😊",
                        category.display_name().to_lowercase()
                    ),
                )
                .with_items(items.into_iter().take(6).collect())
                .with_menu(menu));
            }
        }

        Ok(Response::new(
            label,
            "Sorry, I don't understand what you mean. You can ask me about:\n\n\
             • 'Show me the menu'\n\
             • 'How much is an espresso?'\n\
             • 'I want to order an iced coffee'\n\n\
             Or tell me what you're in the mood for! ☕",
        ))
    }

    fn handle_quantity(&self, ctx: &mut ConversationContext, text: &str) -> TurnResult {
        let item = match ctx.order.pending_item.clone() {
            Some(item) => item,
            None => {
                return self.recover(
                    ctx,
                    "no item is waiting for a quantity",
                    "Sorry, something seems to be wrong. Could you mention the item you want to order again?",
                )
            }
        };

        let quantity = match extract_quantity(text) {
            Some(q) if q > 0 => q,
            _ => {
                return Ok(Response::new(
                    "quantity_request",
                    format!(
                        "Invalid quantity. How many would you like to order for {}?",
                        item.name
                    ),
                ))
            }
        };

        let committed = u32::try_from(quantity)
            .ok()
            .and_then(|q| ctx.order.commit_pending(q));
        if committed.is_none() {
            log::warn!(
                "User {} asked for {} x{}, more than one order line can hold.",
                ctx.user_id,
                item.name,
                quantity
            );
            return Ok(Response::new(
                "quantity_request",
                format!(
                    "Sorry, that quantity is too large. How many {} would you like to order?",
                    item.name
                ),
            ));
        }
        log::info!(
            "User {}: {} x{} added to order (total {}).",
            ctx.user_id,
            item.name,
            quantity,
            ctx.order.total_price()
        );

        ctx.transition(ConversationState::AwaitingMoreItems);
        Ok(Response::new(
            "order_update",
            format!(
                "Okay, {} {} has been added. Your current order: {} (Subtotal: {}).\n\n\
                 Would you like to add another item? Type the menu name you want to add \
                 or type 'done' to proceed to payment.",
                quantity,
                item.name,
                ctx.order.summary(),
                format_price(ctx.order.total_price())
            ),
        ))
    }

    fn handle_more_items(&self, ctx: &mut ConversationContext, text: &str) -> TurnResult {
        let processed_text = preprocess_text(text);

        if contains_any(&processed_text, FINISH_KEYWORDS) {
            if ctx.order.is_empty() {
                log::warn!("User {} in {} but the order has no items.", ctx.user_id, ctx.state);
                ctx.reset();
                return Ok(Response::new(
                    "order_empty",
                    "Sorry, there are no items in the order. Please start ordering again.",
                ));
            }
            ctx.transition(ConversationState::AwaitingDiningOption);
            return Ok(Response::new(
                "order_summary",
                format!(
                    "Alright! Here's your order summary:\n{}\nTotal: {}\n\n\
                     Would you like to dine in or take away?",
                    ctx.order.summary(),
                    format_price(ctx.order.total_price())
                ),
            ));
        }

        match resolve_item(text, self.catalog.as_ref())? {
            Some(item) => {
                let reply = format!("How many {} would you like to order?", item.name);
                ctx.last_inquired_item = Some(item.clone());
                ctx.order.pending_item = Some(item);
                ctx.transition(ConversationState::AwaitingQuantity);
                Ok(Response::new("quantity_request", reply))
            }
            None => Ok(Response::new(
                "item_not_found",
                format!(
                    "Sorry, I couldn't find the menu item '{}'. Try mentioning a more specific menu name, \
                     check the menu, or type 'done' if you're finished.",
                    text.trim()
                ),
            )),
        }
    }

    fn handle_dining_option(&self, ctx: &mut ConversationContext, text: &str) -> TurnResult {
        if ctx.order.is_empty() {
            return self.recover(
                ctx,
                "the order has no items",
                "Sorry, there was an error with your order. Would you like to start again?",
            );
        }

        let processed_text = preprocess_text(text);
        let choice = first_match(
            &processed_text,
            &[
                (DINE_IN_KEYWORDS, DiningOption::DineIn),
                (TAKEAWAY_KEYWORDS, DiningOption::Takeaway),
            ],
        );
        let total = format_price(ctx.order.total_price());

        match choice {
            Some(DiningOption::DineIn) => {
                ctx.order.dining_option = Some(DiningOption::DineIn);
                ctx.transition(ConversationState::AwaitingPaymentMethod);
                Ok(Response::new(
                    "payment_method_request",
                    format!("Alright, for dining in. Your total order is {}.\n\n{}", total, PAYMENT_PROMPT),
                ))
            }
            Some(DiningOption::Takeaway) => {
                ctx.order.dining_option = Some(DiningOption::Takeaway);
                ctx.transition(ConversationState::AwaitingTakeoutType);
                Ok(Response::new(
                    "takeout_type_request",
                    format!(
                        "Alright, for takeaway. Your total order is {}.\n\n\
                         Would you like self-pickup or Delivery?",
                        total
                    ),
                ))
            }
            None => Ok(Response::new(
                "dining_option_request",
                "Please choose whether you'd like to dine in or take away?",
            )),
        }
    }

    fn handle_takeout_type(&self, ctx: &mut ConversationContext, text: &str) -> TurnResult {
        if ctx.order.is_empty() || ctx.order.dining_option != Some(DiningOption::Takeaway) {
            return self.recover(
                ctx,
                "the order is not a takeaway order",
                "Sorry, there was an error. Restarting the order process.",
            );
        }

        let processed_text = preprocess_text(text);
        let choice = first_match(
            &processed_text,
            &[
                (PICKUP_KEYWORDS, TakeoutType::Pickup),
                (DELIVERY_KEYWORDS, TakeoutType::Delivery),
            ],
        );

        match choice {
            Some(TakeoutType::Pickup) => {
                ctx.order.takeout_type = Some(TakeoutType::Pickup);
                ctx.transition(ConversationState::AwaitingPaymentMethod);
                Ok(Response::new(
                    "payment_method_request",
                    format!(
                        "Okay, the order will be picked up by yourself. The total remains {}.\n\n{}",
                        format_price(ctx.order.total_price()),
                        PAYMENT_PROMPT
                    ),
                ))
            }
            Some(TakeoutType::Delivery) => {
                log::info!("User {} asked for delivery; order cancelled.", ctx.user_id);
                ctx.reset();
                Ok(Response::new(
                    "order_cancelled",
                    "We apologize, but we currently cannot accommodate delivery orders.\n\
                     Your order has been cancelled. If you'd like, you can place a new order for self-pickup.",
                ))
            }
            None => Ok(Response::new(
                "takeout_type_request",
                "Please choose whether you'd like self-pickup or delivery?",
            )),
        }
    }

    fn handle_payment_method(
        &self,
        ctx: &mut ConversationContext,
        text: &str,
        now: DateTime<Local>,
    ) -> TurnResult {
        if ctx.order.is_empty() {
            return self.recover(
                ctx,
                "the order has no items",
                "Sorry, there was an error with your order. Would you like to start again?",
            );
        }

        let processed_text = preprocess_text(text);
        let payment_method = match first_match(
            &processed_text,
            &[
                (EWALLET_KEYWORDS, PaymentMethod::EWallet),
                (CASH_KEYWORDS, PaymentMethod::Cash),
            ],
        ) {
            Some(method) => method,
            None => return Ok(Response::new("payment_method_request", PAYMENT_PROMPT)),
        };

        let order_id = generate_order_id(&self.order_id_prefix, &ctx.user_id, now);
        ctx.order.payment_method = Some(payment_method);
        ctx.order.order_id = Some(order_id.clone());

        let receipt = render_receipt(&ReceiptDetails {
            shop_name: &self.shop_name,
            order_id: &order_id,
            order: &ctx.order,
            payment_method,
            issued_at: now,
        });
        log::info!(
            "Order {} completed for user {}: {} via {}",
            order_id,
            ctx.user_id,
            format_price(ctx.order.total_price()),
            payment_method
        );

        ctx.reset();
        Ok(Response::new("order_completed", receipt))
    }
}

/// The value paired with the first keyword list that matches.
fn first_match<T: Copy>(processed_text: &str, options: &[(&[&str], T)]) -> Option<T> {
    options
        .iter()
        .find(|(keywords, _)| contains_any(processed_text, keywords))
        .map(|(_, value)| *value)
}

/// Up to `per_category` items from each category, stopping once `limit` is reached.
fn sample_items(menu: &Menu, per_category: usize, limit: usize) -> Vec<MenuItem> {
    let mut samples = Vec::new();
    for category in Category::ALL {
        samples.extend(menu.items(category).iter().take(per_category).cloned());
        if samples.len() >= limit {
            break;
        }
    }
    samples.truncate(limit);
    samples
}

/// `<prefix><yymmdd>-<last 4 chars of user id><4 hex digits>`, e.g.
/// `KC261019-6789A1F0`.
///
/// Two random bytes give 65536 ids per user per day; collisions are possible
/// but unlikely at café volumes.
pub fn generate_order_id(prefix: &str, user_id: &str, now: DateTime<Local>) -> String {
    let chars: Vec<char> = user_id.chars().collect();
    let user_part: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    let random: [u8; 2] = rand::thread_rng().gen();
    format!(
        "{}{}-{}{:02X}{:02X}",
        prefix,
        now.format("%y%m%d"),
        user_part,
        random[0],
        random[1]
    )
}

/// Minutes until a context idle since `last_activity` expires.
pub fn minutes_until_expiry(last_activity: DateTime<Local>, now: DateTime<Local>, ttl: Duration) -> i64 {
    (ttl - (now - last_activity)).num_minutes().max(0)
}
