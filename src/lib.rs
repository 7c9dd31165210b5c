//! Rule-based ordering assistant for a café.
//!
//! Free text goes in through [`DialogueEngine::handle_message`]; the engine
//! keeps a per-user [`ConversationContext`] and walks the user from picking
//! items to paying.

pub mod catalog;
pub mod conversation;
pub mod dialogue;
pub mod error;
pub mod extract;
pub mod intent;
pub mod model;
pub mod order;
pub mod preprocess;
pub mod render;
pub mod settings;
pub mod store;

pub use catalog::{CatalogOutcome, ItemUpdate, JsonMenuCatalog, MenuCatalog};
pub use conversation::{Clock, ConversationContext, ConversationState, ManualClock, SystemClock};
pub use dialogue::{DialogueEngine, Response};
pub use error::{CatalogError, DialogueError};
pub use intent::{Intent, IntentRecognizer, RecognizedIntent};
pub use model::{Category, Menu, MenuItem};
pub use order::{DiningOption, Order, OrderLine, PaymentMethod, TakeoutType};
pub use settings::Settings;
pub use store::{ContextStore, InMemoryContextStore};
