pub mod alerts;
pub mod countdown;
pub mod error;
pub mod events;
pub mod gate;
pub mod item;
pub mod lifecycle;
pub mod validation;

pub use error::TrackerError;
pub use item::{Category, FoodItem, FoodItemDraft, FoodItemPatch, ItemId};
