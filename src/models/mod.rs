pub mod item;
pub mod item_meta;
pub mod settings;
