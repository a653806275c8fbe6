pub mod catalog;
pub mod count_item;
pub mod sector_count;

pub use catalog::{Product, Sector};
pub use count_item::CountItem;
pub use sector_count::{SectorCount, SectorCountStatus};
