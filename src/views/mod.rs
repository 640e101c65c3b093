pub mod center;
pub mod popup;
pub mod tile;
