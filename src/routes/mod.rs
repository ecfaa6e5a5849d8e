pub mod analytics;
pub mod imports;
pub mod prices;
