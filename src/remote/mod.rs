pub mod listing;
pub mod viewed;
