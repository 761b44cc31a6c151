pub mod controller;
pub mod embed;
pub mod queue;
