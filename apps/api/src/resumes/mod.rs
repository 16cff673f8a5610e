pub mod export;
pub mod handlers;
