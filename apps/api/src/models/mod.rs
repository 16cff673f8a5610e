pub mod audit;
pub mod job;
pub mod resume;
