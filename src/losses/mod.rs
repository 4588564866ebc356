pub mod cox;
pub mod discrete;
pub mod ranking;
