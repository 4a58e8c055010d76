pub mod features;
pub mod panel;
pub mod session;
pub mod sizing;
pub mod weather;
