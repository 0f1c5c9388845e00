pub mod assessment;
pub mod candidate;
pub mod extraction;
