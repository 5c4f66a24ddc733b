pub mod competitor;
pub mod context;
pub mod market;
pub mod recommendation;
