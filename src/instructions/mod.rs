pub mod compute_budget;

pub use compute_budget::prefix_from_settings;
