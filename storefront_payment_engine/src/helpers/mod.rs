mod status_normalizer;

pub use status_normalizer::{initial_status_for_method, normalize_status, INSTANT_SETTLEMENT_METHODS};
