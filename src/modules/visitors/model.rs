pub use learnhub_models::visitors::*;
