mod extractor;
mod navigator;

pub use extractor::PlayerExtractor;
pub use navigator::{NavState, PageNavigator};
