pub mod cache;
pub mod error;
pub mod interface;
pub mod registry;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
pub mod testing;

pub use cache::{LoadingStrategy, ModelCache};
pub use error::TranslateError;
pub use interface::ModelLoader;
pub use registry::Registry;
pub use service::TranslationService;
