//! Model capability adapters.

mod catalog;

pub use catalog::ModelCatalog;
