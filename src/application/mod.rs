// src/application/mod.rs
pub(crate) mod access;
pub mod category_manager;
pub mod filter_browser;
pub mod filter_library;
pub mod filter_metrics;
pub mod filter_organizer;
pub mod repository;
pub mod session;

pub use category_manager::CategoryManager;
pub use filter_browser::{FilterBrowser, ListingRequest, ListingScope};
pub use filter_library::FilterLibrary;
pub use filter_metrics::FilterMetrics;
pub use filter_organizer::FilterOrganizer;
pub use repository::{BrowseQuery, BrowseScope, CategoryRepository, FilterRepository};
pub use session::{SessionProvider, StaticSession};
