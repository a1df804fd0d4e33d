pub mod config;
pub mod denylist;
pub mod error;
pub mod filter;
pub mod quality;
pub mod store;
pub mod types;
pub mod view;

pub use config::Config;
pub use denylist::HostDenylist;
pub use error::{LakesideError, Result};
pub use filter::{apply_filters, parse_bound, FilterCriteria, FilterInput, Overnight};
pub use quality::{compute_backlog, compute_coverage, is_verified, Backlog, Coverage};
pub use store::{resolve_data_dir, Collection, RecordStore};
pub use types::*;
pub use view::{derive_view, CatalogView, KindView, Lang, Preferences, ViewEvent, ViewState};
