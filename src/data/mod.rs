mod loader;
mod store;

pub use loader::{Page, PageLoader};
pub use store::ApodStore;
