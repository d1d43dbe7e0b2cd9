pub mod csvfile;
pub mod domain;
pub mod store;

pub use domain::Reading;
pub use store::ReadingStore;
