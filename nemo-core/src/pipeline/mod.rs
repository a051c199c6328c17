pub mod load;
pub mod save;

pub use load::{load, IncludedFile, LoadOptions, LoadReport};
pub use save::{save, SaveOptions};
