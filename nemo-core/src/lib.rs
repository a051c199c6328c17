#![forbid(unsafe_code)]

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod guid;
pub mod io_port;
pub mod compression;

pub mod codec;
pub mod chunk;
pub mod header;
pub mod data;

pub mod object;
pub mod repository;
pub mod schema;

pub mod session;
pub mod resolver;
pub mod finish_load;

pub mod pipeline;

pub use crate::error::{NemoError, Result};

pub use guid::Guid;
pub use io_port::IoPort;
pub use object::{Object, ObjectFlags, RuntimeId};
pub use repository::{InMemoryRepository, ObjectRepository};
pub use schema::{ClassSchema, HashMapSchemaRegistry, SchemaRegistry};

pub use pipeline::{load, save, IncludedFile, LoadOptions, LoadReport, SaveOptions};

pub mod prelude {
    pub use crate::error::{NemoError, Result};
    pub use crate::pipeline::{load, save, IncludedFile, LoadOptions, LoadReport, SaveOptions};
    pub use crate::repository::{InMemoryRepository, ObjectRepository};
    pub use crate::schema::{ClassSchema, HashMapSchemaRegistry, SchemaRegistry};
    pub use crate::Guid;
    pub use crate::Object;
}
