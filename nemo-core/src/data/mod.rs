pub mod section;

pub use section::{parse_data_section, serialize_data_section, DataSection, ManagerBlock, ObjectBlock};
