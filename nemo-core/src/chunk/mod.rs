pub mod io;
pub mod model;

pub use io::{is_reference_id, remap_object_ids, read_chunk, strip_reference_bit, with_reference_bit, write_chunk, REFERENCE_BIT};
pub use model::{Chunk, ChunkReader, ChunkWriter};
