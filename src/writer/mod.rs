//! Writer for METOP AVHRR/3 Level-1B products
//!
//! Records are encoded big-endian and written back to back; pointer records
//! are patched once the records they locate have been written.

pub mod metop_writer;
pub mod product_builder;
pub use metop_writer::MetopWriter;
pub use product_builder::ProductBuilder;
