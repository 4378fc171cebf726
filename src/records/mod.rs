// src/records/mod.rs
pub mod common;
pub mod generic_header;
pub mod ascii_header;
pub mod pointer_record;
pub mod giadr_radiance;
pub mod geadr;
pub mod mdr;
