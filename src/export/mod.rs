//! Model persistence
//!
//! Saves a fitted model with its metadata and reads it back, in a compact
//! binary envelope or a portable JSON one.

mod serializer;

pub use serializer::{load_model, save_model, ModelMetadata, SerializationFormat, SerializedModel};
