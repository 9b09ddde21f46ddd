//! Dataset loading
//!
//! Reads the labeled transaction table and exposes typed views of its
//! columns: the numeric matrix used for training and the binary label
//! vector.

mod loader;

pub use loader::{
    class_value_counts, column_names, column_values, columns_to_array2, label_vector,
    load_transactions, to_numeric, validate_schema,
};
