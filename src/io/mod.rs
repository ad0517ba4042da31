//! Input loading
//!
//! - NPY reference arrays
//! - Plain-text candidate outputs

mod npy;
mod text;

pub use npy::{
    load_npy, load_npy_f64, load_npy_header, read_npy, read_npy_header, Dtype, ElementType,
    NpyArray, NpyHeader,
};
pub use text::{load_text, read_floats};
