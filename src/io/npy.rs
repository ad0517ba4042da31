//! NPY file loading for reference data
//!
//! Decodes NumPy `.npy` files into flat `f64` sequences in C order, the same
//! ordering `ndarray.flatten()` produces.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::debug;

use crate::error::{ComparisonError, NpyError};

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Element type of an NPY array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    /// float32
    F32,
    /// float64
    F64,
    /// int8
    I8,
    /// int16
    I16,
    /// int32
    I32,
    /// int64
    I64,
    /// uint8
    U8,
    /// uint16
    U16,
    /// uint32
    U32,
    /// uint64
    U64,
}

/// Parsed `descr` field: element type plus byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dtype {
    /// Element type
    pub element: ElementType,
    /// Whether the stored bytes are big-endian
    pub big_endian: bool,
}

impl Dtype {
    /// Parse a dtype string such as `<f4`, `>i8` or `|u1`
    pub fn parse(descr: &str) -> Result<Self, NpyError> {
        let (order, code) = match descr.chars().next() {
            Some(c @ ('<' | '>' | '|' | '=')) => (c, &descr[1..]),
            _ => ('=', descr),
        };

        let element = match code {
            "f4" => ElementType::F32,
            "f8" => ElementType::F64,
            "i1" => ElementType::I8,
            "i2" => ElementType::I16,
            "i4" => ElementType::I32,
            "i8" => ElementType::I64,
            "u1" => ElementType::U8,
            "u2" => ElementType::U16,
            "u4" => ElementType::U32,
            "u8" => ElementType::U64,
            _ => return Err(NpyError::UnsupportedDtype(descr.to_string())),
        };

        let big_endian = match order {
            '>' => true,
            '=' => cfg!(target_endian = "big"),
            _ => false,
        };

        Ok(Self { element, big_endian })
    }

    /// Size of one element in bytes
    pub fn item_size(&self) -> usize {
        match self.element {
            ElementType::I8 | ElementType::U8 => 1,
            ElementType::I16 | ElementType::U16 => 2,
            ElementType::F32 | ElementType::I32 | ElementType::U32 => 4,
            ElementType::F64 | ElementType::I64 | ElementType::U64 => 8,
        }
    }
}

/// Header metadata of an NPY file
#[derive(Debug, Clone, PartialEq)]
pub struct NpyHeader {
    /// Raw dtype string (e.g., "<f4", "<i8")
    pub descr: String,
    /// Parsed dtype
    pub dtype: Dtype,
    /// Whether data is stored column-major
    pub fortran_order: bool,
    /// Shape of the array
    pub shape: Vec<usize>,
}

impl NpyHeader {
    /// Get total number of elements
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn data_size(&self) -> Result<usize, NpyError> {
        self.shape
            .iter()
            .try_fold(self.dtype.item_size(), |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| {
                NpyError::MalformedHeader(format!("shape {:?} is too large", self.shape))
            })
    }
}

/// NPY array data
#[derive(Debug, Clone)]
pub struct NpyArray {
    /// Header metadata
    pub header: NpyHeader,
    /// Raw data bytes, exactly `len() * item_size` long
    pub data: Vec<u8>,
}

impl NpyArray {
    /// Shape of the array
    pub fn shape(&self) -> &[usize] {
        &self.header.shape
    }

    /// Get total number of elements
    pub fn len(&self) -> usize {
        self.header.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widen every element to `f64`, flattened in C order
    pub fn flatten(&self) -> Vec<f64> {
        let be = self.header.dtype.big_endian;
        let data = &self.data;

        let values = match self.header.dtype.element {
            ElementType::F32 => decode::<4>(data, be, |b| f32::from_le_bytes(b) as f64),
            ElementType::F64 => decode::<8>(data, be, f64::from_le_bytes),
            ElementType::I8 => decode::<1>(data, be, |b| i8::from_le_bytes(b) as f64),
            ElementType::I16 => decode::<2>(data, be, |b| i16::from_le_bytes(b) as f64),
            ElementType::I32 => decode::<4>(data, be, |b| i32::from_le_bytes(b) as f64),
            ElementType::I64 => decode::<8>(data, be, |b| i64::from_le_bytes(b) as f64),
            ElementType::U8 => decode::<1>(data, be, |b| u8::from_le_bytes(b) as f64),
            ElementType::U16 => decode::<2>(data, be, |b| u16::from_le_bytes(b) as f64),
            ElementType::U32 => decode::<4>(data, be, |b| u32::from_le_bytes(b) as f64),
            ElementType::U64 => decode::<8>(data, be, |b| u64::from_le_bytes(b) as f64),
        };

        if self.header.fortran_order && self.header.shape.len() > 1 {
            fortran_to_c_order(&values, &self.header.shape)
        } else {
            values
        }
    }
}

fn decode<const N: usize>(data: &[u8], big_endian: bool, convert: fn([u8; N]) -> f64) -> Vec<f64> {
    data.chunks_exact(N)
        .map(|chunk| {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(chunk);
            if big_endian {
                bytes.reverse();
            }
            convert(bytes)
        })
        .collect()
}

/// Reorder column-major values into row-major order
fn fortran_to_c_order(values: &[f64], shape: &[usize]) -> Vec<f64> {
    let mut strides = vec![1usize; shape.len()];
    for axis in 1..shape.len() {
        strides[axis] = strides[axis - 1] * shape[axis - 1];
    }

    let mut index = vec![0usize; shape.len()];
    let mut out = Vec::with_capacity(values.len());

    for _ in 0..values.len() {
        let offset: usize = index.iter().zip(&strides).map(|(i, s)| i * s).sum();
        out.push(values[offset]);

        // Last axis varies fastest in C order
        for axis in (0..shape.len()).rev() {
            index[axis] += 1;
            if index[axis] < shape[axis] {
                break;
            }
            index[axis] = 0;
        }
    }

    out
}

/// Read only the header of an NPY stream
pub fn read_npy_header<R: Read>(reader: &mut R) -> Result<NpyHeader, NpyError> {
    // Read magic number (6 bytes: \x93NUMPY)
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(NpyError::InvalidMagic);
    }

    let mut version = [0u8; 2];
    reader.read_exact(&mut version)?;
    let (major, minor) = (version[0], version[1]);

    // Version 1 uses a u16 header length, 2 and 3 a u32
    let header_len = match major {
        1 => {
            let mut len_bytes = [0u8; 2];
            reader.read_exact(&mut len_bytes)?;
            u16::from_le_bytes(len_bytes) as usize
        }
        2 | 3 => {
            let mut len_bytes = [0u8; 4];
            reader.read_exact(&mut len_bytes)?;
            u32::from_le_bytes(len_bytes) as usize
        }
        _ => return Err(NpyError::UnsupportedVersion(major, minor)),
    };

    let mut header_bytes = vec![0u8; header_len];
    reader.read_exact(&mut header_bytes)?;
    let header = String::from_utf8_lossy(&header_bytes);

    let descr = parse_dtype(&header)?;
    let dtype = Dtype::parse(&descr)?;
    let fortran_order = parse_fortran_order(&header)?;
    let shape = parse_shape(&header)?;

    Ok(NpyHeader {
        descr,
        dtype,
        fortran_order,
        shape,
    })
}

/// Read a complete NPY stream
pub fn read_npy<R: Read>(reader: &mut R) -> Result<NpyArray, NpyError> {
    let header = read_npy_header(reader)?;
    let expected = header.data_size()?;

    // Grow with the bytes actually present; the header size is untrusted
    let mut data = Vec::new();
    reader.take(expected as u64).read_to_end(&mut data)?;
    if data.len() < expected {
        return Err(NpyError::Truncated {
            expected,
            actual: data.len(),
        });
    }

    Ok(NpyArray { header, data })
}

fn open(path: &Path) -> Result<BufReader<File>, ComparisonError> {
    let file = File::open(path).map_err(|e| ComparisonError::from_io(path, e))?;
    Ok(BufReader::new(file))
}

/// Load an NPY file
pub fn load_npy<P: AsRef<Path>>(path: P) -> Result<NpyArray, ComparisonError> {
    let path = path.as_ref();
    let mut reader = open(path)?;

    let array = read_npy(&mut reader).map_err(|source| ComparisonError::Npy {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        "Loaded {:?}: dtype={}, shape={:?}, fortran_order={}",
        path, array.header.descr, array.header.shape, array.header.fortran_order
    );
    Ok(array)
}

/// Load only the header of an NPY file
pub fn load_npy_header<P: AsRef<Path>>(path: P) -> Result<NpyHeader, ComparisonError> {
    let path = path.as_ref();
    let mut reader = open(path)?;
    read_npy_header(&mut reader).map_err(|source| ComparisonError::Npy {
        path: path.to_path_buf(),
        source,
    })
}

/// Load NPY file as a flat f64 vector plus its original shape
pub fn load_npy_f64<P: AsRef<Path>>(path: P) -> Result<(Vec<f64>, Vec<usize>), ComparisonError> {
    let arr = load_npy(path)?;
    let data = arr.flatten();
    Ok((data, arr.header.shape))
}

/// Find the value that follows `key:` in the header dictionary
fn value_after<'a>(header: &'a str, key: &str) -> Result<&'a str, NpyError> {
    let start = header
        .find(&format!("'{}'", key))
        .or_else(|| header.find(&format!("\"{}\"", key)))
        .ok_or_else(|| NpyError::MalformedHeader(format!("no {} in header", key)))?;

    let rest = &header[start + key.len() + 2..];
    let colon = rest
        .find(':')
        .ok_or_else(|| NpyError::MalformedHeader(format!("no colon after {}", key)))?;
    Ok(rest[colon + 1..].trim_start())
}

/// Parse dtype from NPY header
fn parse_dtype(header: &str) -> Result<String, NpyError> {
    // Look for 'descr': '<f4' or similar
    let value = value_after(header, "descr")?;

    let quote_char = match value.chars().next() {
        Some(c @ ('\'' | '"')) => c,
        _ => return Err(NpyError::MalformedHeader("no dtype string".to_string())),
    };
    let dtype_end = value[1..]
        .find(quote_char)
        .ok_or_else(|| NpyError::MalformedHeader("unclosed dtype string".to_string()))?;

    Ok(value[1..1 + dtype_end].to_string())
}

/// Parse fortran_order flag from NPY header
fn parse_fortran_order(header: &str) -> Result<bool, NpyError> {
    let value = value_after(header, "fortran_order")?;
    if value.starts_with("True") {
        Ok(true)
    } else if value.starts_with("False") {
        Ok(false)
    } else {
        Err(NpyError::MalformedHeader("fortran_order is not a bool".to_string()))
    }
}

/// Parse shape from NPY header
fn parse_shape(header: &str) -> Result<Vec<usize>, NpyError> {
    // Look for 'shape': (1, 2, 3) or similar
    let value = value_after(header, "shape")?;
    if !value.starts_with('(') {
        return Err(NpyError::MalformedHeader("no shape tuple".to_string()));
    }
    let paren_end = value
        .find(')')
        .ok_or_else(|| NpyError::MalformedHeader("unclosed shape tuple".to_string()))?;

    // Parse comma-separated integers
    value[1..paren_end]
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<usize>()
                .map_err(|e| NpyError::MalformedHeader(format!("invalid shape element: {}", e)))
        })
        .collect()
}
