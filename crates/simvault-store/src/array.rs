//! In-memory model for named numeric arrays.

use std::collections::BTreeMap;

use simvault_core::{ErrorDetail, VaultError};

/// Element types a codec must round-trip exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    F64,
    F32,
    I64,
    I32,
    U8,
    Bool,
}

impl DType {
    /// The numpy dtype descriptor recorded on disk.
    pub fn descr(&self) -> &'static str {
        match self {
            DType::F64 => "<f8",
            DType::F32 => "<f4",
            DType::I64 => "<i8",
            DType::I32 => "<i4",
            DType::U8 => "|u1",
            DType::Bool => "|b1",
        }
    }

    /// Parses a dtype descriptor; anything outside the supported set is a
    /// hard codec error.
    pub fn from_descr(descr: &str) -> Result<Self, VaultError> {
        match descr {
            "<f8" => Ok(DType::F64),
            "<f4" => Ok(DType::F32),
            "<i8" => Ok(DType::I64),
            "<i4" => Ok(DType::I32),
            "|u1" => Ok(DType::U8),
            "|b1" => Ok(DType::Bool),
            other => Err(VaultError::Serde(
                ErrorDetail::new("dtype-unsupported", "unsupported array element type")
                    .with_context("descr", other),
            )),
        }
    }

    /// Size of one element in bytes.
    pub fn item_size(&self) -> usize {
        match self {
            DType::F64 | DType::I64 => 8,
            DType::F32 | DType::I32 => 4,
            DType::U8 | DType::Bool => 1,
        }
    }
}

/// Typed storage for one array's elements.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    F64(Vec<f64>),
    F32(Vec<f32>),
    I64(Vec<i64>),
    I32(Vec<i32>),
    U8(Vec<u8>),
    Bool(Vec<bool>),
}

impl ArrayData {
    fn len(&self) -> usize {
        match self {
            ArrayData::F64(values) => values.len(),
            ArrayData::F32(values) => values.len(),
            ArrayData::I64(values) => values.len(),
            ArrayData::I32(values) => values.len(),
            ArrayData::U8(values) => values.len(),
            ArrayData::Bool(values) => values.len(),
        }
    }

    fn dtype(&self) -> DType {
        match self {
            ArrayData::F64(_) => DType::F64,
            ArrayData::F32(_) => DType::F32,
            ArrayData::I64(_) => DType::I64,
            ArrayData::I32(_) => DType::I32,
            ArrayData::U8(_) => DType::U8,
            ArrayData::Bool(_) => DType::Bool,
        }
    }
}

/// One named artifact: a dense, C-ordered numeric array.
///
/// An empty shape denotes a 0-d scalar (one element); a shape containing a
/// zero denotes an empty array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactArray {
    shape: Vec<usize>,
    data: ArrayData,
}

/// A run's complete artifact mapping, keyed by array name.
pub type ArtifactSet = BTreeMap<String, ArtifactArray>;

impl ArtifactArray {
    /// Builds an array, validating the element count against the shape.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self, VaultError> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(VaultError::Validation(
                ErrorDetail::new("array-shape", "element count does not match shape")
                    .with_context("expected", expected.to_string())
                    .with_context("actual", data.len().to_string()),
            ));
        }
        Ok(Self { shape, data })
    }

    /// Convenience constructor for a 1-d f64 array.
    pub fn from_f64(values: Vec<f64>) -> Self {
        Self {
            shape: vec![values.len()],
            data: ArrayData::F64(values),
        }
    }

    /// Convenience constructor for a 1-d i64 array.
    pub fn from_i64(values: Vec<i64>) -> Self {
        Self {
            shape: vec![values.len()],
            data: ArrayData::I64(values),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    /// Number of elements (1 for a 0-d scalar).
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Little-endian C-order byte view of the elements.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.element_count() * self.dtype().item_size());
        match &self.data {
            ArrayData::F64(values) => {
                for value in values {
                    bytes.extend_from_slice(&value.to_le_bytes());
                }
            }
            ArrayData::F32(values) => {
                for value in values {
                    bytes.extend_from_slice(&value.to_le_bytes());
                }
            }
            ArrayData::I64(values) => {
                for value in values {
                    bytes.extend_from_slice(&value.to_le_bytes());
                }
            }
            ArrayData::I32(values) => {
                for value in values {
                    bytes.extend_from_slice(&value.to_le_bytes());
                }
            }
            ArrayData::U8(values) => bytes.extend_from_slice(values),
            ArrayData::Bool(values) => bytes.extend(values.iter().map(|flag| *flag as u8)),
        }
        bytes
    }

    /// Rebuilds an array from raw little-endian bytes.
    pub fn from_le_bytes(dtype: DType, shape: Vec<usize>, bytes: &[u8]) -> Result<Self, VaultError> {
        let count: usize = shape.iter().product();
        if bytes.len() != count * dtype.item_size() {
            return Err(VaultError::Serde(
                ErrorDetail::new("array-bytes", "raw payload does not match dtype and shape")
                    .with_context("expected_bytes", (count * dtype.item_size()).to_string())
                    .with_context("actual_bytes", bytes.len().to_string()),
            ));
        }
        let data = match dtype {
            DType::F64 => ArrayData::F64(
                bytes
                    .chunks_exact(8)
                    .map(|chunk| f64::from_le_bytes(chunk.try_into().unwrap_or([0; 8])))
                    .collect(),
            ),
            DType::F32 => ArrayData::F32(
                bytes
                    .chunks_exact(4)
                    .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap_or([0; 4])))
                    .collect(),
            ),
            DType::I64 => ArrayData::I64(
                bytes
                    .chunks_exact(8)
                    .map(|chunk| i64::from_le_bytes(chunk.try_into().unwrap_or([0; 8])))
                    .collect(),
            ),
            DType::I32 => ArrayData::I32(
                bytes
                    .chunks_exact(4)
                    .map(|chunk| i32::from_le_bytes(chunk.try_into().unwrap_or([0; 4])))
                    .collect(),
            ),
            DType::U8 => ArrayData::U8(bytes.to_vec()),
            DType::Bool => ArrayData::Bool(bytes.iter().map(|byte| *byte != 0).collect()),
        };
        Self::new(shape, data)
    }
}
