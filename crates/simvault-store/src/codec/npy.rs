//! Encoding and parsing of the `.npy` container used inside npz archives.

use simvault_core::{ErrorDetail, VaultError};

use crate::array::{ArtifactArray, DType};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const HEADER_ALIGN: usize = 64;

fn npy_error(message: impl Into<String>) -> VaultError {
    VaultError::Serde(ErrorDetail::new("npy-format", message))
}

fn shape_tuple(shape: &[usize]) -> String {
    match shape {
        [] => "()".to_string(),
        [single] => format!("({single},)"),
        dims => {
            let joined = dims
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("({joined})")
        }
    }
}

/// Encodes an array as a version 1.0 `.npy` payload.
pub fn encode(array: &ArtifactArray) -> Vec<u8> {
    let header = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
        array.dtype().descr(),
        shape_tuple(array.shape())
    );
    // magic(6) + version(2) + header_len(2) + header + newline, padded so the
    // data section starts on a 64-byte boundary.
    let unpadded = 10 + header.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    let header_len = (header.len() + padding + 1) as u16;

    let mut bytes = Vec::with_capacity(10 + header_len as usize);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&[0x01, 0x00]);
    bytes.extend_from_slice(&header_len.to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend(std::iter::repeat(b' ').take(padding));
    bytes.push(b'\n');
    bytes.extend_from_slice(&array.to_le_bytes());
    bytes
}

/// Decodes a version 1.0 or 2.0 `.npy` payload.
pub fn decode(bytes: &[u8]) -> Result<ArtifactArray, VaultError> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err(npy_error("missing npy magic"));
    }
    let major = bytes[6];
    let (header_len, header_start) = match major {
        1 => {
            let len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
            (len, 10)
        }
        2 => {
            if bytes.len() < 12 {
                return Err(npy_error("truncated npy v2 header"));
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
            (len, 12)
        }
        other => return Err(npy_error(format!("unsupported npy version {other}"))),
    };
    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err(npy_error("truncated npy header"));
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| npy_error("npy header is not valid UTF-8"))?;

    let descr = extract_str_field(header, "descr")?;
    let dtype = DType::from_descr(&descr)?;
    match extract_raw_field(header, "fortran_order")?.as_str() {
        "False" => {}
        "True" => return Err(npy_error("fortran-ordered arrays are not supported")),
        other => return Err(npy_error(format!("bad fortran_order value: {other}"))),
    }
    let shape = parse_shape(&extract_raw_field(header, "shape")?)?;

    ArtifactArray::from_le_bytes(dtype, shape, &bytes[data_start..])
}

fn field_tail<'a>(header: &'a str, name: &str) -> Result<&'a str, VaultError> {
    let key = format!("'{name}':");
    let at = header
        .find(&key)
        .ok_or_else(|| npy_error(format!("npy header misses field {name}")))?;
    Ok(header[at + key.len()..].trim_start())
}

fn extract_str_field(header: &str, name: &str) -> Result<String, VaultError> {
    let tail = field_tail(header, name)?;
    let inner = tail
        .strip_prefix('\'')
        .and_then(|rest| rest.split_once('\''))
        .ok_or_else(|| npy_error(format!("field {name} is not a string")))?;
    Ok(inner.0.to_string())
}

fn extract_raw_field(header: &str, name: &str) -> Result<String, VaultError> {
    let tail = field_tail(header, name)?;
    if tail.starts_with('(') {
        let end = tail
            .find(')')
            .ok_or_else(|| npy_error("unterminated shape tuple"))?;
        return Ok(tail[..=end].to_string());
    }
    let end = tail
        .find(|c: char| c == ',' || c == '}')
        .ok_or_else(|| npy_error(format!("unterminated field {name}")))?;
    Ok(tail[..end].trim().to_string())
}

fn parse_shape(tuple: &str) -> Result<Vec<usize>, VaultError> {
    let inner = tuple
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| npy_error("shape is not a tuple"))?;
    inner
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>()
                .map_err(|_| npy_error(format!("bad shape dimension: {part}")))
        })
        .collect()
}
