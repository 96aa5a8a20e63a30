//! Minimal reader for NumPy `.npy` files holding numeric arrays. Only the
//! layouts written by `numpy.save` for plain float/int dtypes are accepted.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::FoldBenchError;

const MAGIC: &[u8] = b"\x93NUMPY";

static DESCR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"'descr'\s*:\s*'([<>|=])([fiu])(\d+)'"#).expect("descr regex"));
static SHAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'shape'\s*:\s*\(([^)]*)\)").expect("shape regex"));

/// Array values in file order, widened to `f64`. The shape is only used to
/// size the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Float,
    Int,
    Uint,
}

pub fn read_npy(path: &Path) -> Result<NpyArray, FoldBenchError> {
    let bytes = fs::read(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            FoldBenchError::MissingSibling(path.to_path_buf())
        } else {
            FoldBenchError::malformed(path, err)
        }
    })?;
    parse_npy(&bytes).map_err(|message| FoldBenchError::malformed(path, message))
}

pub fn parse_npy(bytes: &[u8]) -> Result<NpyArray, String> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err("not an .npy file".to_string());
    }
    let major = bytes[6];
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err("truncated header".to_string());
            }
            (
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                12,
            )
        }
        other => return Err(format!("unsupported .npy version {other}")),
    };
    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err("truncated header".to_string());
    }
    let header = String::from_utf8_lossy(&bytes[header_start..data_start]);

    let descr = DESCR_RE
        .captures(&header)
        .ok_or_else(|| format!("unsupported dtype in header {}", header.trim()))?;
    let endian = match &descr[1] {
        ">" => Endian::Big,
        _ => Endian::Little,
    };
    let kind = match &descr[2] {
        "f" => Kind::Float,
        "i" => Kind::Int,
        _ => Kind::Uint,
    };
    let width: usize = descr[3]
        .parse()
        .map_err(|_| format!("invalid dtype width {}", &descr[3]))?;
    if !matches!((kind, width), (Kind::Float, 4 | 8) | (Kind::Int | Kind::Uint, 1 | 2 | 4 | 8)) {
        return Err(format!(
            "unsupported dtype {}{}{}",
            &descr[1], &descr[2], &descr[3]
        ));
    }

    let shape = SHAPE_RE
        .captures(&header)
        .ok_or_else(|| "missing shape".to_string())?[1]
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| dim.parse::<usize>().map_err(|_| format!("invalid dimension {dim}")))
        .collect::<Result<Vec<_>, _>>()?;
    let count = shape
        .iter()
        .try_fold(1usize, |acc, dim| acc.checked_mul(*dim))
        .ok_or_else(|| "shape overflow".to_string())?;
    let byte_len = count
        .checked_mul(width)
        .ok_or_else(|| "shape overflow".to_string())?;

    let payload = &bytes[data_start..];
    if payload.len() < byte_len {
        return Err(format!(
            "expected {count} elements of {width} bytes, found {} bytes",
            payload.len()
        ));
    }

    let data = payload
        .chunks_exact(width)
        .take(count)
        .map(|chunk| decode(chunk, kind, endian))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NpyArray { data })
}

fn decode(chunk: &[u8], kind: Kind, endian: Endian) -> Result<f64, String> {
    macro_rules! read {
        ($ty:ty, $n:expr) => {{
            let mut buf = [0u8; $n];
            buf.copy_from_slice(chunk);
            match endian {
                Endian::Little => <$ty>::from_le_bytes(buf),
                Endian::Big => <$ty>::from_be_bytes(buf),
            }
        }};
    }

    let value = match (kind, chunk.len()) {
        (Kind::Float, 4) => read!(f32, 4) as f64,
        (Kind::Float, 8) => read!(f64, 8),
        (Kind::Int, 1) => read!(i8, 1) as f64,
        (Kind::Int, 2) => read!(i16, 2) as f64,
        (Kind::Int, 4) => read!(i32, 4) as f64,
        (Kind::Int, 8) => read!(i64, 8) as f64,
        (Kind::Uint, 1) => read!(u8, 1) as f64,
        (Kind::Uint, 2) => read!(u16, 2) as f64,
        (Kind::Uint, 4) => read!(u32, 4) as f64,
        (Kind::Uint, 8) => read!(u64, 8) as f64,
        (kind, width) => return Err(format!("unsupported dtype {kind:?}{width}")),
    };
    Ok(value)
}
