#![allow(dead_code)]

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

/// Version 1.0 `.npy` bytes with the given header dict and raw payload.
pub fn npy_with_header(header: &str, payload: &[u8]) -> Vec<u8> {
    let mut header = header.to_string();
    let unpadded = NPY_MAGIC.len() + 4 + header.len() + 1;
    header.push_str(&" ".repeat((64 - unpadded % 64) % 64));
    header.push('\n');

    let mut out = Vec::with_capacity(NPY_MAGIC.len() + 4 + header.len() + payload.len());
    out.extend_from_slice(NPY_MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(payload);
    out
}

/// Little-endian `f64` array as written by `numpy.save`.
pub fn npy_f64(shape: &[usize], data: &[f64]) -> Vec<u8> {
    let dims = match shape {
        [single] => format!("{single},"),
        _ => shape
            .iter()
            .map(|dim| dim.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    };
    let header = format!("{{'descr': '<f8', 'fortran_order': False, 'shape': ({dims}), }}");
    let payload = data
        .iter()
        .flat_map(|value| value.to_le_bytes())
        .collect::<Vec<_>>();
    npy_with_header(&header, &payload)
}
