//! Reader for the `NumPy` `.npy` centroid artifact.
//!
//! Only C-ordered `f8` arrays are accepted; the values are kept flat with
//! their shape so callers can slice rows along the outermost axis.

use std::path::Path;

use npyz::{NpyFile, Order};

use crate::AnalysisError;

/// A dense array of floats with its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    /// Dimensions, outermost first.
    pub shape: Vec<usize>,
    /// Elements in C (row-major) order.
    pub data: Vec<f64>,
}

impl NpyArray {
    /// Reads the `.npy` file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if the file cannot be read or is not a
    /// supported `.npy` array.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Parses `.npy` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Conversion`] on a malformed header, a dtype
    /// other than `f8`, Fortran order, or truncated data.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AnalysisError> {
        let npy = NpyFile::new(bytes).map_err(|e| conversion(&e.to_string()))?;

        if matches!(npy.order(), Order::Fortran) {
            return Err(conversion("Fortran-ordered arrays are not supported"));
        }

        let shape = npy
            .shape()
            .iter()
            .map(|&dim| usize::try_from(dim).map_err(|_| conversion("shape too large")))
            .collect::<Result<Vec<_>, _>>()?;

        let data = npy
            .into_vec::<f64>()
            .map_err(|e| conversion(&e.to_string()))?;

        Ok(Self { shape, data })
    }

    /// Number of rows along the outermost axis.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Elements of the `index`-th outermost row, flattened.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        let width: usize = self.shape.iter().skip(1).product();
        let start = index.checked_mul(width)?;
        self.data.get(start..start + width)
    }
}

fn conversion(message: &str) -> AnalysisError {
    AnalysisError::Conversion {
        message: format!("Invalid .npy data: {message}"),
    }
}

/// Encodes a C-ordered `<f8` array in `.npy` version 1 format.
#[cfg(test)]
pub fn encode_f8(shape: &[usize], data: &[f64]) -> Vec<u8> {
    let dims: Vec<String> = shape.iter().map(ToString::to_string).collect();
    let shape = if dims.len() == 1 {
        format!("({},)", dims[0])
    } else {
        format!("({})", dims.join(", "))
    };
    let mut header =
        format!("{{'descr': '<f8', 'fortran_order': False, 'shape': {shape}, }}");
    while (10 + header.len() + 1) % 64 != 0 {
        header.push(' ');
    }
    header.push('\n');

    let mut bytes = b"\x93NUMPY".to_vec();
    bytes.extend_from_slice(&[1, 0]);
    bytes.extend_from_slice(&u16::try_from(header.len()).unwrap().to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    for value in data {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_three_dimensional_f8() {
        let data: Vec<f64> = (0..12).map(f64::from).collect();
        let array = NpyArray::from_bytes(&encode_f8(&[2, 6, 1], &data)).unwrap();
        assert_eq!(array.shape, vec![2, 6, 1]);
        assert_eq!(array.rows(), 2);
        assert_eq!(array.row(1).unwrap(), &[6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
        assert!(array.row(2).is_none());
    }

    #[test]
    fn reads_one_dimensional_shape() {
        let array = NpyArray::from_bytes(&encode_f8(&[3], &[1.5, 2.5, 3.5])).unwrap();
        assert_eq!(array.shape, vec![3]);
        assert_eq!(array.data, vec![1.5, 2.5, 3.5]);
    }

    #[test]
    fn rejects_non_f8_dtype() {
        let mut bytes = encode_f8(&[2], &[]);
        let text = String::from_utf8(bytes[10..].to_vec()).unwrap();
        let patched = text.replace("<f8", "<i8");
        bytes.truncate(10);
        bytes.extend_from_slice(patched.as_bytes());
        bytes.extend_from_slice(&1_i64.to_le_bytes());
        bytes.extend_from_slice(&2_i64.to_le_bytes());

        assert!(matches!(
            NpyArray::from_bytes(&bytes),
            Err(AnalysisError::Conversion { .. })
        ));
    }

    #[test]
    fn rejects_truncated_data() {
        let mut bytes = encode_f8(&[4], &[1.0, 2.0, 3.0, 4.0]);
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(
            NpyArray::from_bytes(&bytes),
            Err(AnalysisError::Conversion { .. })
        ));
    }

    #[test]
    fn rejects_bad_magic() {
        assert!(NpyArray::from_bytes(b"PK\x03\x04 not numpy").is_err());
    }
}
