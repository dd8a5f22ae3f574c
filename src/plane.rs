//! Bounds-checked views over strided image planes.
//!
//! Decoders hand out planes whose rows are padded for alignment: the distance
//! between two row starts (the *stride*) can be larger than the number of
//! bytes a row actually holds. [`PlaneView`] captures the slice, the stride
//! and the logical row width together and only ever yields the logical part
//! of each row, so padding bytes cannot reach an output file.
//!
//! # Example
//!
//! ```
//! use framedump::PlaneView;
//!
//! // Two rows of three pixels, each row padded to four bytes.
//! let buffer = [1, 2, 3, 0, 4, 5, 6, 0];
//! let plane = PlaneView::new(&buffer, 4, 3, 2)?;
//!
//! let rows: Vec<&[u8]> = plane.rows().collect();
//! assert_eq!(rows, vec![&[1, 2, 3][..], &[4, 5, 6][..]]);
//! assert_eq!(plane.to_packed(), vec![1, 2, 3, 4, 5, 6]);
//! # Ok::<(), framedump::FrameDumpError>(())
//! ```

use crate::error::FrameDumpError;

/// A read-only view of one image plane.
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a> {
    data: &'a [u8],
    stride: usize,
    row_bytes: usize,
    rows: usize,
}

impl<'a> PlaneView<'a> {
    /// Create a view over `rows` rows of `row_bytes` bytes, each starting
    /// `stride` bytes after the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`FrameDumpError::InvalidPlane`] if `stride < row_bytes` or if
    /// `data` is too short to contain the last addressed row.
    pub fn new(
        data: &'a [u8],
        stride: usize,
        row_bytes: usize,
        rows: usize,
    ) -> Result<Self, FrameDumpError> {
        if stride < row_bytes {
            return Err(FrameDumpError::InvalidPlane(format!(
                "stride {stride} is smaller than the row width of {row_bytes} bytes"
            )));
        }

        let required = match rows {
            0 => 0,
            _ => (rows - 1)
                .checked_mul(stride)
                .and_then(|offset| offset.checked_add(row_bytes))
                .ok_or_else(|| {
                    FrameDumpError::InvalidPlane(format!(
                        "{rows} rows of stride {stride} overflow the address space"
                    ))
                })?,
        };

        if data.len() < required {
            return Err(FrameDumpError::InvalidPlane(format!(
                "buffer holds {} bytes but {rows} rows of {row_bytes} bytes at stride {stride} need {required}",
                data.len()
            )));
        }

        Ok(Self {
            data,
            stride,
            row_bytes,
            rows,
        })
    }

    /// Distance in bytes between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of meaningful bytes in each row.
    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows
    }

    /// The logical bytes of row `index`, or `None` past the last row.
    pub fn row(&self, index: usize) -> Option<&'a [u8]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.stride;
        self.data.get(start..start + self.row_bytes)
    }

    /// Iterate over every row, top to bottom, without padding.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &'a [u8]> + 'a {
        let view = *self;
        (0..view.rows).map(move |index| {
            let start = index * view.stride;
            &view.data[start..start + view.row_bytes]
        })
    }

    /// The byte at (`row`, `column`), where `column` counts bytes.
    pub fn get(&self, row: usize, column: usize) -> Option<u8> {
        if column >= self.row_bytes {
            return None;
        }
        self.row(row).map(|bytes| bytes[column])
    }

    /// Copy the plane into a tightly packed buffer of
    /// `row_bytes * height` bytes.
    pub fn to_packed(&self) -> Vec<u8> {
        if self.stride == self.row_bytes {
            return self.data[..self.row_bytes * self.rows].to_vec();
        }

        let mut buffer = Vec::with_capacity(self.row_bytes * self.rows);
        for row in self.rows() {
            buffer.extend_from_slice(row);
        }
        buffer
    }
}
