//! Little-endian primitives shared by the tree and registry formats.
//!
//! Every multi-byte integer in the serialized formats is little-endian,
//! independent of the host byte order. Fixed buffers go through the same code
//! as streams: `&[u8]` implements [`Read`] and `&mut [u8]` implements
//! [`Write`].

use paste::paste;
use std::io::{self, Read, Write};

macro_rules! le_codec_for_integers {
    (values: $($type:ty),*; slices: $($slice_type:ty),*) => {
        paste! {
            /// Read little-endian integers from any byte source.
            pub trait ReadLeExt: Read {
                $(
                    fn [<read_ $type _le>](&mut self) -> io::Result<$type> {
                        let mut buf = [0; ::std::mem::size_of::<$type>()];
                        self.read_exact(&mut buf)?;
                        Ok(<$type>::from_le_bytes(buf))
                    }
                )*

                $(
                    /// Fill `out` with consecutive little-endian values.
                    fn [<read_ $slice_type _slice_le>](&mut self, out: &mut [$slice_type]) -> io::Result<()> {
                        self.read_exact(bytemuck::cast_slice_mut(out))?;
                        for value in out.iter_mut() {
                            *value = <$slice_type>::from_le(*value);
                        }
                        Ok(())
                    }
                )*
            }

            /// Write little-endian integers to any byte sink.
            pub trait WriteLeExt: Write {
                $(
                    fn [<write_ $type _le>](&mut self, value: $type) -> io::Result<()> {
                        self.write_all(&value.to_le_bytes())
                    }
                )*

                $(
                    fn [<write_ $slice_type _slice_le>](&mut self, values: &[$slice_type]) -> io::Result<()> {
                        if cfg!(target_endian = "little") {
                            return self.write_all(bytemuck::cast_slice(values));
                        }

                        for value in values {
                            self.write_all(&value.to_le_bytes())?;
                        }
                        Ok(())
                    }
                )*
            }
        }
    };
}

le_codec_for_integers!(values: u8, u16, u32, u64, i32, i64; slices: u16, u64);

impl<R: Read + ?Sized> ReadLeExt for R {}

impl<W: Write + ?Sized> WriteLeExt for W {}

/// A [`Write`] adapter that counts the bytes passed through it.
pub(crate) struct CountingWriter<W> {
    inner: W,
    written: usize,
}

impl<W: Write> CountingWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        CountingWriter { inner, written: 0 }
    }

    pub(crate) fn written(&self) -> usize {
        self.written
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.written += written;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_little_endian() {
        let mut buf = Vec::new();
        buf.write_u16_le(0x0102).unwrap();
        buf.write_u32_le(0x0304_0506).unwrap();
        buf.write_u64_le(0x0708_090A_0B0C_0D0E).unwrap();
        buf.write_i32_le(-2).unwrap();

        assert_eq!(
            buf,
            [
                0x02, 0x01, 0x06, 0x05, 0x04, 0x03, 0x0E, 0x0D, 0x0C, 0x0B, 0x0A, 0x09, 0x08, 0x07,
                0xFE, 0xFF, 0xFF, 0xFF
            ]
        );

        let mut reader = buf.as_slice();
        assert_eq!(reader.read_u16_le().unwrap(), 0x0102);
        assert_eq!(reader.read_u32_le().unwrap(), 0x0304_0506);
        assert_eq!(reader.read_u64_le().unwrap(), 0x0708_090A_0B0C_0D0E);
        assert_eq!(reader.read_i32_le().unwrap(), -2);
        assert!(reader.is_empty());
    }

    #[test]
    fn slices_are_little_endian() {
        let mut buf = Vec::new();
        buf.write_u16_slice_le(&[0x0102, 0x0304]).unwrap();
        assert_eq!(buf, [0x02, 0x01, 0x04, 0x03]);

        let mut out = [0u16; 2];
        buf.as_slice().read_u16_slice_le(&mut out).unwrap();
        assert_eq!(out, [0x0102, 0x0304]);
    }

    #[test]
    fn short_read_is_unexpected_eof() {
        let mut reader: &[u8] = &[1, 2, 3];
        let err = reader.read_u32_le().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn fixed_buffer_counts_written_bytes() {
        let mut storage = [0u8; 8];
        let mut writer = CountingWriter::new(&mut storage[..]);
        writer.write_u32_le(7).unwrap();
        writer.write_u8_le(1).unwrap();
        assert_eq!(writer.written(), 5);

        let err = writer.write_u64_le(0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }
}
