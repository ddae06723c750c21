use crate::{error::DeserializeError, ReadLeExt, WriteLeExt};
use std::io::{self, Read, Write};

/// The number of 64-bit words in a bitmap container.
pub const BITMAP_WORDS: usize = 1024;

/// The most values a container can hold, one per 16-bit value.
pub const MAX_CARDINALITY: usize = 1 << 16;

/// The kind of a [`Container`], with its serialized tag as the discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContainerType {
    /// Sorted runs of consecutive values.
    Run = 0,
    /// A fixed bitmap with one bit per 16-bit value.
    Bitmap = 1,
    /// A sorted array of 16-bit values.
    Array = 2,
}

impl ContainerType {
    /// Attempt to convert a u8 value to a [`ContainerType`], returning `None`
    /// for unknown tags.
    pub fn from_u8(value: u8) -> Option<ContainerType> {
        match value {
            0 => Some(ContainerType::Run),
            1 => Some(ContainerType::Bitmap),
            2 => Some(ContainerType::Array),
            _ => None,
        }
    }
}

/// The low 16 bits of the values that share one 48-bit key.
///
/// The registry only stores and serializes containers, the set algorithms
/// over their contents live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    /// Runs as `[start, length]` pairs, each covering `start..=start + length`.
    Run(Vec<[u16; 2]>),
    /// One bit per value, least significant bit first.
    Bitmap(Box<[u64; BITMAP_WORDS]>),
    /// Sorted values.
    Array(Vec<u16>),
}

impl Container {
    /// Create a bitmap container with no values set.
    pub fn empty_bitmap() -> Self {
        Container::Bitmap(Box::new([0; BITMAP_WORDS]))
    }

    /// Return the kind of this container.
    pub fn container_type(&self) -> ContainerType {
        match self {
            Container::Run(_) => ContainerType::Run,
            Container::Bitmap(_) => ContainerType::Bitmap,
            Container::Array(_) => ContainerType::Array,
        }
    }

    /// Return the number of values in the container.
    pub fn cardinality(&self) -> u32 {
        match self {
            Container::Run(runs) => runs
                .iter()
                .fold(0u32, |total, [_, length]| total.saturating_add(u32::from(*length) + 1)),
            Container::Bitmap(words) => words.iter().map(|word| word.count_ones()).sum(),
            Container::Array(values) => values.len() as u32,
        }
    }

    /// The number of bytes of the type specific payload.
    pub(crate) fn payload_size_in_bytes(&self) -> u64 {
        match self {
            Container::Run(runs) => 2 + 4 * runs.len() as u64,
            Container::Bitmap(_) => 8 * BITMAP_WORDS as u64,
            Container::Array(values) => 2 * values.len() as u64,
        }
    }

    /// Write `[u8 type][i32 cardinality][payload]`.
    pub(crate) fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        let cardinality = i32::try_from(self.cardinality()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "container cardinality does not fit the format",
            )
        })?;
        writer.write_u8_le(self.container_type() as u8)?;
        writer.write_i32_le(cardinality)?;

        match self {
            Container::Run(runs) => {
                let num_runs = u16::try_from(runs.len()).map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidInput, "too many runs in container")
                })?;
                writer.write_u16_le(num_runs)?;
                writer.write_u16_slice_le(bytemuck::cast_slice(&runs[..]))
            },
            Container::Bitmap(words) => writer.write_u64_slice_le(&words[..]),
            Container::Array(values) => writer.write_u16_slice_le(values),
        }
    }

    /// Read a container written by [`Container::write_to`].
    pub(crate) fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, DeserializeError> {
        let tag = reader.read_u8_le()?;
        let container_type =
            ContainerType::from_u8(tag).ok_or(DeserializeError::UnknownContainerType(tag))?;
        let cardinality = reader.read_i32_le()?;

        let container = match container_type {
            ContainerType::Run => {
                let num_runs = reader.read_u16_le()?;
                let mut runs = vec![[0; 2]; usize::from(num_runs)];
                reader.read_u16_slice_le(bytemuck::cast_slice_mut(&mut runs[..]))?;
                Container::Run(runs)
            },
            ContainerType::Bitmap => {
                let mut words = Box::new([0; BITMAP_WORDS]);
                reader.read_u64_slice_le(&mut words[..])?;
                Container::Bitmap(words)
            },
            ContainerType::Array => {
                let len = usize::try_from(cardinality)
                    .map_err(|_| DeserializeError::NegativeLength(cardinality.into()))?;
                if len > MAX_CARDINALITY {
                    return Err(DeserializeError::InvalidCardinality(cardinality));
                }
                let mut values = vec![0; len];
                reader.read_u16_slice_le(&mut values)?;
                Container::Array(values)
            },
        };

        Ok(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinality_per_kind() {
        assert_eq!(Container::Run(vec![[0, 0], [10, 4]]).cardinality(), 6);
        assert_eq!(Container::Run(vec![[0, u16::MAX]]).cardinality(), 1 << 16);
        assert_eq!(Container::Array(vec![1, 5, 9]).cardinality(), 3);

        let mut bitmap = Container::empty_bitmap();
        assert_eq!(bitmap.cardinality(), 0);
        if let Container::Bitmap(words) = &mut bitmap {
            words[0] = 0b1011;
            words[BITMAP_WORDS - 1] = u64::MAX;
        }
        assert_eq!(bitmap.cardinality(), 3 + 64);
    }

    #[test]
    fn run_container_bytes() {
        let mut buf = Vec::new();
        Container::Run(vec![[1, 2], [0x0100, 0]])
            .write_to(&mut buf)
            .unwrap();

        #[rustfmt::skip]
        let expected = [
            // type, cardinality
            0, 4, 0, 0, 0,
            // number of runs
            2, 0,
            // start, length pairs
            1, 0, 2, 0, 0x00, 0x01, 0, 0,
        ];
        assert_eq!(buf, expected);
        assert_eq!(
            Container::Run(vec![[1, 2], [0x0100, 0]]).payload_size_in_bytes(),
            (expected.len() - 5) as u64
        );
    }

    #[test]
    fn array_container_bytes() {
        let mut buf = Vec::new();
        Container::Array(vec![3, 0x0201]).write_to(&mut buf).unwrap();

        assert_eq!(buf, [2, 2, 0, 0, 0, 3, 0, 0x01, 0x02]);
        let read = Container::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(read, Container::Array(vec![3, 0x0201]));
    }

    #[test]
    fn bitmap_container_round_trip() {
        let mut words = Box::new([0; BITMAP_WORDS]);
        words[3] = 0x8000_0000_0000_0001;
        let bitmap = Container::Bitmap(words);

        let mut buf = Vec::new();
        bitmap.write_to(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, 5 + bitmap.payload_size_in_bytes());
        assert_eq!(&buf[..5], [1, 2, 0, 0, 0]);
        assert_eq!(&buf[5 + 24..5 + 32], [1, 0, 0, 0, 0, 0, 0, 0x80]);

        assert_eq!(Container::read_from(&mut buf.as_slice()).unwrap(), bitmap);
    }

    #[test]
    fn read_rejects_unknown_type() {
        let buf = [3, 0, 0, 0, 0];
        let err = Container::read_from(&mut &buf[..]).unwrap_err();
        assert!(matches!(err, DeserializeError::UnknownContainerType(3)));
    }

    #[test]
    fn read_rejects_bad_array_cardinality() {
        let negative = [2, 0xFF, 0xFF, 0xFF, 0xFF];
        let err = Container::read_from(&mut &negative[..]).unwrap_err();
        assert!(matches!(err, DeserializeError::NegativeLength(-1)));

        let too_large = [2, 0x01, 0x00, 0x01, 0x00];
        let err = Container::read_from(&mut &too_large[..]).unwrap_err();
        assert!(matches!(err, DeserializeError::InvalidCardinality(0x0001_0001)));
    }

    #[test]
    fn read_truncated_payload() {
        let buf = [2, 2, 0, 0, 0, 1, 0];
        let err = Container::read_from(&mut &buf[..]).unwrap_err();
        assert!(matches!(err, DeserializeError::Io(_)));
    }
}
