//! A two-level registry of containers, addressed by a composite 64-bit index.

use crate::{
    error::{CapacityError, DeserializeError, SerializeError},
    CountingWriter, ReadLeExt, WriteLeExt,
};
use std::io::{self, Read, Write};

mod container;
pub use container::*;


/// The default capacity limit of a single bucket.
pub const DEFAULT_MAX_BUCKET_LEN: usize = i32::MAX as usize - 8;

const NULL_MARK: u8 = 0;
const NOT_NULL_MARK: u8 = 1;
/// Buckets are always written whole, compacted buckets are not supported.
const NOT_TRIMMED_MARK: u8 = 0xFE;

/// Bytes of the bucket count that starts the format.
const BUCKET_COUNT_LEN: u64 = 4;
/// Bytes of the trim marker and length that start each bucket.
const BUCKET_HEADER_LEN: u64 = 1 + 4;
/// Bytes of the null marker, type and cardinality that start each live slot.
const SLOT_HEADER_LEN: u64 = 1 + 1 + 4;
/// Bytes of the container count and last index that end the format.
const TRAILER_LEN: u64 = 8 + 4 + 4;

/// Pack a bucket index and a slot index into a container index.
pub fn to_container_idx(first_level: u32, second_level: u32) -> u64 {
    (u64::from(first_level) << 32) | u64::from(second_level)
}

/// Split a container index into its bucket index and slot index.
pub fn split_container_idx(container_idx: u64) -> (u32, u32) {
    ((container_idx >> 32) as u32, container_idx as u32)
}

/// Runtime settings of a [`Containers`] registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainersConfig {
    /// The capacity limit of one bucket. A new bucket is started once the
    /// current one holds `max_bucket_len - 1` containers.
    pub max_bucket_len: usize,
}

impl Default for ContainersConfig {
    fn default() -> Self {
        ContainersConfig {
            max_bucket_len: DEFAULT_MAX_BUCKET_LEN,
        }
    }
}

/// A registry of [`Container`]s with stable indices.
///
/// Containers are appended to the last bucket, and a new bucket is started
/// when the last one is full. Removing a container leaves a hole that is
/// never reused or compacted, so an index stays valid for as long as its
/// container is present.
///
/// # Examples
///
/// ```rust
/// use roaring_art::{Container, Containers};
///
/// let mut containers = Containers::new();
/// let first = containers.add(Container::Array(vec![1, 2, 3])).unwrap();
/// let second = containers.add(Container::Run(vec![[10, 5]])).unwrap();
///
/// assert_eq!(containers.get(first).map(Container::cardinality), Some(3));
/// assert_eq!(containers.remove(second), Some(Container::Run(vec![[10, 5]])));
/// assert_eq!(containers.get(second), None);
/// assert_eq!(containers.container_size(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Containers {
    buckets: Vec<Vec<Option<Container>>>,
    /// The number of live containers.
    container_size: u64,
    /// The slot filled by the most recent [`Containers::add`].
    last_added: Option<(u32, u32)>,
    config: ContainersConfig,
}

impl Default for Containers {
    fn default() -> Self {
        Self::new()
    }
}

impl Containers {
    /// Create an empty registry with the default configuration.
    ///
    /// This function will not pre-allocate anything.
    pub fn new() -> Self {
        Self::with_config(ContainersConfig::default())
    }

    /// Create an empty registry with the given configuration.
    ///
    /// # Panics
    ///
    ///  - Panics if `config.max_bucket_len` is less than 2, since a bucket
    ///    must be able to hold at least one container.
    pub fn with_config(config: ContainersConfig) -> Self {
        assert!(
            config.max_bucket_len >= 2,
            "max_bucket_len must be at least 2, got [{}]",
            config.max_bucket_len
        );

        Containers {
            buckets: Vec::new(),
            container_size: 0,
            last_added: None,
            config,
        }
    }

    /// Return the configuration of this registry.
    pub fn config(&self) -> &ContainersConfig {
        &self.config
    }

    /// Return the number of live containers.
    pub fn container_size(&self) -> u64 {
        self.container_size
    }

    /// Return true if the registry holds no live containers.
    pub fn is_empty(&self) -> bool {
        self.container_size == 0
    }

    fn next_slot(&self) -> Result<(u32, u32), CapacityError> {
        let next = match self.last_added {
            None => (0, 0),
            Some((first, second)) if second as usize + 1 != self.config.max_bucket_len - 1 => {
                (first, second + 1)
            },
            Some((first, _)) => {
                let first = first.checked_add(1).ok_or(CapacityError::Overflow {
                    requested: self.buckets.len() + 1,
                })?;
                (first, 0)
            },
        };
        Ok(next)
    }

    /// Grow the bucket to hold at least `min_capacity` slots, by half of its
    /// current length at a time.
    fn grow_bucket(&mut self, first: usize, min_capacity: usize) -> Result<(), CapacityError> {
        let max_bucket_len = self.config.max_bucket_len;
        let bucket = &mut self.buckets[first];
        let old_len = bucket.len();
        if min_capacity <= old_len {
            return Ok(());
        }
        if min_capacity > max_bucket_len {
            return Err(CapacityError::Overflow {
                requested: min_capacity,
            });
        }

        let new_len = old_len
            .saturating_add(old_len >> 1)
            .max(min_capacity)
            .min(max_bucket_len);
        bucket.try_reserve_exact(new_len - old_len)?;
        bucket.resize_with(new_len, || None);
        tracing::debug!(bucket = first, old_len, new_len, "grew container bucket");
        Ok(())
    }

    /// Store `container` in the next free slot and return its index.
    ///
    /// # Errors
    ///
    /// Returns a [`CapacityError`] if the bucket cannot grow. The registry is
    /// left unchanged in that case.
    pub fn add(&mut self, container: Container) -> Result<u64, CapacityError> {
        let (first, second) = self.next_slot()?;

        if second == 0 {
            let mut bucket = Vec::new();
            bucket.try_reserve_exact(1)?;
            bucket.push(None);
            self.buckets.try_reserve(1)?;
            self.buckets.push(bucket);
            tracing::debug!(bucket = first, "allocated container bucket");
        } else {
            self.grow_bucket(first as usize, second as usize + 1)?;
        }

        self.buckets[first as usize][second as usize] = Some(container);
        self.last_added = Some((first, second));
        self.container_size += 1;
        Ok(to_container_idx(first, second))
    }

    fn slot(&self, container_idx: u64) -> Option<&Option<Container>> {
        let (first, second) = split_container_idx(container_idx);
        self.buckets.get(first as usize)?.get(second as usize)
    }

    fn slot_mut(&mut self, container_idx: u64) -> Option<&mut Option<Container>> {
        let (first, second) = split_container_idx(container_idx);
        self.buckets
            .get_mut(first as usize)?
            .get_mut(second as usize)
    }

    /// Return the container at `container_idx`, if it is present.
    pub fn get(&self, container_idx: u64) -> Option<&Container> {
        self.slot(container_idx)?.as_ref()
    }

    /// Return the container at `container_idx` mutably, if it is present.
    pub fn get_mut(&mut self, container_idx: u64) -> Option<&mut Container> {
        self.slot_mut(container_idx)?.as_mut()
    }

    /// Store `container` at `container_idx`, and return the container that
    /// was there before.
    ///
    /// Filling a hole left by [`Containers::remove`] makes the slot live
    /// again.
    ///
    /// # Panics
    ///
    ///  - Panics if `container_idx` is outside of every bucket.
    pub fn replace(&mut self, container_idx: u64, container: Container) -> Option<Container> {
        let Some(slot) = self.slot_mut(container_idx) else {
            panic!("container index [{container_idx:#x}] is out of bounds");
        };

        let previous = slot.replace(container);
        if previous.is_none() {
            self.container_size += 1;
        }
        previous
    }

    /// Remove and return the container at `container_idx`.
    ///
    /// The slot becomes a hole, later containers are not moved.
    pub fn remove(&mut self, container_idx: u64) -> Option<Container> {
        let removed = self.slot_mut(container_idx)?.take();
        if removed.is_some() {
            self.container_size = self.container_size.saturating_sub(1);
        }
        removed
    }

    /// Iterate over the live containers with their indices, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Container)> + '_ {
        self.buckets.iter().zip(0u32..).flat_map(|(bucket, first)| {
            bucket
                .iter()
                .zip(0u32..)
                .filter_map(move |(slot, second)| {
                    Some((to_container_idx(first, second), slot.as_ref()?))
                })
        })
    }

    /// Iterate mutably over the live containers with their indices, in index
    /// order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u64, &mut Container)> + '_ {
        self.buckets.iter_mut().zip(0u32..).flat_map(|(bucket, first)| {
            bucket
                .iter_mut()
                .zip(0u32..)
                .filter_map(move |(slot, second)| {
                    Some((to_container_idx(first, second), slot.as_mut()?))
                })
        })
    }

    /// Return a cursor over the live containers that can replace the
    /// container it is positioned on.
    pub fn container_iterator(&mut self) -> ContainerIterator<'_> {
        ContainerIterator {
            containers: self,
            next_slot: (0, 0),
            current: None,
        }
    }

    /// Return the number of bytes [`Containers::serialize`] writes.
    pub fn serialized_size_in_bytes(&self) -> u64 {
        let buckets: u64 = self
            .buckets
            .iter()
            .map(|bucket| {
                let slots: u64 = bucket
                    .iter()
                    .map(|slot| match slot {
                        Some(container) => SLOT_HEADER_LEN + container.payload_size_in_bytes(),
                        None => 1,
                    })
                    .sum();
                BUCKET_HEADER_LEN + slots
            })
            .sum();

        BUCKET_COUNT_LEN + buckets + TRAILER_LEN
    }

    /// Write the registry to `writer` and return the number of bytes written.
    ///
    /// Every slot of every bucket is written, including holes and unused
    /// capacity, so indices are stable across a round trip.
    pub fn serialize<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<usize> {
        let mut writer = CountingWriter::new(writer);

        writer.write_i32_le(length_field(self.buckets.len())?)?;
        for bucket in &self.buckets {
            writer.write_u8_le(NOT_TRIMMED_MARK)?;
            writer.write_i32_le(length_field(bucket.len())?)?;
            for slot in bucket {
                match slot {
                    Some(container) => {
                        writer.write_u8_le(NOT_NULL_MARK)?;
                        container.write_to(&mut writer)?;
                    },
                    None => writer.write_u8_le(NULL_MARK)?,
                }
            }
        }

        let (first, second) = match self.last_added {
            Some((first, second)) => (first as i32, second as i32),
            None => (-1, 0),
        };
        writer.write_i64_le(self.container_size as i64)?;
        writer.write_i32_le(first)?;
        writer.write_i32_le(second)?;

        tracing::debug!(
            num_buckets = self.buckets.len(),
            container_size = self.container_size,
            bytes = writer.written(),
            "serialized containers"
        );
        Ok(writer.written())
    }

    /// Write the registry into the front of `buf` and return the number of
    /// bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] without writing anything if
    /// `buf` is shorter than [`Containers::serialized_size_in_bytes`].
    pub fn serialize_into_slice(&self, buf: &mut [u8]) -> Result<usize, SerializeError> {
        let needed = self.serialized_size_in_bytes();
        if needed > buf.len() as u64 {
            return Err(SerializeError::BufferTooSmall {
                needed,
                available: buf.len(),
            });
        }

        let mut writer = buf;
        Ok(self.serialize(&mut writer)?)
    }

    /// Read a registry written by [`Containers::serialize`], with the default
    /// configuration.
    ///
    /// The bucket limit is not part of the format. A registry that was written
    /// with a smaller limit should be read with
    /// [`Containers::deserialize_with_config`], so that it keeps rolling over
    /// buckets at the same point.
    ///
    /// # Errors
    ///
    /// Unknown markers or container types abort the read, see
    /// [`DeserializeError`].
    pub fn deserialize<R: Read + ?Sized>(reader: &mut R) -> Result<Containers, DeserializeError> {
        Self::deserialize_with_config(reader, ContainersConfig::default())
    }

    /// Read a registry written by [`Containers::serialize`], and give it
    /// `config` for the containers added afterwards.
    ///
    /// # Errors
    ///
    /// See [`Containers::deserialize`].
    ///
    /// # Panics
    ///
    ///  - Panics if `config.max_bucket_len` is less than 2.
    pub fn deserialize_with_config<R: Read + ?Sized>(
        reader: &mut R,
        config: ContainersConfig,
    ) -> Result<Containers, DeserializeError> {
        let mut containers = Containers::with_config(config);

        let num_buckets = read_length(reader)?;
        let mut buckets = Vec::new();
        for _ in 0..num_buckets {
            // Buckets are never trimmed, the marker carries no information.
            let _trim_mark = reader.read_u8_le()?;

            let bucket_len = read_length(reader)?;
            let mut bucket = Vec::new();
            for _ in 0..bucket_len {
                let slot = match reader.read_u8_le()? {
                    NULL_MARK => None,
                    NOT_NULL_MARK => Some(Container::read_from(reader)?),
                    mark => return Err(DeserializeError::InvalidNullMarker(mark)),
                };
                bucket.push(slot);
            }
            buckets.push(bucket);
        }

        let container_size = reader.read_i64_le()?;
        let container_size = u64::try_from(container_size)
            .map_err(|_| DeserializeError::NegativeLength(container_size))?;
        let first = reader.read_i32_le()?;
        let second = reader.read_i32_le()?;
        let last_added = last_added_from_trailer(&buckets, first, second)?;

        tracing::debug!(
            num_buckets = buckets.len(),
            container_size,
            "deserialized containers"
        );
        containers.buckets = buckets;
        containers.container_size = container_size;
        containers.last_added = last_added;
        Ok(containers)
    }

    /// Read a registry from the front of `buf`, and return it with the number
    /// of bytes read.
    pub fn deserialize_from_slice(buf: &[u8]) -> Result<(Containers, usize), DeserializeError> {
        let mut reader = buf;
        let containers = Containers::deserialize(&mut reader)?;
        Ok((containers, buf.len() - reader.len()))
    }
}

fn length_field(len: usize) -> io::Result<i32> {
    i32::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "registry length does not fit the format",
        )
    })
}

fn read_length<R: Read + ?Sized>(reader: &mut R) -> Result<usize, DeserializeError> {
    let len = reader.read_i32_le()?;
    usize::try_from(len).map_err(|_| DeserializeError::NegativeLength(len.into()))
}

/// The trailer must point into the last bucket, or be `(-1, _)` when there
/// are no buckets.
fn last_added_from_trailer(
    buckets: &[Vec<Option<Container>>],
    first: i32,
    second: i32,
) -> Result<Option<(u32, u32)>, DeserializeError> {
    if first < 0 && buckets.is_empty() {
        return Ok(None);
    }

    let invalid = || DeserializeError::InvalidLastIndex {
        first_level: first,
        second_level: second,
    };
    let (Ok(first_idx), Ok(second_idx)) = (u32::try_from(first), u32::try_from(second)) else {
        return Err(invalid());
    };
    let is_last_bucket = first_idx as usize + 1 == buckets.len();
    let in_bucket = buckets
        .last()
        .is_some_and(|bucket| (second_idx as usize) < bucket.len());
    if !is_last_bucket || !in_bucket {
        return Err(invalid());
    }

    Ok(Some((first_idx, second_idx)))
}

/// A cursor over the live containers of a [`Containers`] registry.
///
/// Created by [`Containers::container_iterator`].
///
/// # Examples
///
/// ```rust
/// use roaring_art::{Container, Containers};
///
/// let mut containers = Containers::new();
/// containers.add(Container::Array(vec![1, 2, 3])).unwrap();
/// containers.add(Container::Array(vec![4])).unwrap();
///
/// let mut cursor = containers.container_iterator();
/// while cursor.advance() {
///     if cursor.current().map(Container::cardinality) == Some(3) {
///         cursor.replace(Container::Run(vec![[1, 2]]));
///     }
/// }
///
/// assert_eq!(containers.get(0), Some(&Container::Run(vec![[1, 2]])));
/// ```
#[derive(Debug)]
pub struct ContainerIterator<'a> {
    containers: &'a mut Containers,
    /// The first slot the next advance looks at.
    next_slot: (usize, usize),
    current: Option<(usize, usize)>,
}

impl ContainerIterator<'_> {
    /// Move to the next live container, returning false once there are none
    /// left.
    pub fn advance(&mut self) -> bool {
        let (mut first, mut second) = self.next_slot;

        while let Some(bucket) = self.containers.buckets.get(first) {
            if let Some(offset) = bucket[second.min(bucket.len())..]
                .iter()
                .position(Option::is_some)
            {
                second += offset;
                self.current = Some((first, second));
                self.next_slot = (first, second + 1);
                return true;
            }

            first += 1;
            second = 0;
        }

        self.next_slot = (first, 0);
        self.current = None;
        false
    }

    /// Return the container the cursor is positioned on.
    pub fn current(&self) -> Option<&Container> {
        let (first, second) = self.current?;
        self.containers.buckets[first][second].as_ref()
    }

    /// Return the container the cursor is positioned on, mutably.
    pub fn current_mut(&mut self) -> Option<&mut Container> {
        let (first, second) = self.current?;
        self.containers.buckets[first][second].as_mut()
    }

    /// Return the index of the container the cursor is positioned on.
    pub fn current_container_idx(&self) -> Option<u64> {
        let (first, second) = self.current?;
        Some(to_container_idx(first as u32, second as u32))
    }

    /// Replace the container the cursor is positioned on, and return the old
    /// one.
    ///
    /// # Panics
    ///
    ///  - Panics if [`ContainerIterator::advance`] has not returned true.
    pub fn replace(&mut self, container: Container) -> Option<Container> {
        let Some((first, second)) = self.current else {
            panic!("container iterator is not positioned on a container");
        };
        self.containers.buckets[first][second].replace(container)
    }
}
