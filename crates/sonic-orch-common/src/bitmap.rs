//! Fixed-capacity id bitmap with first-fit allocation.
//!
//! Used both for scheduler-group child slots and for the simulated
//! hardware id spaces. A set bit means the id is in use.

use std::fmt;
use thiserror::Error;

const WORD_BITS: u32 = u64::BITS;

/// Error type for IdBitmap operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitmapError {
    #[error("No free id left (capacity {capacity})")]
    Exhausted { capacity: u32 },

    #[error("Id {id} out of range (capacity {capacity})")]
    OutOfRange { id: u32, capacity: u32 },
}

/// First-fit id allocator over `0..capacity`.
///
/// # Example
///
/// ```
/// use sonic_orch_common::IdBitmap;
///
/// let mut slots = IdBitmap::new(4);
/// assert_eq!(slots.alloc().unwrap(), 0);
/// assert_eq!(slots.alloc().unwrap(), 1);
/// slots.free(0).unwrap();
/// assert_eq!(slots.alloc().unwrap(), 0);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct IdBitmap {
    words: Vec<u64>,
    capacity: u32,
    used: u32,
}

impl IdBitmap {
    /// Creates a bitmap with every id in `0..capacity` free.
    pub fn new(capacity: u32) -> Self {
        let words = capacity.div_ceil(WORD_BITS) as usize;
        Self {
            words: vec![0; words],
            capacity,
            used: 0,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns the number of ids currently allocated.
    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn available(&self) -> u32 {
        self.capacity - self.used
    }

    /// Allocates the lowest free id.
    pub fn alloc(&mut self) -> Result<u32, BitmapError> {
        let id = self.first_free().ok_or(BitmapError::Exhausted {
            capacity: self.capacity,
        })?;
        self.set(id);
        Ok(id)
    }

    /// Returns the lowest free id without allocating it.
    pub fn first_free(&self) -> Option<u32> {
        self.words.iter().enumerate().find_map(|(w, &word)| {
            if word == u64::MAX {
                return None;
            }
            let id = w as u32 * WORD_BITS + (!word).trailing_zeros();
            (id < self.capacity).then_some(id)
        })
    }

    /// Marks a specific id as used.
    ///
    /// Returns `Ok(false)` if it was already used.
    pub fn reserve(&mut self, id: u32) -> Result<bool, BitmapError> {
        self.check(id)?;
        if self.is_used(id) {
            return Ok(false);
        }
        self.set(id);
        Ok(true)
    }

    /// Releases `id`.
    ///
    /// Returns `Ok(false)` if it was already free.
    pub fn free(&mut self, id: u32) -> Result<bool, BitmapError> {
        self.check(id)?;
        if !self.is_used(id) {
            return Ok(false);
        }
        let (w, bit) = Self::locate(id);
        self.words[w] &= !bit;
        self.used -= 1;
        Ok(true)
    }

    /// Returns true if `id` is allocated. Out-of-range ids are never used.
    pub fn is_used(&self, id: u32) -> bool {
        if id >= self.capacity {
            return false;
        }
        let (w, bit) = Self::locate(id);
        self.words[w] & bit != 0
    }

    /// Iterates allocated ids in ascending order.
    pub fn iter_used(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.capacity).filter(move |&id| self.is_used(id))
    }

    fn set(&mut self, id: u32) {
        let (w, bit) = Self::locate(id);
        self.words[w] |= bit;
        self.used += 1;
    }

    fn check(&self, id: u32) -> Result<(), BitmapError> {
        if id >= self.capacity {
            Err(BitmapError::OutOfRange {
                id,
                capacity: self.capacity,
            })
        } else {
            Ok(())
        }
    }

    fn locate(id: u32) -> (usize, u64) {
        ((id / WORD_BITS) as usize, 1u64 << (id % WORD_BITS))
    }
}

impl fmt::Debug for IdBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdBitmap")
            .field("capacity", &self.capacity)
            .field("used", &self.iter_used().collect::<Vec<_>>())
            .finish()
    }
}
