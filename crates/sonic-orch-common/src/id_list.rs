//! Relationship list primitive.
//!
//! Every one-to-many association in the QoS graph (port to queues, group
//! to children, map to ports, ...) is an `IdList` of handles owned by the
//! "one" side. Members are kept in insertion order. Linking an id twice or
//! unlinking an absent id is an error, never a silent no-op, so paired
//! insert/remove calls cannot drift apart unnoticed.

use std::fmt;
use thiserror::Error;

/// Error type for IdList operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    #[error("Member is already linked")]
    AlreadyLinked,

    #[error("Member is not linked")]
    NotLinked,
}

/// Ordered membership list of object handles.
///
/// # Example
///
/// ```
/// use sonic_orch_common::IdList;
///
/// let mut children = IdList::new();
/// children.link_back(10u64).unwrap();
/// children.link_back(20u64).unwrap();
///
/// assert_eq!(children.first(), Some(10));
/// assert_eq!(children.next(&10), Some(20));
/// assert_eq!(children.next(&20), None);
///
/// children.unlink(&10).unwrap();
/// assert_eq!(children.first(), Some(20));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct IdList<K> {
    members: Vec<K>,
}

impl<K: Copy + PartialEq> IdList<K> {
    /// Creates an empty list.
    pub const fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Appends `id` at the back of the list.
    pub fn link_back(&mut self, id: K) -> Result<(), ListError> {
        if self.contains(&id) {
            return Err(ListError::AlreadyLinked);
        }
        self.members.push(id);
        Ok(())
    }

    /// Removes `id` from the list, keeping the order of the others.
    pub fn unlink(&mut self, id: &K) -> Result<(), ListError> {
        let pos = self
            .members
            .iter()
            .position(|m| m == id)
            .ok_or(ListError::NotLinked)?;
        self.members.remove(pos);
        Ok(())
    }

    /// Returns the first member.
    pub fn first(&self) -> Option<K> {
        self.members.first().copied()
    }

    /// Returns the member after `id`, or `None` at the end of the list or
    /// when `id` is not a member.
    pub fn next(&self, id: &K) -> Option<K> {
        let pos = self.members.iter().position(|m| m == id)?;
        self.members.get(pos + 1).copied()
    }

    /// Returns true if `id` is a member.
    pub fn contains(&self, id: &K) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterates members front to back.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = K> + '_ {
        self.members.iter().copied()
    }

    /// Copies the members out, so the caller can mutate the graph while
    /// walking them.
    pub fn to_vec(&self) -> Vec<K> {
        self.members.clone()
    }
}

impl<K: Copy + PartialEq> Default for IdList<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for IdList<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.members.iter()).finish()
    }
}
