//! Layered stacks.
//!
//! A layered stack is a stack whose visible top region ("the current layer")
//! starts at a movable floor. `lock` pushes the current floor onto a dump
//! and raises the floor to the current top; `unlock` restores the previous
//! floor. Locks are strictly LIFO.
//!
//! Two implementations share the [`LayeredStack`] trait:
//!
//! - [`CheckedLayeredStack`] refuses to read or pop below the floor and
//!   reports [`RuntimeError`]s. The engine uses it for values.
//! - [`UncheckedLayeredStack`] performs no floor checks. It is used for the
//!   call stack, whose discipline is guaranteed by woven code. It is still
//!   memory safe: out-of-range reads yield `T::default()` and out-of-range
//!   writes are dropped.

use crate::error::RuntimeError;

/// Initial item capacity for freshly created stacks.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Operations shared by both layered stacks.
///
/// Offsets count down from the top of the current layer; indexes count up
/// from its floor. Whether a violation is an error or a silent default
/// depends on the implementation.
pub trait LayeredStack<T: Clone + Default> {
    /// Push onto the current layer.
    fn push(&mut self, value: T);

    /// Remove and return the top item of the current layer.
    fn pop(&mut self) -> Result<T, RuntimeError>;

    /// As [`LayeredStack::pop`], yielding `T::default()` on an empty layer.
    fn pop_or_default(&mut self) -> T {
        self.pop().unwrap_or_default()
    }

    /// Top item of the current layer.
    fn peek(&self) -> Result<T, RuntimeError> {
        self.peek_at(0)
    }

    /// As [`LayeredStack::peek`], yielding `T::default()` on an empty layer.
    fn peek_or_default(&self) -> T {
        self.peek().unwrap_or_default()
    }

    /// Item `offset` places below the top (0 is the top).
    fn peek_at(&self, offset: usize) -> Result<T, RuntimeError>;

    /// As [`LayeredStack::peek_at`], yielding `T::default()` when out of range.
    fn peek_at_or_default(&self, offset: usize) -> T {
        self.peek_at(offset).unwrap_or_default()
    }

    /// Item `index` places above the floor of the current layer.
    fn get(&self, index: usize) -> Result<T, RuntimeError>;

    /// Overwrite the item `index` places above the floor.
    fn set(&mut self, index: usize, value: T) -> Result<(), RuntimeError>;

    /// Start a new, empty layer at the current top.
    fn lock(&mut self);

    /// Return to the enclosing layer. Items of the current layer stay on
    /// the stack and become part of the enclosing one.
    fn unlock(&mut self) -> Result<(), RuntimeError>;

    /// Size of the current layer, then unlock.
    fn count_and_unlock(&mut self) -> Result<usize, RuntimeError> {
        let count = self.size();
        self.unlock()?;
        Ok(count)
    }

    /// Drop every item in the current layer; the lock stays in place.
    fn clear(&mut self);

    fn clear_and_unlock(&mut self) -> Result<(), RuntimeError> {
        self.clear();
        self.unlock()
    }

    /// Number of outstanding locks.
    fn lock_count(&self) -> usize;

    /// Number of items in the current layer.
    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Copy of the current layer, bottom first.
    fn snapshot(&self) -> Vec<T>;
}

/// Layered stack that reports every boundary violation.
#[derive(Debug, Clone)]
pub struct CheckedLayeredStack<T> {
    items: Vec<T>,
    floor: usize,
    dump: Vec<usize>,
}

impl<T> CheckedLayeredStack<T> {
    /// An empty stack with [`DEFAULT_CAPACITY`] reserved.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// An empty stack with room for `capacity` items before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            floor: 0,
            dump: Vec::new(),
        }
    }

    /// Move the current layer into a newly locked layer of `dest`.
    ///
    /// When the moved count does not exceed `local_count`, the new layer is
    /// padded with defaults up to `local_count` slots. The current layer of
    /// `self` is left empty but still locked. Returns the moved count.
    pub fn transfer_locked_region_into<U>(
        &mut self,
        dest: &mut UncheckedLayeredStack<U>,
        local_count: usize,
    ) -> usize
    where
        U: From<T> + Default,
    {
        let arg_count = self.items.len() - self.floor;
        dest.dump.push(dest.floor);
        dest.floor = dest.items.len();
        dest.items.extend(self.items.drain(self.floor..).map(U::from));
        if arg_count <= local_count {
            let len = dest.floor + local_count;
            dest.items.resize_with(len, U::default);
        }
        arg_count
    }
}

impl<T> Default for CheckedLayeredStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Default> LayeredStack<T> for CheckedLayeredStack<T> {
    fn push(&mut self, value: T) {
        self.items.push(value);
    }

    fn pop(&mut self) -> Result<T, RuntimeError> {
        if self.items.len() <= self.floor {
            return Err(RuntimeError::StackUnderflow);
        }
        self.items.pop().ok_or(RuntimeError::StackUnderflow)
    }

    fn peek_at(&self, offset: usize) -> Result<T, RuntimeError> {
        if offset >= self.size() {
            return Err(RuntimeError::StackUnderflow);
        }
        Ok(self.items[self.items.len() - 1 - offset].clone())
    }

    fn get(&self, index: usize) -> Result<T, RuntimeError> {
        let size = self.size();
        if index >= size {
            return Err(RuntimeError::SlotOutOfRange { index, size });
        }
        Ok(self.items[self.floor + index].clone())
    }

    fn set(&mut self, index: usize, value: T) -> Result<(), RuntimeError> {
        let size = self.size();
        if index >= size {
            return Err(RuntimeError::SlotOutOfRange { index, size });
        }
        self.items[self.floor + index] = value;
        Ok(())
    }

    fn lock(&mut self) {
        self.dump.push(self.floor);
        self.floor = self.items.len();
    }

    fn unlock(&mut self) -> Result<(), RuntimeError> {
        self.floor = self.dump.pop().ok_or(RuntimeError::UnlockWithoutLock)?;
        Ok(())
    }

    fn clear(&mut self) {
        self.items.truncate(self.floor);
    }

    fn lock_count(&self) -> usize {
        self.dump.len()
    }

    fn size(&self) -> usize {
        self.items.len() - self.floor
    }

    fn snapshot(&self) -> Vec<T> {
        self.items[self.floor..].to_vec()
    }
}

/// Layered stack without boundary checks.
#[derive(Debug, Clone)]
pub struct UncheckedLayeredStack<T> {
    items: Vec<T>,
    floor: usize,
    dump: Vec<usize>,
}

impl<T> UncheckedLayeredStack<T> {
    /// An empty stack with [`DEFAULT_CAPACITY`] reserved.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            floor: 0,
            dump: Vec::new(),
        }
    }
}

impl<T> Default for UncheckedLayeredStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Default> LayeredStack<T> for UncheckedLayeredStack<T> {
    fn push(&mut self, value: T) {
        self.items.push(value);
    }

    fn pop(&mut self) -> Result<T, RuntimeError> {
        Ok(self.items.pop().unwrap_or_default())
    }

    fn peek_at(&self, offset: usize) -> Result<T, RuntimeError> {
        Ok(self
            .items
            .len()
            .checked_sub(offset + 1)
            .and_then(|i| self.items.get(i))
            .cloned()
            .unwrap_or_default())
    }

    fn get(&self, index: usize) -> Result<T, RuntimeError> {
        Ok(self
            .items
            .get(self.floor + index)
            .cloned()
            .unwrap_or_default())
    }

    fn set(&mut self, index: usize, value: T) -> Result<(), RuntimeError> {
        if let Some(slot) = self.items.get_mut(self.floor + index) {
            *slot = value;
        }
        Ok(())
    }

    fn lock(&mut self) {
        self.dump.push(self.floor);
        self.floor = self.items.len();
    }

    fn unlock(&mut self) -> Result<(), RuntimeError> {
        self.floor = self.dump.pop().unwrap_or(0);
        Ok(())
    }

    fn clear(&mut self) {
        self.items.truncate(self.floor);
    }

    fn lock_count(&self) -> usize {
        self.dump.len()
    }

    fn size(&self) -> usize {
        self.items.len().saturating_sub(self.floor)
    }

    fn snapshot(&self) -> Vec<T> {
        self.items.get(self.floor..).unwrap_or_default().to_vec()
    }
}
