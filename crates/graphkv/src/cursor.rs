//! Cursors handed out by the store and its indexes.

use graphkv_core::{CursorState, GotoResult, LogicalResult, Projection, ResultSet};
use graphkv_storage::RawIterator;

use crate::error::GraphResult;

/// A bidirectional, positionable cursor over stored items.
///
/// Wraps a [`ResultSet`] and reports errors as [`GraphError`](crate::GraphError).
/// The cursor borrows the transaction it was opened in and releases its
/// engine iterator when closed or dropped.
pub struct RecordCursor<I: RawIterator, P: Projection> {
    inner: ResultSet<I, P>,
}

impl<I: RawIterator, P: Projection> RecordCursor<I, P> {
    pub(crate) fn open(inner: LogicalResult<ResultSet<I, P>>) -> GraphResult<Self> {
        Ok(Self { inner: inner? })
    }

    /// Whether the cursor ranges over nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// The coarse position of the cursor.
    #[must_use]
    pub fn state(&self) -> CursorState {
        self.inner.state()
    }

    /// The element the cursor is on.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cursor`](crate::GraphError::Cursor) if the
    /// cursor is not on an element.
    pub fn current(&self) -> GraphResult<P::Item> {
        Ok(self.inner.current()?)
    }

    /// Whether an element follows the current position.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the
    /// engine fails.
    pub fn has_next(&mut self) -> GraphResult<bool> {
        Ok(self.inner.has_next()?)
    }

    /// Move to the following element and return it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cursor`](crate::GraphError::Cursor) if there is
    /// none.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> GraphResult<P::Item> {
        Ok(self.inner.next()?)
    }

    /// Whether an element precedes the current position.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the
    /// engine fails.
    pub fn has_prev(&mut self) -> GraphResult<bool> {
        Ok(self.inner.has_prev()?)
    }

    /// Move to the preceding element and return it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cursor`](crate::GraphError::Cursor) if there is
    /// none.
    pub fn prev(&mut self) -> GraphResult<P::Item> {
        Ok(self.inner.prev()?)
    }

    /// Position before the first element.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the
    /// engine fails.
    pub fn go_before_first(&mut self) -> GraphResult<()> {
        Ok(self.inner.go_before_first()?)
    }

    /// Position after the last element.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the
    /// engine fails.
    pub fn go_after_last(&mut self) -> GraphResult<()> {
        Ok(self.inner.go_after_last()?)
    }

    /// Position on `item`, or on the smallest larger item unless `exact`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cursor`](crate::GraphError::Cursor) if this
    /// cursor cannot be positioned by item.
    pub fn go_to(&mut self, item: &P::Item, exact: bool) -> GraphResult<GotoResult> {
        Ok(self.inner.go_to(item, exact)?)
    }

    /// Count the elements, then position on the first one.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the
    /// engine fails.
    pub fn count(&mut self) -> GraphResult<u64> {
        Ok(self.inner.count()?)
    }

    /// Collect the elements after the current position.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the
    /// engine fails.
    pub fn collect_remaining(&mut self) -> GraphResult<Vec<P::Item>> {
        Ok(self.inner.remaining()?)
    }

    /// Release the engine iterator.
    pub fn close(&mut self) {
        self.inner.close();
    }
}
