//! Bidirectional, positionable result sets over a raw engine iterator.
//!
//! A [`ResultSet`] keeps three slots around its logical position: the
//! previous element, the current element and the next element. Each slot is
//! either known to be a value, known to be outside the range, or unknown. The
//! `lookahead` records how many logical steps the raw iterator sits away from
//! `current`, in `-1..=1`.
//!
//! Neighbours are only fetched when asked for. Walking in one direction costs
//! one raw step per element; reversing costs at most two.

use std::mem;

use graphkv_storage::RawIterator;
use tracing::warn;

use crate::error::{LogicalError, LogicalResult};

use super::projection::Projection;

/// One neighbour slot of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot<T> {
    /// No element exists on this side.
    Outside,
    /// The element has not been fetched yet.
    Unknown,
    /// A known element.
    Value(T),
}

impl<T> Slot<T> {
    /// Whether the slot still has to be resolved.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// The known element, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Outcome of [`ResultSet::go_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GotoResult {
    /// The item is present; the cursor is on it.
    Found,
    /// The item is absent; the cursor is on the smallest larger item.
    Close,
    /// Nothing suitable was found; the cursor is on the first element, if
    /// there is one.
    Nothing,
}

/// Coarse position of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorState {
    /// The range holds no elements.
    Empty,
    /// Before the first element.
    BeforeFirst,
    /// On an element.
    OnElement,
    /// After the last element.
    AfterLast,
    /// Closed; every operation fails.
    Closed,
}

/// A cursor over the items a [`Projection`] decodes from a raw iterator.
///
/// A result set owns its iterator and closes it on [`close`](Self::close) or
/// drop. It is confined to the thread that opened it.
pub struct ResultSet<I: RawIterator, P: Projection> {
    iter: I,
    projection: P,
    prev: Slot<P::Item>,
    current: Slot<P::Item>,
    next: Slot<P::Item>,
    lookahead: i8,
    /// Collapse consecutive entries that project to equal items.
    distinct: bool,
    empty: bool,
    closed: bool,
}

impl<I: RawIterator, P: Projection> ResultSet<I, P> {
    /// Wrap `iter`, positioned before the first element.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::StorageFault`] if the iterator fails, or a
    /// decoding error if the first entry cannot be projected.
    pub fn new(iter: I, projection: P) -> LogicalResult<Self> {
        Self::open(iter, projection, false)
    }

    /// Wrap `iter`, yielding each run of equal items once.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn distinct(iter: I, projection: P) -> LogicalResult<Self> {
        Self::open(iter, projection, true)
    }

    fn open(iter: I, projection: P, distinct: bool) -> LogicalResult<Self> {
        let mut rs = Self {
            iter,
            projection,
            prev: Slot::Outside,
            current: Slot::Outside,
            next: Slot::Outside,
            lookahead: 0,
            distinct,
            empty: false,
            closed: false,
        };

        rs.iter.seek_to_first();
        if rs.iter.is_valid() {
            rs.next = Slot::Value(rs.extract()?);
            rs.lookahead = 1;
        } else {
            rs.check_status()?;
            rs.empty = true;
        }
        Ok(rs)
    }

    /// Whether the range holds no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.empty
    }

    /// Whether equal consecutive items are collapsed.
    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// The coarse position of the cursor.
    #[must_use]
    pub fn state(&self) -> CursorState {
        if self.closed {
            CursorState::Closed
        } else if self.empty {
            CursorState::Empty
        } else if matches!(self.current, Slot::Value(_)) {
            CursorState::OnElement
        } else if self.lookahead > 0 {
            CursorState::BeforeFirst
        } else {
            CursorState::AfterLast
        }
    }

    /// The element the cursor is on.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::NoCurrentElement`] before the first element,
    /// after the last one, or on an empty range.
    pub fn current(&self) -> LogicalResult<P::Item> {
        self.ensure_open()?;
        self.current.value().cloned().ok_or(LogicalError::NoCurrentElement)
    }

    /// Whether an element follows the current position.
    ///
    /// May move the raw iterator, but never the logical position.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::StorageFault`] if the iterator fails.
    pub fn has_next(&mut self) -> LogicalResult<bool> {
        self.ensure_open()?;
        if self.empty {
            return Ok(false);
        }
        self.check_invariant()?;

        match self.next {
            Slot::Value(_) => return Ok(true),
            Slot::Outside => return Ok(false),
            Slot::Unknown => {}
        }

        match self.lookahead {
            0 => {
                if self.advance()? {
                    self.next = Slot::Value(self.extract()?);
                    self.lookahead = 1;
                } else {
                    self.restore_last()?;
                    self.next = Slot::Outside;
                }
            }
            -1 => {
                if !self.advance()? {
                    return Err(LogicalError::illegal_state("iterator lost the current element"));
                }
                if self.advance()? {
                    self.next = Slot::Value(self.extract()?);
                    self.lookahead = 1;
                } else {
                    self.restore_last()?;
                    self.lookahead = 0;
                    self.next = Slot::Outside;
                }
            }
            _ => {
                return Err(LogicalError::illegal_state(
                    "next element unknown while the iterator is ahead",
                ))
            }
        }

        Ok(matches!(self.next, Slot::Value(_)))
    }

    /// Move to the following element and return it.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::IllegalCursorState`] if there is no following
    /// element; the cursor is then after the last element.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> LogicalResult<P::Item> {
        if !self.has_next()? {
            if !self.empty {
                self.go_after_last()?;
            }
            return Err(LogicalError::illegal_state("no element after the current position"));
        }

        let Slot::Value(item) = mem::replace(&mut self.next, Slot::Unknown) else {
            return Err(LogicalError::illegal_state("next element vanished"));
        };
        self.prev = mem::replace(&mut self.current, Slot::Value(item.clone()));
        self.lookahead -= 1;

        if self.lookahead < -1 {
            if !self.advance()? {
                return Err(LogicalError::illegal_state("iterator lost the previous element"));
            }
            self.lookahead = -1;
        }
        Ok(item)
    }

    /// Whether an element precedes the current position.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::StorageFault`] if the iterator fails.
    pub fn has_prev(&mut self) -> LogicalResult<bool> {
        self.ensure_open()?;
        if self.empty {
            return Ok(false);
        }
        self.check_invariant()?;

        match self.prev {
            Slot::Value(_) => return Ok(true),
            Slot::Outside => return Ok(false),
            Slot::Unknown => {}
        }

        match self.lookahead {
            0 => {
                if self.retreat()? {
                    self.prev = Slot::Value(self.extract()?);
                    self.lookahead = -1;
                } else {
                    self.restore_first()?;
                    self.prev = Slot::Outside;
                }
            }
            1 => {
                if !self.retreat()? {
                    return Err(LogicalError::illegal_state("iterator lost the current element"));
                }
                if self.retreat()? {
                    self.prev = Slot::Value(self.extract()?);
                    self.lookahead = -1;
                } else {
                    self.restore_first()?;
                    self.lookahead = 0;
                    self.prev = Slot::Outside;
                }
            }
            _ => {
                return Err(LogicalError::illegal_state(
                    "previous element unknown while the iterator is behind",
                ))
            }
        }

        Ok(matches!(self.prev, Slot::Value(_)))
    }

    /// Move to the preceding element and return it.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::IllegalCursorState`] if there is no preceding
    /// element; the cursor is then before the first element.
    pub fn prev(&mut self) -> LogicalResult<P::Item> {
        if !self.has_prev()? {
            if !self.empty {
                self.go_before_first()?;
            }
            return Err(LogicalError::illegal_state("no element before the current position"));
        }

        let Slot::Value(item) = mem::replace(&mut self.prev, Slot::Unknown) else {
            return Err(LogicalError::illegal_state("previous element vanished"));
        };
        self.next = mem::replace(&mut self.current, Slot::Value(item.clone()));
        self.lookahead += 1;

        if self.lookahead > 1 {
            if !self.retreat()? {
                return Err(LogicalError::illegal_state("iterator lost the next element"));
            }
            self.lookahead = 1;
        }
        Ok(item)
    }

    /// Position before the first element.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::StorageFault`] if the iterator fails.
    pub fn go_before_first(&mut self) -> LogicalResult<()> {
        self.ensure_open()?;
        if self.empty {
            return Ok(());
        }

        self.iter.seek_to_first();
        if !self.iter.is_valid() {
            self.check_status()?;
            self.become_empty();
            return Ok(());
        }
        self.next = Slot::Value(self.extract()?);
        self.current = Slot::Outside;
        self.prev = Slot::Outside;
        self.lookahead = 1;
        Ok(())
    }

    /// Position after the last element.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::StorageFault`] if the iterator fails.
    pub fn go_after_last(&mut self) -> LogicalResult<()> {
        self.ensure_open()?;
        if self.empty {
            return Ok(());
        }

        self.iter.seek_to_last();
        if !self.iter.is_valid() {
            self.check_status()?;
            self.become_empty();
            return Ok(());
        }
        self.prev = Slot::Value(self.extract()?);
        self.current = Slot::Outside;
        self.next = Slot::Outside;
        self.lookahead = -1;
        Ok(())
    }

    /// Position on `item`, or on the smallest larger item.
    ///
    /// Returns [`GotoResult::Found`] if `item` is present. If it is absent,
    /// an inexact search positions on the next larger item and returns
    /// [`GotoResult::Close`]. An exact miss, a miss past the last element, or
    /// an empty range return [`GotoResult::Nothing`]; a non-empty cursor is
    /// then left on its first element.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::Unsupported`] if the projection cannot seek.
    pub fn go_to(&mut self, item: &P::Item, exact: bool) -> LogicalResult<GotoResult> {
        self.ensure_open()?;
        if self.empty {
            return Ok(GotoResult::Nothing);
        }

        let target = self.projection.seek_key(item)?;
        self.iter.seek(&target);
        if self.iter.is_valid() {
            let found = self.extract()?;
            if found == *item {
                self.settle_on(found);
                return Ok(GotoResult::Found);
            }
            if !exact {
                self.settle_on(found);
                return Ok(GotoResult::Close);
            }
        } else {
            self.check_status()?;
        }

        self.settle_on_first()?;
        Ok(GotoResult::Nothing)
    }

    /// Count the elements by scanning the whole range, then position on the
    /// first element.
    ///
    /// This is O(n) in the size of the range.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::StorageFault`] if the iterator fails.
    pub fn count(&mut self) -> LogicalResult<u64> {
        self.ensure_open()?;
        if self.empty {
            return Ok(0);
        }

        self.iter.seek_to_first();
        if !self.iter.is_valid() {
            self.check_status()?;
            self.become_empty();
            return Ok(0);
        }
        let mut count = 1;
        while self.advance()? {
            count += 1;
        }

        self.settle_on_first()?;
        Ok(count)
    }

    /// Collect every element after the current position, leaving the cursor
    /// on the last element.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::StorageFault`] if the iterator fails.
    pub fn remaining(&mut self) -> LogicalResult<Vec<P::Item>> {
        let mut items = Vec::new();
        while self.has_next()? {
            items.push(self.next()?);
        }
        Ok(items)
    }

    /// Release the iterator. Further calls have no effect.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.iter.close();
        self.prev = Slot::Outside;
        self.current = Slot::Outside;
        self.next = Slot::Outside;
        self.lookahead = 0;
    }

    fn ensure_open(&self) -> LogicalResult<()> {
        if self.closed {
            Err(LogicalError::Closed)
        } else {
            Ok(())
        }
    }

    /// Unknown neighbours on both sides are only allowed while the iterator
    /// sits on `current`.
    fn check_invariant(&self) -> LogicalResult<()> {
        if self.prev.is_unknown() && self.next.is_unknown() && self.lookahead != 0 {
            return Err(LogicalError::illegal_state(format!(
                "both neighbours unknown with lookahead {}",
                self.lookahead
            )));
        }
        if self.current.is_unknown() {
            return Err(LogicalError::illegal_state("current element unknown"));
        }
        Ok(())
    }

    fn check_status(&self) -> LogicalResult<()> {
        self.iter.status().map_err(|e| {
            warn!(error = %e, "result set iterator failed");
            LogicalError::StorageFault(e)
        })
    }

    fn extract(&self) -> LogicalResult<P::Item> {
        let key = self
            .iter
            .key()
            .ok_or_else(|| LogicalError::illegal_state("iterator is not positioned"))?;
        self.projection.extract(key, self.iter.value().unwrap_or_default())
    }

    /// Take one logical step forward from a valid position.
    fn advance(&mut self) -> LogicalResult<bool> {
        let anchor = if self.distinct { Some(self.extract()?) } else { None };
        loop {
            self.iter.next();
            if !self.iter.is_valid() {
                self.check_status()?;
                return Ok(false);
            }
            match &anchor {
                Some(anchor) if self.extract()? == *anchor => continue,
                _ => return Ok(true),
            }
        }
    }

    /// Take one logical step backward from a valid position.
    fn retreat(&mut self) -> LogicalResult<bool> {
        let anchor = if self.distinct { Some(self.extract()?) } else { None };
        loop {
            self.iter.prev();
            if !self.iter.is_valid() {
                self.check_status()?;
                return Ok(false);
            }
            match &anchor {
                Some(anchor) if self.extract()? == *anchor => continue,
                _ => return Ok(true),
            }
        }
    }

    fn restore_last(&mut self) -> LogicalResult<()> {
        self.iter.seek_to_last();
        if self.iter.is_valid() {
            Ok(())
        } else {
            self.check_status()?;
            Err(LogicalError::illegal_state("range emptied under an open cursor"))
        }
    }

    fn restore_first(&mut self) -> LogicalResult<()> {
        self.iter.seek_to_first();
        if self.iter.is_valid() {
            Ok(())
        } else {
            self.check_status()?;
            Err(LogicalError::illegal_state("range emptied under an open cursor"))
        }
    }

    /// Make `item`, which the iterator is on, the current element.
    fn settle_on(&mut self, item: P::Item) {
        self.current = Slot::Value(item);
        self.prev = Slot::Unknown;
        self.next = Slot::Unknown;
        self.lookahead = 0;
    }

    fn settle_on_first(&mut self) -> LogicalResult<()> {
        self.iter.seek_to_first();
        if !self.iter.is_valid() {
            self.check_status()?;
            self.become_empty();
            return Ok(());
        }
        self.current = Slot::Value(self.extract()?);
        self.prev = Slot::Outside;
        self.next = Slot::Unknown;
        self.lookahead = 0;
        Ok(())
    }

    fn become_empty(&mut self) {
        self.empty = true;
        self.prev = Slot::Outside;
        self.current = Slot::Outside;
        self.next = Slot::Outside;
        self.lookahead = 0;
    }
}

impl<I: RawIterator, P: Projection> Drop for ResultSet<I, P> {
    fn drop(&mut self) {
        self.close();
    }
}
