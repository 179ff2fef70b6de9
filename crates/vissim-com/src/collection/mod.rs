//! Collection enumeration
//!
//! Server collections (links, vehicles, ...) expose a pull protocol: ask for
//! the next element until the server signals the end. [`CollectionView`]
//! presents that protocol as a lazy, forward-only `Iterator` without
//! buffering the collection.
//!
//! A view is single-pass. Once it reports the end, or an error, it stays
//! finished; iterate again by requesting a fresh view from the server.

mod query;

pub use query::{Filter, Project, Query};

use std::fmt;
use std::iter::FusedIterator;

use tracing::{debug, trace, warn};

use crate::types::Result;

/// Server-side forward enumeration protocol
pub trait ElementEnumerator {
    /// Element type produced by the collection
    type Item;

    /// Fetch the next element, `Ok(None)` at end of sequence
    fn next_element(&mut self) -> Result<Option<Self::Item>>;

    /// Convert every produced element
    fn map_elements<F, U>(self, f: F) -> MapElements<Self, F>
    where
        Self: Sized,
        F: FnMut(Self::Item) -> U,
    {
        MapElements { inner: self, f }
    }
}

impl<E: ElementEnumerator + ?Sized> ElementEnumerator for Box<E> {
    type Item = E::Item;

    fn next_element(&mut self) -> Result<Option<Self::Item>> {
        (**self).next_element()
    }
}

/// Enumerator adapter created by [`ElementEnumerator::map_elements`]
pub struct MapElements<E, F> {
    inner: E,
    f: F,
}

impl<E, F, U> ElementEnumerator for MapElements<E, F>
where
    E: ElementEnumerator,
    F: FnMut(E::Item) -> U,
{
    type Item = U;

    fn next_element(&mut self) -> Result<Option<U>> {
        Ok(self.inner.next_element()?.map(&mut self.f))
    }
}

/// Lazy, single-pass view over a server collection
///
/// Yields `Ok(element)` until the end of the sequence. An enumeration
/// failure is yielded once as `Err` and ends the view.
pub struct CollectionView<'a, T> {
    source: Option<Box<dyn ElementEnumerator<Item = T> + 'a>>,
    yielded: usize,
}

impl<'a, T> CollectionView<'a, T> {
    /// Wrap a server enumerator
    pub fn new<E>(enumerator: E) -> Self
    where
        E: ElementEnumerator<Item = T> + 'a,
    {
        Self {
            source: Some(Box::new(enumerator)),
            yielded: 0,
        }
    }

    /// Whether the view has reached its end or failed
    pub fn is_finished(&self) -> bool {
        self.source.is_none()
    }

    /// Number of elements produced so far
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Start a deferred query over this view
    pub fn query(self) -> Query<Self> {
        Query::new(self)
    }
}

impl<T> Iterator for CollectionView<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let source = self.source.as_mut()?;
        match source.next_element() {
            Ok(Some(element)) => {
                self.yielded += 1;
                trace!(index = self.yielded - 1, "collection element");
                Some(Ok(element))
            }
            Ok(None) => {
                debug!(count = self.yielded, "collection enumeration finished");
                self.source = None;
                None
            }
            Err(err) => {
                warn!(after = self.yielded, "collection enumeration failed: {}", err);
                self.source = None;
                Some(Err(err))
            }
        }
    }
}

impl<T> FusedIterator for CollectionView<'_, T> {}

impl<T> fmt::Debug for CollectionView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionView")
            .field("finished", &self.is_finished())
            .field("yielded", &self.yielded)
            .finish()
    }
}
