//! Deferred filter and projection over fallible sequences
//!
//! A [`Query`] wraps any `Iterator<Item = Result<T>>`. Building it consumes
//! nothing; elements are pulled only while the query itself is iterated.
//! Predicates and projectors return `Result` so attribute coercions can use
//! `?`. The first error (from the source or from caller code) is yielded and
//! ends the query. Once a query has ended it keeps returning `None`, even
//! over a source that is not fused.

use std::iter::FusedIterator;

use crate::types::Result;

/// Composable, order-preserving query
#[derive(Debug)]
pub struct Query<I> {
    inner: I,
    finished: bool,
}

impl<I, T> Query<I>
where
    I: Iterator<Item = Result<T>>,
{
    /// Start a query over `source`
    pub fn new(source: I) -> Self {
        Self {
            inner: source,
            finished: false,
        }
    }

    /// Keep only elements for which `predicate` returns true
    pub fn filter<P>(self, predicate: P) -> Query<Filter<I, P>>
    where
        P: FnMut(&T) -> Result<bool>,
    {
        Query {
            inner: Filter {
                inner: self.inner,
                predicate,
            },
            finished: self.finished,
        }
    }

    /// Replace every element with `projector(element)`
    pub fn project<F, R>(self, projector: F) -> Query<Project<I, F>>
    where
        F: FnMut(T) -> Result<R>,
    {
        Query {
            inner: Project {
                inner: self.inner,
                projector,
            },
            finished: self.finished,
        }
    }

    /// Run the query, stopping at the first error
    pub fn try_collect(self) -> Result<Vec<T>> {
        self.collect()
    }
}

impl<I, T> Iterator for Query<I>
where
    I: Iterator<Item = Result<T>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.inner.next();
        if !matches!(item, Some(Ok(_))) {
            self.finished = true;
        }
        item
    }
}

impl<I, T> FusedIterator for Query<I> where I: Iterator<Item = Result<T>> {}

/// Query stage created by [`Query::filter`]
#[derive(Debug)]
pub struct Filter<I, P> {
    inner: I,
    predicate: P,
}

impl<I, P, T> Iterator for Filter<I, P>
where
    I: Iterator<Item = Result<T>>,
    P: FnMut(&T) -> Result<bool>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(item) => match (self.predicate)(&item) {
                    Ok(true) => return Some(Ok(item)),
                    Ok(false) => continue,
                    Err(err) => return Some(Err(err)),
                },
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Query stage created by [`Query::project`]
#[derive(Debug)]
pub struct Project<I, F> {
    inner: I,
    projector: F,
}

impl<I, F, T, R> Iterator for Project<I, F>
where
    I: Iterator<Item = Result<T>>,
    F: FnMut(T) -> Result<R>,
{
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.inner.next()?.and_then(&mut self.projector))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
