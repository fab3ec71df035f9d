//! Lazy filter and map over restartable sequences.
//!
//! A source is any `Fn() -> impl IntoIterator`; calling it again yields a
//! fresh, independent sequence. [`LazyFilter`] and [`LazyMap`] are sources
//! themselves: every [`iter`](LazyFilter::iter) call restarts from the
//! underlying source, and elements are only pulled as they are consumed.

/// A restartable sequence keeping only elements that match a predicate.
#[derive(Debug, Clone)]
pub struct LazyFilter<G, P> {
    source: G,
    predicate: P,
}

/// A restartable sequence transforming every element.
#[derive(Debug, Clone)]
pub struct LazyMap<G, F> {
    source: G,
    map: F,
}

/// Wraps `source` so its sequences only yield elements matching `predicate`.
#[must_use]
pub fn lazy_filter<G, P>(source: G, predicate: P) -> LazyFilter<G, P> {
    LazyFilter { source, predicate }
}

/// Wraps `source` so its sequences yield `map` applied to each element.
#[must_use]
pub fn lazy_map<G, F>(source: G, map: F) -> LazyMap<G, F> {
    LazyMap { source, map }
}

impl<G, I, P> LazyFilter<G, P>
where
    G: Fn() -> I,
    I: IntoIterator,
    P: Fn(&I::Item) -> bool,
{
    /// Starts a fresh filtered sequence.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = I::Item> + 'a
    where
        I::IntoIter: 'a,
    {
        (self.source)().into_iter().filter(|item| (self.predicate)(item))
    }
}

impl<G, I, F, R> LazyMap<G, F>
where
    G: Fn() -> I,
    I: IntoIterator,
    F: Fn(I::Item) -> R,
{
    /// Starts a fresh mapped sequence.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = R> + 'a
    where
        I::IntoIter: 'a,
    {
        (self.source)().into_iter().map(|item| (self.map)(item))
    }
}
