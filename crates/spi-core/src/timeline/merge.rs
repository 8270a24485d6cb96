//! Lazy k-way merge of descending streams.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

struct HeapEntry<T> {
    item: T,
    stream: usize,
}

impl<T: Ord> PartialEq for HeapEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Ord> Eq for HeapEntry<T> {}

impl<T: Ord> PartialOrd for HeapEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for HeapEntry<T> {
    // Max-heap: greatest item first; among equal items the lower stream wins.
    fn cmp(&self, other: &Self) -> Ordering {
        self.item
            .cmp(&other.item)
            .then_with(|| other.stream.cmp(&self.stream))
    }
}

/// Iterator returned by [`merge_descending`].
pub struct MergeDescending<I: Iterator> {
    streams: Vec<I>,
    heap: BinaryHeap<HeapEntry<I::Item>>,
}

/// Merge streams that are each sorted greatest first into one stream sorted
/// greatest first.
///
/// Each stream is pulled only when its previous head has been yielded. Equal
/// items come out in stream order.
pub fn merge_descending<S>(streams: impl IntoIterator<Item = S>) -> MergeDescending<S::IntoIter>
where
    S: IntoIterator,
    S::Item: Ord,
{
    let mut streams: Vec<S::IntoIter> = streams.into_iter().map(IntoIterator::into_iter).collect();
    let mut heap = BinaryHeap::with_capacity(streams.len());
    for (stream, iter) in streams.iter_mut().enumerate() {
        if let Some(item) = iter.next() {
            heap.push(HeapEntry { item, stream });
        }
    }
    MergeDescending { streams, heap }
}

impl<I> Iterator for MergeDescending<I>
where
    I: Iterator,
    I::Item: Ord,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let HeapEntry { item, stream } = self.heap.pop()?;
        if let Some(next) = self.streams[stream].next() {
            self.heap.push(HeapEntry { item: next, stream });
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lo, hi) = self
            .streams
            .iter()
            .map(Iterator::size_hint)
            .fold((0_usize, Some(0_usize)), |(lo, hi), (l, h)| {
                (lo.saturating_add(l), hi.zip(h).and_then(|(a, b)| a.checked_add(b)))
            });
        let queued = self.heap.len();
        (
            lo.saturating_add(queued),
            hi.and_then(|h| h.checked_add(queued)),
        )
    }
}
