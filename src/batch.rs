//! Lazy fixed-size batching.
//!
//! [`Batches`] partitions an iterator into consecutive groups of at most `n`
//! elements. Each [`Batch`] pulls from the shared upstream only as it is
//! consumed, and mutably borrows its [`Batches`], so the next batch cannot be
//! requested while the current one is alive. Dropping a batch early drains
//! its remaining quota, keeping batch boundaries fixed at multiples of `n`.
//!
//! [`FaultTrap`] sits between a batch of `Result`s and its consumer, so the
//! consumer only ever sees records and the caller gets the fault.

use std::num::NonZeroUsize;

/// Splits an iterator into lazily-filled batches of at most `size` elements.
pub struct Batches<I: Iterator> {
    source: I,
    size: NonZeroUsize,
    emitted: usize,
}

impl<I: Iterator> Batches<I> {
    pub fn new(source: I, size: NonZeroUsize) -> Self {
        Self {
            source,
            size,
            emitted: 0,
        }
    }

    /// Start the next batch, or `None` once the upstream is exhausted.
    ///
    /// Pulls exactly one element to decide; an empty upstream therefore
    /// yields no batches at all rather than one empty batch.
    pub fn next_batch(&mut self) -> Option<Batch<'_, I>> {
        let first = self.source.next()?;
        self.emitted += 1;
        Some(Batch {
            first: Some(first),
            remaining: self.size.get() - 1,
            source: &mut self.source,
        })
    }

    /// Number of batches handed out so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

/// One single-pass batch borrowed from a [`Batches`].
pub struct Batch<'a, I: Iterator> {
    first: Option<I::Item>,
    remaining: usize,
    source: &'a mut I,
}

impl<I: Iterator> Iterator for Batch<'_, I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if let Some(first) = self.first.take() {
            return Some(first);
        }
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let item = self.source.next();
        if item.is_none() {
            self.remaining = 0;
        }
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let first = usize::from(self.first.is_some());
        (first, Some(first + self.remaining))
    }
}

impl<I: Iterator> Drop for Batch<'_, I> {
    fn drop(&mut self) {
        while self.remaining > 0 {
            self.remaining -= 1;
            if self.source.next().is_none() {
                break;
            }
        }
    }
}

/// Splits a fallible batch into plain records and the first fault.
///
/// Yields `Ok` values until the first `Err`, which is stored and ends the
/// stream. [`FaultTrap::finish`] drains whatever the consumer left unread
/// through the same check, so a fault past the point where the consumer
/// stopped is still reported.
pub struct FaultTrap<I, E> {
    inner: I,
    fault: Option<E>,
}

impl<T, E, I> FaultTrap<I, E>
where
    I: Iterator<Item = Result<T, E>>,
{
    pub fn new(inner: I) -> Self {
        Self { inner, fault: None }
    }

    /// Drain the rest of the batch and return the first fault seen, if any.
    pub fn finish(mut self) -> Result<(), E> {
        while self.next().is_some() {}
        match self.fault {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}

impl<T, E, I> Iterator for FaultTrap<I, E>
where
    I: Iterator<Item = Result<T, E>>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.fault.is_some() {
            return None;
        }
        match self.inner.next()? {
            Ok(item) => Some(item),
            Err(fault) => {
                self.fault = Some(fault);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::Cell;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn collect_batches<T>(items: Vec<T>, n: usize) -> Vec<Vec<T>> {
        let mut batches = Batches::new(items.into_iter(), size(n));
        let mut out = Vec::new();
        while let Some(batch) = batches.next_batch() {
            out.push(batch.collect());
        }
        out
    }

    #[test]
    fn test_exact_multiple() {
        let out = collect_batches((0..6).collect(), 3);
        assert_eq!(out, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn test_final_partial_batch() {
        let out = collect_batches((0..7).collect(), 3);
        assert_eq!(out, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        let out = collect_batches(Vec::<u8>::new(), 4);
        assert!(out.is_empty());
    }

    #[test]
    fn test_batch_size_one() {
        let out = collect_batches(vec!['a', 'b'], 1);
        assert_eq!(out, vec![vec!['a'], vec!['b']]);
    }

    #[test]
    fn test_batch_lengths_2500_by_1000() {
        let lens: Vec<usize> = collect_batches((0..2500).collect(), 1000)
            .iter()
            .map(Vec::len)
            .collect();
        assert_eq!(lens, vec![1000, 1000, 500]);
    }

    #[test]
    fn test_pulls_lazily() {
        let pulled = Cell::new(0);
        let source = (0..10).inspect(|_| pulled.set(pulled.get() + 1));
        let mut batches = Batches::new(source, size(4));

        let mut batch = batches.next_batch().unwrap();
        assert_eq!(pulled.get(), 1);
        assert_eq!(batch.next(), Some(0));
        assert_eq!(pulled.get(), 1);
        assert_eq!(batch.next(), Some(1));
        assert_eq!(pulled.get(), 2);
        assert_eq!(batch.by_ref().count(), 2);
        assert_eq!(pulled.get(), 4);
        drop(batch);

        assert_eq!(pulled.get(), 4);
        assert_eq!(batches.emitted(), 1);
    }

    #[test]
    fn test_early_drop_drains_quota() {
        let mut batches = Batches::new(0..10, size(4));
        {
            let mut first = batches.next_batch().unwrap();
            assert_eq!(first.next(), Some(0));
        }
        let second: Vec<_> = batches.next_batch().unwrap().collect();
        assert_eq!(second, vec![4, 5, 6, 7]);
        let third: Vec<_> = batches.next_batch().unwrap().collect();
        assert_eq!(third, vec![8, 9]);
        assert!(batches.next_batch().is_none());
        assert_eq!(batches.emitted(), 3);
    }

    #[test]
    fn test_size_hint() {
        let mut batches = Batches::new(0..5, size(3));
        let mut batch = batches.next_batch().unwrap();
        assert_eq!(batch.size_hint(), (1, Some(3)));
        batch.next();
        assert_eq!(batch.size_hint(), (0, Some(2)));
    }

    #[test]
    fn test_fault_trap_stops_at_first_fault() {
        let items: Vec<Result<u8, &str>> = vec![Ok(1), Ok(2), Err("bad"), Ok(4), Err("worse")];
        let mut trap = FaultTrap::new(items.into_iter());
        assert_eq!(trap.by_ref().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(trap.next(), None);
        assert_eq!(trap.finish(), Err("bad"));
    }

    #[test]
    fn test_fault_trap_finish_checks_unread_items() {
        let items: Vec<Result<u8, &str>> = vec![Ok(1), Ok(2), Ok(3), Err("late")];
        let mut trap = FaultTrap::new(items.into_iter());
        assert_eq!(trap.next(), Some(1));
        assert_eq!(trap.finish(), Err("late"));
    }

    #[test]
    fn test_fault_trap_clean_batch() {
        let items: Vec<Result<u8, &str>> = vec![Ok(1), Ok(2)];
        let trap = FaultTrap::new(items.into_iter());
        assert_eq!(trap.finish(), Ok(()));
    }

    proptest! {
        #[test]
        fn prop_batches_partition_input(
            items in proptest::collection::vec(any::<u16>(), 0..300),
            n in 1usize..40,
        ) {
            let batches = collect_batches(items.clone(), n);

            let rebuilt: Vec<u16> = batches.iter().flatten().copied().collect();
            prop_assert_eq!(&rebuilt, &items);
            prop_assert_eq!(batches.is_empty(), items.is_empty());

            if let Some((last, full)) = batches.split_last() {
                for batch in full {
                    prop_assert_eq!(batch.len(), n);
                }
                let expected_last = if items.len() % n == 0 { n } else { items.len() % n };
                prop_assert_eq!(last.len(), expected_last);
            }
        }
    }
}
