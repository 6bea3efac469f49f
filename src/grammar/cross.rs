//! Cross product over lists of alternatives.

use crate::error::{LexigramError, Result};

/// Enumerates every combination picking one item from each dimension.
///
/// The iterator keeps only a counter; each combination is decoded from it
/// by repeated `%`/`/` over the dimension lengths, so the first dimension
/// changes fastest. A dimension without items makes the product empty;
/// no dimensions at all yield a single empty combination. A product too
/// large for the counter is rejected.
///
/// ```
/// use lexigram::grammar::cross::CrossIter;
///
/// let combinations: Vec<_> = CrossIter::new(vec![vec![1, 2], vec![10, 20]]).unwrap().collect();
/// assert_eq!(combinations, vec![vec![1, 10], vec![2, 10], vec![1, 20], vec![2, 20]]);
/// ```
#[derive(Clone, Debug)]
pub struct CrossIter<T> {
    index: usize,
    size: usize,
    dimensions: Vec<Vec<T>>,
}

impl<T: Clone> CrossIter<T> {
    pub fn new(dimensions: Vec<Vec<T>>) -> Result<Self> {
        let size = combination_count(dimensions.iter().map(Vec::len)).ok_or_else(|| {
            LexigramError::grammar(format!(
                "Cross product of {} dimensions overflows",
                dimensions.len()
            ))
        })?;
        Ok(CrossIter {
            index: 0,
            size,
            dimensions,
        })
    }

    /// Number of combinations.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The combination at `index`, or `None` past the end.
    pub fn values_at(&self, index: usize) -> Option<Vec<T>> {
        if index >= self.size {
            return None;
        }
        let mut rest = index;
        let values = self
            .dimensions
            .iter()
            .map(|dimension| {
                let item = dimension[rest % dimension.len()].clone();
                rest /= dimension.len();
                item
            })
            .collect();
        Some(values)
    }

    pub fn restart(&mut self) {
        self.index = 0;
    }
}

/// Product of the dimension lengths, `None` on overflow.
fn combination_count(lengths: impl IntoIterator<Item = usize>) -> Option<usize> {
    lengths.into_iter().try_fold(1usize, |count, len| count.checked_mul(len))
}

impl<T: Clone> Iterator for CrossIter<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let values = self.values_at(self.index)?;
        self.index += 1;
        Some(values)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.size - self.index;
        (remaining, Some(remaining))
    }
}

impl<T: Clone> ExactSizeIterator for CrossIter<T> {}
