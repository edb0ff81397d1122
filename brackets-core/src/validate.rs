//! Validation of competitor lists before a [`Bracket`] is built.
//!
//! [`Bracket`]: crate::Bracket
use crate::{Error, Result};

use std::collections::HashMap;

/// All competitor counts accepted by a bracket without byes.
pub const COMPETITOR_COUNTS: [usize; 7] = [4, 8, 16, 32, 64, 128, 256];

/// Checks that `count` is a power of two between 4 and 256.
pub fn competitor_count(count: usize) -> Result<()> {
    if COMPETITOR_COUNTS.contains(&count) {
        Ok(())
    } else {
        Err(Error::InvalidCompetitorCount { found: count })
    }
}

/// Checks that every name in `names` is unique.
///
/// # Errors
///
/// Returns [`Error::DuplicateNames`] with every repeated name, the most repeated first. Names
/// repeated equally often keep the order of their first appearance.
pub fn unique_names<I, T>(names: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    for (position, name) in names.into_iter().enumerate() {
        counts
            .entry(name.as_ref().to_owned())
            .or_insert((0, position))
            .0 += 1;
    }

    let mut repeated: Vec<(String, (usize, usize))> =
        counts.into_iter().filter(|(_, (count, _))| *count > 1).collect();

    if repeated.is_empty() {
        return Ok(());
    }

    repeated.sort_by(|(_, (lhs, lhs_pos)), (_, (rhs, rhs_pos))| {
        rhs.cmp(lhs).then(lhs_pos.cmp(rhs_pos))
    });

    Err(Error::DuplicateNames(
        repeated.into_iter().map(|(name, _)| name).collect(),
    ))
}

/// Runs all checks on `names`, the count first.
pub fn validate<T>(names: &[T]) -> Result<()>
where
    T: AsRef<str>,
{
    competitor_count(names.len())?;
    unique_names(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_competitor_count() {
        for n in COMPETITOR_COUNTS {
            assert_eq!(competitor_count(n), Ok(()));
        }

        for n in [0, 1, 2, 3, 5, 6, 100, 255, 257, 512] {
            assert_eq!(
                competitor_count(n),
                Err(Error::InvalidCompetitorCount { found: n })
            );
        }
    }

    #[test]
    fn test_unique_names() {
        assert_eq!(unique_names(["A", "B", "C", "D"]), Ok(()));
        assert_eq!(unique_names(Vec::<String>::new()), Ok(()));

        assert_eq!(
            unique_names(["A", "B", "A", "C", "B", "B"]),
            Err(Error::DuplicateNames(vec!["B".into(), "A".into()]))
        );

        assert_eq!(
            unique_names(["X", "Y", "Y", "X"]),
            Err(Error::DuplicateNames(vec!["X".into(), "Y".into()]))
        );

        // Names are compared exactly.
        assert_eq!(unique_names(["a", "A", "a "]), Ok(()));
    }

    #[test]
    fn test_validate() {
        assert_eq!(validate(&["A", "B", "C", "D"]), Ok(()));
        assert_eq!(
            validate(&["A", "B", "C"]),
            Err(Error::InvalidCompetitorCount { found: 3 })
        );
        assert_eq!(
            validate(&["A", "B", "C", "A"]),
            Err(Error::DuplicateNames(vec!["A".into()]))
        );
    }
}
