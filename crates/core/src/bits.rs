//! Bit-sets and enum-sets

use std::collections::BTreeSet;

/// Growable set of non-negative integers stored as 64-bit words
///
/// Words are kept trimmed: the last word is never zero, so equal sets always
/// have equal word vectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BitSet {
    words: Vec<u64>,
}

impl BitSet {
    /// Empty set
    pub fn new() -> Self {
        BitSet::default()
    }

    /// Rebuild from little-endian words, bit `i` of word `w` is index `64w + i`
    pub fn from_words(mut words: Vec<u64>) -> Self {
        while words.last() == Some(&0) {
            words.pop();
        }
        BitSet { words }
    }

    /// Words backing the set
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Add an index
    pub fn insert(&mut self, index: usize) {
        let (word, bit) = (index / 64, index % 64);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << bit;
    }

    /// Remove an index
    pub fn remove(&mut self, index: usize) {
        let (word, bit) = (index / 64, index % 64);
        if let Some(w) = self.words.get_mut(word) {
            *w &= !(1u64 << bit);
        }
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }

    /// True if the index is present
    pub fn contains(&self, index: usize) -> bool {
        self.words
            .get(index / 64)
            .map_or(false, |w| w & (1u64 << (index % 64)) != 0)
    }

    /// Number of indices present
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True if no index is present
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Present indices in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            (0..64usize)
                .filter(move |&bit| word & (1u64 << bit) != 0)
                .map(move |bit| w * 64 + bit)
        })
    }
}

impl FromIterator<usize> for BitSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = BitSet::new();
        for index in iter {
            set.insert(index);
        }
        set
    }
}

/// Set of constants of a named enum type
///
/// Carries the element type so an empty set still knows what it is a set of.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumSet {
    element_type: String,
    constants: BTreeSet<String>,
}

impl EnumSet {
    /// Empty set of `element_type`
    pub fn empty(element_type: impl Into<String>) -> Self {
        EnumSet {
            element_type: element_type.into(),
            constants: BTreeSet::new(),
        }
    }

    /// Set of `element_type` holding `constants`
    pub fn of<I, S>(element_type: impl Into<String>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EnumSet {
            element_type: element_type.into(),
            constants: constants.into_iter().map(Into::into).collect(),
        }
    }

    /// Enum type name
    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    /// Constant names in sorted order
    pub fn constants(&self) -> &BTreeSet<String> {
        &self.constants
    }

    /// True if the constant is present
    pub fn contains(&self, constant: &str) -> bool {
        self.constants.contains(constant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_contains_remove() {
        let mut set = BitSet::new();
        set.insert(3);
        set.insert(130);
        assert!(set.contains(3));
        assert!(set.contains(130));
        assert!(!set.contains(4));
        assert_eq!(set.len(), 2);
        set.remove(130);
        assert_eq!(set.words().len(), 1);
    }

    #[test]
    fn test_from_words_trims() {
        let set = BitSet::from_words(vec![5, 0, 0]);
        assert_eq!(set.words(), &[5]);
        assert_eq!(set, [0usize, 2].into_iter().collect::<BitSet>());
    }

    #[test]
    fn test_iter_ascending() {
        let set: BitSet = [64usize, 1, 200].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 64, 200]);
    }

    #[test]
    fn test_full_word() {
        let set = BitSet::from_words(vec![u64::MAX]);
        assert_eq!(set.len(), 64);
        assert!(set.contains(63));
    }

    #[test]
    fn test_enum_set() {
        let set = EnumSet::of("ledgerflow.Colour", ["RED", "BLUE"]);
        assert!(set.contains("RED"));
        assert_eq!(set.constants().len(), 2);
        assert!(EnumSet::empty("ledgerflow.Colour").constants().is_empty());
    }
}
