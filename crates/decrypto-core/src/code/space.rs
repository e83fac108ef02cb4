use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered selection of distinct keyword slots: clue `i` refers to slot `code[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Code(Vec<usize>);

impl Code {
    pub fn new(slots: Vec<usize>) -> Self {
        Self(slots)
    }

    pub fn slots(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[usize]> for Code {
    fn from(slots: &[usize]) -> Self {
        Self(slots.to_vec())
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pos, slot) in self.0.iter().enumerate() {
            if pos > 0 {
                f.write_str("-")?;
            }
            write!(f, "{slot}")?;
        }
        Ok(())
    }
}

/// Every `code_length`-permutation of `0..slots`, in lexicographic order.
///
/// The enumeration order is the tie-breaking order for every decoder result, so it is
/// generated once and never reordered. Codes are stored flat, `code_length` entries each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSpace {
    slots: usize,
    code_length: usize,
    flat: Vec<usize>,
}

impl CodeSpace {
    pub fn new(slots: usize, code_length: usize) -> Result<Self, DecodeError> {
        if code_length == 0 || slots < code_length {
            return Err(DecodeError::EmptyCodeSpace { slots, code_length });
        }

        let count = permutation_count(slots, code_length);
        let mut flat = Vec::with_capacity(count.saturating_mul(code_length));
        let mut prefix = Vec::with_capacity(code_length);
        let mut used = vec![false; slots];
        generate(slots, code_length, &mut prefix, &mut used, &mut flat);

        Ok(Self {
            slots,
            code_length,
            flat,
        })
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn code_length(&self) -> usize {
        self.code_length
    }

    pub fn len(&self) -> usize {
        self.flat.len() / self.code_length
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&[usize]> {
        let start = position.checked_mul(self.code_length)?;
        self.flat.get(start..start + self.code_length)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.flat.chunks_exact(self.code_length)
    }

    /// Enumeration index of `code`, if it belongs to this space.
    pub fn position_of(&self, code: &Code) -> Option<usize> {
        if code.len() != self.code_length {
            return None;
        }
        self.iter().position(|candidate| candidate == code.slots())
    }
}

/// Convenience wrapper returning owned codes in enumeration order.
pub fn enumerate_codes(slots: usize, code_length: usize) -> Result<Vec<Code>, DecodeError> {
    let space = CodeSpace::new(slots, code_length)?;
    Ok(space.iter().map(Code::from).collect())
}

fn permutation_count(slots: usize, code_length: usize) -> usize {
    ((slots - code_length + 1)..=slots).fold(1usize, |acc, factor| acc.saturating_mul(factor))
}

fn generate(
    slots: usize,
    code_length: usize,
    prefix: &mut Vec<usize>,
    used: &mut [bool],
    output: &mut Vec<usize>,
) {
    if prefix.len() == code_length {
        output.extend_from_slice(prefix);
        return;
    }

    for slot in 0..slots {
        if used[slot] {
            continue;
        }
        used[slot] = true;
        prefix.push(slot);
        generate(slots, code_length, prefix, used, output);
        prefix.pop();
        used[slot] = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_and_last_codes_are_lexicographic_extremes() {
        let space = CodeSpace::new(4, 3).expect("valid space");
        assert_eq!(space.len(), 24);
        assert_eq!(space.get(0), Some(&[0, 1, 2][..]));
        assert_eq!(space.get(1), Some(&[0, 1, 3][..]));
        assert_eq!(space.get(23), Some(&[3, 2, 1][..]));
        assert_eq!(space.get(24), None);
    }

    #[test]
    fn enumeration_is_strictly_increasing() {
        let space = CodeSpace::new(5, 3).expect("valid space");
        assert_eq!(space.len(), 60);
        let codes: Vec<&[usize]> = space.iter().collect();
        for pair in codes.windows(2) {
            assert!(pair[0] < pair[1], "{:?} !< {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn codes_have_distinct_slots() {
        let space = CodeSpace::new(4, 4).expect("valid space");
        for code in space.iter() {
            let mut sorted = code.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), 4);
        }
    }

    #[test]
    fn rejects_short_slot_lists() {
        let err = CodeSpace::new(2, 3).expect_err("N < L");
        assert_eq!(
            err,
            DecodeError::EmptyCodeSpace {
                slots: 2,
                code_length: 3
            }
        );
        assert!(CodeSpace::new(3, 0).is_err());
    }

    #[test]
    fn position_of_round_trips() {
        let space = CodeSpace::new(4, 3).expect("valid space");
        let code = Code::new(vec![1, 3, 0]);
        let position = space.position_of(&code).expect("member");
        assert_eq!(space.get(position), Some(code.slots()));
        assert_eq!(space.position_of(&Code::new(vec![1, 1, 0])), None);
        assert_eq!(code.to_string(), "1-3-0");
    }

    #[test]
    fn owned_enumeration_matches_space() {
        let codes = enumerate_codes(3, 2).expect("valid");
        let expected: Vec<Code> = [[0, 1], [0, 2], [1, 0], [1, 2], [2, 0], [2, 1]]
            .iter()
            .map(|slots| Code::new(slots.to_vec()))
            .collect();
        assert_eq!(codes, expected);
    }
}
