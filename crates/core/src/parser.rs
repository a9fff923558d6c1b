use crate::error::ParseError;
use crate::types::PairTable;

const OPENERS: [char; 4] = ['(', '[', '{', '<'];
const CLOSERS: [char; 4] = [')', ']', '}', '>'];

/// Parse dot-bracket notation into a pair table.
///
/// Characters: `.` = unpaired, `()` `[]` `{}` `<>` = four independent bracket
/// kinds, so crossing pairs can be written as `((..[[..))..]]`.
/// Whitespace is skipped.
pub fn parse(input: &str) -> Result<PairTable, ParseError> {
    let mut pairs: Vec<Option<usize>> = Vec::new();
    let mut stacks: [Vec<usize>; 4] = Default::default();
    let mut base_idx: usize = 0;

    for (pos, ch) in input.chars().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        if ch == '.' {
            pairs.push(None);
            base_idx += 1;
        } else if let Some(kind) = OPENERS.iter().position(|&c| c == ch) {
            pairs.push(None); // placeholder
            stacks[kind].push(base_idx);
            base_idx += 1;
        } else if let Some(kind) = CLOSERS.iter().position(|&c| c == ch) {
            let j = stacks[kind]
                .pop()
                .ok_or(ParseError::UnmatchedClose { ch, pos })?;
            pairs.push(Some(j));
            pairs[j] = Some(base_idx);
            base_idx += 1;
        } else {
            return Err(ParseError::BadCharacter { ch, pos });
        }
    }

    for (kind, stack) in stacks.iter().enumerate() {
        if let Some(&open) = stack.last() {
            return Err(ParseError::UnmatchedOpen {
                ch: OPENERS[kind],
                pos: open,
            });
        }
    }

    Ok(PairTable::new_unchecked(pairs))
}
