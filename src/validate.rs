use tracing::{debug, instrument};

use crate::{BfError, LoopFault};

/// Checks that every `[` in `program` has a matching `]` and vice versa.
///
/// An unopened `]` is reported at its own index. If loops are still open at
/// the end, the innermost one still open is reported, not the outermost.
#[instrument(level = "debug", skip_all, fields(len = program.len()))]
pub fn validate(program: &[u8]) -> Result<(), BfError> {
    jump_table(program).map(|_| ())
}

/// Builds the table of matching bracket positions.
///
/// `table[i]` holds the index of the bracket matching the one at `i`. Entries
/// for non-bracket positions are unused and left at zero.
pub(crate) fn jump_table(program: &[u8]) -> Result<Vec<usize>, BfError> {
    let mut loop_stack = vec![];
    let mut table = vec![0; program.len()];
    for (position, &code) in program.iter().enumerate() {
        match code {
            b'[' => loop_stack.push(position),
            b']' => {
                let Some(beginning) = loop_stack.pop() else {
                    debug!(position, "closing unopened loop");
                    return Err(BfError::UnbalancedLoop {
                        position,
                        fault: LoopFault::Unopened,
                    });
                };
                table[beginning] = position;
                table[position] = beginning;
            }
            _ => {}
        }
    }
    if let Some(&position) = loop_stack.last() {
        debug!(position, open = loop_stack.len(), "unclosed loop");
        return Err(BfError::UnbalancedLoop {
            position,
            fault: LoopFault::Unclosed,
        });
    }
    Ok(table)
}

#[cfg(test)]
fn fails_at(program: &str) -> Option<(usize, LoopFault)> {
    match validate(program.as_bytes()) {
        Err(BfError::UnbalancedLoop { position, fault }) => Some((position, fault)),
        _ => None,
    }
}

#[test]
fn balanced_loops_are_accepted() {
    for program in ["", "+-<>.,", "[]", "[[]]", "[][]", "+[>[-]<[>+<-]]", "a[b]c"] {
        assert!(validate(program.as_bytes()).is_ok(), "{program:?}");
    }
}

#[test]
fn unopened_close_is_reported_at_its_index() {
    assert_eq!(fails_at("]"), Some((0, LoopFault::Unopened)));
    assert_eq!(fails_at("[]]"), Some((2, LoopFault::Unopened)));
    assert_eq!(fails_at("+-]["), Some((2, LoopFault::Unopened)));
}

#[test]
fn unclosed_open_reports_innermost_still_open() {
    assert_eq!(fails_at("["), Some((0, LoopFault::Unclosed)));
    assert_eq!(fails_at("[[]"), Some((0, LoopFault::Unclosed)));
    assert_eq!(fails_at("[["), Some((1, LoopFault::Unclosed)));
    assert_eq!(fails_at("+[+[-][+"), Some((6, LoopFault::Unclosed)));
}

#[test]
fn validation_is_repeatable() {
    for program in ["[[]", "]", "[-]"] {
        let first = fails_at(program);
        assert_eq!(first, fails_at(program));
    }
}

#[test]
fn table_pairs_brackets() -> anyhow::Result<()> {
    let table = jump_table(b"+[[-]>]")?;
    assert_eq!(table[1], 6);
    assert_eq!(table[6], 1);
    assert_eq!(table[2], 4);
    assert_eq!(table[4], 2);
    Ok(())
}
