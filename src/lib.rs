use std::fmt;
use std::io::{BufRead, Write};

use thiserror::Error;
use tracing::{debug, trace};

pub mod programs;
mod tape;
mod validate;

pub use tape::Tape;
pub use validate::validate;

/// Number of cells on the tape unless configured otherwise.
pub const TAPE_CAPACITY: usize = 32768;

/// Value stored by `,` when input is exhausted or cannot be read.
pub const EOF_SENTINEL: i8 = -1;

/// When bytes written by `.` reach the underlying writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// Flush after every byte.
    #[default]
    Unbuffered,
    /// Flush once, when execution finishes.
    Buffered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Config {
    /// Clamped to at least one cell.
    pub tape_capacity: usize,
    pub output_mode: OutputMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tape_capacity: TAPE_CAPACITY,
            output_mode: OutputMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BfInterpreter<'p, I, O> {
    program: &'p [u8],
    instruction_pointer: usize,
    jump_memo: Vec<usize>,
    tape: Tape,
    output_mode: OutputMode,
    input: I,
    output: O,
}

impl<'p, I, O> BfInterpreter<'p, I, O>
where
    I: BufRead,
    O: Write,
{
    /// Validates `source` and prepares a fresh tape for running it.
    pub fn new(source: &'p str, config: Config, input: I, output: O) -> Result<Self, BfError> {
        let program = source.as_bytes();
        let jump_memo = validate::jump_table(program)?;
        Ok(Self {
            program,
            instruction_pointer: 0,
            jump_memo,
            tape: Tape::new(config.tape_capacity),
            output_mode: config.output_mode,
            input,
            output,
        })
    }

    pub fn is_end(&self) -> bool {
        self.instruction_pointer >= self.program.len()
    }

    pub fn instruction_pointer(&self) -> usize {
        self.instruction_pointer
    }

    pub fn data_pointer(&self) -> usize {
        self.tape.pointer()
    }

    pub fn head_value(&self) -> i8 {
        self.tape.head()
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn current_instruction(&self) -> Option<BfInstruction> {
        self.program
            .get(self.instruction_pointer)
            .copied()
            .and_then(BfInstruction::decode)
    }

    /// Executes the instruction under the instruction pointer.
    ///
    /// On a tape boundary violation the instruction pointer is left on the
    /// offending instruction. Once the program has ended this does nothing.
    pub fn step(&mut self) -> Result<(), BfError> {
        if self.is_end() {
            return Ok(());
        }
        let position = self.instruction_pointer;
        match self.current_instruction() {
            Some(BfInstruction::GoRight) => {
                if !self.tape.forward() {
                    return Err(BfError::TapeOverflow { position });
                }
            }
            Some(BfInstruction::GoLeft) => {
                if !self.tape.backward() {
                    return Err(BfError::TapeUnderflow { position });
                }
            }
            Some(BfInstruction::Increment) => {
                let cell = self.tape.head_mut();
                *cell = cell.wrapping_add(1);
            }
            Some(BfInstruction::Decrement) => {
                let cell = self.tape.head_mut();
                *cell = cell.wrapping_sub(1);
            }
            Some(BfInstruction::GetInput) => {
                *self.tape.head_mut() = self.read_byte();
            }
            Some(BfInstruction::PutOutput) => {
                let byte = self.head_value() as u8;
                self.output.write_all(&[byte])?;
                if self.output_mode == OutputMode::Unbuffered {
                    self.output.flush()?;
                }
            }
            Some(BfInstruction::LoopStart) => {
                if self.head_value() == 0 {
                    self.instruction_pointer = self.jump_memo[position];
                }
            }
            Some(BfInstruction::LoopEnd) => {
                if self.head_value() != 0 {
                    self.instruction_pointer = self.jump_memo[position];
                }
            }
            None => {}
        }
        self.instruction_pointer += 1;
        Ok(())
    }

    pub fn execute(mut self) -> Result<(), BfError> {
        debug!(
            len = self.program.len(),
            capacity = self.tape.capacity(),
            mode = ?self.output_mode,
            "execution started"
        );
        let mut steps = 0u64;
        while !self.is_end() {
            self.step()?;
            steps += 1;
        }
        self.output.flush()?;
        debug!(steps, "execution finished");
        Ok(())
    }

    fn read_byte(&mut self) -> i8 {
        let byte = match self.input.fill_buf() {
            Ok(buf) => buf.first().copied(),
            Err(err) => {
                trace!(%err, "input read failed");
                None
            }
        };
        match byte {
            Some(byte) => {
                self.input.consume(1);
                trace!(byte, "input consumed");
                byte as i8
            }
            None => {
                trace!("input exhausted");
                EOF_SENTINEL
            }
        }
    }
}

/// Validates and runs `source` on a tape of `tape_capacity` cells, flushing
/// output after every byte. A capacity of 0 is raised to a single cell.
pub fn execute<I, O>(source: &str, tape_capacity: usize, input: I, output: O) -> Result<(), BfError>
where
    I: BufRead,
    O: Write,
{
    let config = Config {
        tape_capacity,
        ..Config::default()
    };
    BfInterpreter::new(source, config, input, output)?.execute()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BfInstruction {
    GoRight,
    GoLeft,
    Increment,
    Decrement,
    GetInput,
    PutOutput,
    LoopStart,
    LoopEnd,
}

impl BfInstruction {
    /// Any byte outside the instruction set decodes to `None`.
    pub fn decode(code: u8) -> Option<Self> {
        Some(match code {
            b'>' => Self::GoRight,
            b'<' => Self::GoLeft,
            b'+' => Self::Increment,
            b'-' => Self::Decrement,
            b',' => Self::GetInput,
            b'.' => Self::PutOutput,
            b'[' => Self::LoopStart,
            b']' => Self::LoopEnd,
            _ => return None,
        })
    }
}

/// Which side of a loop is missing its partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopFault {
    /// A `]` with no `[` before it.
    Unopened,
    /// A `[` never closed.
    Unclosed,
}

impl fmt::Display for LoopFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopFault::Unopened => write!(f, "closing unopened loop"),
            LoopFault::Unclosed => write!(f, "unclosed loop"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BfError {
    #[error("unbalanced loop: {fault} at index {position}")]
    UnbalancedLoop { position: usize, fault: LoopFault },
    #[error("tape overflow: code ran off the tape at index {position}")]
    TapeOverflow { position: usize },
    #[error("tape underflow: code fell off the tape at index {position}")]
    TapeUnderflow { position: usize },
    #[error("output write error")]
    Output(#[from] std::io::Error),
}

impl BfError {
    /// Index of the offending instruction, if the error has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            BfError::UnbalancedLoop { position, .. }
            | BfError::TapeOverflow { position }
            | BfError::TapeUnderflow { position } => Some(*position),
            BfError::Output(_) => None,
        }
    }
}

#[cfg(test)]
fn run_with(source: &str, input: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut output = vec![];
    execute(source, TAPE_CAPACITY, std::io::BufReader::new(input), &mut output)?;
    Ok(output)
}

#[test]
fn test_echo() -> anyhow::Result<()> {
    let output = run_with(",[.,]", &[1, 4, 2, 3, 5, 2, 3, 0])?;
    assert_eq!(output, [1, 4, 2, 3, 5, 2, 3]);
    Ok(())
}

#[test]
fn test_reverse() -> anyhow::Result<()> {
    let output = run_with(">,[>,]<[.<]", &[1, 4, 2, 3, 5, 2, 3, 0])?;
    assert_eq!(output, [3, 2, 5, 3, 2, 4, 1]);
    Ok(())
}

#[test]
fn test_reverser_until_eof() -> anyhow::Result<()> {
    assert_eq!(run_with(programs::REVERSER, b"AB")?, b"BA\0");
    assert_eq!(run_with(programs::REVERSER, b"")?, b"\0");
    Ok(())
}

#[test]
fn test_hello_world() -> anyhow::Result<()> {
    let output = run_with(
        "++++++++++[>+++++++>++++++++++>+++>++++<
<<<-]>++.>+.+++++++..+++.>>++++.<++.<+++
+++++.--------.+++.------.--------.>+.",
        &[],
    )?;
    assert_eq!(output, b"Hello, world!");
    Ok(())
}

#[test]
fn test_sum_n() -> anyhow::Result<()> {
    let output = run_with(",[[->>+>+<<<]>>>[-<<<+>>>]<[-<+>]<<-]>.", &[3])?;
    assert_eq!(output, [6]);
    Ok(())
}

#[test]
fn test_sierpinski() -> anyhow::Result<()> {
    let output = run_with(programs::SIERPINSKI, &[])?;
    assert!(output.contains(&b'*'));
    assert!(output.contains(&b'\n'));
    Ok(())
}

#[test]
fn test_single_output() -> anyhow::Result<()> {
    assert_eq!(run_with("+++.", &[])?, [3]);
    assert_eq!(run_with("+[-].", &[])?, [0]);
    assert_eq!(run_with("-.", &[])?, [255]);
    Ok(())
}

#[test]
fn test_non_instructions_are_ignored() -> anyhow::Result<()> {
    assert_eq!(run_with("+ add\n+ two\n+ three .", &[])?, [3]);
    Ok(())
}

#[test]
fn test_cell_wraps_around() -> anyhow::Result<()> {
    let source = "+".repeat(256);
    let mut interpreter = BfInterpreter::new(&source, Config::default(), &b""[..], std::io::sink())?;
    while !interpreter.is_end() {
        interpreter.step()?;
    }
    assert_eq!(interpreter.head_value(), 0);
    Ok(())
}

#[test]
fn test_input_exhausted_stores_sentinel() -> anyhow::Result<()> {
    let mut interpreter = BfInterpreter::new(",,", Config::default(), &b"x"[..], std::io::sink())?;
    interpreter.step()?;
    assert_eq!(interpreter.head_value(), b'x' as i8);
    interpreter.step()?;
    assert_eq!(interpreter.head_value(), EOF_SENTINEL);
    Ok(())
}

#[test]
fn test_input_failure_stores_sentinel() -> anyhow::Result<()> {
    struct Broken;
    impl std::io::Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("broken pipe"))
        }
    }
    let input = std::io::BufReader::new(Broken);
    let mut interpreter = BfInterpreter::new("+,", Config::default(), input, std::io::sink())?;
    interpreter.step()?;
    interpreter.step()?;
    assert_eq!(interpreter.head_value(), EOF_SENTINEL);
    assert!(interpreter.is_end());
    Ok(())
}

#[test]
fn test_tape_overflow() -> anyhow::Result<()> {
    let capacity = 8;
    let mut output = vec![];
    execute(&">".repeat(capacity - 1), capacity, &b""[..], &mut output)?;

    let err = execute(&">".repeat(capacity), capacity, &b""[..], &mut output)
        .expect_err("must run off the tape");
    assert!(matches!(err, BfError::TapeOverflow { position } if position == capacity - 1));
    Ok(())
}

#[test]
fn test_tape_overflow_at_default_capacity() {
    let err = run_with(&">".repeat(TAPE_CAPACITY), &[]).expect_err("must run off the tape");
    let err = err.downcast::<BfError>().expect("interpreter error");
    assert_eq!(err.position(), Some(TAPE_CAPACITY - 1));
}

#[test]
fn test_zero_capacity_gets_one_cell() -> anyhow::Result<()> {
    let mut output = vec![];
    execute("+.", 0, &b""[..], &mut output)?;
    assert_eq!(output, [1]);
    let err = execute(">", 0, &b""[..], &mut output).expect_err("single cell tape");
    assert!(matches!(err, BfError::TapeOverflow { position: 0 }));
    Ok(())
}

#[test]
fn test_step_after_end_is_noop() -> anyhow::Result<()> {
    let mut interpreter = BfInterpreter::new("+", Config::default(), &b""[..], std::io::sink())?;
    interpreter.step()?;
    assert!(interpreter.is_end());
    assert_eq!(interpreter.current_instruction(), None);
    interpreter.step()?;
    assert_eq!(interpreter.instruction_pointer(), 1);
    assert_eq!(interpreter.head_value(), 1);
    Ok(())
}

#[test]
fn test_tape_underflow_halts_immediately() -> anyhow::Result<()> {
    let mut output = vec![];
    let err = execute("+.<+.", 4, &b""[..], &mut output).expect_err("must fall off the tape");
    assert!(matches!(err, BfError::TapeUnderflow { position: 2 }));
    assert_eq!(output, [1]);
    Ok(())
}

#[test]
fn test_failed_step_keeps_instruction_pointer() -> anyhow::Result<()> {
    let mut interpreter = BfInterpreter::new("><<", Config::default(), &b""[..], std::io::sink())?;
    interpreter.step()?;
    interpreter.step()?;
    assert_eq!(interpreter.data_pointer(), 0);
    assert!(interpreter.step().is_err());
    assert_eq!(interpreter.instruction_pointer(), 2);
    Ok(())
}

#[test]
fn test_loop_skipped_on_zero() -> anyhow::Result<()> {
    let mut interpreter = BfInterpreter::new("[+>]-", Config::default(), &b""[..], std::io::sink())?;
    interpreter.step()?;
    assert_eq!(interpreter.instruction_pointer(), 4);
    interpreter.step()?;
    assert_eq!(interpreter.tape().cells()[0], -1);
    assert_eq!(interpreter.data_pointer(), 0);
    Ok(())
}

#[test]
fn test_not_opening_loop() {
    let res = BfInterpreter::new("]", Config::default(), &b""[..], std::io::sink());
    let err = res.expect_err("must occur syntax error");
    assert!(matches!(
        err,
        BfError::UnbalancedLoop { position: 0, fault: LoopFault::Unopened }
    ));
}

#[test]
fn test_not_closing_loop() {
    let res = BfInterpreter::new("[[]", Config::default(), &b""[..], std::io::sink());
    let err = res.expect_err("must occur syntax error");
    assert!(matches!(
        err,
        BfError::UnbalancedLoop { position: 0, fault: LoopFault::Unclosed }
    ));
    assert_eq!(err.to_string(), "unbalanced loop: unclosed loop at index 0");
}

#[test]
fn test_output_flush_follows_mode() -> anyhow::Result<()> {
    #[derive(Default)]
    struct Counting {
        bytes: Vec<u8>,
        flushes: usize,
    }
    impl Write for Counting {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    let mut unbuffered = Counting::default();
    BfInterpreter::new("+.+.+.", Config::default(), &b""[..], &mut unbuffered)?.execute()?;
    assert_eq!(unbuffered.bytes, [1, 2, 3]);
    assert_eq!(unbuffered.flushes, 4);

    let config = Config {
        output_mode: OutputMode::Buffered,
        ..Config::default()
    };
    let mut buffered = Counting::default();
    BfInterpreter::new("+.+.+.", config, &b""[..], &mut buffered)?.execute()?;
    assert_eq!(buffered.bytes, [1, 2, 3]);
    assert_eq!(buffered.flushes, 1);
    Ok(())
}
