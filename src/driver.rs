//! Simulation driver
//!
//! Runs the fetch-decode-execute-trace cycle until the program halts
//! (spec.md §4.6). Grounded on `riscvemu/src/hart.rs::step`'s
//! fetch/decode/execute sequencing, restructured as an explicit
//! `{Running, Halted}` state machine matching
//! `examples/original_source/ISA/pauloreis_202100115524_poximv1.py`'s
//! top-level `while executando:` loop, which halts on `ebreak` and on
//! an unrecognised opcode rather than trapping into a debugger.

use crate::decode::decode;
use crate::error::ExecError;
use crate::exec::{execute, TraceEvent};
use crate::memory::Memory;
use crate::registers::Registers;
use crate::trace::format_trace_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
}

/// Owns the architectural state and drives it forward one instruction
/// at a time, producing one trace line per step.
pub struct Driver {
    pub pc: u32,
    pub registers: Registers,
    pub memory: Memory,
    state: State,
}

impl Driver {
    pub fn new(pc: u32, registers: Registers, memory: Memory) -> Self {
        Self {
            pc,
            registers,
            memory,
            state: State::Running,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Fetch, decode and execute the instruction at the current `pc`,
    /// returning the trace line for it. Returns `None` once halted;
    /// callers should stop calling `step` at that point.
    pub fn step(&mut self) -> Result<Option<String>, ExecError> {
        if self.state == State::Halted {
            return Ok(None);
        }

        let word = self.memory.read_u32_le(self.pc)?;
        let decoded = decode(word);
        let outcome = execute(&mut self.registers, &mut self.memory, self.pc, &decoded)?;

        let line = format_trace_line(self.pc, &outcome.trace);
        if matches!(outcome.trace, TraceEvent::EBreak) {
            self.state = State::Halted;
        } else {
            self.pc = outcome.next_pc;
        }
        Ok(Some(line))
    }

    /// Run to completion, returning every trace line produced. On an
    /// execution error the partial trace already produced is
    /// discarded by the caller along with the error, per spec.md
    /// §7.3 (the program aborts, it does not emit a partial trace).
    pub fn run(&mut self) -> Result<Vec<String>, ExecError> {
        let mut lines = Vec::new();
        while let Some(line) = self.step()? {
            lines.push(line);
        }
        Ok(lines)
    }
}
