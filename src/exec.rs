//! Instruction execution
//!
//! One `execute` entry point, total over `Decoded`, that mutates
//! `Registers`/`Memory`, returns the next `pc`, and produces a
//! `TraceEvent` carrying exactly the values the tracer needs to render
//! the golden-file line for that instruction.
//!
//! Grounded on `riscvemu/src/hart.rs`'s `execute_*_rv32i` family (one
//! function per instruction group, `sign_extend`, wrapping arithmetic,
//! and the register-zero discipline of reading `rd` through
//! `Registers::set`, which already discards writes to `x0`). The
//! teacher reinterprets signed/unsigned values with
//! `unsafe { mem::transmute }`; this crate uses safe `as` casts
//! instead, since `i32`/`u32` have identical size and layout and the
//! cast is exactly what `transmute` was doing here.
//! `mul` semantics (32x32 -> low 32 bits, unsigned wrapping multiply)
//! are grounded on
//! `examples/original_source/ISA/pauloreis_202100115524_poximv1.py`'s
//! `opcode == 0b0110011` / `funct7 == 0b0000001` arm.

use crate::decode::{sign_extend, Decoded};
use crate::error::ExecError;
use crate::memory::Memory;
use crate::opcodes::*;
use crate::registers::Registers;

fn as_signed(v: u32) -> i32 {
    v as i32
}

fn as_unsigned(v: i32) -> u32 {
    v as u32
}

/// The semantic facts the tracer needs to render one retired
/// instruction's line, in the exact layout spec.md §4.5 fixes.
#[derive(Debug, Clone)]
pub enum TraceEvent {
    Lui { rd: u8, imm_u: u32, result: u32 },
    Auipc { rd: u8, imm_u: u32, result: u32 },
    Jal { rd: u8, imm_j: u32, target: u32, link: u32 },
    Jalr {
        rd: u8,
        rs1: u8,
        imm_i_raw: u32,
        rs1_value: u32,
        imm_i_signed: u32,
        target: u32,
        link: u32,
    },
    Branch {
        mnemonic: &'static str,
        op: &'static str,
        rs1: u8,
        rs2: u8,
        rs1_value: u32,
        rs2_value: u32,
        imm_b: u32,
        taken: bool,
        target: u32,
    },
    Load {
        mnemonic: &'static str,
        rd: u8,
        rs1: u8,
        imm_i: u32,
        addr: u32,
        value: u32,
    },
    Store {
        mnemonic: &'static str,
        rs1: u8,
        rs2: u8,
        imm_s: u32,
        addr: u32,
        value: u32,
    },
    RegImm {
        mnemonic: &'static str,
        rd: u8,
        rs1: u8,
        operand: i32,
        lhs_expr: String,
        result: u32,
    },
    RegReg {
        mnemonic: &'static str,
        rd: u8,
        rs1: u8,
        rs2: u8,
        lhs_expr: String,
        result: u32,
    },
    EBreak,
}

/// Outcome of executing one instruction: where to fetch from next,
/// and what to trace.
pub struct StepOutcome {
    pub next_pc: u32,
    pub trace: TraceEvent,
}

fn next_instruction_address(pc: u32) -> u32 {
    pc.wrapping_add(4)
}

pub fn execute(
    regs: &mut Registers,
    mem: &mut Memory,
    pc: u32,
    decoded: &Decoded,
) -> Result<StepOutcome, ExecError> {
    match *decoded {
        Decoded::Lui { rd, imm_u } => {
            regs.set(rd, imm_u);
            Ok(StepOutcome {
                next_pc: next_instruction_address(pc),
                trace: TraceEvent::Lui {
                    rd,
                    imm_u,
                    result: imm_u,
                },
            })
        }
        Decoded::Auipc { rd, imm_u } => {
            let result = pc.wrapping_add(imm_u);
            regs.set(rd, result);
            Ok(StepOutcome {
                next_pc: next_instruction_address(pc),
                trace: TraceEvent::Auipc { rd, imm_u, result },
            })
        }
        Decoded::Jal { rd, imm_j } => {
            let link = next_instruction_address(pc);
            let target = pc.wrapping_add(imm_j);
            regs.set(rd, link);
            Ok(StepOutcome {
                next_pc: target,
                trace: TraceEvent::Jal {
                    rd,
                    imm_j,
                    target,
                    link,
                },
            })
        }
        Decoded::Jalr { rd, rs1, imm_i } => {
            let rs1_value = regs.get(rs1);
            let link = next_instruction_address(pc);
            let target = rs1_value.wrapping_add(imm_i) & !1u32;
            regs.set(rd, link);
            Ok(StepOutcome {
                next_pc: target,
                trace: TraceEvent::Jalr {
                    rd,
                    rs1,
                    imm_i_raw: imm_i & 0xfff,
                    rs1_value,
                    imm_i_signed: imm_i,
                    target,
                    link,
                },
            })
        }
        Decoded::Branch {
            funct3,
            rs1,
            rs2,
            imm_b,
        } => {
            let rs1_value = regs.get(rs1);
            let rs2_value = regs.get(rs2);
            let (taken, mnemonic, op) = match funct3 {
                FUNCT3_BEQ => (rs1_value == rs2_value, "beq", "=="),
                FUNCT3_BNE => (rs1_value != rs2_value, "bne", "!="),
                FUNCT3_BLT => (as_signed(rs1_value) < as_signed(rs2_value), "blt", "<"),
                FUNCT3_BGE => (as_signed(rs1_value) >= as_signed(rs2_value), "bge", ">="),
                FUNCT3_BLTU => (rs1_value < rs2_value, "bltu", "<"),
                FUNCT3_BGEU => (rs1_value >= rs2_value, "bgeu", ">="),
                _ => return Err(ExecError::UnknownOpcode { opcode: OP_BRANCH, pc }),
            };
            let target = if taken {
                pc.wrapping_add(imm_b)
            } else {
                next_instruction_address(pc)
            };
            Ok(StepOutcome {
                next_pc: target,
                trace: TraceEvent::Branch {
                    mnemonic,
                    op,
                    rs1,
                    rs2,
                    rs1_value,
                    rs2_value,
                    imm_b,
                    taken,
                    target,
                },
            })
        }
        Decoded::Load {
            funct3,
            rd,
            rs1,
            imm_i,
        } => {
            let base = regs.get(rs1);
            let addr = base.wrapping_add(imm_i);
            let mnemonic;
            let value;
            match funct3 {
                FUNCT3_B => {
                    mnemonic = "lb";
                    value = sign_extend(mem.read_u8(addr)?.into(), 7);
                }
                FUNCT3_H => {
                    mnemonic = "lh";
                    value = sign_extend(mem.read_u16_le(addr)?.into(), 15);
                }
                FUNCT3_W => {
                    mnemonic = "lw";
                    value = mem.read_u32_le(addr)?;
                }
                FUNCT3_BU => {
                    mnemonic = "lbu";
                    value = mem.read_u8(addr)?.into();
                }
                FUNCT3_HU => {
                    mnemonic = "lhu";
                    value = mem.read_u16_le(addr)?.into();
                }
                _ => return Err(ExecError::UnknownOpcode { opcode: OP_LOAD, pc }),
            }
            regs.set(rd, value);
            Ok(StepOutcome {
                next_pc: next_instruction_address(pc),
                trace: TraceEvent::Load {
                    mnemonic,
                    rd,
                    rs1,
                    imm_i,
                    addr,
                    value,
                },
            })
        }
        Decoded::Store {
            funct3,
            rs1,
            rs2,
            imm_s,
        } => {
            let base = regs.get(rs1);
            let addr = base.wrapping_add(imm_s);
            let value = regs.get(rs2);
            let mnemonic = match funct3 {
                FUNCT3_B => {
                    mem.write_u8(addr, value as u8)?;
                    "sb"
                }
                FUNCT3_H => {
                    mem.write_u16_le(addr, value as u16)?;
                    "sh"
                }
                FUNCT3_W => {
                    mem.write_u32_le(addr, value)?;
                    "sw"
                }
                _ => return Err(ExecError::UnknownOpcode { opcode: OP_STORE, pc }),
            };
            Ok(StepOutcome {
                next_pc: next_instruction_address(pc),
                trace: TraceEvent::Store {
                    mnemonic,
                    rs1,
                    rs2,
                    imm_s,
                    addr,
                    value,
                },
            })
        }
        Decoded::RegImm {
            funct3,
            funct7,
            rd,
            rs1,
            imm_i,
            shamt,
        } => {
            let src = regs.get(rs1);
            let (mnemonic, result, lhs_expr, operand) = match funct3 {
                FUNCT3_ADDI => (
                    "addi",
                    src.wrapping_add(imm_i),
                    format!("0x{src:08x}+0x{imm_i:08x}"),
                    as_signed(imm_i),
                ),
                FUNCT3_SLTI => (
                    "slti",
                    (as_signed(src) < as_signed(imm_i)) as u32,
                    format!("({src:08x}<{imm_i:08x})"),
                    as_signed(imm_i),
                ),
                FUNCT3_SLTIU => (
                    "sltiu",
                    (src < imm_i) as u32,
                    format!("({src:08x}<{imm_i:08x})"),
                    as_signed(imm_i),
                ),
                FUNCT3_XORI => (
                    "xori",
                    src ^ imm_i,
                    format!("0x{src:08x}^0x{imm_i:08x}"),
                    as_signed(imm_i),
                ),
                FUNCT3_ORI => (
                    "ori",
                    src | imm_i,
                    format!("0x{src:08x}|0x{imm_i:08x}"),
                    as_signed(imm_i),
                ),
                FUNCT3_ANDI => (
                    "andi",
                    src & imm_i,
                    format!("0x{src:08x}&0x{imm_i:08x}"),
                    as_signed(imm_i),
                ),
                FUNCT3_SLLI => (
                    "slli",
                    src << (shamt & 0x1f),
                    format!("0x{src:08x}<<{shamt}"),
                    i32::from(shamt),
                ),
                FUNCT3_SRLI_SRAI if funct7 == FUNCT7_SRA => (
                    "srai",
                    as_unsigned(as_signed(src) >> (shamt & 0x1f)),
                    format!("0x{src:08x}>>{shamt}"),
                    i32::from(shamt),
                ),
                FUNCT3_SRLI_SRAI => (
                    "srli",
                    src >> (shamt & 0x1f),
                    format!("0x{src:08x}>>{shamt}"),
                    i32::from(shamt),
                ),
                _ => return Err(ExecError::UnknownOpcode { opcode: OP_IMM, pc }),
            };
            regs.set(rd, result);
            Ok(StepOutcome {
                next_pc: next_instruction_address(pc),
                trace: TraceEvent::RegImm {
                    mnemonic,
                    rd,
                    rs1,
                    operand,
                    lhs_expr,
                    result,
                },
            })
        }
        Decoded::RegReg {
            funct3,
            funct7,
            rd,
            rs1,
            rs2,
        } => {
            let a = regs.get(rs1);
            let b = regs.get(rs2);
            let shamt = b & 0x1f;
            let (mnemonic, result, lhs_expr) = match (funct3, funct7) {
                (FUNCT3_MUL, FUNCT7_MULDIV) => {
                    ("mul", a.wrapping_mul(b), format!("0x{a:08x}*0x{b:08x}"))
                }
                (FUNCT3_ADD_SUB, f) if f == FUNCT7_SUB => {
                    ("sub", a.wrapping_sub(b), format!("0x{a:08x}-0x{b:08x}"))
                }
                (FUNCT3_ADD_SUB, _) => {
                    ("add", a.wrapping_add(b), format!("0x{a:08x}+0x{b:08x}"))
                }
                (FUNCT3_SLL, _) => ("sll", a << shamt, format!("0x{a:08x}<<{shamt}")),
                (FUNCT3_SLT, _) => (
                    "slt",
                    (as_signed(a) < as_signed(b)) as u32,
                    format!("({a:08x}<{b:08x})"),
                ),
                (FUNCT3_SLTU, _) => ("sltu", (a < b) as u32, format!("({a:08x}<{b:08x})")),
                (FUNCT3_XOR, _) => ("xor", a ^ b, format!("0x{a:08x}^{b:08x}")),
                (FUNCT3_SRL_SRA, f) if f == FUNCT7_SRA => (
                    "sra",
                    as_unsigned(as_signed(a) >> shamt),
                    format!("0x{a:08x}>>{shamt}"),
                ),
                (FUNCT3_SRL_SRA, _) => ("srl", a >> shamt, format!("0x{a:08x}>>{shamt}")),
                (FUNCT3_OR, _) => ("or", a | b, format!("0x{a:08x}|0x{b:08x}")),
                (FUNCT3_AND, _) => ("and", a & b, format!("0x{a:08x}&0x{b:08x}")),
                _ => return Err(ExecError::UnknownOpcode { opcode: OP_REG, pc }),
            };
            regs.set(rd, result);
            Ok(StepOutcome {
                next_pc: next_instruction_address(pc),
                trace: TraceEvent::RegReg {
                    mnemonic,
                    rd,
                    rs1,
                    rs2,
                    lhs_expr,
                    result,
                },
            })
        }
        Decoded::EBreak => Ok(StepOutcome {
            next_pc: pc,
            trace: TraceEvent::EBreak,
        }),
        Decoded::Unknown { opcode, .. } => Err(ExecError::UnknownOpcode { opcode, pc }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use crate::encode::*;
    use crate::memory::BASE_ADDR;

    fn fresh() -> (Registers, Memory) {
        (Registers::new(), Memory::new())
    }

    #[test]
    fn addi_adds_sign_extended_immediate() {
        let (mut regs, mut mem) = fresh();
        let instr = decode(itype((-1i32 as u32) & 0xfff, 0, FUNCT3_ADDI.into(), 5, OP_IMM));
        let outcome = execute(&mut regs, &mut mem, BASE_ADDR, &instr).unwrap();
        assert_eq!(regs.get(5), u32::MAX);
        assert_eq!(outcome.next_pc, BASE_ADDR + 4);
    }

    #[test]
    fn add_wraps_on_overflow() {
        let (mut regs, mut mem) = fresh();
        regs.set(1, u32::MAX);
        regs.set(2, 1);
        let instr = decode(rstype(0, 2, 1, FUNCT3_ADD_SUB.into(), 3, OP_REG));
        execute(&mut regs, &mut mem, BASE_ADDR, &instr).unwrap();
        assert_eq!(regs.get(3), 0);
    }

    #[test]
    fn mul_keeps_low_32_bits() {
        let (mut regs, mut mem) = fresh();
        regs.set(1, 0x1_0000);
        regs.set(2, 0x1_0000);
        let instr = decode(rstype(
            FUNCT7_MULDIV,
            2,
            1,
            FUNCT3_MUL.into(),
            3,
            OP_REG,
        ));
        execute(&mut regs, &mut mem, BASE_ADDR, &instr).unwrap();
        assert_eq!(regs.get(3), 0);
    }

    #[test]
    fn blt_compares_signed() {
        let (mut regs, mut mem) = fresh();
        regs.set(1, u32::MAX); // -1 signed
        regs.set(2, 1);
        let instr = decode(btype(1, 2, 8, FUNCT3_BLT.into(), OP_BRANCH));
        let outcome = execute(&mut regs, &mut mem, BASE_ADDR, &instr).unwrap();
        assert_eq!(outcome.next_pc, BASE_ADDR + 8);
    }

    #[test]
    fn bltu_compares_unsigned() {
        let (mut regs, mut mem) = fresh();
        regs.set(1, u32::MAX);
        regs.set(2, 1);
        let instr = decode(btype(1, 2, 8, FUNCT3_BLTU.into(), OP_BRANCH));
        let outcome = execute(&mut regs, &mut mem, BASE_ADDR, &instr).unwrap();
        assert_eq!(outcome.next_pc, BASE_ADDR + 4);
    }

    #[test]
    fn store_then_load_word_round_trips() {
        let (mut regs, mut mem) = fresh();
        regs.set(1, BASE_ADDR);
        regs.set(2, 0xcafe_babe);
        let store = decode(stype(0, 2, 1, FUNCT3_W.into(), OP_STORE));
        execute(&mut regs, &mut mem, BASE_ADDR, &store).unwrap();

        let load = decode(itype(0, 1, FUNCT3_W.into(), 3, OP_LOAD));
        execute(&mut regs, &mut mem, BASE_ADDR + 4, &load).unwrap();
        assert_eq!(regs.get(3), 0xcafe_babe);
    }

    #[test]
    fn lb_sign_extends() {
        let (mut regs, mut mem) = fresh();
        mem.write_u8(BASE_ADDR, 0xff).unwrap();
        regs.set(1, BASE_ADDR);
        let load = decode(itype(0, 1, FUNCT3_B.into(), 2, OP_LOAD));
        execute(&mut regs, &mut mem, BASE_ADDR, &load).unwrap();
        assert_eq!(regs.get(2), 0xffff_ffff);
    }

    #[test]
    fn lbu_zero_extends() {
        let (mut regs, mut mem) = fresh();
        mem.write_u8(BASE_ADDR, 0xff).unwrap();
        regs.set(1, BASE_ADDR);
        let load = decode(itype(0, 1, FUNCT3_BU.into(), 2, OP_LOAD));
        execute(&mut regs, &mut mem, BASE_ADDR, &load).unwrap();
        assert_eq!(regs.get(2), 0xff);
    }

    #[test]
    fn jalr_handles_rd_equal_rs1() {
        let (mut regs, mut mem) = fresh();
        regs.set(1, BASE_ADDR + 0x100);
        let instr = decode(itype(0, 1, 0, 1, OP_JALR));
        let outcome = execute(&mut regs, &mut mem, BASE_ADDR, &instr).unwrap();
        assert_eq!(outcome.next_pc, BASE_ADDR + 0x100);
        assert_eq!(regs.get(1), BASE_ADDR + 4);
    }

    #[test]
    fn ebreak_does_not_advance_pc() {
        let (mut regs, mut mem) = fresh();
        let instr = decode(itype(1, 0, 0, 0, OP_SYSTEM));
        let outcome = execute(&mut regs, &mut mem, BASE_ADDR, &instr).unwrap();
        assert_eq!(outcome.next_pc, BASE_ADDR);
    }

    #[test]
    fn unknown_opcode_is_an_error() {
        let (mut regs, mut mem) = fresh();
        let instr = decode(0b1111111);
        assert!(execute(&mut regs, &mut mem, BASE_ADDR, &instr).is_err());
    }

    #[test]
    fn out_of_range_store_is_an_error() {
        let (mut regs, mut mem) = fresh();
        regs.set(1, 0);
        let store = decode(stype(0, 0, 1, FUNCT3_W.into(), OP_STORE));
        assert!(execute(&mut regs, &mut mem, BASE_ADDR, &store).is_err());
    }
}
