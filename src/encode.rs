//! Test-only instruction-word assembler.
//!
//! Grounded on `examples/johnrscott-riscvemu/src/encode.rs`
//! (`itype`/`rstype`/`ujtype` raw field builders and the
//! `btype_imm_fields`/`jtype_imm_field` bit shuffles), trimmed to the
//! RV32I + `mul` subset this crate executes. The per-mnemonic macros
//! the teacher generates (`addi!`, `beq!`, ...) are dropped; tests call
//! the format builders (`itype`, `rstype`, `stype`, `btype`, `jal`,
//! `utype`) directly with a raw opcode/funct3/funct7 constant.

pub use crate::opcodes::*;

/// Build an I-type instruction. `imm` is the raw 12-bit field value.
pub fn itype(imm: u32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
    (imm & 0xfff) << 20 | rs1 << 15 | funct3 << 12 | rd << 7 | opcode
}

/// Build a U-type instruction. `imm` is the raw upper-20-bits field.
pub fn utype(imm: u32, rd: u32, opcode: u32) -> u32 {
    (imm & 0xf_ffff) << 12 | rd << 7 | opcode
}

/// Build an R-type or S-type instruction, which share a layout. For
/// R-type `a` = funct7, `b` = rd; for S-type `a` = imm[11:5], `b` =
/// imm[4:0].
pub fn rstype(a: u32, rs2: u32, rs1: u32, funct3: u32, b: u32, opcode: u32) -> u32 {
    (a & 0x7f) << 25 | rs2 << 20 | rs1 << 15 | funct3 << 12 | (b & 0x1f) << 7 | opcode
}

/// Build a store instruction from a signed 12-bit byte offset.
pub fn stype(imm: i32, rs2: u32, rs1: u32, funct3: u32, opcode: u32) -> u32 {
    let bits = imm as u32 & 0xfff;
    rstype(bits >> 5, rs2, rs1, funct3, bits & 0x1f, opcode)
}

/// Build a conditional-branch instruction from a signed, even byte
/// offset (the implicit trailing zero bit is not stored).
pub fn btype(rs1: u32, rs2: u32, offset: i32, funct3: u32, opcode: u32) -> u32 {
    let bits = offset as u32;
    let imm12 = (bits >> 12) & 1;
    let imm11 = (bits >> 11) & 1;
    let imm10_5 = (bits >> 5) & 0x3f;
    let imm4_1 = (bits >> 1) & 0xf;
    imm12 << 31
        | imm10_5 << 25
        | rs2 << 20
        | rs1 << 15
        | funct3 << 12
        | imm4_1 << 8
        | imm11 << 7
        | opcode
}

/// Build a `jal` instruction from a signed, even byte offset.
pub fn jal(rd: u32, offset: i32) -> u32 {
    let bits = offset as u32;
    let imm20 = (bits >> 20) & 1;
    let imm19_12 = (bits >> 12) & 0xff;
    let imm11 = (bits >> 11) & 1;
    let imm10_1 = (bits >> 1) & 0x3ff;
    imm20 << 31 | imm10_1 << 21 | imm11 << 20 | imm19_12 << 12 | rd << 7 | OP_JAL
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode, Decoded};

    #[test]
    fn btype_round_trips_negative_offset() {
        let instr = btype(1, 2, -16, FUNCT3_BEQ.into(), OP_BRANCH);
        match decode(instr) {
            Decoded::Branch { imm_b, .. } => assert_eq!(imm_b as i32, -16),
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn stype_round_trips() {
        let instr = stype(-4, 3, 4, FUNCT3_W.into(), OP_STORE);
        match decode(instr) {
            Decoded::Store {
                imm_s, rs1, rs2, ..
            } => {
                assert_eq!(imm_s as i32, -4);
                assert_eq!(rs1, 4);
                assert_eq!(rs2, 3);
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn jal_round_trips_positive_offset() {
        let instr = jal(1, 1024);
        match decode(instr) {
            Decoded::Jal { rd, imm_j } => {
                assert_eq!(rd, 1);
                assert_eq!(imm_j as i32, 1024);
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }
}
