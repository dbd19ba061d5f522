//! Trace-line formatting
//!
//! One function, `format_trace_line`, renders a `TraceEvent` into the
//! exact text spec.md §4.5/§9 treats as a golden-file contract. Every
//! literal byte here — spacing included — is transcribed from
//! `examples/original_source/ISA/pauloreis_202100115524_poximv1.py`,
//! which is the most complete of the retrieved Python drafts and the
//! "reference disassembler" spec.md §4.5 points at. Column widths
//! that look arbitrary (the run of spaces before `rd=...` on each
//! line) are exactly as wide as the Python f-strings make them; do not
//! "clean them up".

use crate::exec::TraceEvent;
use crate::registers::Registers;

pub fn format_trace_line(pc: u32, event: &TraceEvent) -> String {
    match *event {
        TraceEvent::Lui { rd, imm_u, result } => format!(
            "0x{pc:08x}:lui    {},0x{:x}          {}=0x{result:08x}",
            Registers::name(rd),
            imm_u >> 12,
            Registers::name(rd),
        ),
        TraceEvent::Auipc { rd, imm_u, result } => format!(
            "0x{pc:08x}:auipc  {},0x{:x}          {}=0x{pc:08x}+0x{imm_u:08x}=0x{result:08x}",
            Registers::name(rd),
            imm_u >> 12,
            Registers::name(rd),
        ),
        TraceEvent::Jal {
            rd,
            imm_j,
            target,
            link,
        } => format!(
            "0x{pc:08x}:jal    {},0x{:x}        pc=0x{target:08x},{}=0x{link:08x}",
            Registers::name(rd),
            imm_j & 0x1f_ffff,
            Registers::name(rd),
        ),
        TraceEvent::Jalr {
            rd,
            rs1,
            imm_i_raw,
            rs1_value,
            imm_i_signed,
            target: _,
            link,
        } => format!(
            "0x{pc:08x}:jalr   {},{},0x{imm_i_raw:x}       pc=0x{rs1_value:08x}+{:08x},{}=0x{link:08x}",
            Registers::name(rd),
            Registers::name(rs1),
            imm_i_signed,
            Registers::name(rd),
        ),
        TraceEvent::Branch {
            mnemonic,
            op,
            rs1,
            rs2,
            rs1_value,
            rs2_value,
            imm_b,
            taken,
            target,
        } => format!(
            "0x{pc:08x}:{mnemonic:<7}{},{},0x{:x}         ({rs1_value:08x}{op}{rs2_value:08x})={}->pc=0x{target:08x}",
            Registers::name(rs1),
            Registers::name(rs2),
            imm_b & 0x1fff,
            taken as u8,
        ),
        TraceEvent::Load {
            mnemonic,
            rd,
            rs1,
            imm_i,
            addr,
            value,
        } => format!(
            "0x{pc:08x}:{mnemonic:<7}{},{}({})        {}=mem[0x{addr:08x}]=0x{value:08x}",
            Registers::name(rd),
            imm_i as i32,
            Registers::name(rs1),
            Registers::name(rd),
        ),
        TraceEvent::Store {
            mnemonic,
            rs1,
            rs2,
            imm_s,
            addr,
            value,
        } => format!(
            "0x{pc:08x}:{mnemonic:<7}{},{}({})      mem[0x{addr:08x}]=0x{value:08x}",
            Registers::name(rs2),
            imm_s as i32,
            Registers::name(rs1),
        ),
        TraceEvent::RegImm {
            mnemonic,
            rd,
            rs1,
            operand,
            ref lhs_expr,
            result,
        } => format!(
            "0x{pc:08x}:{mnemonic:<7}{},{},{operand}         {}={lhs_expr}=0x{result:08x}",
            Registers::name(rd),
            Registers::name(rs1),
            Registers::name(rd),
        ),
        TraceEvent::RegReg {
            mnemonic,
            rd,
            rs1,
            rs2,
            ref lhs_expr,
            result,
        } => format!(
            "0x{pc:08x}:{mnemonic:<7}{},{},{}            {}={lhs_expr}=0x{result:08x}",
            Registers::name(rd),
            Registers::name(rs1),
            Registers::name(rs2),
            Registers::name(rd),
        ),
        TraceEvent::EBreak => format!("0x{pc:08x}:ebreak"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::BASE_ADDR;

    #[test]
    fn lui_matches_golden_layout() {
        let event = TraceEvent::Lui {
            rd: 10,
            imm_u: 0x1234_5000,
            result: 0x1234_5000,
        };
        let line = format_trace_line(BASE_ADDR, &event);
        assert_eq!(
            line,
            "0x80000000:lui    a0,0x12345          a0=0x12345000"
        );
    }

    #[test]
    fn ebreak_is_bare() {
        let line = format_trace_line(BASE_ADDR, &TraceEvent::EBreak);
        assert_eq!(line, "0x80000000:ebreak");
    }

    #[test]
    fn branch_shows_comparison_and_target() {
        let event = TraceEvent::Branch {
            mnemonic: "beq",
            op: "==",
            rs1: 1,
            rs2: 2,
            rs1_value: 5,
            rs2_value: 5,
            imm_b: 8,
            taken: true,
            target: BASE_ADDR + 8,
        };
        let line = format_trace_line(BASE_ADDR, &event);
        assert_eq!(
            line,
            "0x80000000:beq    ra,sp,0x8         (00000005==00000005)=1->pc=0x80000008"
        );
    }

    #[test]
    fn addi_shows_lhs_expr() {
        let event = TraceEvent::RegImm {
            mnemonic: "addi",
            rd: 5,
            rs1: 0,
            operand: 3,
            lhs_expr: "0x00000000+0x00000003".to_string(),
            result: 3,
        };
        let line = format_trace_line(BASE_ADDR, &event);
        assert_eq!(
            line,
            "0x80000000:addi   t0,zero,3         t0=0x00000000+0x00000003=0x00000003"
        );
    }
}
