use crate::ops::instr::{ArgDesc, ArgKind, InstrDesc};

const fn arg(name: &'static str, kind: ArgKind) -> ArgDesc {
    ArgDesc { name, kind }
}

/// Control-code instruction table (TEXT section).
pub const TABLE: &[InstrDesc] = &[
    InstrDesc {
        opcode: 0x00,
        mnemonic: "nop",
        args: &[],
    },
    InstrDesc {
        opcode: 0x01,
        mnemonic: "write_32",
        args: &[arg("address", ArgKind::U32), arg("value", ArgKind::U32)],
    },
    InstrDesc {
        opcode: 0x02,
        mnemonic: "mask_write_32",
        args: &[arg("address", ArgKind::U32), arg("mask", ArgKind::U32), arg("value", ArgKind::U32)],
    },
    InstrDesc {
        opcode: 0x05,
        mnemonic: "wait_uc_dma",
        args: &[arg("dma_id", ArgKind::U16)],
    },
    InstrDesc {
        opcode: 0x06,
        mnemonic: "uc_dma_write_des",
        args: &[arg("dma_id", ArgKind::U16), arg("descriptor", ArgKind::Addr)],
    },
    InstrDesc {
        opcode: 0x08,
        mnemonic: "local_barrier",
        args: &[arg("barrier_id", ArgKind::U16), arg("num_participants", ArgKind::U16)],
    },
    InstrDesc {
        opcode: 0x09,
        mnemonic: "remote_barrier",
        args: &[arg("barrier_id", ArgKind::U16), arg("party_mask", ArgKind::U32)],
    },
    InstrDesc {
        opcode: 0x0C,
        mnemonic: "start_job",
        args: &[arg("job_id", ArgKind::Job)],
    },
    InstrDesc {
        opcode: 0x0D,
        mnemonic: "start_job_deferred",
        args: &[arg("job_id", ArgKind::Job)],
    },
    InstrDesc {
        opcode: 0x0E,
        mnemonic: "end_job",
        args: &[],
    },
    InstrDesc {
        opcode: 0x0F,
        mnemonic: "launch_job",
        args: &[arg("job_id", ArgKind::Job)],
    },
    InstrDesc {
        opcode: 0x10,
        mnemonic: "apply_offset_57",
        args: &[arg("table", ArgKind::Addr), arg("num_entries", ArgKind::U16), arg("offset", ArgKind::U16)],
    },
    InstrDesc {
        opcode: 0xFF,
        mnemonic: "eof",
        args: &[],
    },
];

pub fn by_mnemonic(name: &str) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.mnemonic == name)
}

pub fn by_opcode(opcode: u8) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.opcode == opcode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes_and_mnemonics_are_unique() {
        for (i, a) in TABLE.iter().enumerate() {
            for b in &TABLE[i + 1..] {
                assert_ne!(a.opcode, b.opcode, "{} / {}", a.mnemonic, b.mnemonic);
                assert_ne!(a.mnemonic, b.mnemonic);
            }
        }
    }

    #[test]
    fn sizes_follow_field_packing() {
        let size = |m| by_mnemonic(m).unwrap().size();
        assert_eq!(size("nop"), 4);
        assert_eq!(size("start_job"), 4);
        assert_eq!(size("write_32"), 12);
        assert_eq!(size("mask_write_32"), 16);
        assert_eq!(size("uc_dma_write_des"), 8);
        assert_eq!(size("local_barrier"), 8);
        assert_eq!(size("apply_offset_57"), 12);
    }
}
