//! Trace a RV32I + `mul` program loaded from a Verilog-style hex image.
//!
//! Grounded on the teacher's `src/bin/emulate.rs` / `src/bin/elf2trace.rs`
//! (`clap::Parser` derive style, doc comment as `--help` text), adapted
//! from named `--input`/`--output` flags to bare positionals per
//! spec.md §6.

use clap::Parser;
use rv32i_trace_sim::driver::Driver;
use rv32i_trace_sim::error::SimError;
use rv32i_trace_sim::loader::load;
use rv32i_trace_sim::memory::BASE_ADDR;
use rv32i_trace_sim::registers::Registers;
use std::fs;
use std::io::Write;
use std::process::ExitCode;

/// Trace-simulate an RV32I + mul program from a hex memory image.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Path to the input hex memory image
    input: String,

    /// Path to write the trace to, in addition to stdout
    output: Option<String>,
}

const SEPARATOR: &str = "--------------------------------------------------------------------------------";

fn run(args: &Args) -> Result<(), SimError> {
    println!("{SEPARATOR}");
    for (i, arg) in std::env::args().enumerate() {
        println!("argv[{i}] = {arg}");
    }
    println!("{SEPARATOR}");

    let image_text = fs::read_to_string(&args.input)?;
    let outcome = load(&image_text)?;
    for warning in &outcome.warnings {
        println!("{warning}");
    }

    let mut output_file = args
        .output
        .as_ref()
        .map(fs::File::create)
        .transpose()?;

    let mut driver = Driver::new(BASE_ADDR, Registers::new(), outcome.memory);
    let result = (|| -> Result<(), SimError> {
        loop {
            let line = match driver.step() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                // Spec.md §7.3's error line is itself a trace line: it
                // goes through the same stdout/file sinks as every
                // other retired instruction before the run aborts.
                Err(e) => {
                    let line = format!("error: {e}");
                    println!("{line}");
                    if let Some(file) = output_file.as_mut() {
                        writeln!(file, "{line}")?;
                    }
                    return Err(SimError::from(e));
                }
            };
            println!("{line}");
            if let Some(file) = output_file.as_mut() {
                writeln!(file, "{line}")?;
            }
        }
        Ok(())
    })();

    println!("{SEPARATOR}");
    result
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
