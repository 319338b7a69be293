use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use micro8::exec::{Event, State, disassemble};
use micro8::machine::Machine;
use micro8::program::parse_image;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "micro8", about = "An 8-bit byte-code virtual machine")]
struct Cli {
    /// Program file: one 8-digit binary literal per line, `#` comments.
    program: PathBuf,

    /// Print a trace line (pc, next three bytes, registers) every cycle.
    #[arg(long)]
    trace: bool,

    /// Stop with an error after this many cycles (0 = no limit).
    #[arg(long, default_value_t = 0)]
    step_limit: u64,

    /// Print a disassembly of the program instead of running it.
    #[arg(long)]
    disassemble: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let source = match std::fs::read_to_string(&cli.program) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: could not read {}: {e}", cli.program.display());
            exit(1);
        }
    };
    let image = match parse_image(&source) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("error: {e}");
            exit(1);
        }
    };

    if cli.disassemble {
        print!("{}", disassemble(&image));
        return;
    }

    let mut machine = Machine::new();
    if let Err(e) = machine.load(&image) {
        eprintln!("error: {e}");
        exit(1);
    }

    let mut emit = |event: Event| match event {
        Event::Print(value) => println!("{value}"),
        Event::StackEmpty { reg } => eprintln!("stack is empty, POP r{reg} skipped"),
    };

    let mut cycles: u64 = 0;
    loop {
        if cli.trace {
            eprintln!("{}", machine.trace());
        }
        match machine.step(&mut emit) {
            Ok(State::Running) => {}
            Ok(State::Halted) => break,
            Err(e) => {
                eprintln!("fault: {e}");
                exit(1);
            }
        }
        cycles += 1;
        if cli.step_limit != 0 && cycles >= cli.step_limit {
            eprintln!("error: step limit of {} cycles reached", cli.step_limit);
            exit(1);
        }
    }
}
