use std::process;

fn main() {
    if let Err(e) = relay_enforce::cli::run_with_args(std::env::args_os()) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
