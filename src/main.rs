//! serviceloop CLI binary
//!
//! All logic is in the library; main.rs only invokes `cli::run()`.

fn main() {
    // cli::run() prints its own errors; main only maps to the process exit code
    if let Err(code) = serviceloop::cli::run() {
        std::process::exit(code.as_i32());
    }
}
