#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = diagonal_demo::run_from_env() {
        eprintln!("diagonal: {error}");
        std::process::exit(error.exit_code());
    }
}
