fn main() {
    if let Err(err) = lamport::cli::run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
