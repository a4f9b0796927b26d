fn main() {
    if let Err(err) = lecturas::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
