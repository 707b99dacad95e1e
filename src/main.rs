fn main() {
    if let Err(err) = enrollment_insight::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
