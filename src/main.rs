fn main() {
    if let Err(err) = parcats_rs::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
