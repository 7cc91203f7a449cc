fn main() {
    if let Err(err) = tienda_analytics::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
