fn main() {
    if let Err(err) = xlsx_consolidate::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
