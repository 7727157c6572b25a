fn main() {
    if let Err(err) = healthguard_lib::run() {
        eprintln!("healthguard: {err:#}");
        std::process::exit(1);
    }
}
