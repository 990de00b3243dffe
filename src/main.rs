fn main() {
    if let Err(err) = trend_reconcile_lib::run() {
        eprintln!("trend_reconcile failed: {err:#}");
        std::process::exit(1);
    }
}
