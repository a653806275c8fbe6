use inventory_count_lib::log_error;

const ENABLE_LOGS: bool = true;

fn main() {
    if let Err(err) = inventory_count_lib::run() {
        log_error!("{err:#}");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
