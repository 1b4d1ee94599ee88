use tracing_subscriber::EnvFilter;

fn main() {
    // INFO by default, RUST_LOG overrides
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = customer_etl::cli::run() {
        eprintln!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}
