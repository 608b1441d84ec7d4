//! Yellows server and admin CLI
//!
//! Run with: cargo run -- serve
//! Or after build: ./target/release/yellows serve

#[tokio::main]
async fn main() {
    // Load .env as early as possible so config secret references resolve
    let _ = dotenvy::dotenv();

    // Initialize logging
    yellows::init_logging();

    if let Err(e) = yellows::cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
