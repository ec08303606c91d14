use checkers_arena::web::run_server;
use checkers_arena::{Board, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Checkers Arena");
    println!("==============\n");
    println!("{}", Board::standard());

    let config = ServerConfig::from_env();
    println!("Serving on http://{}", config.bind_addr);

    run_server(config).await?;

    Ok(())
}
