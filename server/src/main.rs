use anyhow::Context;
use tokio::net::TcpListener;
use todo_server::{AppState, Config};
use todo_store::TodoStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    let store = TodoStore::new(config.store.clone());
    store
        .initialize()
        .with_context(|| format!("opening database {}", config.store.path.display()))?;

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    log::info!("{} {} listening on {addr}", config.app_name, config.app_version);

    let state = AppState::new(store, &config)?;
    todo_server::run(listener, state, &config).await?;
    Ok(())
}
