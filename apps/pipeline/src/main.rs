// [apps/pipeline/src/main.rs]
use snapforge_pipeline::{routes, state::AppState};
use tracing::info;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    snapforge_telemetry::init_tracing("snapforge_pipeline");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime.block_on(async {
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(3000);

        let state = AppState::from_env()?;
        let router = routes::build_router(state);

        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
        info!(port, "snapforge pipeline listening");
        axum::serve(listener, router).await?;

        Ok::<(), anyhow::Error>(())
    })
}
