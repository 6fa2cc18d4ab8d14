use anyhow::Context;
use classifieds_server::{config::Config, routes::build_router, state::AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = Config::from_env()?;
	let state = AppState::from_config(&config).await?;
	log::info!("serving uploaded files from {}", state.files.root().display());
	if !state.payments.merchant().can_create_orders() {
		log::warn!("RAZORPAY_KEY_SECRET not set, boost checkout runs without server-side orders");
	}

	let app = build_router(state, config.max_upload_bytes);
	let listener = TcpListener::bind(&config.bind_addr)
		.await
		.with_context(|| format!("binding {}", config.bind_addr))?;
	log::info!("listening on {}", config.bind_addr);

	axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
	log::info!("server stopped");
	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		log::error!("failed to listen for ctrl-c: {e}");
	}
}
