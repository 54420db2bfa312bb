use eduzip_core::AppConfig;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{ProxyError, ProxyState, router};

/// Run the proxy on `bind` (or the configured address) until Ctrl-C.
pub async fn serve(config: &AppConfig, bind: Option<&str>) -> Result<(), ProxyError> {
    let addr = bind.unwrap_or(config.proxy.bind.as_str()).to_string();
    let state = ProxyState::new(&config.upstage)?;
    if config.upstage.api_key.trim().is_empty() {
        warn!("no API key configured; every forwarded request will fail");
    }

    let app = router(state, &config.proxy.path);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ProxyError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!(addr = %addr, path = %config.proxy.path, "credential proxy listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down credential proxy");
        })
        .await?;
    Ok(())
}
