use std::net::SocketAddr;

use kube::Client;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{config::OperatorConfig, controller::run_controller, web::run_http_server};

pub fn compute_http_addr(cfg: &OperatorConfig) -> SocketAddr {
    ([0, 0, 0, 0], cfg.http_port).into()
}

pub fn spawn_controller(
    client: Client,
    cfg: OperatorConfig,
    shutdown: CancellationToken,
) -> JoinHandle<anyhow::Result<()>> {
    tokio::spawn(async move { run_controller(client, cfg, shutdown).await })
}

pub fn spawn_http(
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> JoinHandle<anyhow::Result<()>> {
    tokio::spawn(async move { run_http_server(addr, shutdown).await })
}

/// Cancels `shutdown` on SIGINT or SIGTERM.
pub fn spawn_signal_listener(shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown signal received");
        shutdown.cancel();
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for SIGTERM; using ctrl-c only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Starts the controller and the health server and waits until both stop.
pub async fn run_all(client: Client, cfg: OperatorConfig) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let http_addr = compute_http_addr(&cfg);

    let _signals = spawn_signal_listener(shutdown.clone());
    let controller = spawn_controller(client, cfg, shutdown.clone());
    let http = spawn_http(http_addr, shutdown.clone());

    // Either side stopping takes the other down with it.
    let (c_res, h_res) = tokio::join!(
        async {
            let res = controller.await;
            shutdown.cancel();
            res
        },
        async {
            let res = http.await;
            shutdown.cancel();
            res
        },
    );
    c_res??;
    h_res??;
    info!("operator stopped");
    Ok(())
}
