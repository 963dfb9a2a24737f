//! Process lifecycle (component L): both listeners run in background
//! tasks; the foreground waits for an OS termination signal or a listener
//! failing outright, then drains whichever listeners are still running
//! within a bounded timeout.

use crate::state::AppState;
use anyhow::{bail, Context, Result};
use tokio::net::TcpListener;
use tokio::signal;

pub async fn serve(state: AppState) -> Result<()> {
    let main_listener = TcpListener::bind(state.settings.listen)
        .await
        .with_context(|| format!("failed to bind LISTEN at {}", state.settings.listen))?;
    let management_listener = TcpListener::bind(state.settings.management_listen)
        .await
        .with_context(|| format!("failed to bind MANAGEMENT_LISTEN at {}", state.settings.management_listen))?;

    tracing::info!(addr = %state.settings.listen, "main listener bound");
    tracing::info!(addr = %state.settings.management_listen, "management listener bound");

    let shutdown_timeout = state.settings.shutdown_timeout;
    let (main_tx, main_rx) = tokio::sync::oneshot::channel::<()>();
    let (management_tx, management_rx) = tokio::sync::oneshot::channel::<()>();

    let mut main_task = tokio::spawn(
        axum::serve(main_listener, crate::http::main_router(state.clone()))
            .with_graceful_shutdown(async move {
                let _ = main_rx.await;
            }),
    );
    let mut management_task = tokio::spawn(
        axum::serve(management_listener, crate::http::management_router(state.clone()))
            .with_graceful_shutdown(async move {
                let _ = management_rx.await;
            }),
    );

    tokio::select! {
        () = termination_signal() => {
            tracing::info!("termination signal received, draining listeners");
            let _ = main_tx.send(());
            let _ = management_tx.send(());
        }
        result = &mut main_task => {
            result.context("main listener task panicked")?.context("main listener failed")?;
            bail!("main listener exited before a shutdown signal was received");
        }
        result = &mut management_task => {
            result.context("management listener task panicked")?.context("management listener failed")?;
            bail!("management listener exited before a shutdown signal was received");
        }
    }

    let drained = tokio::time::timeout(shutdown_timeout, async {
        let _ = tokio::join!(&mut main_task, &mut management_task);
    })
    .await;

    if drained.is_err() {
        tracing::warn!(?shutdown_timeout, "listeners did not finish draining before the shutdown timeout");
    }

    Ok(())
}

async fn termination_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(err) => {
                tracing::error!(%err, "failed to install ctrl-c handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to install sigterm handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
