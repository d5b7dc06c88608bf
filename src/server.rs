//! TCP listeners for the settings client and the kernel hook.
//!
//! Both speak line-delimited JSON: one request per line, one response line
//! per request. The client listener edits the policy and persists it after
//! each successful change; the kernel listener only reads.

use parking_lot::Mutex;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::error::Result;
use crate::guard::Guard;
use crate::protocol::{handle_client_line, handle_kernel_line};
use crate::remote::RemoteListManager;

/// How often the updater asks the list manager whether an update is due.
pub const UPDATE_CHECK_PERIOD: Duration = Duration::from_secs(3600);

/// Accept settings-client connections until the listener fails.
///
/// With `policy_path`, the policy is saved after every successful mutation.
pub async fn serve_client(listener: TcpListener, guard: Guard, policy_path: Option<PathBuf>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                log::debug!("Client connected: {}", peer);
                let guard = guard.clone();
                let policy_path = policy_path.clone();
                tokio::spawn(async move {
                    if let Err(e) = client_connection(stream, guard, policy_path).await {
                        log::warn!("Client {} disconnected: {}", peer, e);
                    }
                });
            }
            Err(e) => {
                log::error!("Client accept failed: {}", e);
                return;
            }
        }
    }
}

/// Accept kernel-hook connections until the listener fails.
pub async fn serve_kernel(listener: TcpListener, guard: Guard) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                log::debug!("Kernel hook connected: {}", peer);
                let guard = guard.clone();
                tokio::spawn(async move {
                    if let Err(e) = kernel_connection(stream, guard).await {
                        log::warn!("Kernel hook {} disconnected: {}", peer, e);
                    }
                });
            }
            Err(e) => {
                log::error!("Kernel accept failed: {}", e);
                return;
            }
        }
    }
}

async fn client_connection(
    stream: TcpStream,
    guard: Guard,
    policy_path: Option<PathBuf>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let (response, command) = handle_client_line(&guard, &line);

        let changed = response.is_success() && command.is_some_and(|c| c.is_mutation());
        if changed {
            if let Some(path) = policy_path.clone() {
                let policy = guard.policy().clone();
                let saved = tokio::task::spawn_blocking(move || policy.save(&path)).await;
                match saved {
                    Ok(Err(e)) => log::error!("Failed to save policy: {}", e),
                    Err(e) => log::error!("Policy save task failed: {}", e),
                    Ok(Ok(())) => {}
                }
            }
        }

        write_json_line(&mut writer, &response).await?;
    }
    Ok(())
}

async fn kernel_connection(stream: TcpStream, guard: Guard) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_kernel_line(&guard, &line);
        write_json_line(&mut writer, &response).await?;
    }
    Ok(())
}

async fn write_json_line<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize,
{
    let mut buf = serde_json::to_vec(value)?;
    buf.push(b'\n');
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Load the list, then keep it current.
///
/// Runs `init` once and afterwards calls `update_if_needed` every `period`.
/// Both run on the blocking pool. Failures are logged and the rules that
/// were active stay active.
pub async fn run_updater(manager: Arc<Mutex<RemoteListManager>>, period: Duration) {
    let first = manager.clone();
    match tokio::task::spawn_blocking(move || first.lock().init()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::warn!("Initial filter list load failed: {}", e),
        Err(e) => log::error!("Filter list task failed: {}", e),
    }

    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;
        let manager = manager.clone();
        match tokio::task::spawn_blocking(move || manager.lock().update_if_needed()).await {
            Ok(Ok(true)) => log::info!("Filter list updated"),
            Ok(Ok(false)) => log::debug!("Filter list is current"),
            Ok(Err(e)) => log::warn!("Filter list update failed, keeping current rules: {}", e),
            Err(e) => log::error!("Filter list task failed: {}", e),
        }
    }
}

/// Serve both listeners and the updater until `shutdown` completes.
pub async fn run<F>(
    client: TcpListener,
    kernel: TcpListener,
    guard: Guard,
    policy_path: Option<PathBuf>,
    manager: Option<Arc<Mutex<RemoteListManager>>>,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    if let Ok(addr) = client.local_addr() {
        log::info!("Client listener on {}", addr);
    }
    if let Ok(addr) = kernel.local_addr() {
        log::info!("Kernel listener on {}", addr);
    }

    let client_task = tokio::spawn(serve_client(client, guard.clone(), policy_path));
    let kernel_task = tokio::spawn(serve_kernel(kernel, guard));
    let updater_task =
        manager.map(|manager| tokio::spawn(run_updater(manager, UPDATE_CHECK_PERIOD)));

    shutdown.await;
    log::info!("Shutting down");

    client_task.abort();
    kernel_task.abort();
    if let Some(task) = updater_task {
        task.abort();
    }
}
