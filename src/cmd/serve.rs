//! HTTP server command: `showcase serve`.

use std::time::Duration;

use anyhow::Result;
use showcase::config::Workspace;
use showcase::server::{ServerConfig, build_state, start_server};

pub async fn cmd_serve(workspace: &Workspace, port: Option<u16>, dev: bool) -> Result<()> {
    let (config, _) = super::load_config(workspace)?;
    let state = build_state(&config, workspace.clone())?;

    start_server(
        state,
        ServerConfig {
            port: port.unwrap_or(config.server.port),
            dev_mode: dev,
        },
        Duration::from_secs(config.server.sweep_interval_secs),
    )
    .await
}
