//! Chess relay server.
//!
//! Environment:
//!
//! - `GAMBIT_BIND`: full listen address; overrides `PORT`
//! - `PORT`: port on `0.0.0.0` (default `3000`)
//! - `GAMBIT_IDLE_TIMEOUT_SECS`: close connections silent for this long
//! - `GAMBIT_NOTIFY_REJECTIONS`: `1`/`true` to tell players why a move was dropped
//! - `RUST_LOG`: log filter (default `info`)
//!
//! Any of these may also be set in a `.env` file in the working directory.
//! Variables already in the environment take precedence.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use gambit::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 3000;

/// Builds the server configuration from environment lookups.
fn config_from(lookup: impl Fn(&str) -> Option<String>) -> ServerConfig {
    let bind_addr = match lookup("GAMBIT_BIND") {
        Some(addr) if !addr.trim().is_empty() => addr.trim().to_string(),
        _ => {
            let port = lookup("PORT")
                .and_then(|p| p.trim().parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT);
            format!("0.0.0.0:{port}")
        }
    };

    let idle_timeout = lookup("GAMBIT_IDLE_TIMEOUT_SECS")
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);

    let notify = lookup("GAMBIT_NOTIFY_REJECTIONS")
        .is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes"));

    ServerConfig {
        bind_addr,
        idle_timeout,
        session: SessionConfig::default().with_rejection_notices(notify),
        ..ServerConfig::default()
    }
}

/// Reads `KEY=value` pairs from a dotenv file. A missing file is empty.
fn read_env_file(path: &Path) -> Result<HashMap<String, String>, dotenvy::Error> {
    match dotenvy::from_path_iter(path) {
        Ok(pairs) => pairs.collect(),
        Err(e) if e.not_found() => Ok(HashMap::new()),
        Err(e) => Err(e),
    }
}

/// Looks a key up in `primary` first, then in the dotenv file's pairs.
fn layered<'a>(
    primary: impl Fn(&str) -> Option<String> + 'a,
    file: &'a HashMap<String, String>,
) -> impl Fn(&str) -> Option<String> + 'a {
    move |key| primary(key).or_else(|| file.get(key).cloned())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_file = read_env_file(Path::new(".env"));
    let file_vars = env_file.as_ref().cloned().unwrap_or_default();
    let lookup = layered(|key: &str| std::env::var(key).ok(), &file_vars);

    let filter = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match &env_file {
        Ok(vars) if !vars.is_empty() => tracing::info!(vars = vars.len(), "loaded .env"),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
    }

    let config = config_from(&lookup);
    tracing::info!(
        bind = %config.bind_addr,
        idle_timeout = ?config.idle_timeout,
        notify_rejections = config.session.notify_rejections,
        "starting chess relay"
    );

    let server = GambitServerBuilder::with_config(config)
        .build::<Chess>()
        .await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    tracing::info!("chess relay stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use std::collections::HashMap;
    use tokio_tungstenite::tungstenite::Message;

    type Ws = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults_to_port_3000() {
        let config = config_from(env(&[]));
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert!(config.idle_timeout.is_none());
        assert!(!config.session.notify_rejections);
    }

    #[test]
    fn test_config_reads_port() {
        let config = config_from(env(&[("PORT", "8080")]));
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_config_bind_overrides_port() {
        let config = config_from(env(&[("PORT", "8080"), ("GAMBIT_BIND", "127.0.0.1:9000")]));
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
    }

    #[test]
    fn test_config_ignores_bad_port() {
        let config = config_from(env(&[("PORT", "eighty")]));
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_config_optional_settings() {
        let config = config_from(env(&[
            ("GAMBIT_IDLE_TIMEOUT_SECS", "30"),
            ("GAMBIT_NOTIFY_REJECTIONS", "true"),
        ]));
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(30)));
        assert!(config.session.notify_rejections);
    }

    #[test]
    fn test_env_file_fills_in_unset_variables() {
        let path = std::env::temp_dir().join(format!("chess-relay-{}.env", std::process::id()));
        std::fs::write(&path, "PORT=4100\nGAMBIT_NOTIFY_REJECTIONS=1\n").unwrap();
        let file = read_env_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let config = config_from(layered(env(&[("PORT", "5000")]), &file));
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert!(config.session.notify_rejections);

        let config = config_from(layered(env(&[]), &file));
        assert_eq!(config.bind_addr, "0.0.0.0:4100");
    }

    #[test]
    fn test_missing_env_file_is_empty() {
        let file = read_env_file(Path::new("/nonexistent/chess-relay/.env")).unwrap();
        assert!(file.is_empty());
    }

    async fn start() -> String {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".into(),
            ..ServerConfig::default()
        };
        let server = GambitServerBuilder::with_config(config)
            .build::<Chess>()
            .await
            .unwrap();
        let addr = server.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let _ = server.run().await;
        });
        addr
    }

    async fn ws(addr: &str) -> Ws {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        ws
    }

    async fn emit(ws: &mut Ws, event: serde_json::Value) {
        ws.send(Message::Text(event.to_string().into())).await.unwrap();
    }

    async fn next(ws: &mut Ws) -> serde_json::Value {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        serde_json::from_slice(&msg.into_data()).unwrap()
    }

    async fn skip(ws: &mut Ws, n: usize) {
        for _ in 0..n {
            next(ws).await;
        }
    }

    async fn play(mover: &mut Ws, other: &mut Ws, from: &str, to: &str) -> serde_json::Value {
        emit(mover, json!({"event": "move", "data": {"from": from, "to": to, "promotion": "q"}})).await;
        skip(mover, 2).await;
        skip(other, 1).await;
        next(other).await
    }

    #[tokio::test]
    async fn test_full_game_over_the_wire() {
        let addr = start().await;
        let mut alice = ws(&addr).await;
        let mut bob = ws(&addr).await;

        emit(&mut alice, json!({"event": "joinRoom", "data": {"roomId": "demo", "playerName": "Alice"}})).await;
        assert_eq!(next(&mut alice).await, json!({"event": "playerRole", "data": "w"}));
        skip(&mut alice, 3).await;

        emit(&mut bob, json!({"event": "joinRoom", "data": {"roomId": "demo", "playerName": "Bob"}})).await;
        assert_eq!(next(&mut bob).await, json!({"event": "playerRole", "data": "b"}));
        skip(&mut bob, 2).await;
        let roster = json!({"event": "playerNames", "data": {"white": "Alice", "black": "Bob"}});
        assert_eq!(next(&mut bob).await, roster);
        assert_eq!(next(&mut alice).await, roster);

        // A pawn race ending in a promotion: 1. h4 g5 2. hxg5 Nf6 3. gxf6 a6 4. fxe7 a5 5. exd8=Q+
        play(&mut alice, &mut bob, "h2", "h4").await;
        play(&mut bob, &mut alice, "g7", "g5").await;
        play(&mut alice, &mut bob, "h4", "g5").await;
        play(&mut bob, &mut alice, "g8", "f6").await;
        play(&mut alice, &mut bob, "g5", "f6").await;
        play(&mut bob, &mut alice, "a7", "a6").await;
        play(&mut alice, &mut bob, "f6", "e7").await;
        play(&mut bob, &mut alice, "a6", "a5").await;
        let history = play(&mut alice, &mut bob, "e7", "d8").await;

        assert_eq!(
            history,
            json!({
                "event": "moveHistory",
                "data": ["h4", "g5", "hxg5", "Nf6", "gxf6", "a6", "fxe7", "a5", "exd8=Q+"]
            })
        );
    }
}
