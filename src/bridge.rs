//! 调用桥
//! 以逐行 JSON 替代 webview IPC：stdin 读取请求，stdout 写出响应与时钟事件

use crate::app::AppState;
use crate::commands;
use crate::services::clock_ticks;
use futures::StreamExt;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    #[serde(default)]
    pub id: Option<Value>,
    pub cmd: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Serialize)]
pub struct InvokeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventMessage<T: Serialize> {
    pub event: &'static str,
    pub payload: T,
}

async fn handle_line(state: &AppState, line: &str) -> InvokeResponse {
    let request: InvokeRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!("malformed request: {}", e);
            return InvokeResponse {
                id: None,
                ok: None,
                error: Some(format!("malformed request: {}", e)),
            };
        }
    };

    debug!("invoke {}", request.cmd);
    match commands::invoke(state, &request.cmd, request.args).await {
        Ok(value) => InvokeResponse {
            id: request.id,
            ok: Some(value),
            error: None,
        },
        Err(message) => InvokeResponse {
            id: request.id,
            ok: None,
            error: Some(message),
        },
    }
}

/// 逐行处理请求，直到输入结束
pub async fn serve<R>(state: &AppState, input: R, out: UnboundedSender<String>) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(state, &line).await;
        if out.send(serde_json::to_string(&response)?).is_err() {
            break;
        }
    }

    Ok(())
}

/// 时钟事件，接收端关闭后退出
pub async fn emit_clock(period: Duration, out: UnboundedSender<String>) -> anyhow::Result<()> {
    let ticks = clock_ticks(period);
    futures::pin_mut!(ticks);

    while let Some(tick) = ticks.next().await {
        let message = EventMessage {
            event: "clock",
            payload: tick,
        };
        if out.send(serde_json::to_string(&message)?).is_err() {
            break;
        }
    }

    Ok(())
}

pub async fn write_lines<W>(mut output: W, mut rx: UnboundedReceiver<String>) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use tokio::io::BufReader;
    use tokio::sync::mpsc;

    fn state() -> AppState {
        AppState::in_memory(&AppConfig {
            seed: Some(8),
            ..AppConfig::default()
        })
    }

    async fn run(input: &str) -> Vec<Value> {
        let state = state();
        let (tx, mut rx) = mpsc::unbounded_channel();

        serve(&state, BufReader::new(input.as_bytes()), tx).await.unwrap();

        let mut replies = Vec::new();
        while let Some(line) = rx.recv().await {
            replies.push(serde_json::from_str(&line).unwrap());
        }
        replies
    }

    #[tokio::test]
    async fn test_serve_requests_in_order() {
        let replies = run(concat!(
            r#"{"id":1,"cmd":"lock_schedule","args":{"trialDayCount":3}}"#,
            "\n\n",
            r#"{"id":2,"cmd":"complete_day","args":{"day":2}}"#,
            "\n",
            r#"{"id":3,"cmd":"complete_day","args":{"day":1}}"#,
            "\n",
        ))
        .await;

        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[0]["ok"]["trialDayCount"], 3);
        assert_eq!(replies[1]["id"], 2);
        assert!(replies[1]["error"].as_str().unwrap().contains("Day 2"));
        assert_eq!(replies[2]["ok"]["currentDay"], 2);
    }

    #[tokio::test]
    async fn test_serve_malformed_line() {
        let replies = run("not json\n").await;

        assert_eq!(replies.len(), 1);
        assert!(replies[0]["error"]
            .as_str()
            .unwrap()
            .starts_with("malformed request"));
    }

    #[tokio::test]
    async fn test_emit_clock_stops_when_receiver_closes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(emit_clock(Duration::from_millis(5), tx));

        let first: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(first["event"], "clock");
        assert!(first["payload"]["date"].is_string());

        drop(rx);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_write_lines() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send("{\"ok\":true}".to_string()).unwrap();
        drop(tx);

        let mut output = Vec::new();
        write_lines(&mut output, rx).await.unwrap();
        assert_eq!(output, b"{\"ok\":true}\n");
    }
}
