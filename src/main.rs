use anyhow::Result;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Duration;

use livedash::dashboard::Dashboard;
use livedash::logging::{log, obj, v_str, Domain, Level};
use livedash::render::TerminalPresenter;
use livedash::session::{run_session, Command};
use livedash::state::Config;

/// Forward stdin lines as commands until EOF or `quit`.
async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match Command::parse(&line) {
                    Some(cmd) => {
                        let quit = cmd == Command::Quit;
                        if tx.send(cmd).await.is_err() || quit {
                            return;
                        }
                    }
                    None => log(
                        Level::Warn,
                        Domain::Command,
                        "unknown_command",
                        obj(&[("msg", v_str(line.trim()))]),
                    ),
                }
            }
            Ok(None) => return,
            Err(err) => {
                log(
                    Level::Error,
                    Domain::System,
                    "stdin_failed",
                    obj(&[("msg", v_str(&err.to_string()))]),
                );
                return;
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("days", json!(cfg.days)),
            ("tick_ms", json!(cfg.tick_ms)),
            ("seed", json!(cfg.seed)),
            ("live", json!(!cfg.start_paused)),
        ]),
    );

    let mut dash = Dashboard::from_config(&cfg)?;
    let mut presenter = TerminalPresenter::new(std::io::stdout());
    let (tx, mut rx) = mpsc::channel(32);
    tokio::spawn(read_commands(tx));

    let summary = run_session(
        &mut dash,
        &mut presenter,
        &mut rx,
        Duration::from_millis(cfg.tick_ms),
    )
    .await;

    eprintln!(
        "[livedash] done: ticks={} commands={} exports={} errors={}",
        summary.ticks, summary.commands, summary.exports, summary.errors
    );
    Ok(())
}
