//! # Console Host
//!
//! Stands in for the browser: an in-memory history, an in-memory mount point
//! and a line-based command loop.
//!
//! ## Commands
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  go <path>                 navigate (push)                              │
//! │  click <href>              anchor click, same filtering as a browser    │
//! │  back / forward            history moves, resolved via pop-state        │
//! │  submit k=v [k=v ...]      "submit" event on the document               │
//! │  do <action> [args ...]    "action" event on the document               │
//! │  state                     state snapshot as JSON                       │
//! │  log                       navigation log                               │
//! │  help                                                                   │
//! │  quit                                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use till_core::RecordingChrome;
use till_router::{LinkClick, MemoryHistory, NavigateOptions, Router};
use till_store::{MemoryStorage, SqliteStorage, StateManager, Storage};
use till_view::{ApiClient, MemoryMount, MountPoint, NotificationCenter};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::api::HttpApiClient;
use crate::app::App;
use crate::config::{ShellConfig, StorageBackend};
use crate::context::{AppContext, ACTION_EVENT, SUBMIT_EVENT};
use crate::error::{ShellError, ShellResult};

/// How long `back`/`forward` wait for the pop-state resolution.
const POP_WAIT: Duration = Duration::from_millis(500);

const HELP: &str = "commands: go <path> | click <href> | back | forward | \
submit k=v ... | do <action> [args] | state | log | help | quit";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Go(String),
    Click(String),
    Back,
    Forward,
    Submit(Map<String, Value>),
    Do { name: String, args: Vec<String> },
    State,
    Log,
    Help,
    Quit,
}

/// Parses one line. Blank lines are `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (verb, rest.as_slice()) {
        ("go", [path]) => Command::Go(path.to_string()),
        ("click", [href]) => Command::Click(href.to_string()),
        ("back", []) => Command::Back,
        ("forward", []) => Command::Forward,
        ("submit", fields) => {
            let mut form = Map::new();
            for field in fields {
                let (key, value) = field
                    .split_once('=')
                    .ok_or_else(|| format!("expected key=value, got '{field}'"))?;
                form.insert(key.to_string(), Value::String(value.to_string()));
            }
            Command::Submit(form)
        }
        ("do", [name, args @ ..]) => Command::Do {
            name: name.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        },
        ("state", []) => Command::State,
        ("log", []) => Command::Log,
        ("help", _) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        ("go" | "click", _) => return Err(format!("usage: {verb} <path>")),
        _ => return Err(format!("unknown command '{line}', try 'help'")),
    };
    Ok(Some(command))
}

/// Console host around an [`App`].
pub struct ConsoleHost {
    app: App,
    history: Arc<MemoryHistory>,
    mount: Arc<MemoryMount>,
    chrome: Arc<RecordingChrome>,
    center: Arc<NotificationCenter>,
}

impl ConsoleHost {
    /// Builds storage, state, API client, router and app from `config`.
    pub fn from_config(config: &ShellConfig) -> ShellResult<Self> {
        let storage: Arc<dyn Storage> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
            StorageBackend::Sqlite => {
                let path = config.storage.resolved_path().ok_or_else(|| {
                    ShellError::InvalidConfig("No storage path available".into())
                })?;
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                info!(?path, "Opening state storage");
                Arc::new(SqliteStorage::open(&path)?)
            }
        };
        let state = Arc::new(StateManager::new(config.storage.store.clone(), storage));
        let api: Arc<dyn ApiClient> = Arc::new(HttpApiClient::new(&config.api, state.clone())?);
        Self::build(config, state, api)
    }

    /// Builds the host around an existing state manager and API client.
    pub fn build(config: &ShellConfig, state: Arc<StateManager>, api: Arc<dyn ApiClient>) -> ShellResult<Self> {
        let history = Arc::new(MemoryHistory::new("/"));
        let mount = Arc::new(MemoryMount::new());
        let chrome = Arc::new(RecordingChrome::new());
        let center = Arc::new(NotificationCenter::new(config.notification_config()));

        let router = Router::with_config(config.router_config()?, history.clone(), chrome.clone());
        let ctx = AppContext::new(state, router, center.clone(), api, chrome.clone(), mount.clone());
        let app = App::new(ctx)?;

        Ok(ConsoleHost {
            app,
            history,
            mount,
            chrome,
            center,
        })
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Resolves the initial location.
    pub async fn start(&self) -> String {
        self.app.router().start().await;
        self.app.context().settle().await;
        self.screen()
    }

    /// Runs one command. `None` means quit.
    pub async fn execute(&self, command: Command) -> Option<String> {
        let ctx = self.app.context();
        match command {
            Command::Go(path) => {
                let outcome = self.app.router().navigate(&path, NavigateOptions::default()).await;
                debug!(?outcome, "Navigation finished");
            }
            Command::Click(href) => {
                if !self.app.router().handle_link_click(&LinkClick::new(href.clone())).await {
                    return Some(format!("(leaving the app for {href})"));
                }
            }
            Command::Back => {
                if !self.pop(|router| router.back()).await {
                    return Some("(no history entry)".to_string());
                }
            }
            Command::Forward => {
                if !self.pop(|router| router.forward()).await {
                    return Some("(no history entry)".to_string());
                }
            }
            Command::Submit(form) => {
                ctx.document.dispatch(SUBMIT_EVENT, &Value::Object(form));
            }
            Command::Do { name, args } => {
                let payload = serde_json::json!({ "name": name, "args": args });
                if ctx.document.dispatch(ACTION_EVENT, &payload) == 0 {
                    return Some(format!("(nothing handles '{name}' here)"));
                }
            }
            Command::State => {
                let snapshot = ctx.state.snapshot();
                return Some(serde_json::to_string_pretty(&snapshot).unwrap_or_default());
            }
            Command::Log => {
                let log = self.app.router().navigation_log();
                return Some(
                    log.iter()
                        .map(|entry| format!("{}  {}", entry.at.format("%H:%M:%S"), entry.path))
                        .collect::<Vec<_>>()
                        .join("\n"),
                );
            }
            Command::Help => return Some(HELP.to_string()),
            Command::Quit => return None,
        }
        ctx.settle().await;
        Some(self.screen())
    }

    /// Moves through history and waits for the pop-state resolution.
    async fn pop(&self, step: impl FnOnce(&Router) -> bool) -> bool {
        let mut changes = self.app.router().subscribe();
        if !step(self.app.router()) {
            return false;
        }
        // blocked pops never broadcast
        let _ = tokio::time::timeout(POP_WAIT, changes.recv()).await;
        true
    }

    /// Title, location, mount content and visible toasts.
    pub fn screen(&self) -> String {
        let mut out = format!(
            "== {} [{}] ==\n{}\n",
            self.chrome.title(),
            self.history.current().path,
            self.mount.content()
        );
        for (field, error) in self.mount.field_errors() {
            out.push_str(&format!("  ! {field}: {error}\n"));
        }
        for toast in self.center.visible() {
            out.push_str(&format!("[{}] {}\n", toast.level.as_str(), toast.message));
        }
        out
    }

    /// Reads commands from `input` until `quit` or end of input.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> ShellResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let screen = self.start().await;
        output.write_all(screen.as_bytes()).await?;
        output.write_all(format!("{HELP}\n> ").as_bytes()).await?;
        output.flush().await?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let reply = match parse_command(&line) {
                Ok(None) => String::new(),
                Ok(Some(command)) => match self.execute(command).await {
                    Some(reply) => reply,
                    None => break,
                },
                Err(message) => message,
            };
            if !reply.is_empty() {
                output.write_all(reply.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
            output.write_all(b"> ").await?;
            output.flush().await?;
        }

        self.app.shutdown();
        info!("Console host stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use till_view::{MemoryApi, Method};

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("go /pos").unwrap(), Some(Command::Go("/pos".into())));
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(parse_command("back").unwrap(), Some(Command::Back));
        assert_eq!(
            parse_command("do add COKE").unwrap(),
            Some(Command::Do {
                name: "add".into(),
                args: vec!["COKE".into()]
            })
        );

        let Some(Command::Submit(form)) = parse_command("submit username=amina password=pw=1").unwrap() else {
            panic!("expected submit");
        };
        assert_eq!(form["username"], json!("amina"));
        assert_eq!(form["password"], json!("pw=1"));

        assert!(parse_command("submit username").is_err());
        assert!(parse_command("go").is_err());
        assert!(parse_command("dance").is_err());
    }

    fn host() -> (ConsoleHost, Arc<MemoryApi>) {
        let api = Arc::new(MemoryApi::new());
        api.respond(
            Method::Post,
            "/auth/login",
            Ok(json!({"token": "t-9", "user": {"name": "Bilal"}})),
        );
        api.respond(Method::Get, "/sales/summary", Ok(json!({"sales_count": 1, "revenue_cents": 99})));
        let host = ConsoleHost::build(
            &ShellConfig::default(),
            Arc::new(StateManager::in_memory()),
            api.clone(),
        )
        .unwrap();
        (host, api)
    }

    #[tokio::test]
    async fn test_session_in_the_console() {
        let (host, _api) = host();
        let screen = host.start().await;
        assert!(screen.contains("[/login]"));

        let screen = host
            .execute(parse_command("submit username=bilal password=secret").unwrap().unwrap())
            .await
            .unwrap();
        assert!(screen.contains("== Dashboard [/] =="));
        assert!(screen.contains("0.99"));
        assert!(screen.contains("[success] Welcome, Bilal"));

        let reply = host.execute(Command::Do { name: "dance".into(), args: vec![] }).await.unwrap();
        assert!(reply.contains("nothing handles"));

        let state = host.execute(Command::State).await.unwrap();
        assert!(state.contains("t-9"));

        assert_eq!(host.execute(Command::Quit).await, None);
    }

    #[tokio::test]
    async fn test_run_loop_reads_until_quit() {
        let (host, _api) = host();
        let input: &[u8] = b"help\ngo /nowhere\nquit\ngo /\n";
        let mut output = Vec::new();

        host.run(input, &mut output).await.unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("commands:"));
        assert!(output.contains("Page not found: /nowhere"));
        assert!(!output.contains("Dashboard"));
    }
}
