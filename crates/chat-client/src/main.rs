//! Terminal chat client
//!
//! Run with:
//! ```bash
//! CHAT_EMAIL=me@example.com CHAT_PASSWORD=secret cargo run -p chat-client
//! ```
//!
//! Lines typed on stdin are sent as chat messages. Commands: `/typing`,
//! `/retry`, `/robots`, `/toggle <id>`, `/quit`.

use anyhow::Context;
use chat_api::ApiClient;
use chat_client::{ChatSession, ConnectionState, TransportFactory, WsTransportFactory};
use chat_common::{
    try_init_tracing_with_config, ClientConfig, MemoryCredentialStore, TracingConfig,
};
use chat_core::{is_robot_action_message, CredentialStore, AUTH_TOKEN_KEY};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

type Api = ApiClient<MemoryCredentialStore>;

#[tokio::main]
async fn main() {
    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "Chat client failed");
        std::process::exit(1);
    }
}

async fn run(config: ClientConfig) -> anyhow::Result<()> {
    info!(
        app = %config.app.name,
        env = ?config.app.env,
        server = config.server.http_base(),
        "Starting chat client..."
    );

    let credentials = MemoryCredentialStore::new();
    let api = ApiClient::from_config(&config, credentials.clone()).context("Failed to build API client")?;

    if let Some(token) = &config.credentials.token {
        credentials.set(AUTH_TOKEN_KEY, token.clone());
    } else if let Some((email, password)) = config.credentials.login() {
        api.login(email, password).await.context("Login failed")?;
    }

    let factory = WsTransportFactory::new(config.server.ws_url());
    let mut session = ChatSession::with_config(factory, credentials, &config.session);

    // Robot roster refreshes need the API, which is async
    let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel();
    install_handlers(&mut session, refresh_tx);

    session.connect().context("Could not connect")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let before = session.state();

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if !handle_line(&mut session, &api, line.trim()).await {
                    break;
                }
            }
            Some(()) = refresh_rx.recv() => print_robots(&api).await,
            _ = session.run_once(), if !session.is_idle() => {}
        }

        let after = session.state();
        if after == ConnectionState::Disconnected && before != after && session.retry_connection().is_err() {
            println!("* could not reconnect, giving up");
            break;
        }
    }

    let _ = session.disconnect();
    info!("Chat client stopped");
    Ok(())
}

fn install_handlers<F: TransportFactory>(
    session: &mut ChatSession<F, MemoryCredentialStore>,
    refresh: mpsc::UnboundedSender<()>,
) {
    session.on_message(|payload| {
        if let Some(error) = &payload.error {
            println!("! {error}");
        } else if let Some(message) = &payload.message {
            if is_robot_action_message(message) {
                println!("* {message}");
            } else {
                println!("{message}");
            }
        }
    });

    session.on_presence(|users, lurkers| {
        println!("* online: {} (+{lurkers} lurking)", users.join(", "));
    });

    session.on_agent_list(move || {
        let _ = refresh.send(());
    });

    session.on_typing(|human, agent| match (human, agent) {
        (false, false) => {}
        (true, false) => println!("* someone is typing..."),
        (false, true) => println!("* a robot is typing..."),
        (true, true) => println!("* someone and a robot are typing..."),
    });
}

/// Handle one line of input; returns `false` to quit
async fn handle_line<F: TransportFactory>(
    session: &mut ChatSession<F, MemoryCredentialStore>,
    api: &Api,
    line: &str,
) -> bool {
    let mut parts = line.split_whitespace();

    match parts.next() {
        None => {}
        Some("/quit") => return false,
        Some("/typing") => {
            session.notify_local_input();
        }
        Some("/retry") => {
            if let Err(e) = session.retry_send_message() {
                println!("! {e}");
            }
        }
        Some("/robots") => print_robots(api).await,
        Some("/toggle") => match parts.next().map(str::parse::<i64>) {
            Some(Ok(id)) => match api.toggle_robo_chatter(id).await {
                Ok(robot) => {
                    println!("* {} is now {}", robot.name, if robot.enabled { "on" } else { "off" });
                    if let Err(e) = session.announce_robot_toggle(robot.enabled) {
                        println!("! {e}");
                    }
                }
                Err(e) => println!("! {e}"),
            },
            _ => println!("! usage: /toggle <id>"),
        },
        Some(_) => {
            if let Err(e) = session.send_message(line) {
                println!("! {e}");
            }
        }
    }

    true
}

async fn print_robots(api: &Api) {
    match api.robo_chatters().await {
        Ok(robots) => {
            for robot in robots {
                let status = if robot.enabled { "on" } else { "off" };
                println!("* [{}] {} ({status})", robot.id, robot.name);
            }
        }
        Err(e) => println!("! could not fetch robots: {e}"),
    }
}
