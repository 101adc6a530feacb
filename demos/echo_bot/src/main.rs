//! Echo Bot Demo
//!
//! A console bot that runs every line typed on stdin through the full Nidda
//! pipeline: parsing, sessions, the context cache and nested routers.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-bot -- --author 7 --guild g1
//! ```
//!
//! Then type messages such as `!ping`, `!echo hello`, `!roll --max=20`,
//! `!count`, `!admin whois` or `<@1000> hi`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use nidda::core::{Channel, Member};
use nidda::prelude::*;
use nidda::runtime::config::{ConfigLoader, load_config_from_file};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const BOT_ID: &str = "1000";

#[derive(Debug, Parser)]
#[command(about = "Console echo bot for the Nidda middleware")]
struct Args {
    /// User id the typed messages are sent as.
    #[arg(long, default_value = "7")]
    author: String,

    /// Guild id; omit to chat in a direct message.
    #[arg(long)]
    guild: Option<String>,

    /// Configuration file (defaults to ./nidda.toml when present).
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

// ============================================================================
// Console platform
// ============================================================================

#[derive(Debug)]
struct ConsoleMessage {
    id: String,
    content: String,
    author: String,
    guild: Option<GuildRef>,
}

#[async_trait]
impl IncomingMessage for ConsoleMessage {
    fn id(&self) -> &str {
        &self.id
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn author_id(&self) -> &str {
        &self.author
    }

    fn channel_id(&self) -> &str {
        "console"
    }

    fn channel_kind(&self) -> ChannelKind {
        if self.guild.is_some() {
            ChannelKind::Guild
        } else {
            ChannelKind::Private
        }
    }

    fn guild(&self) -> Option<&GuildRef> {
        self.guild.as_ref()
    }

    async fn reply(&self, text: &str) -> BotResult<()> {
        println!("bot> {text}");
        Ok(())
    }

    async fn send_to_channel(&self, payload: Payload) -> BotResult<()> {
        if let Some(text) = &payload.content {
            println!("bot> {text}");
        }
        for embed in &payload.embeds {
            println!("bot> [embed] {embed}");
        }
        Ok(())
    }
}

/// A fixed set of users and servers.
struct MemoryResolver {
    users: HashMap<String, User>,
    servers: HashMap<String, Server>,
}

impl MemoryResolver {
    fn new(guild: Option<&str>, author: &str) -> Self {
        let mut users = HashMap::new();
        users.insert(author.to_string(), User::new(author, "console-user"));

        let mut servers = HashMap::new();
        if let Some(id) = guild {
            let mut member = Member::new(author);
            member.roles.push("admin".into());
            let server = Server::new(id, "Console Guild")
                .with_channel(Channel::new("console", "general"))
                .with_member(member);
            servers.insert(id.to_string(), server);
        }

        Self { users, servers }
    }
}

#[async_trait]
impl Resolver for MemoryResolver {
    async fn resolve_user(&self, id: &str) -> BotResult<Option<User>> {
        Ok(self.users.get(id).cloned())
    }

    async fn resolve_server(&self, id: &str) -> BotResult<Option<Server>> {
        Ok(self.servers.get(id).cloned())
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Logs every routed message and lets the chain continue.
async fn audit(ctx: Arc<MessageContext>, route: RouteData) -> Outcome {
    debug!(author = ctx.message().author_id(), path = route.text(), "Routing message");
    Outcome::Continue
}

async fn ping() -> &'static str {
    "Pong! 🏓"
}

async fn echo(Text(text): Text) -> BotResult<String> {
    if text.is_empty() {
        return Err(BotError::validation("Give me something to echo"));
    }
    Ok(text)
}

async fn help() -> Payload {
    Payload::text("Commands: !ping, !echo <text>, !roll [--max=N], !count, !whoami, !admin whois")
}

/// Rolls a pseudo-random number up to `--max` (default 6).
async fn roll(route: RouteData, ctx: Arc<MessageContext>) -> BotResult<String> {
    let max = match route.arg("max") {
        None => 6,
        Some(value) => value
            .as_u64()
            .filter(|n| *n > 0)
            .ok_or_else(|| BotError::validation("--max must be a positive number"))?,
    };
    let seed = ctx
        .message()
        .id()
        .bytes()
        .fold(17u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
    Ok(format!("🎲 {}", seed % max + 1))
}

/// Counts messages per guild using the session.
async fn count(session: Session) -> String {
    let n = session.update(|bag| {
        let n = bag.get("count").and_then(|v| v.as_u64()).unwrap_or(0) + 1;
        bag.insert("count".into(), serde_json::json!(n));
        n
    });
    format!("This scope has counted {n} time(s)")
}

async fn whoami(CurrentUser(user): CurrentUser) -> String {
    format!("You are {} ({})", user.name, user.id)
}

async fn whois(
    CurrentServer(server): CurrentServer,
    ctx: Arc<MessageContext>,
) -> BotResult<String> {
    let member = ctx
        .member()
        .ok_or_else(|| BotError::access_denied("You are not a member of this server"))?;
    if !member.has_role("admin") {
        return Err(BotError::access_denied("Admins only"));
    }
    ctx.set_state(Answered);
    Ok(format!(
        "{}: {} channel(s), {} member(s)",
        server.name,
        server.channels.len(),
        server.members.len()
    ))
}

async fn mentioned() -> &'static str {
    "You called? Try !help"
}

async fn fallback(ctx: Arc<MessageContext>) -> Option<String> {
    (ctx.content().is_command_prefixed && !ctx.has_state::<Answered>())
        .then(|| "Unknown command, try !help".to_string())
}

/// Marks a message answered inside a nested router, whose parent chain
/// keeps running afterwards.
#[derive(Debug, Clone, Copy)]
struct Answered;

/// Admin commands, only reachable from a guild.
struct Admin;

impl Module for Admin {
    fn name(&self) -> &str {
        "admin"
    }

    fn register(&self, router: Router) -> Router {
        let admin = Router::named("admin").route("whois", whois);
        router.nest_with("admin", admin, RouteOptions::new().scope(Scope::Public))
    }
}

fn router() -> Router {
    Router::named("root")
        .route("*", audit)
        .route_with("ping", ping, RouteOptions::new().trigger(Trigger::Either))
        .route("echo", echo)
        .route(["help", "h"], help)
        .route("roll", roll)
        .route("count", count)
        .route("whoami", whoami)
        .module(&Admin)
        .route_with("*", mentioned, RouteOptions::new().only_mentioned(true))
        .route("*", fallback)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config_from_file(path)?,
        None => ConfigLoader::new().with_current_dir().load()?,
    };
    let bot_id = config.bot.bot_id.get_or_insert_with(|| BOT_ID.into()).clone();

    let resolver = MemoryResolver::new(args.guild.as_deref(), &args.author);
    let bootstrap = Bootstrap::builder()
        .config(config)
        .router(router())
        .resolver(Arc::new(resolver))
        .build()?;

    info!(bot_id = %bot_id, guild = ?args.guild, "Type messages, Ctrl+D to quit");

    let (tx, rx) = mpsc::channel::<BoxedMessage>(16);
    let guild = args.guild.map(|id| GuildRef::new(id, "Console Guild"));
    let author = args.author;

    tokio::spawn(async move {
        let next_id = AtomicU64::new(1);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let message = ConsoleMessage {
                        id: next_id.fetch_add(1, Ordering::Relaxed).to_string(),
                        content: line,
                        author: author.clone(),
                        guild: guild.clone(),
                    };
                    if tx.send(Arc::new(message)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    });

    bootstrap.run(rx).await?;
    info!(stats = %bootstrap.stats(), "Goodbye");
    Ok(())
}
