//! Command-line front end for the Stride client library.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ortho_config::OrthoConfig;
use client::api::{AuthApi, PostInteractions, PostsApi, UsersApi, WorkoutsApi};
use client::config::ClientSettings;
use client::domain::ports::{InteractionCommand, InteractionQuery};
use client::domain::{
    ApiClient, InteractionKind, ItemId, LoginCredentials, OptimisticInteractions,
    RedundantSessionStore,
};
use client::outbound::http::ReqwestTransport;
use client::outbound::storage::{CookieJarTokenStorage, FileTokenStorage};
use reqwest::cookie::Jar;
use tokio::runtime::Builder;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt};

type CliStore = RedundantSessionStore<FileTokenStorage, CookieJarTokenStorage>;
type CliClient = ApiClient<ReqwestTransport, CliStore>;

/// `stride` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "stride", about = "Talk to the Stride backend", version)]
struct CliArgs {
    /// Backend base URL; overrides `STRIDE_BASE_URL`.
    #[arg(long = "base-url", value_name = "url", global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Log in and store the session.
    Login {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long)]
        password: String,
    },
    /// End the session.
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// Show one page of the feed.
    Feed {
        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Toggle the like on a post.
    Like {
        /// Post identifier.
        post: String,
    },
    /// Toggle following a user.
    Follow {
        /// User identifier.
        user: String,
    },
    /// List logged workouts.
    Workouts,
}

fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let mut settings = ClientSettings::load_from_iter([OsString::from("stride")])
        .map_err(|error| io::Error::other(format!("load configuration: {error}")))?;
    if args.base_url.is_some() {
        settings.base_url = args.base_url;
    }
    let client = build_client(&settings)?;

    match args.command {
        Command::Login { email, password } => login(&client, &email, &password).await,
        Command::Logout => {
            AuthApi::new(client).logout().await;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            let me = AuthApi::new(client)
                .current_user()
                .await
                .map_err(|error| request_failed("whoami", &error))?;
            println!("{} ({})", me.display_label(), me.id);
            Ok(())
        }
        Command::Feed { page } => feed(client, page).await,
        Command::Like { post } => {
            let id = parse_id(&post)?;
            let posts = Arc::new(PostsApi::new(client));
            let post = Arc::new(PostInteractions::new(posts, id.clone()));
            toggle(Arc::clone(&post), post, id, InteractionKind::Like).await
        }
        Command::Follow { user } => {
            let id = parse_id(&user)?;
            let profile = Arc::new(UsersApi::new(client).interactions_for(id.clone()));
            toggle(profile.clone(), profile, id, InteractionKind::Follow).await
        }
        Command::Workouts => {
            let workouts = WorkoutsApi::new(client)
                .list()
                .await
                .map_err(|error| request_failed("list workouts", &error))?;
            for workout in workouts {
                let minutes = workout
                    .duration_minutes
                    .map_or_else(|| "-".to_owned(), |minutes| format!("{minutes}m"));
                println!("{}\t{}\t{minutes}", workout.id, workout.title);
            }
            Ok(())
        }
    }
}

fn build_client(settings: &ClientSettings) -> io::Result<Arc<CliClient>> {
    let base_url = settings
        .base_url()
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;
    let session_dir = settings
        .session_dir()
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;

    let jar = Arc::new(Jar::default());
    let transport = ReqwestTransport::with_cookie_jar(settings.timeout(), Arc::clone(&jar))
        .map_err(|error| io::Error::other(format!("build HTTP client: {error}")))?;
    let primary = FileTokenStorage::open(&session_dir)
        .map_err(|error| io::Error::other(format!("open session store: {error}")))?;
    let mirror = CookieJarTokenStorage::new(jar, base_url.clone(), settings.cookie_policy());
    let store = RedundantSessionStore::new(Arc::new(primary), Arc::new(mirror));
    if store.restore_mirror() {
        debug!(session_dir = %session_dir, "restored persisted session");
    }

    ApiClient::new(base_url, Arc::new(transport), Arc::new(store))
        .map(Arc::new)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))
}

async fn login(client: &Arc<CliClient>, email: &str, password: &str) -> io::Result<()> {
    let credentials = LoginCredentials::try_from_parts(email, password)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;
    let user = AuthApi::new(Arc::clone(client))
        .login(&credentials)
        .await
        .map_err(|error| request_failed("login", &error))?;
    match user {
        Some(profile) => println!("logged in as {}", profile.display_label()),
        None => println!("logged in"),
    }
    Ok(())
}

async fn feed(client: Arc<CliClient>, page: u32) -> io::Result<()> {
    let feed = PostsApi::new(client)
        .feed(page)
        .await
        .map_err(|error| request_failed("load feed", &error))?;
    for post in &feed.posts {
        let author = post
            .author
            .as_ref()
            .map_or("unknown", |author| author.username.as_str());
        println!(
            "{}\t@{author}\t♥{}\t↻{}\t{}",
            post.id, post.likes_count, post.reposts_count, post.content
        );
    }
    if feed.has_more {
        println!("more: stride feed --page {}", feed.page.saturating_add(1));
    }
    Ok(())
}

async fn toggle<C, Q>(command: Arc<C>, query: Arc<Q>, id: ItemId, kind: InteractionKind) -> io::Result<()>
where
    C: InteractionCommand + 'static,
    Q: InteractionQuery + 'static,
{
    let interactions = OptimisticInteractions::new(command, query);
    interactions
        .refresh()
        .await
        .map_err(|error| request_failed("load current state", &error))?;
    if !interactions.tracks(&id, kind) {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{id}: no current {} state reported", kind.path_segment()),
        ));
    }
    let result = interactions.toggle(&id, kind).await;
    interactions.settle().await;
    let view = interactions.view(&id, kind);
    result.map_err(|error| request_failed(kind.path_segment(), &error))?;
    let state = if view.active { "on" } else { "off" };
    println!("{} {id}: {state} ({})", kind.path_segment(), view.count);
    Ok(())
}

fn parse_id(raw: &str) -> io::Result<ItemId> {
    ItemId::new(raw).map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))
}

fn request_failed(action: &str, error: &client::domain::ApiError) -> io::Error {
    if error.is_unauthorized() {
        return io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("{action}: session expired, run `stride login`"),
        );
    }
    io::Error::other(format!("{action} failed: {error}"))
}
