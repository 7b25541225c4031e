use clap::{Parser, Subcommand};
use goal_tracker::{AppState, Config, auth, load_data, persist_data, router};
use std::net::SocketAddr;
use tokio::fs;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "goal_tracker", about = "Personal goal tracker", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the web server (the default).
    Serve,
    /// Create a user in the data file.
    AddUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create a goal, with its tasks, for an existing user.
    AddGoal {
        #[arg(long)]
        username: String,
        #[arg(long)]
        title: String,
        /// Task title; repeat for several tasks.
        #[arg(long = "task")]
        tasks: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::AddUser {
            username,
            email,
            password,
        } => add_user(&config, username, email, password).await,
        Command::AddGoal {
            username,
            title,
            tasks,
        } => add_goal(&config, username, title, tasks).await,
    }
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = config.data_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let data = load_data(&config.data_path).await;
    info!(
        users = data.users.len(),
        goals = data.goals.len(),
        "loaded {}",
        config.data_path.display()
    );
    let state = AppState::new(config.data_path.clone(), data);
    let app = router(state, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn add_user(
    config: &Config,
    username: String,
    email: String,
    password: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let username = username.trim().to_string();
    let password = password.trim().to_string();
    if username.is_empty() || password.is_empty() {
        return Err("username and password must not be empty".into());
    }

    let mut data = load_data(&config.data_path).await;
    if data.find_user_by_username(&username).is_some() {
        return Err(format!("user {username:?} already exists").into());
    }
    let hash = tokio::task::spawn_blocking(move || auth::hash_password(&password)).await??;
    let id = data.insert_user(username.clone(), email.trim().to_string(), hash);
    persist_data(&config.data_path, &data)
        .await
        .map_err(|err| err.message)?;

    info!(user_id = id, %username, "user created");
    Ok(())
}

async fn add_goal(
    config: &Config,
    username: String,
    title: String,
    tasks: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut data = load_data(&config.data_path).await;
    let user_id = data
        .find_user_by_username(username.trim())
        .map(|user| user.id)
        .ok_or_else(|| format!("no user named {username:?}"))?;
    let tasks = tasks
        .into_iter()
        .map(|task| task.trim().to_string())
        .filter(|task| !task.is_empty())
        .collect();
    let id = data.insert_goal(user_id, title.trim().to_string(), tasks);
    persist_data(&config.data_path, &data)
        .await
        .map_err(|err| err.message)?;

    info!(goal_id = id, user_id, "goal created");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
