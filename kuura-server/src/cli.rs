//! Administrative CLI. Every subcommand builds or reuses the same
//! [`AppState`] the HTTP surface runs on and calls straight into the core
//! engines; there is no separate CLI business logic to keep in sync.

use crate::state::AppState;
use anyhow::{Context, Result};
use auth_core::models::Service;
use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "kuura-server", about = "Kuura authentication service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Runs both HTTP listeners until a termination signal arrives. The
    /// default when no subcommand is given.
    Serve,
    /// Applies pending SQL migrations and exits.
    Migrate,
    /// Relying-service administration.
    Services {
        #[command(subcommand)]
        action: ServicesAction,
    },
    /// User administration.
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Per-service signing key administration.
    Jwks {
        #[command(subcommand)]
        action: JwksAction,
    },
    /// Machine-to-machine role templates and sessions.
    M2m {
        #[command(subcommand)]
        action: M2mAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ServicesAction {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        jwt_audience: String,
        #[arg(long)]
        api_domain: String,
        #[arg(long)]
        login_redirect: String,
        #[arg(long, default_value_t = 3600)]
        access_token_duration_secs: i64,
    },
    List,
}

#[derive(Subcommand, Debug)]
pub enum UsersAction {
    /// Registers a user from a salt/verifier pair computed client-side; the
    /// server never sees the password.
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        salt: String,
        #[arg(long)]
        verifier: String,
    },
    List,
}

#[derive(Subcommand, Debug)]
pub enum JwksAction {
    Rotate {
        #[arg(long)]
        service_id: Uuid,
    },
    List {
        #[arg(long)]
        service_id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
pub enum M2mAction {
    CreateTemplate {
        #[arg(long)]
        service_id: Uuid,
        #[arg(long)]
        template_id: String,
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,
    },
    CreateSession {
        #[arg(long)]
        service_id: Uuid,
        #[arg(long)]
        subject_id: String,
        #[arg(long)]
        template: String,
    },
}

pub async fn dispatch(command: Command, state: AppState) -> Result<()> {
    match command {
        Command::Serve => crate::lifecycle::serve(state).await,
        Command::Migrate => migrate(state).await,
        Command::Services { action } => services(action, state).await,
        Command::Users { action } => users(action, state).await,
        Command::Jwks { action } => jwks(action, state).await,
        Command::M2m { action } => m2m(action, state).await,
    }
}

async fn migrate(state: AppState) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(&state.pool)
        .await
        .context("failed to apply migrations")?;
    println!("migrations applied");
    Ok(())
}

async fn services(action: ServicesAction, state: AppState) -> Result<()> {
    match action {
        ServicesAction::Create {
            name,
            jwt_audience,
            api_domain,
            login_redirect,
            access_token_duration_secs,
        } => {
            let now = chrono::Utc::now();
            let service = Service {
                id: Uuid::now_v7(),
                name,
                jwt_audience,
                api_domain,
                login_redirect,
                access_token_duration_secs,
                access_token_cookie_name: "kuura_access".to_string(),
                description: None,
                contact_name: None,
                contact_email: None,
                created_at: now,
                modified_at: now,
            };
            state.services.create(&service).await?;
            print_json(&service)
        }
        ServicesAction::List => print_json(&state.services.list().await?),
    }
}

async fn users(action: UsersAction, state: AppState) -> Result<()> {
    match action {
        UsersAction::Create { username, salt, verifier } => {
            let user = state.srp.register(&username, &salt, &verifier).await?;
            print_json(&user)
        }
        UsersAction::List => print_json(&state.srp.list_users().await?),
    }
}

async fn jwks(action: JwksAction, state: AppState) -> Result<()> {
    match action {
        JwksAction::Rotate { service_id } => {
            let kid = state.jwks.rotate(service_id).await?;
            println!("{kid}");
            Ok(())
        }
        JwksAction::List { service_id } => {
            let keys = state.jwks.get_jwks(service_id).await?;
            let status = state.jwks.key_status(service_id).await?;
            print_json(&serde_json::json!({ "keys": keys, "status": status }))
        }
    }
}

async fn m2m(action: M2mAction, state: AppState) -> Result<()> {
    match action {
        M2mAction::CreateTemplate { service_id, template_id, roles } => {
            state.m2m.create_role_template(service_id, &template_id, roles).await?;
            println!("role template {template_id} created");
            Ok(())
        }
        M2mAction::CreateSession { service_id, subject_id, template } => {
            let (session_id, refresh_token) = state.m2m.create_m2m_session(service_id, &subject_id, &template).await?;
            print_json(&serde_json::json!({ "session_id": session_id, "refresh_token": refresh_token }))
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
