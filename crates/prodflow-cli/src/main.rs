mod auth;
mod cli;
mod commands;
mod config;
mod observability;
mod output;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use prodflow_client::{ApiClient, ResourceCache};

use cli::{Cli, Commands, ConfigCommands, DeviceCommands, LogCommands, RoleCommands, UserCommands};
use output::print_failure;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    observability::init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        print_failure(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let profile = &cli.profile;
    let format = config::resolve_format(cli.format, profile);

    match &cli.command {
        Commands::Login(args) => {
            let server = config::resolve_server(&cli.server, profile)?;
            commands::auth::login(&server, args, profile).await?;
        }
        Commands::Logout => {
            commands::auth::logout(profile)?;
        }
        Commands::Whoami => {
            commands::auth::whoami(profile)?;
        }
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => {
                let cfg = config::load_profile(profile)?;
                println!("{}: {}", "Profile".cyan(), profile);
                println!(
                    "{}: {}",
                    "Server".cyan(),
                    cfg.server.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "{}: {}",
                    "Format".cyan(),
                    cfg.format.as_deref().unwrap_or("table")
                );
            }
            ConfigCommands::Set(set_args) => {
                let mut cfg = config::load_profile(profile)?;
                config::apply_setting(&mut cfg, &set_args.key, &set_args.value)?;
                config::save_profile(profile, &cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        },
        Commands::Status => {
            let client = make_client(&cli.server, profile)?;
            commands::server::status(&client).await?;
        }
        Commands::Users(args) => {
            let cache = ResourceCache::with_defaults(make_client(&cli.server, profile)?);
            match &args.command {
                UserCommands::List(a) => commands::users::list(&cache, a, format).await?,
                UserCommands::Get(a) => commands::users::get(&cache, a.id, format).await?,
                UserCommands::Create(a) => commands::users::create(&cache, a, format).await?,
                UserCommands::Update(a) => commands::users::update(&cache, a, format).await?,
                UserCommands::Delete(a) => commands::users::delete(&cache, a.id, format).await?,
            }
        }
        Commands::Roles(args) => {
            let cache = ResourceCache::with_defaults(make_client(&cli.server, profile)?);
            match &args.command {
                RoleCommands::List(a) => commands::roles::list(&cache, a, format).await?,
                RoleCommands::Get(a) => commands::roles::get(&cache, a.id, format).await?,
                RoleCommands::Create(a) => commands::roles::create(&cache, a, format).await?,
                RoleCommands::Update(a) => commands::roles::update(&cache, a, format).await?,
                RoleCommands::Delete(a) => commands::roles::delete(&cache, a.id, format).await?,
            }
        }
        Commands::Devices(args) => {
            let cache = ResourceCache::with_defaults(make_client(&cli.server, profile)?);
            match &args.command {
                DeviceCommands::List(a) => commands::devices::list(&cache, a, format).await?,
                DeviceCommands::Get(a) => commands::devices::get(&cache, a.id, format).await?,
                DeviceCommands::Create(a) => commands::devices::create(&cache, a, format).await?,
                DeviceCommands::Update(a) => commands::devices::update(&cache, a, format).await?,
                DeviceCommands::Delete(a) => {
                    commands::devices::delete(&cache, a.id, format).await?
                }
            }
        }
        Commands::Permissions => {
            let cache = ResourceCache::with_defaults(make_client(&cli.server, profile)?);
            commands::roles::permissions(&cache, format).await?;
        }
        Commands::Logs(args) => {
            let client = make_client(&cli.server, profile)?;
            match &args.command {
                LogCommands::List => commands::logs::list(&client, format).await?,
                LogCommands::Show(a) => commands::logs::show(&client, a).await?,
                LogCommands::Download(a) => commands::logs::download(&client, a).await?,
            }
        }
    }

    Ok(())
}

/// Client for the resolved server, carrying the profile's stored token if any.
fn make_client(cli_server: &Option<String>, profile: &str) -> Result<ApiClient> {
    let server = config::resolve_server(cli_server, profile)?;
    let token = auth::load_credentials(profile)?.map(|c| c.token);
    tracing::debug!(%server, authenticated = token.is_some(), "building API client");
    Ok(ApiClient::new(&server, token)?)
}
