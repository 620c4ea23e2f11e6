use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "prodflow")]
#[command(about = "ProdFlow admin console: manage users, roles, devices and server logs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API base URL (overrides config and PRODFLOW_URL env var)
    #[arg(short, long, global = true, env = "PRODFLOW_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "PRODFLOW_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log requests and cache activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Obtain and store an access token
    Login(LoginArgs),
    /// Logout (remove the stored token)
    Logout,
    /// Show current auth info
    Whoami,
    /// Check that the server answers
    Status,
    /// Manage users
    Users(UsersArgs),
    /// Manage roles
    Roles(RolesArgs),
    /// Manage devices
    Devices(DevicesArgs),
    /// List the permission identifiers a role can hold
    Permissions,
    /// Browse server log files
    Logs(LogsArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Username
    #[arg(short, long)]
    pub username: String,
    /// Password
    #[arg(long)]
    pub password: String,
}

#[derive(clap::Args)]
pub struct IdArgs {
    /// Record id (UUID)
    pub id: Uuid,
}

#[derive(clap::Args, Default)]
pub struct ListArgs {
    /// Only records whose name matches (filtered by the server, bypasses the cache)
    #[arg(long)]
    pub name: Option<String>,
}

// --- users ---

#[derive(clap::Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UserCommands,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List users
    List(ListArgs),
    /// Show one user, read from the server
    Get(IdArgs),
    /// Create a user
    Create(UserCreateArgs),
    /// Update fields of a user
    Update(UserUpdateArgs),
    /// Delete a user
    Delete(IdArgs),
}

#[derive(clap::Args)]
pub struct UserCreateArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub patronymic: Option<String>,
    /// Initial password (at least 8 characters)
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub finger_token: Option<String>,
    /// Role id to assign (repeatable)
    #[arg(long = "role")]
    pub roles: Vec<Uuid>,
}

#[derive(clap::Args)]
pub struct UserUpdateArgs {
    /// User id (UUID)
    pub id: Uuid,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub patronymic: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub finger_token: Option<String>,
    /// Replace the user's roles with these ids (repeatable)
    #[arg(long = "role", conflicts_with = "clear_roles")]
    pub roles: Vec<Uuid>,
    /// Remove every role from the user
    #[arg(long)]
    pub clear_roles: bool,
}

// --- roles ---

#[derive(clap::Args)]
pub struct RolesArgs {
    #[command(subcommand)]
    pub command: RoleCommands,
}

#[derive(Subcommand)]
pub enum RoleCommands {
    /// List roles
    List(ListArgs),
    /// Show one role, read from the server
    Get(IdArgs),
    /// Create a role
    Create(RoleCreateArgs),
    /// Update a role
    Update(RoleUpdateArgs),
    /// Delete a role
    Delete(IdArgs),
}

#[derive(clap::Args)]
pub struct RoleCreateArgs {
    #[arg(long)]
    pub name: String,
    /// Permission to grant (repeatable, see `prodflow permissions`)
    #[arg(long = "permission")]
    pub permissions: Vec<String>,
}

#[derive(clap::Args)]
pub struct RoleUpdateArgs {
    /// Role id (UUID)
    pub id: Uuid,
    #[arg(long)]
    pub name: Option<String>,
    /// Replace the role's permissions with these (repeatable)
    #[arg(long = "permission", conflicts_with = "clear_permissions")]
    pub permissions: Vec<String>,
    /// Remove every permission from the role
    #[arg(long)]
    pub clear_permissions: bool,
}

// --- devices ---

#[derive(clap::Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DeviceCommands,
}

#[derive(Subcommand)]
pub enum DeviceCommands {
    /// List devices
    List(ListArgs),
    /// Show one device, read from the server
    Get(IdArgs),
    /// Register a device
    Create(DeviceCreateArgs),
    /// Update a device
    Update(DeviceUpdateArgs),
    /// Delete a device
    Delete(IdArgs),
}

#[derive(clap::Args)]
pub struct DeviceCreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub android_id: String,
}

#[derive(clap::Args)]
pub struct DeviceUpdateArgs {
    /// Device id (UUID)
    pub id: Uuid,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub android_id: Option<String>,
}

// --- logs ---

#[derive(clap::Args)]
pub struct LogsArgs {
    #[command(subcommand)]
    pub command: LogCommands,
}

#[derive(Subcommand)]
pub enum LogCommands {
    /// List log files on the server
    List,
    /// Print a log file
    Show(LogShowArgs),
    /// Save a log file locally
    Download(LogDownloadArgs),
}

#[derive(clap::Args)]
pub struct LogShowArgs {
    /// Log file name
    pub file: String,
    /// Only the last entries of the file
    #[arg(long)]
    pub last: bool,
}

#[derive(clap::Args)]
pub struct LogDownloadArgs {
    /// Log file name
    pub file: String,
    /// Destination path (defaults to the file name in the current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

// --- config ---

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (server, format)
    pub key: String,
    /// Value
    pub value: String,
}
