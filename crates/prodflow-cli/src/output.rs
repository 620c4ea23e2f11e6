use colored::Colorize;
use prodflow_client::{ClientError, Device, Role, User};
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;
use uuid::Uuid;

use crate::cli::OutputFormat;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Reports a failed command as a single line.
pub fn print_failure(err: &anyhow::Error) {
    match err.downcast_ref::<ClientError>() {
        Some(client_err) => {
            print_error(&client_err.user_message());
            if client_err.is_unauthorized() {
                eprintln!("  Run `prodflow login` to obtain a new token.");
            }
        }
        None => print_error(&format!("{err:#}")),
    }
}

/// Prints `value` as JSON or YAML. Table output is handled per record kind.
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let value = serde_json::to_value(value)?;
    match format {
        OutputFormat::Yaml => println!("{}", format_yaml(&value, 0)),
        OutputFormat::Json | OutputFormat::Table => {
            println!("{}", serde_json::to_string_pretty(&value)?)
        }
    }
    Ok(())
}

/// Role names for the ids a user holds; ids with no matching role are shown as-is.
pub fn role_names(role_ids: &[Uuid], roles: &[Role]) -> String {
    role_ids
        .iter()
        .map(|id| {
            roles
                .iter()
                .find(|r| r.id == *id)
                .map(|r| r.name.clone())
                .unwrap_or_else(|| id.to_string())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn users_table(users: &[User], roles: &[Role]) -> String {
    if users.is_empty() {
        return "No users found.".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(["ID", "Username", "Name", "Roles", "Finger token"]);
    for user in users {
        builder.push_record([
            user.id.to_string(),
            user.username.clone(),
            user.full_name(),
            role_names(&user.role_ids, roles),
            user.finger_token.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}

pub fn roles_table(roles: &[Role]) -> String {
    if roles.is_empty() {
        return "No roles found.".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "Permissions"]);
    for role in roles {
        builder.push_record([
            role.id.to_string(),
            role.name.clone(),
            role.permissions.join(", "),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}

pub fn devices_table(devices: &[Device]) -> String {
    if devices.is_empty() {
        return "No devices found.".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "Android ID"]);
    for device in devices {
        builder.push_record([
            device.id.to_string(),
            device.name.clone(),
            device.android_id.clone(),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}

fn format_yaml(value: &Value, indent: usize) -> String {
    let prefix = " ".repeat(indent);
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.contains('\n') {
                format!(
                    "|\n{}{}",
                    " ".repeat(indent + 2),
                    s.replace('\n', &format!("\n{}", " ".repeat(indent + 2)))
                )
            } else {
                format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
        }
        Value::Array(arr) => {
            if arr.is_empty() {
                return "[]".to_string();
            }
            let items: Vec<String> = arr
                .iter()
                .map(|v| {
                    let item = format_yaml(v, indent + 2);
                    format!("{prefix}- {}", item.trim_start())
                })
                .collect();
            format!("\n{}", items.join("\n"))
        }
        Value::Object(obj) => {
            if obj.is_empty() {
                return "{}".to_string();
            }
            let items: Vec<String> = obj
                .iter()
                .map(|(k, v)| {
                    let val = format_yaml(v, indent + 2);
                    if val.starts_with('\n') {
                        format!("{prefix}{k}:{val}")
                    } else {
                        format!("{prefix}{k}: {val}")
                    }
                })
                .collect();
            if indent == 0 {
                items.join("\n")
            } else {
                format!("\n{}", items.join("\n"))
            }
        }
    }
}
