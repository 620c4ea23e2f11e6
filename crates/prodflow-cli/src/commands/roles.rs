use anyhow::Result;
use colored::Colorize;
use prodflow_client::{NewRole, ResourceCache, Role, RolePatch};
use uuid::Uuid;

use crate::cli::{ListArgs, OutputFormat, RoleCreateArgs, RoleUpdateArgs};
use crate::output::{print_structured, print_success, roles_table};

pub async fn list(cache: &ResourceCache, args: &ListArgs, format: OutputFormat) -> Result<()> {
    let roles = match &args.name {
        Some(query) => cache.client().search::<Role>(query).await?,
        None => cache.read::<Role>().await?.to_vec(),
    };
    match format {
        OutputFormat::Table => println!("{}", roles_table(&roles)),
        _ => print_structured(&roles, format)?,
    }
    Ok(())
}

pub async fn get(cache: &ResourceCache, id: Uuid, format: OutputFormat) -> Result<()> {
    let record = cache.client().get::<Role>(id).await?;
    match format {
        OutputFormat::Table => println!("{}", roles_table(std::slice::from_ref(&record))),
        _ => print_structured(&record, format)?,
    }
    Ok(())
}

pub async fn create(cache: &ResourceCache, args: &RoleCreateArgs, format: OutputFormat) -> Result<()> {
    let payload = NewRole {
        name: args.name.clone(),
        permissions: args.permissions.clone(),
    };
    let created = cache.create::<Role>(&payload).await?;
    print_success(&format!("Created role {} ({})", created.name.cyan(), created.id));
    list(cache, &ListArgs::default(), format).await
}

pub async fn update(cache: &ResourceCache, args: &RoleUpdateArgs, format: OutputFormat) -> Result<()> {
    let permissions = if args.clear_permissions {
        Some(Vec::new())
    } else if args.permissions.is_empty() {
        None
    } else {
        Some(args.permissions.clone())
    };
    let patch = RolePatch {
        name: args.name.clone(),
        permissions,
    };
    if patch == RolePatch::default() {
        anyhow::bail!("Nothing to update. Pass --name, --permission or --clear-permissions");
    }
    let updated = cache.update::<Role>(args.id, &patch).await?;
    print_success(&format!("Updated role {}", updated.name.cyan()));
    list(cache, &ListArgs::default(), format).await
}

/// Deletes a role. Users holding it keep the id; listings show it raw.
pub async fn delete(cache: &ResourceCache, id: Uuid, format: OutputFormat) -> Result<()> {
    cache.delete::<Role>(id).await?;
    print_success(&format!("Deleted role {id}"));
    list(cache, &ListArgs::default(), format).await
}

pub async fn permissions(cache: &ResourceCache, format: OutputFormat) -> Result<()> {
    let permissions = cache.client().permissions().await?;
    match format {
        OutputFormat::Table => {
            for p in &permissions {
                println!("{p}");
            }
        }
        _ => print_structured(&permissions, format)?,
    }
    Ok(())
}
