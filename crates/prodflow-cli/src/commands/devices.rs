use anyhow::Result;
use colored::Colorize;
use prodflow_client::{Device, DevicePatch, NewDevice, ResourceCache};
use uuid::Uuid;

use crate::cli::{DeviceCreateArgs, DeviceUpdateArgs, ListArgs, OutputFormat};
use crate::output::{devices_table, print_structured, print_success};

pub async fn list(cache: &ResourceCache, args: &ListArgs, format: OutputFormat) -> Result<()> {
    let devices = match &args.name {
        Some(query) => cache.client().search::<Device>(query).await?,
        None => cache.read::<Device>().await?.to_vec(),
    };
    match format {
        OutputFormat::Table => println!("{}", devices_table(&devices)),
        _ => print_structured(&devices, format)?,
    }
    Ok(())
}

pub async fn get(cache: &ResourceCache, id: Uuid, format: OutputFormat) -> Result<()> {
    let record = cache.client().get::<Device>(id).await?;
    match format {
        OutputFormat::Table => println!("{}", devices_table(std::slice::from_ref(&record))),
        _ => print_structured(&record, format)?,
    }
    Ok(())
}

pub async fn create(cache: &ResourceCache, args: &DeviceCreateArgs, format: OutputFormat) -> Result<()> {
    let payload = NewDevice {
        name: args.name.clone(),
        android_id: args.android_id.clone(),
    };
    let created = cache.create::<Device>(&payload).await?;
    print_success(&format!("Registered device {} ({})", created.name.cyan(), created.id));
    list(cache, &ListArgs::default(), format).await
}

pub async fn update(cache: &ResourceCache, args: &DeviceUpdateArgs, format: OutputFormat) -> Result<()> {
    let patch = DevicePatch {
        name: args.name.clone(),
        android_id: args.android_id.clone(),
    };
    if patch == DevicePatch::default() {
        anyhow::bail!("Nothing to update. Pass --name or --android-id");
    }
    let updated = cache.update::<Device>(args.id, &patch).await?;
    print_success(&format!("Updated device {}", updated.name.cyan()));
    list(cache, &ListArgs::default(), format).await
}

pub async fn delete(cache: &ResourceCache, id: Uuid, format: OutputFormat) -> Result<()> {
    cache.delete::<Device>(id).await?;
    print_success(&format!("Deleted device {id}"));
    list(cache, &ListArgs::default(), format).await
}
