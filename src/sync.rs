use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use curriculum_data_sync::helpers::load_courses_data_and_write_formatted;
use curriculum_data_sync::{SyncData, SyncMetadata};

pub struct SyncOptions {
    pub content_store_url: Url,
    pub api_key: SecretString,
    pub dry_run: bool,
}

pub async fn sync(data_path: &Path, options: SyncOptions) -> Result<()> {
    let courses = load_courses_data_and_write_formatted(data_path)?;

    let client = Client::new();

    let metadata_url = options.content_store_url.join("sync/metadata")?;
    let metadata: SyncMetadata = client
        .get(metadata_url)
        .bearer_auth(options.api_key.expose_secret())
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
        .context("content store returned malformed sync metadata")?;

    let sync_data = SyncData::compute(&courses[..], &metadata);

    println!(
        "{} course(s), {} section(s), {} module(s) to sync",
        sync_data.courses_to_sync.len(),
        sync_data.sections_to_sync.len(),
        sync_data.modules_to_sync.len(),
    );
    println!(
        "{} course(s), {} section(s), {} module(s) to delete",
        sync_data.courses_to_delete.len(),
        sync_data.sections_to_delete.len(),
        sync_data.modules_to_delete.len(),
    );

    if sync_data.is_empty() {
        return Ok(());
    }

    if options.dry_run {
        println!("dry run, nothing pushed");
        return Ok(());
    }

    let sync_url = options.content_store_url.join("sync")?;
    client
        .post(sync_url)
        .bearer_auth(options.api_key.expose_secret())
        .json(&sync_data)
        .send()
        .await?
        .error_for_status()?;

    Ok(())
}
