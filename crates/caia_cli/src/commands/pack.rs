//! Memory pack commands: import, export, listing and signatures

use std::path::Path;

use caia_db::{CaiaDb, PackManifest, PackVerification, queries};
use miette::{IntoDiagnostic, Result, WrapErr};
use owo_colors::OwoColorize;
use tracing::info;

use crate::helpers::format_tags;
use crate::output::Output;

/// Import a pack manifest from a JSON file
pub async fn import(db: &CaiaDb, file: &Path, output: &Output) -> Result<()> {
    let json = tokio::fs::read_to_string(file)
        .await
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
    let manifest = PackManifest::from_json(&json)
        .wrap_err_with(|| format!("Invalid pack manifest {}", file.display()))?;

    info!(file = %file.display(), "importing pack manifest");
    let imported = caia_db::import_manifest(db.pool(), &manifest).await?;

    output.success(&format!(
        "Imported {} {} ({} items)",
        manifest.pack.slug.bright_cyan(),
        manifest.pack.version,
        imported.item_count
    ));
    output.kv("Pack ID", &imported.pack_id);
    output.kv(
        "Vendor",
        &format!(
            "{} ({})",
            manifest.vendor.name,
            if imported.created_vendor { "new" } else { "existing" }
        ),
    );
    if manifest.pack.signature.is_some() {
        output.kv("Signature", "verified");
    }
    Ok(())
}

/// Export a pack as a manifest, to a file or stdout
pub async fn export(db: &CaiaDb, pack_id: &str, out: Option<&Path>, output: &Output) -> Result<()> {
    let manifest = caia_db::export_pack(db.pool(), pack_id).await?;
    let json = manifest.to_json()?;

    match out {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            output.success(&format!(
                "Exported {} items to {}",
                manifest.items.len(),
                path.display()
            ));
        }
        None => output.print(&json),
    }
    Ok(())
}

/// List a vendor's packs
pub async fn list(db: &CaiaDb, vendor_id: &str, output: &Output) -> Result<()> {
    let packs = queries::list_packs_for_vendor(db.pool(), vendor_id).await?;
    if packs.is_empty() {
        output.info("No packs found", "Import one with: caia pack import <file>");
        return Ok(());
    }

    for pack in packs {
        let items = queries::count_pack_items(db.pool(), &pack.id).await?;
        output.info(
            "•",
            &format!("{} {}", pack.slug.bright_cyan(), pack.version.bold()),
        );
        output.kv("  ID", &pack.id);
        output.kv("  Title", &pack.title);
        output.kv("  Items", &items.to_string());
        output.kv(
            "  Signed",
            if pack.signature.is_some() { "yes" } else { "no" },
        );
        output.status("");
    }
    Ok(())
}

/// List a pack's items, optionally of one kind
pub async fn items(db: &CaiaDb, pack_id: &str, kind: Option<&str>, output: &Output) -> Result<()> {
    let pack = queries::require_pack(db.pool(), pack_id).await?;
    let items = queries::list_pack_items(db.pool(), pack_id, kind).await?;

    output.section(&format!("{} {} ({} items)", pack.slug, pack.version, items.len()));
    for item in items {
        let subject = item.subject.as_deref().unwrap_or("-");
        output.info("•", &format!("[{}] {}", item.kind.yellow(), subject.bold()));
        output.kv("  ID", &item.id);
        output.kv("  Content", &item.content);
        let tags = item.tags.map(|t| t.0).unwrap_or_default();
        output.kv("  Tags", &format_tags(&tags));
    }
    Ok(())
}

/// Store the pack's current digest as its signature
pub async fn sign(db: &CaiaDb, pack_id: &str, output: &Output) -> Result<()> {
    let digest = caia_db::sign_pack(db.pool(), pack_id).await?;
    output.success("Pack signed");
    output.kv("Signature", &digest);
    Ok(())
}

/// Check the stored signature against the pack's items
pub async fn verify(db: &CaiaDb, pack_id: &str, output: &Output) -> Result<()> {
    match caia_db::verify_pack(db.pool(), pack_id).await? {
        PackVerification::Unsigned => {
            output.warning("Pack is not signed");
            Ok(())
        }
        PackVerification::Valid => {
            output.success("Signature matches pack contents");
            Ok(())
        }
        PackVerification::Mismatch { expected, actual } => {
            output.kv("Stored", &expected);
            output.kv("Computed", &actual);
            Err(miette::miette!(
                help = "Re-sign with `caia pack sign` if the changes are intended",
                "Signature does not match pack contents"
            ))
        }
    }
}
