use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{MaterialsArgs, PartsArgs, resolve_db_path};
use crate::commands::ingest::store;

pub fn run_materials(args: MaterialsArgs) -> Result<()> {
    let db_path = resolve_db_path(&args.data_root, args.db_path.as_ref());
    let connection = store::open_existing_store(&db_path)?;

    let materials = store::list_materials(&connection).context("failed to query materials")?;
    info!(path = %db_path.display(), materials = materials.len(), "loaded materials");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&materials)?);
    } else {
        for material_id in &materials {
            println!("{material_id}");
        }
    }

    Ok(())
}

pub fn run_parts(args: PartsArgs) -> Result<()> {
    let db_path = resolve_db_path(&args.data_root, args.db_path.as_ref());
    let connection = store::open_existing_store(&db_path)?;

    if let Some(part_id) = args.part_id.as_deref() {
        let Some(part) = store::find_part(&connection, part_id)
            .with_context(|| format!("failed to query part {part_id}"))?
        else {
            warn!(part_id, "part not found");
            return Ok(());
        };

        if args.json {
            println!("{}", serde_json::to_string_pretty(&part)?);
        } else {
            println!(
                "{}\t{}\t{}\t{}",
                part.part_id,
                part.material_id,
                part.vendor.unwrap_or_default(),
                part.part_type.unwrap_or_default()
            );
        }
        return Ok(());
    }

    let parts = store::list_parts(&connection).context("failed to query parts")?;
    info!(path = %db_path.display(), parts = parts.len(), "loaded parts");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&parts)?);
    } else {
        for part_id in &parts {
            println!("{part_id}");
        }
    }

    Ok(())
}
