//! # Seed Data Generator
//!
//! Populates the database with branches, staff, zones and items for
//! development.
//!
//! ## Usage
//! ```bash
//! # 2 branches × 4 zones × 25 items (default)
//! cargo run -p stocktake-db --bin seed
//!
//! # Custom shape
//! cargo run -p stocktake-db --bin seed -- --zones 10 --items 200
//!
//! # Specify database path
//! cargo run -p stocktake-db --bin seed -- --db ./data/stocktake.db
//! ```
//!
//! ## Generated Data
//! Per branch: one area manager, one operator, one checker (with profile),
//! one operating group, N zones each holding M items. Item codes follow
//! `{BRANCH}-{ZONE}-{INDEX}` so a scan from the wrong zone is easy to stage.

use std::env;

use stocktake_core::Role;
use stocktake_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

const BRANCHES: &[&str] = &["Central", "Harbour"];

const ITEM_STATES: &[&str] = &["ok", "damaged", "missing parts", "retired"];

const ASSETS: &[&str] = &[
    "Forklift",
    "Pallet Jack",
    "Barcode Scanner",
    "Label Printer",
    "Shelving Unit",
    "Desk",
    "Office Chair",
    "Laptop",
    "Monitor",
    "Fire Extinguisher",
    "Ladder",
    "Hand Truck",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    let mut zones_per_branch: usize = 4;
    let mut items_per_zone: usize = 25;
    let mut db_path = String::from("./stocktake_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--zones" | "-z" => {
                if i + 1 < args.len() {
                    zones_per_branch = args[i + 1].parse().unwrap_or(4);
                    i += 1;
                }
            }
            "--items" | "-i" => {
                if i + 1 < args.len() {
                    items_per_zone = args[i + 1].parse().unwrap_or(25);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stocktake Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -z, --zones <N>    Zones per branch (default: 4)");
                println!("  -i, --items <N>    Items per zone (default: 25)");
                println!("  -d, --db <PATH>    Database file path (default: ./stocktake_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Stocktake Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Zones per branch: {}", zones_per_branch);
    println!("Items per zone: {}", items_per_zone);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.zones().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} zones", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    let mut state_ids = Vec::with_capacity(ITEM_STATES.len());
    for label in ITEM_STATES {
        state_ids.push(db.items().insert_state(label).await?.id);
    }
    let ok_state = state_ids[0];

    let mut items_created = 0;

    for (branch_idx, branch_name) in BRANCHES.iter().enumerate() {
        let staff = db.staff();
        let branch_id = staff.insert_branch(branch_name).await?;
        let prefix: String = branch_name.chars().take(3).collect::<String>().to_uppercase();

        let manager_id = staff
            .insert_user(&format!("{branch_name} Manager"), Role::AreaManager, Some(branch_id))
            .await?;
        staff
            .insert_user(&format!("{branch_name} Operator"), Role::Operator, Some(branch_id))
            .await?;
        let checker_user = staff
            .insert_user(&format!("{branch_name} Checker"), Role::Checker, Some(branch_id))
            .await?;
        staff.insert_checker(checker_user, branch_id).await?;
        staff
            .insert_group(&format!("{branch_name} Count Team"), branch_id)
            .await?;

        println!("✓ Branch {} ({})", branch_name, prefix);

        for zone_idx in 0..zones_per_branch {
            let zone = db
                .zones()
                .insert(
                    &format!("{branch_name} Zone {}", zone_idx + 1),
                    branch_id,
                    manager_id,
                )
                .await?;

            for item_idx in 0..items_per_zone {
                let code = format!("{}-{:02}-{:04}", prefix, zone_idx + 1, item_idx + 1);
                let asset = ASSETS[(branch_idx * 7 + zone_idx * 3 + item_idx) % ASSETS.len()];

                if let Err(e) = db
                    .items()
                    .insert(&code, &format!("{asset} #{}", item_idx + 1), zone.id, ok_state)
                    .await
                {
                    eprintln!("Failed to insert {}: {}", code, e);
                    continue;
                }
                items_created += 1;
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Generated {} zones and {} items in {:?}",
        db.zones().count().await?,
        items_created,
        elapsed
    );
    println!("✓ Seed complete!");

    Ok(())
}
