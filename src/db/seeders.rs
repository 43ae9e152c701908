//! Database seeders for built-in data
//!
//! Seeds run on every startup and never overwrite rows an administrator
//! already edited.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use super::ContentPageKind;

/// Seed empty content pages and the default loyalty tiers
pub async fn seed_defaults(pool: &SqlitePool) -> Result<()> {
    info!("Seeding default content pages and loyalty tiers...");

    for page in ContentPageKind::ALL {
        sqlx::query("INSERT OR IGNORE INTO content_pages (page, document) VALUES (?, ?)")
            .bind(page.as_str())
            .bind(page.empty_document().to_string())
            .execute(pool)
            .await?;
    }

    let tier_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM loyalty_tiers")
        .fetch_one(pool)
        .await?;
    if tier_count.0 > 0 {
        return Ok(());
    }

    // Format: (name, points_threshold, color, benefits)
    let tiers: Vec<(&str, i64, &str, &str)> = vec![
        (
            "Bronze",
            0,
            "#cd7f32",
            r#"["Member-only rates","Free Wi-Fi"]"#,
        ),
        (
            "Silver",
            1000,
            "#c0c0c0",
            r#"["Member-only rates","Free Wi-Fi","Late checkout"]"#,
        ),
        (
            "Gold",
            5000,
            "#ffd700",
            r#"["Member-only rates","Free Wi-Fi","Late checkout","Room upgrade"]"#,
        ),
        (
            "Platinum",
            15000,
            "#e5e4e2",
            r#"["Member-only rates","Free Wi-Fi","Late checkout","Room upgrade","Spa credit"]"#,
        ),
    ];

    for (name, threshold, color, benefits) in tiers {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO loyalty_tiers (id, name, points_threshold, benefits, color)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(name)
        .bind(threshold)
        .bind(benefits)
        .bind(color)
        .execute(pool)
        .await?;
    }

    info!("Seeded default loyalty tiers");
    Ok(())
}
