//! Command handlers for the CLI.
//!
//! Each handler loads the corpus snapshot once and runs the relevant
//! engine query against it. Output is human-readable by default; the
//! global `--json` flag switches to raw JSON on stdout.

use anyhow::Context as _;
use serde::Serialize;
use uuid::Uuid;

use centrescan_core::{AppConfig, CategoryAliases};
use centrescan_engine::{
    analyze_gaps, find_nearby, CancelFlag, DedupeConfig, DetailLevel, DuplicateScanner, GapConfig,
    NearbyFilters, Resolution, ResolverConfig, ScanReport, Snapshot,
};

/// Shared command context: parsed config plus the loaded corpus snapshot.
pub struct Context {
    pub config: AppConfig,
    pub snapshot: Snapshot,
    pub json: bool,
}

impl Context {
    /// Connect to the database and load the full corpus into memory.
    pub async fn connect(json: bool) -> anyhow::Result<Self> {
        let config = centrescan_core::load_app_config()?;
        let pool_config = centrescan_db::PoolConfig::from_app_config(&config);
        let pool = centrescan_db::connect_pool(&config.database_url, pool_config).await?;

        let aliases = if config.category_aliases_path.exists() {
            centrescan_core::load_category_aliases(&config.category_aliases_path)?
        } else {
            CategoryAliases::default()
        };

        let snapshot = centrescan_db::load_snapshot(&pool, &aliases)
            .await
            .context("failed to load location snapshot")?;

        Ok(Self {
            config,
            snapshot,
            json,
        })
    }

    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce()) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human();
        }
        Ok(())
    }
}

/// `centrescan-cli resolve <name>`
pub fn resolve(ctx: &Context, name: &str) -> anyhow::Result<()> {
    let config = ResolverConfig::from_app_config(&ctx.config);
    let resolution = centrescan_engine::resolve(&ctx.snapshot, name, &config)?;

    ctx.emit(&resolution, || match &resolution {
        Resolution::Match(m) => {
            println!(
                "{} ({}) — confidence {:.2}",
                m.canonical_name, m.location_id, m.confidence
            );
            for alt in &m.alternatives {
                println!("  also considered: {} ({:.2})", alt.name, alt.score);
            }
        }
        Resolution::Ambiguous { candidates } => {
            println!("ambiguous; {} candidates:", candidates.len());
            for c in candidates {
                println!("  {} ({}) — score {:.2}", c.name, c.location_id, c.score);
            }
        }
        Resolution::NotFound => println!("no match for {name:?}"),
    })
}

/// `centrescan-cli nearby <name-or-id> --radius-km`
pub fn nearby(
    ctx: &Context,
    target: &str,
    radius_km: f64,
    min_stores: Option<u32>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let origin_id = resolve_target(ctx, target)?;
    let filters = NearbyFilters {
        min_stores,
        location_type: None,
        limit: Some(limit.unwrap_or(ctx.config.nearby_result_limit)),
    };
    let report = find_nearby(&ctx.snapshot, origin_id, radius_km, &filters)?;

    ctx.emit(&report, || {
        if report.missing_coordinates {
            println!("location {origin_id} has no coordinates; proximity is undefined");
            return;
        }
        println!(
            "{} locations within {radius_km} km:",
            report.candidates.len()
        );
        for c in &report.candidates {
            println!(
                "  {:>7.2} km  {} ({} stores)",
                c.distance_km,
                c.name,
                c.number_of_stores
                    .map_or_else(|| "?".to_string(), |n| n.to_string())
            );
        }
    })
}

/// `centrescan-cli gaps <name-or-id> --radius-km [--detailed]`
pub fn gaps(ctx: &Context, target: &str, radius_km: f64, detailed: bool) -> anyhow::Result<()> {
    let target_id = resolve_target(ctx, target)?;

    let filters = NearbyFilters::with_limit_from(&ctx.config);
    let nearby = find_nearby(&ctx.snapshot, target_id, radius_km, &filters)?;
    let competitor_ids: Vec<Uuid> = nearby.candidates.iter().map(|c| c.location_id).collect();

    let detail = if detailed {
        DetailLevel::Detailed
    } else {
        DetailLevel::High
    };
    let config = GapConfig::from_app_config(&ctx.config);
    let report = analyze_gaps(&ctx.snapshot, target_id, &competitor_ids, detail, &config)?;

    ctx.emit(&report, || {
        if report.low_confidence {
            println!("note: target has no tenant data; analysis rests on the neighbourhood alone");
        }
        if report.priorities.is_empty() {
            println!(
                "no category gaps against {} neighbours within {radius_km} km",
                competitor_ids.len()
            );
            return;
        }
        println!("category gaps (highest priority first):");
        for p in &report.priorities {
            println!(
                "  {:>6.1}  {} — {}",
                p.gap_score,
                p.category.display_name(),
                p.rationale
            );
            for example in &p.example_locations {
                println!("          e.g. {example}");
            }
        }
    })
}

/// `centrescan-cli dedupe [--postcode-prefix]`
///
/// Ctrl-c flips the engine cancel flag; the scan stops at the next block
/// boundary and the partial report is printed, marked cancelled.
pub async fn dedupe(ctx: &Context, postcode_prefix: Option<&str>) -> anyhow::Result<()> {
    let corpus = match postcode_prefix {
        Some(prefix) => filter_by_postcode_prefix(&ctx.snapshot, prefix),
        None => ctx.snapshot.clone(),
    };

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("ctrl-c received; finishing current block then stopping");
                cancel.cancel();
            }
        });
    }

    let config = DedupeConfig::from_app_config(&ctx.config);
    let scanner = DuplicateScanner::new();
    let report = tokio::task::spawn_blocking(move || {
        let cancel = cancel;
        scanner.scan(&corpus, &config, &cancel)
    })
    .await??;

    print_scan_report(ctx, &report)
}

fn print_scan_report(ctx: &Context, report: &ScanReport) -> anyhow::Result<()> {
    ctx.emit(report, || {
        if report.cancelled {
            println!("scan cancelled; partial results follow");
        }
        println!(
            "{} suspected duplicate pairs ({} compared, {} skipped, {} unblockable)",
            report.pairs.len(),
            report.compared_pairs,
            report.skipped_pairs,
            report.unblockable_records
        );
        for pair in &report.pairs {
            println!(
                "  [{}] {} <-> {} ({})",
                pair.rule.reason(),
                pair.name_a,
                pair.name_b,
                pair.evidence
            );
        }
    })
}

/// Accept either a UUID or a free-text name; names must resolve to
/// exactly one record.
fn resolve_target(ctx: &Context, target: &str) -> anyhow::Result<Uuid> {
    if let Ok(id) = target.parse::<Uuid>() {
        return Ok(id);
    }

    let config = ResolverConfig::from_app_config(&ctx.config);
    match centrescan_engine::resolve(&ctx.snapshot, target, &config)? {
        Resolution::Match(m) => {
            tracing::info!(name = %m.canonical_name, confidence = m.confidence, "resolved target");
            Ok(m.location_id)
        }
        Resolution::Ambiguous { candidates } => {
            let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
            anyhow::bail!(
                "{target:?} is ambiguous; candidates: {}. Use a UUID instead.",
                names.join(", ")
            )
        }
        Resolution::NotFound => anyhow::bail!("no location matching {target:?}"),
    }
}

fn filter_by_postcode_prefix(snapshot: &Snapshot, prefix: &str) -> Snapshot {
    let wanted = prefix.trim().to_uppercase().replace(' ', "");
    let locations = snapshot
        .locations()
        .iter()
        .filter(|l| {
            l.postcode
                .as_deref()
                .is_some_and(|p| p.to_uppercase().replace(' ', "").starts_with(&wanted))
        })
        .cloned()
        .collect();
    Snapshot::new(locations, Vec::new())
}
