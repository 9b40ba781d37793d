//! Batch duplicate detection over the location corpus.
//!
//! Offline entity-resolution pass: candidate pairs are generated by
//! blocking (shared website domain, shared postcode outward code, shared
//! coarse grid cell) and each pair is then evaluated against the match
//! rules in a fixed order, first true rule wins. The scan is advisory —
//! it never merges or mutates records; output goes to human triage.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use centrescan_core::{AppConfig, Location};

use crate::error::EngineError;
use crate::geo::haversine_km;
use crate::normalize::{normalize, similarity};
use crate::repository::Repository;

/// Grid cell edge in degrees. At UK latitudes ~1.1 km of latitude per
/// cell, comfortably larger than the proximity rule's distance gate, so
/// checking the 3×3 neighborhood around a cell cannot miss a pair.
const GRID_CELL_DEGREES: f64 = 0.01;

#[derive(Debug, Clone, Copy)]
pub struct DedupeConfig {
    /// Similarity gate for the postcode rule.
    pub name_threshold: f64,
    /// Geocode agreement distance for the proximity rule, in km.
    pub proximity_km: f64,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            name_threshold: 0.6,
            proximity_km: 0.2,
        }
    }
}

impl DedupeConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            name_threshold: config.dedupe_name_threshold,
            proximity_km: config.dedupe_proximity_km,
        }
    }
}

/// Which rule flagged a pair. Ordering here is evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    WebsiteIdentity,
    PostcodeNameSimilarity,
    ProximityExactName,
}

impl MatchRule {
    /// Triage-facing reason label.
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            MatchRule::WebsiteIdentity => "Same Website",
            MatchRule::PostcodeNameSimilarity => "Same Postcode + Name Sim",
            MatchRule::ProximityExactName => "Close Proximity + Same Name",
        }
    }
}

impl std::fmt::Display for MatchRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// One suspected duplicate, with ids ordered so `(A, B)` and `(B, A)`
/// are the same pair.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateCandidatePair {
    pub record_a: Uuid,
    pub record_b: Uuid,
    pub name_a: String,
    pub name_b: String,
    pub rule: MatchRule,
    pub evidence: String,
}

/// Outcome of one batch scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub pairs: Vec<DuplicateCandidatePair>,
    /// Pairs that went through rule evaluation.
    pub compared_pairs: usize,
    /// Pairs abandoned mid-rule because a needed field was unusable.
    pub skipped_pairs: usize,
    /// Records that joined no block at all (no website, postcode, or
    /// coordinates) and therefore could not be compared with anything.
    pub unblockable_records: usize,
    /// True when the scan was cancelled; `pairs` holds the partial result.
    pub cancelled: bool,
}

#[derive(Debug, Error)]
pub enum ScanError {
    /// The scanner is single-flight; a scan was already running.
    #[error("a duplicate scan is already in progress")]
    ScanInProgress,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<crate::error::RepositoryError> for ScanError {
    fn from(e: crate::error::RepositoryError) -> Self {
        ScanError::Engine(EngineError::Repository(e))
    }
}

/// Cooperative cancellation signal checked between blocks.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Single-flight batch scanner.
///
/// Share one instance (behind an `Arc`) between every caller that may
/// trigger a scan; a second concurrent `scan` call is rejected with
/// [`ScanError::ScanInProgress`] rather than queued.
#[derive(Debug, Default)]
pub struct DuplicateScanner {
    running: AtomicBool,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl DuplicateScanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run a full duplicate scan over the corpus.
    ///
    /// # Errors
    ///
    /// [`ScanError::ScanInProgress`] if another scan holds the flight
    /// slot; [`ScanError::Engine`] if the store cannot be reached.
    pub fn scan(
        &self,
        repo: &impl Repository,
        config: &DedupeConfig,
        cancel: &CancelFlag,
    ) -> Result<ScanReport, ScanError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ScanError::ScanInProgress);
        }
        let _guard = RunningGuard(&self.running);

        let locations = repo.all_locations().map_err(ScanError::from)?;
        tracing::info!(locations = locations.len(), "duplicate scan started");

        let blocks = build_blocks(&locations);
        let mut report = ScanReport {
            unblockable_records: blocks.unblockable_records,
            ..ScanReport::default()
        };

        let mut seen: BTreeSet<(usize, usize)> = BTreeSet::new();

        'blocks: for block in &blocks.blocks {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break 'blocks;
            }
            for (i, j) in block_pairs(block) {
                if !seen.insert((i, j)) {
                    continue;
                }
                report.compared_pairs += 1;
                match evaluate_pair(&locations[i], &locations[j], config) {
                    PairVerdict::Duplicate(pair) => report.pairs.push(pair),
                    PairVerdict::Clean => {}
                    PairVerdict::Skipped => report.skipped_pairs += 1,
                }
            }
        }

        tracing::info!(
            duplicates = report.pairs.len(),
            compared = report.compared_pairs,
            skipped = report.skipped_pairs,
            unblockable = report.unblockable_records,
            cancelled = report.cancelled,
            "duplicate scan finished"
        );
        Ok(report)
    }
}

enum PairVerdict {
    Duplicate(DuplicateCandidatePair),
    Clean,
    Skipped,
}

struct Blocks {
    /// Each block is a list of indexes into the location slice.
    blocks: Vec<Vec<usize>>,
    unblockable_records: usize,
}

fn build_blocks(locations: &[Location]) -> Blocks {
    let mut by_website: HashMap<String, Vec<usize>> = HashMap::new();
    let mut by_outward: HashMap<String, Vec<usize>> = HashMap::new();
    let mut by_cell: HashMap<(i64, i64), Vec<usize>> = HashMap::new();

    let mut unblockable = 0usize;

    for (i, location) in locations.iter().enumerate() {
        let mut blocked = false;

        if let Some(site) = location.website.as_deref().map(normalize_website) {
            if !site.is_empty() {
                by_website.entry(site).or_default().push(i);
                blocked = true;
            }
        }
        if let Some(outward) = location
            .postcode
            .as_deref()
            .and_then(postcode_outward)
        {
            by_outward.entry(outward).or_default().push(i);
            blocked = true;
        }
        if let Some(coords) = location.coordinates {
            let cell = grid_cell(coords.latitude, coords.longitude);
            // Register in the home cell only; pairing scans the 3×3
            // neighborhood so boundary-straddling pairs still meet.
            by_cell.entry(cell).or_default().push(i);
            blocked = true;
        }

        if !blocked {
            unblockable += 1;
        }
    }

    let mut blocks: Vec<Vec<usize>> = Vec::new();
    // Stable block order keeps scans reproducible run to run.
    let mut website_blocks: Vec<_> = by_website.into_iter().collect();
    website_blocks.sort_by(|(a, _), (b, _)| a.cmp(b));
    blocks.extend(website_blocks.into_iter().map(|(_, v)| v).filter(|v| v.len() > 1));

    let mut outward_blocks: Vec<_> = by_outward.into_iter().collect();
    outward_blocks.sort_by(|(a, _), (b, _)| a.cmp(b));
    blocks.extend(outward_blocks.into_iter().map(|(_, v)| v).filter(|v| v.len() > 1));

    let mut cell_keys: Vec<_> = by_cell.keys().copied().collect();
    cell_keys.sort_unstable();
    for key in cell_keys {
        // Merge the cell with its neighbors so the proximity rule sees
        // pairs split across a cell edge.
        let mut merged: Vec<usize> = Vec::new();
        for di in -1..=1 {
            for dj in -1..=1 {
                if let Some(members) = by_cell.get(&(key.0 + di, key.1 + dj)) {
                    merged.extend_from_slice(members);
                }
            }
        }
        merged.sort_unstable();
        merged.dedup();
        if merged.len() > 1 {
            blocks.push(merged);
        }
    }

    Blocks {
        blocks,
        unblockable_records: unblockable,
    }
}

fn block_pairs(block: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    block.iter().enumerate().flat_map(move |(n, &i)| {
        block[n + 1..].iter().map(move |&j| {
            if i < j {
                (i, j)
            } else {
                (j, i)
            }
        })
    })
}

/// Evaluate the match rules for one pair, in order; first true rule wins.
fn evaluate_pair(a: &Location, b: &Location, config: &DedupeConfig) -> PairVerdict {
    debug_assert_ne!(a.id, b.id);

    // Rule 1: website identity.
    if let (Some(wa), Some(wb)) = (a.website.as_deref(), b.website.as_deref()) {
        let na = normalize_website(wa);
        let nb = normalize_website(wb);
        if !na.is_empty() && na == nb {
            return PairVerdict::Duplicate(make_pair(
                a,
                b,
                MatchRule::WebsiteIdentity,
                format!("both records point at {na}"),
            ));
        }
    }

    // Rule 2: shared postcode plus similar name.
    if let (Some(pa), Some(pb)) = (
        a.postcode.as_deref().map(normalize_postcode),
        b.postcode.as_deref().map(normalize_postcode),
    ) {
        if !pa.is_empty() && pa == pb {
            let name_a = normalize(&a.name);
            let name_b = normalize(&b.name);
            if name_a.is_empty() || name_b.is_empty() {
                return PairVerdict::Skipped;
            }
            let score = similarity(&a.name, &b.name);
            if score > config.name_threshold {
                return PairVerdict::Duplicate(make_pair(
                    a,
                    b,
                    MatchRule::PostcodeNameSimilarity,
                    format!(
                        "postcode {pa} shared, name similarity {:.0}%",
                        score * 100.0
                    ),
                ));
            }
        }
    }

    // Rule 3: geocoded within the proximity gate and exact same name.
    if let (Some(ca), Some(cb)) = (a.coordinates, b.coordinates) {
        let distance_km = haversine_km(ca, cb);
        if distance_km <= config.proximity_km {
            let name_a = normalize(&a.name);
            let name_b = normalize(&b.name);
            if !name_a.is_empty() && name_a == name_b {
                return PairVerdict::Duplicate(make_pair(
                    a,
                    b,
                    MatchRule::ProximityExactName,
                    format!("identical name {:.0} m apart", distance_km * 1000.0),
                ));
            }
        }
    }

    PairVerdict::Clean
}

fn make_pair(a: &Location, b: &Location, rule: MatchRule, evidence: String) -> DuplicateCandidatePair {
    let (first, second) = if a.id < b.id { (a, b) } else { (b, a) };
    DuplicateCandidatePair {
        record_a: first.id,
        record_b: second.id,
        name_a: first.name.clone(),
        name_b: second.name.clone(),
        rule,
        evidence,
    }
}

/// Strip scheme, `www.`, and any trailing slash; lowercase the rest.
fn normalize_website(url: &str) -> String {
    let mut s = url.trim().to_lowercase();
    for prefix in ["https://", "http://"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.to_string();
            break;
        }
    }
    if let Some(rest) = s.strip_prefix("www.") {
        s = rest.to_string();
    }
    while s.ends_with('/') {
        s.pop();
    }
    s
}

/// Uppercase with all whitespace removed.
fn normalize_postcode(postcode: &str) -> String {
    postcode
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Outward code used for blocking: everything before the final three
/// characters of a full normalized postcode, or the whole thing when it
/// is too short to split.
fn postcode_outward(postcode: &str) -> Option<String> {
    let normalized = normalize_postcode(postcode);
    if normalized.is_empty() {
        return None;
    }
    if normalized.len() > 3 {
        Some(normalized[..normalized.len() - 3].to_string())
    } else {
        Some(normalized)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn grid_cell(latitude: f64, longitude: f64) -> (i64, i64) {
    (
        (latitude / GRID_CELL_DEGREES).floor() as i64,
        (longitude / GRID_CELL_DEGREES).floor() as i64,
    )
}
