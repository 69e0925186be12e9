use mood_core::catalog::{Catalog, CatalogSource};
use mood_core::models::Recommendation;
use mood_core::moods::MoodEntry;
use mood_core::pipeline::HealthReport;
use serde_json::{json, Value};

/// The `{analysis, music}` response document.
pub fn recommendation_json(rec: &Recommendation) -> serde_json::Result<Value> {
    serde_json::to_value(rec)
}

pub fn recommendation_text(rec: &Recommendation) -> String {
    let a = &rec.analysis;
    let secondary = a
        .secondary_mood
        .map(|m| m.to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut out = format!(
        "mood: {} (secondary {}, intensity {:.2})\n",
        a.primary_mood, secondary, a.intensity
    );
    if !a.emotional_tags.is_empty() {
        out.push_str(&format!("tags: {}\n", a.emotional_tags.join(", ")));
    }
    if !a.reasoning.is_empty() {
        out.push_str(&format!("reasoning: {}\n", a.reasoning));
    }
    out.push_str(&format!(
        "track: {} [{}]\nurl: {}\nexpires: {}",
        rec.music.file_path,
        rec.music.mood,
        rec.music.streaming_url,
        rec.music.expires_at.to_rfc3339()
    ));
    out
}

pub fn moods_json(entries: &[MoodEntry]) -> Value {
    json!({
        "moods": entries,
        "total": entries.len(),
    })
}

pub fn moods_text(entries: &[MoodEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{:<13} {}", e.mood.as_str(), e.folders.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn health_text(report: &HealthReport) -> String {
    format!(
        "{} v{} bucket={} files={} empty_folders={}",
        report.status,
        report.version,
        report.bucket,
        report.total_files,
        report.catalog.empty_folders.len()
    )
}

pub fn catalog_json(catalog: &Catalog) -> Value {
    json!({
        "stats": catalog.stats(),
        "folders": catalog.folders(),
    })
}

pub fn catalog_text(catalog: &Catalog) -> String {
    let source = match catalog.source() {
        CatalogSource::Cached => "snapshot",
        CatalogSource::Live => "live",
    };
    let mut lines = vec![format!(
        "{} tracks ({} listing, built {})",
        catalog.total_tracks(),
        source,
        catalog.built_at().to_rfc3339()
    )];
    for f in catalog.folders() {
        lines.push(format!("  {:<32} {}", f.name, f.tracks));
    }
    lines.join("\n")
}
