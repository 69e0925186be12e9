use chrono::{TimeZone, Utc};
use cli::render;
use mood_core::catalog::{Catalog, CatalogSource};
use mood_core::models::{MusicInfo, Recommendation, SceneAnalysis, Track};
use mood_core::moods::{Mood, MOOD_TABLE};
use std::collections::BTreeMap;

fn recommendation() -> Recommendation {
    Recommendation {
        analysis: SceneAnalysis::new(
            Mood::Exploration,
            Some(Mood::Peaceful),
            0.65,
            vec!["모험".to_string(), "설렘".to_string()],
            "숲 속 탐험",
        ),
        music: MusicInfo {
            mood: Mood::Exploration,
            filename: "Elven Glade.mp3".to_string(),
            file_path: "Fantasy_mp3/Elven Glade.mp3".to_string(),
            streaming_url: "https://storage.googleapis.com/scene-music/Fantasy_mp3/Elven%20Glade.mp3?X-Goog-Signature=ab".to_string(),
            expires_at: Utc.with_ymd_and_hms(2026, 3, 1, 13, 0, 0).unwrap(),
        },
    }
}

#[test]
fn recommendation_json_has_response_shape() {
    let v = render::recommendation_json(&recommendation()).unwrap();
    let keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["analysis", "music"]);
    assert_eq!(v["analysis"]["primary_mood"], "exploration");
    assert_eq!(v["analysis"]["secondary_mood"], "peaceful");
    assert_eq!(v["analysis"]["intensity"], 0.65);
    assert_eq!(v["music"]["mood"], "exploration");
    assert_eq!(v["music"]["file_path"], "Fantasy_mp3/Elven Glade.mp3");
    assert!(v["music"]["expires_at"].as_str().unwrap().starts_with("2026-03-01T13:00:00"));
}

#[test]
fn recommendation_text_lists_track_and_url() {
    let text = render::recommendation_text(&recommendation());
    assert!(text.starts_with("mood: exploration (secondary peaceful, intensity 0.65)"));
    assert!(text.contains("tags: 모험, 설렘"));
    assert!(text.contains("track: Fantasy_mp3/Elven Glade.mp3 [exploration]"));
    assert!(text.contains("url: https://storage.googleapis.com/"));
}

#[test]
fn moods_output_covers_the_table() {
    let v = render::moods_json(&MOOD_TABLE);
    assert_eq!(v["total"], 19);
    assert_eq!(v["moods"][0]["mood"], "peaceful");
    assert!(v["moods"][0].get("gloss").is_none());
    assert_eq!(render::moods_text(&MOOD_TABLE).lines().count(), 19);
}

#[test]
fn catalog_output_reports_empty_folders() {
    let mut folders = BTreeMap::new();
    folders.insert(
        "Fantasy_mp3".to_string(),
        vec![Track::new("Fantasy_mp3", "Elven Glade.mp3")],
    );
    folders.insert("Horror_mp3".to_string(), vec![]);
    let catalog = Catalog::new(folders, CatalogSource::Cached);

    let v = render::catalog_json(&catalog);
    assert_eq!(v["stats"]["total_tracks"], 1);
    assert_eq!(v["stats"]["source"], "cached");
    assert_eq!(v["stats"]["empty_folders"][0], "Horror_mp3");

    let text = render::catalog_text(&catalog);
    assert!(text.starts_with("1 tracks (snapshot listing"));
    assert!(text.contains("Horror_mp3"));
}
