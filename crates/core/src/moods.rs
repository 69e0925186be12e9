//! The fixed mood table: every mood with its Korean keywords and the storage
//! folders that hold matching tracks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Peaceful,
    Romantic,
    Mysterious,
    Suspense,
    Horror,
    Action,
    Fantasy,
    Epic,
    Comedy,
    Uplifting,
    Sad,
    Exploration,
    Dramatic,
    Tension,
    Wonder,
    Curious,
    Isolation,
    Nostalgic,
    DarkComedy,
}

/// Mood used when classification fails and as the last selection tier.
pub const DEFAULT_MOOD: Mood = Mood::Peaceful;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MoodEntry {
    pub mood: Mood,
    /// Short Korean gloss shown to the classifier.
    #[serde(skip)]
    pub gloss: &'static str,
    pub keywords: &'static [&'static str],
    pub folders: &'static [&'static str],
}

pub static MOOD_TABLE: [MoodEntry; 19] = [
    MoodEntry {
        mood: Mood::Peaceful,
        gloss: "평화로운, 차분한",
        keywords: &["평화", "평온", "고요", "잔잔", "평화로운", "차분한"],
        folders: &["Miscellaneous_Chill_mp3", "Miscellaneous_Classical_mp3"],
    },
    MoodEntry {
        mood: Mood::Romantic,
        gloss: "로맨틱한, 사랑스러운",
        keywords: &["로맨틱", "사랑", "로맨스", "달콤한", "감성적", "낭만적"],
        folders: &["romantic", "Romantic_Sentimental_mp3"],
    },
    MoodEntry {
        mood: Mood::Mysterious,
        gloss: "신비로운, 미스터리한 - 호기심, 궁금증이 있을 때",
        keywords: &["신비", "미스터리", "불가사의", "수수께끼", "호기심"],
        folders: &["Underscoring_mp3", "Electronic_mp3"],
    },
    MoodEntry {
        mood: Mood::Suspense,
        gloss: "긴장감 있는, 스릴 있는 - 긴장되지만 공포스럽지 않은",
        keywords: &["긴장", "스릴", "서스펜스", "조마조마"],
        folders: &["Underscoring_mp3", "Epic_Dramatic_mp3"],
    },
    MoodEntry {
        mood: Mood::Horror,
        gloss: "공포스러운, 무서운 - 두려움, 공포가 있을 때만",
        keywords: &["공포", "무서운", "두려움", "섬뜩한", "오싹한"],
        folders: &["Horror_mp3"],
    },
    MoodEntry {
        mood: Mood::Action,
        gloss: "액션, 전투",
        keywords: &["액션", "전투", "격렬", "싸움", "강렬한"],
        folders: &["Epic_Dramatic_mp3", "Electronic_mp3"],
    },
    MoodEntry {
        mood: Mood::Fantasy,
        gloss: "판타지, 마법",
        keywords: &["판타지", "마법", "환상", "신비로운"],
        folders: &["Fantasy_mp3", "World_mp3"],
    },
    MoodEntry {
        mood: Mood::Epic,
        gloss: "웅장한, 서사적인",
        keywords: &["웅장", "장엄", "대서사", "영웅적", "위대한"],
        folders: &["Epic_Dramatic_mp3"],
    },
    MoodEntry {
        mood: Mood::Comedy,
        gloss: "코미디, 유쾌한",
        keywords: &["코미디", "재미있는", "유쾌한", "웃긴", "경쾌한"],
        folders: &["Comedy_mp3", "Uplifting_mp3"],
    },
    MoodEntry {
        mood: Mood::Uplifting,
        gloss: "신나는, 활기찬",
        keywords: &["신나는", "즐거운", "활기찬", "상쾌한", "밝은"],
        folders: &["Uplifting_mp3", "Electronic_mp3"],
    },
    MoodEntry {
        mood: Mood::Sad,
        gloss: "슬픈, 우울한",
        keywords: &["슬픈", "우울", "애수", "비극적", "눈물"],
        folders: &["Romantic_Sentimental_mp3", "Underscoring_mp3"],
    },
    MoodEntry {
        mood: Mood::Exploration,
        gloss: "탐험, 모험",
        keywords: &["탐험", "모험", "여행", "발견", "탐사"],
        folders: &["Fantasy_mp3", "World_mp3", "Miscellaneous_World_Folk_mp3"],
    },
    MoodEntry {
        mood: Mood::Dramatic,
        gloss: "극적인, 드라마틱한",
        keywords: &["드라마틱", "극적", "강렬", "감동적"],
        folders: &["Epic_Dramatic_mp3", "Romantic_Sentimental_mp3"],
    },
    MoodEntry {
        mood: Mood::Tension,
        gloss: "긴장감, 팽팽한",
        keywords: &["긴장감", "팽팽한", "압박", "조급한"],
        folders: &["Underscoring_mp3", "Electronic_mp3"],
    },
    MoodEntry {
        mood: Mood::Wonder,
        gloss: "경이로운, 놀라운",
        keywords: &["경이", "놀라운", "신기한", "감탄"],
        folders: &["Fantasy_mp3", "Uplifting_mp3"],
    },
    MoodEntry {
        mood: Mood::Curious,
        gloss: "호기심 많은, 흥미로운",
        keywords: &["호기심", "궁금한", "흥미로운"],
        folders: &["Underscoring_mp3", "World_mp3"],
    },
    MoodEntry {
        mood: Mood::Isolation,
        gloss: "고립된, 외로운",
        keywords: &["고립", "외로운", "쓸쓸한", "단절"],
        folders: &["Underscoring_mp3", "Miscellaneous_Chill_mp3"],
    },
    MoodEntry {
        mood: Mood::Nostalgic,
        gloss: "향수, 그리운",
        keywords: &["향수", "그리운", "추억", "옛날"],
        folders: &["Miscellaneous_Classical_mp3", "Miscellaneous_Jazz_mp3"],
    },
    MoodEntry {
        mood: Mood::DarkComedy,
        gloss: "블랙코미디, 냉소적",
        keywords: &["블랙코미디", "아이러니", "냉소적"],
        folders: &["Comedy_mp3", "Underscoring_mp3"],
    },
];

impl Mood {
    pub const ALL: [Mood; 19] = [
        Mood::Peaceful,
        Mood::Romantic,
        Mood::Mysterious,
        Mood::Suspense,
        Mood::Horror,
        Mood::Action,
        Mood::Fantasy,
        Mood::Epic,
        Mood::Comedy,
        Mood::Uplifting,
        Mood::Sad,
        Mood::Exploration,
        Mood::Dramatic,
        Mood::Tension,
        Mood::Wonder,
        Mood::Curious,
        Mood::Isolation,
        Mood::Nostalgic,
        Mood::DarkComedy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Peaceful => "peaceful",
            Mood::Romantic => "romantic",
            Mood::Mysterious => "mysterious",
            Mood::Suspense => "suspense",
            Mood::Horror => "horror",
            Mood::Action => "action",
            Mood::Fantasy => "fantasy",
            Mood::Epic => "epic",
            Mood::Comedy => "comedy",
            Mood::Uplifting => "uplifting",
            Mood::Sad => "sad",
            Mood::Exploration => "exploration",
            Mood::Dramatic => "dramatic",
            Mood::Tension => "tension",
            Mood::Wonder => "wonder",
            Mood::Curious => "curious",
            Mood::Isolation => "isolation",
            Mood::Nostalgic => "nostalgic",
            Mood::DarkComedy => "dark_comedy",
        }
    }

    pub fn entry(self) -> &'static MoodEntry {
        // Table rows are declared in the same order as `Mood::ALL`.
        &MOOD_TABLE[self as usize]
    }

    pub fn keywords(self) -> &'static [&'static str] {
        self.entry().keywords
    }

    pub fn folders(self) -> &'static [&'static str] {
        self.entry().folders
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mood: {0}")]
pub struct UnknownMood(pub String);

impl FromStr for Mood {
    type Err = UnknownMood;

    /// Case-insensitive; tolerates surrounding whitespace and `-`/space in
    /// place of `_` ("Dark Comedy" parses as `dark_comedy`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_lowercase().replace(['-', ' '], "_");
        Mood::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == norm)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

/// Every folder referenced by the table, deduplicated, in first-seen order.
pub fn all_folders() -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for entry in MOOD_TABLE.iter() {
        for folder in entry.folders {
            if !out.contains(folder) {
                out.push(folder);
            }
        }
    }
    out
}
