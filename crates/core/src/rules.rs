//! Keyword correction rules applied after classification.
//!
//! The table is evaluated once, in order, and the first matching rule
//! rewrites `primary_mood`. No rule may match the analysis it produces, so
//! running the corrector twice gives the same result as running it once.

use crate::models::SceneAnalysis;
use crate::moods::Mood;
use tracing::info;

const CURIOSITY: &[&str] = &["호기심", "궁금", "신비"];
const TENSION: &[&str] = &["긴장", "조마조마"];
const FEAR: &[&str] = &["두려움", "공포", "무서운", "섬뜩", "오싹"];

#[derive(Debug, Clone, Copy)]
pub enum Precondition {
    PrimaryIs(&'static [Mood]),
    PrimaryIsNot(&'static [Mood]),
}

impl Precondition {
    fn holds(&self, primary: Mood) -> bool {
        match self {
            Precondition::PrimaryIs(moods) => moods.contains(&primary),
            Precondition::PrimaryIsNot(moods) => !moods.contains(&primary),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    /// Any of these in the scene text fires the rule.
    pub trigger: &'static [&'static str],
    /// Any of these in the scene text suppresses it.
    pub unless: &'static [&'static str],
    pub precondition: Option<Precondition>,
    pub target: Mood,
}

pub static CORRECTION_RULES: [Rule; 3] = [
    Rule {
        name: "curiosity_is_not_horror",
        trigger: CURIOSITY,
        unless: &[],
        precondition: Some(Precondition::PrimaryIs(&[Mood::Horror])),
        target: Mood::Mysterious,
    },
    Rule {
        name: "tension_is_not_horror",
        trigger: TENSION,
        unless: FEAR,
        precondition: Some(Precondition::PrimaryIs(&[Mood::Horror])),
        target: Mood::Suspense,
    },
    Rule {
        name: "explicit_fear_is_horror",
        trigger: FEAR,
        unless: CURIOSITY,
        precondition: Some(Precondition::PrimaryIsNot(&[Mood::Horror])),
        target: Mood::Horror,
    },
];

#[derive(Debug, Clone)]
pub struct RuleContext<'a> {
    pub text: &'a str,
    pub primary: Mood,
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

pub fn matches(rule: &Rule, ctx: &RuleContext<'_>) -> bool {
    ctx.primary != rule.target
        && rule.precondition.map_or(true, |p| p.holds(ctx.primary))
        && contains_any(ctx.text, rule.trigger)
        && !contains_any(ctx.text, rule.unless)
}

pub fn first_match<'a>(rules: &'a [Rule], ctx: &RuleContext<'_>) -> Option<&'a Rule> {
    rules.iter().find(|r| matches(r, ctx))
}

/// Applies `rules` to `analysis` for the given scene text.
pub fn correct_with(rules: &[Rule], analysis: SceneAnalysis, scene: &str) -> SceneAnalysis {
    let text = scene.to_lowercase();
    let ctx = RuleContext {
        text: &text,
        primary: analysis.primary_mood,
    };
    match first_match(rules, &ctx) {
        Some(rule) => {
            info!(
                rule = rule.name,
                from = %analysis.primary_mood,
                to = %rule.target,
                "correcting classified mood"
            );
            SceneAnalysis {
                primary_mood: rule.target,
                ..analysis
            }
        }
        None => analysis,
    }
}

pub fn correct(analysis: SceneAnalysis, scene: &str) -> SceneAnalysis {
    correct_with(&CORRECTION_RULES, analysis, scene)
}
