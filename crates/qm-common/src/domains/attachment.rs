//! 恋愛・愛着スタイル診断
//!
//! 不安 (anxiety) と回避 (avoidance) の2軸の象限からサブタイプを導き、
//! 上位3タイプは合計100%の割合でも返す。

use crate::{
    catalog::CandidateProfile,
    dimension::{Dimension, DimensionScale},
    matching::{PreferenceProfile, QuizDefinition, ScoringConfig},
    question::{AnswerOption, Question},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttachmentDimension {
    Anxiety,
    Avoidance,
    Expressiveness,
    Independence,
    Commitment,
    Adventure,
}

use AttachmentDimension::*;

impl Dimension for AttachmentDimension {
    const ALL: &'static [Self] = &[
        Anxiety,
        Avoidance,
        Expressiveness,
        Independence,
        Commitment,
        Adventure,
    ];

    fn key(self) -> &'static str {
        match self {
            Anxiety => "anxiety",
            Avoidance => "avoidance",
            Expressiveness => "expressiveness",
            Independence => "independence",
            Commitment => "commitment",
            Adventure => "adventure",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Anxiety => "need for reassurance",
            Avoidance => "need for distance",
            Expressiveness => "openness with feelings",
            Independence => "personal space",
            Commitment => "long-term focus",
            Adventure => "appetite for novelty",
        }
    }

    fn high_label(self) -> &'static str {
        match self {
            Anxiety => "reassurance-seeker",
            Avoidance => "self-reliant",
            Expressiveness => "heart-on-sleeve",
            Independence => "free-spirit",
            Commitment => "all-in",
            Adventure => "thrill-seeker",
        }
    }

    fn low_label(self) -> &'static str {
        match self {
            Anxiety => "unbothered",
            Avoidance => "close-keeper",
            Expressiveness => "reserved",
            Independence => "together-always",
            Commitment => "go-with-the-flow",
            Adventure => "homebody",
        }
    }
}

fn o(
    id: &str,
    label: &str,
    pairs: &[(AttachmentDimension, f64)],
) -> AnswerOption<AttachmentDimension> {
    AnswerOption::new(id, label, pairs)
}

fn questions() -> Vec<Question<AttachmentDimension>> {
    vec![
        Question::new(
            "love-reply",
            "Your partner hasn't replied for three hours. You...",
            1.35,
            vec![
                o("a", "Barely notice", &[(Anxiety, 1.0), (Independence, 7.0)]),
                o(
                    "b",
                    "Send a second message, just in case",
                    &[(Anxiety, 8.0), (Expressiveness, 6.0)],
                ),
                o("c", "Assume they're busy and carry on", &[(Anxiety, 3.0), (Avoidance, 3.0)]),
                o(
                    "d",
                    "Feel a bit relieved to have time alone",
                    &[(Avoidance, 8.0), (Independence, 8.0)],
                ),
            ],
        ),
        Question::new(
            "love-conflict",
            "After an argument you usually...",
            1.3,
            vec![
                o(
                    "a",
                    "Want to talk it through right away",
                    &[(Expressiveness, 9.0), (Anxiety, 6.0)],
                ),
                o("b", "Need a day to cool off alone", &[(Avoidance, 7.0), (Expressiveness, 3.0)]),
                o("c", "Apologise first, even if unsure", &[(Anxiety, 8.0), (Commitment, 7.0)]),
                o(
                    "d",
                    "Talk once both of you are calm",
                    &[(Anxiety, 2.0), (Avoidance, 2.0), (Expressiveness, 7.0)],
                ),
            ],
        ),
        Question::new(
            "love-future",
            "Talking about moving in together feels...",
            1.2,
            vec![
                o("a", "Exciting, let's plan it", &[(Commitment, 9.0), (Avoidance, 2.0)]),
                o("b", "A little suffocating", &[(Avoidance, 8.0), (Commitment, 3.0)]),
                o("c", "Fine, when the time is right", &[(Commitment, 6.0), (Anxiety, 3.0)]),
                o(
                    "d",
                    "Scary but I want it",
                    &[(Anxiety, 7.0), (Avoidance, 4.0), (Commitment, 6.0)],
                ),
            ],
        ),
        Question::new(
            "love-weekend",
            "An ideal weekend as a couple:",
            1.0,
            vec![
                o("a", "Last-minute road trip", &[(Adventure, 9.0), (Independence, 5.0)]),
                o("b", "Cooking at home together", &[(Adventure, 2.0), (Commitment, 7.0)]),
                o(
                    "c",
                    "Each doing our own thing, dinner after",
                    &[(Independence, 9.0), (Avoidance, 5.0)],
                ),
                o("d", "Meeting each other's friends", &[(Expressiveness, 7.0), (Adventure, 6.0)]),
            ],
        ),
        Question::new(
            "love-feelings",
            "Saying \"I love you\" first is...",
            1.25,
            vec![
                o("a", "Easy, I say what I feel", &[(Expressiveness, 9.0), (Anxiety, 3.0)]),
                o(
                    "b",
                    "Terrifying, what if they don't say it back",
                    &[(Anxiety, 9.0), (Expressiveness, 4.0)],
                ),
                o(
                    "c",
                    "Something I'd rather show than say",
                    &[(Expressiveness, 3.0), (Avoidance, 6.0)],
                ),
                o("d", "Fine once I'm sure it's mutual", &[(Anxiety, 5.0), (Commitment, 7.0)]),
            ],
        ),
        Question::new(
            "love-space",
            "When your partner wants a solo trip you...",
            1.1,
            vec![
                o("a", "Help them plan it", &[(Anxiety, 2.0), (Independence, 7.0)]),
                o("b", "Worry the whole time", &[(Anxiety, 9.0), (Independence, 2.0)]),
                o(
                    "c",
                    "Book one of your own",
                    &[(Independence, 9.0), (Adventure, 7.0), (Avoidance, 6.0)],
                ),
                o("d", "Ask to come along", &[(Independence, 2.0), (Commitment, 7.0)]),
            ],
        ),
        Question::new(
            "love-past",
            "Looking back at past relationships...",
            1.15,
            vec![
                o(
                    "a",
                    "I stayed close to most exes",
                    &[(Anxiety, 3.0), (Avoidance, 2.0), (Expressiveness, 7.0)],
                ),
                o(
                    "b",
                    "I often left before things got deep",
                    &[(Avoidance, 9.0), (Commitment, 2.0)],
                ),
                o("c", "I was usually the one holding on", &[(Anxiety, 8.0), (Commitment, 8.0)]),
                o("d", "They were short and exciting", &[(Adventure, 9.0), (Commitment, 3.0)]),
            ],
        ),
        Question::new(
            "love-surprise",
            "Your partner plans a surprise party for you. You feel...",
            1.05,
            vec![
                o("a", "Over the moon", &[(Expressiveness, 8.0), (Adventure, 7.0)]),
                o("b", "Touched, if a bit exposed", &[(Avoidance, 5.0), (Expressiveness, 5.0)]),
                o(
                    "c",
                    "Uneasy about all the attention",
                    &[(Avoidance, 7.0), (Expressiveness, 2.0)],
                ),
                o("d", "Relieved they care this much", &[(Anxiety, 7.0), (Commitment, 7.0)]),
            ],
        ),
    ]
}

fn candidates() -> Vec<CandidateProfile<AttachmentDimension>> {
    vec![
        CandidateProfile::new(
            "anchor",
            "The Anchor",
            1,
            &[
                (Anxiety, 2.5), (Avoidance, 2.5), (Expressiveness, 7.0),
                (Independence, 6.0), (Commitment, 7.5), (Adventure, 5.0),
            ],
        )
        .with_meta("Steady, warm and easy to rely on.", &["secure"]),
        CandidateProfile::new(
            "flame",
            "The Flame",
            2,
            &[
                (Anxiety, 8.0), (Avoidance, 2.5), (Expressiveness, 8.0),
                (Independence, 3.0), (Commitment, 8.0), (Adventure, 5.0),
            ],
        )
        .with_meta("You love deeply and want to hear it back.", &["anxious"]),
        CandidateProfile::new(
            "island",
            "The Island",
            3,
            &[
                (Anxiety, 2.5), (Avoidance, 8.0), (Expressiveness, 3.0),
                (Independence, 8.5), (Commitment, 4.0), (Adventure, 6.0),
            ],
        )
        .with_meta("Close on your own terms, with a door you can always open.", &["avoidant"]),
        CandidateProfile::new(
            "tide",
            "The Tide",
            4,
            &[
                (Anxiety, 7.5), (Avoidance, 7.5), (Expressiveness, 4.0),
                (Independence, 6.0), (Commitment, 4.0), (Adventure, 5.0),
            ],
        )
        .with_meta("Pulled toward closeness and away from it in turn.", &["fearful"]),
        CandidateProfile::new(
            "wanderer",
            "The Wanderer",
            5,
            &[
                (Anxiety, 3.5), (Avoidance, 5.5), (Expressiveness, 6.0),
                (Independence, 8.0), (Commitment, 3.0), (Adventure, 9.0),
            ],
        )
        .with_meta("Romance is best on the move.", &["free"]),
    ]
}

/// 不安 × 回避 の象限。どちらも未回答ならサブタイプなし。
pub fn attachment_subtype(
    preference: &PreferenceProfile<AttachmentDimension>,
    config: &ScoringConfig,
) -> Option<String> {
    if !preference.is_covered(Anxiety) && !preference.is_covered(Avoidance) {
        return None;
    }

    let neutral = config.scale.neutral();
    let anxious = preference.value(Anxiety) > neutral;
    let avoidant = preference.value(Avoidance) > neutral;

    let label = match (anxious, avoidant) {
        (false, false) => "secure",
        (true, false) => "anxious",
        (false, true) => "avoidant",
        (true, true) => "fearful",
    };
    Some(label.to_string())
}

pub fn definition() -> QuizDefinition<AttachmentDimension> {
    QuizDefinition {
        title: "What is your attachment style?",
        questions: questions(),
        candidates: candidates(),
        config: ScoringConfig::for_scale(DimensionScale::ZERO_TO_TEN).with_env_overrides(),
        calibration: None,
        question_range: (6, 8),
        share_count: 3,
        subtype: Some(attachment_subtype),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dimension::filled, matching::ScoringEngine};

    fn profile(
        anxiety: Option<f64>,
        avoidance: Option<f64>,
    ) -> PreferenceProfile<AttachmentDimension> {
        let mut pref = PreferenceProfile::neutral(DimensionScale::ZERO_TO_TEN);
        pref.weights = filled(0.0);
        if let Some(v) = anxiety {
            pref.vector.insert(Anxiety, v);
            pref.weights.insert(Anxiety, 1.0);
        }
        if let Some(v) = avoidance {
            pref.vector.insert(Avoidance, v);
            pref.weights.insert(Avoidance, 1.0);
        }
        pref
    }

    #[test]
    fn subtype_follows_quadrant() {
        let config = ScoringConfig::default();
        let cases = [
            (Some(2.0), Some(2.0), "secure"),
            (Some(8.0), Some(3.0), "anxious"),
            (Some(3.0), Some(8.0), "avoidant"),
            (Some(8.0), Some(8.0), "fearful"),
            (Some(7.0), None, "anxious"),
        ];
        for (anx, avo, expected) in cases {
            assert_eq!(
                attachment_subtype(&profile(anx, avo), &config).as_deref(),
                Some(expected),
                "{anx:?} {avo:?}"
            );
        }
        assert_eq!(attachment_subtype(&profile(None, None), &config), None);
    }

    #[test]
    fn clingy_answers_produce_anxious_mix() {
        let engine = ScoringEngine::new(definition()).expect("attachment catalog is valid");
        let questions = engine.questions();
        let answers = vec![
            Some("b"), // reply: second message
            Some("c"), // conflict: apologise first
            Some("d"), // future: scary but wanted
            Some("b"), // weekend: cooking
            Some("b"), // feelings: terrifying
            Some("b"), // space: worry
            Some("c"), // past: holding on
            Some("d"), // surprise: relieved
        ];

        let outcome = engine.evaluate(questions, &answers);
        assert_eq!(outcome.top().unwrap().candidate.id, "flame");
        assert_eq!(outcome.subtype.as_deref(), Some("anxious"));
        assert_eq!(outcome.shares.len(), 3);
        assert_eq!(outcome.shares.iter().map(|(_, s)| s).sum::<u32>(), 100);
        assert_eq!(outcome.shares[0].0, "flame");
    }
}
