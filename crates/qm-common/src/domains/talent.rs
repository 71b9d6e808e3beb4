//! 隠れた才能診断（0〜100 スケール）

use crate::{
    catalog::CandidateProfile,
    dimension::{Dimension, DimensionScale},
    matching::{QuizDefinition, ScoringConfig},
    question::{AnswerOption, Question},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TalentDimension {
    Analysis,
    Creativity,
    Empathy,
    Leadership,
    Craft,
    Endurance,
}

use TalentDimension::*;

impl Dimension for TalentDimension {
    const ALL: &'static [Self] = &[Analysis, Creativity, Empathy, Leadership, Craft, Endurance];

    fn key(self) -> &'static str {
        match self {
            Analysis => "analysis",
            Creativity => "creativity",
            Empathy => "empathy",
            Leadership => "leadership",
            Craft => "craft",
            Endurance => "endurance",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Analysis => "analytical thinking",
            Creativity => "creative spark",
            Empathy => "reading people",
            Leadership => "taking the lead",
            Craft => "hands-on craft",
            Endurance => "staying power",
        }
    }

    fn high_label(self) -> &'static str {
        match self {
            Analysis => "pattern-finder",
            Creativity => "idea-machine",
            Empathy => "people-reader",
            Leadership => "rallying-voice",
            Craft => "maker",
            Endurance => "marathoner",
        }
    }

    fn low_label(self) -> &'static str {
        match self {
            Analysis => "intuitive",
            Creativity => "by-the-book",
            Empathy => "task-focused",
            Leadership => "quiet-contributor",
            Craft => "big-picture",
            Endurance => "sprinter",
        }
    }
}

fn o(id: &str, label: &str, pairs: &[(TalentDimension, f64)]) -> AnswerOption<TalentDimension> {
    AnswerOption::new(id, label, pairs)
}

fn questions() -> Vec<Question<TalentDimension>> {
    vec![
        Question::new(
            "talent-puzzle",
            "A friend hands you a broken gadget. You...",
            1.2,
            vec![
                o("a", "Open it up and fix it", &[(Craft, 95.0), (Analysis, 70.0)]),
                o("b", "Look up the schematics first", &[(Analysis, 90.0), (Endurance, 60.0)]),
                o("c", "Turn it into something new", &[(Creativity, 95.0), (Craft, 70.0)]),
                o("d", "Ask who else has fixed one", &[(Empathy, 70.0), (Leadership, 60.0)]),
            ],
        ),
        Question::new(
            "talent-group",
            "In a group project you naturally...",
            1.3,
            vec![
                o("a", "Set the plan and deadlines", &[(Leadership, 95.0), (Analysis, 60.0)]),
                o("b", "Keep everyone getting along", &[(Empathy, 95.0)]),
                o("c", "Pitch the wild idea", &[(Creativity, 90.0), (Leadership, 55.0)]),
                o("d", "Quietly build the thing", &[(Craft, 90.0), (Leadership, 20.0)]),
            ],
        ),
        Question::new(
            "talent-stress",
            "When a task drags on for weeks...",
            1.1,
            vec![
                o("a", "I grind through, steady pace", &[(Endurance, 95.0)]),
                o(
                    "b",
                    "I lose interest and start something else",
                    &[(Endurance, 15.0), (Creativity, 75.0)],
                ),
                o("c", "I break it into a spreadsheet", &[(Analysis, 85.0), (Endurance, 70.0)]),
                o("d", "I find someone to keep me company", &[(Empathy, 75.0), (Endurance, 50.0)]),
            ],
        ),
        Question::new(
            "talent-compliment",
            "The compliment you hear most often:",
            1.35,
            vec![
                o("a", "You notice everything", &[(Analysis, 90.0), (Empathy, 60.0)]),
                o("b", "You're so easy to talk to", &[(Empathy, 95.0)]),
                o("c", "You never give up", &[(Endurance, 90.0), (Leadership, 60.0)]),
                o("d", "How did you make that?", &[(Craft, 95.0), (Creativity, 75.0)]),
            ],
        ),
        Question::new(
            "talent-free-day",
            "An unplanned free day. You...",
            1.0,
            vec![
                o("a", "Sketch, write or compose", &[(Creativity, 95.0)]),
                o("b", "Organise a get-together", &[(Leadership, 80.0), (Empathy, 75.0)]),
                o("c", "Learn a new system or game", &[(Analysis, 85.0)]),
                o("d", "Long run or long hike", &[(Endurance, 95.0), (Craft, 40.0)]),
            ],
        ),
        Question::new(
            "talent-conflict",
            "Two friends are arguing. You...",
            1.15,
            vec![
                o("a", "Mediate until both feel heard", &[(Empathy, 95.0), (Endurance, 65.0)]),
                o("b", "Make the call and move on", &[(Leadership, 90.0), (Empathy, 30.0)]),
                o("c", "Lay out the facts", &[(Analysis, 85.0), (Empathy, 40.0)]),
                o("d", "Crack a joke to reset the mood", &[(Creativity, 80.0), (Empathy, 65.0)]),
            ],
        ),
        Question::new(
            "talent-museum",
            "At a museum you linger at...",
            1.05,
            vec![
                o("a", "Ancient tools and how they were made", &[(Craft, 90.0), (Analysis, 60.0)]),
                o("b", "Abstract paintings", &[(Creativity, 90.0)]),
                o("c", "Portraits and the stories behind them", &[(Empathy, 85.0)]),
                o("d", "Maps of great campaigns", &[(Leadership, 85.0), (Analysis, 70.0)]),
            ],
        ),
    ]
}

fn candidates() -> Vec<CandidateProfile<TalentDimension>> {
    vec![
        CandidateProfile::new(
            "strategist",
            "The Strategist",
            1,
            &[
                (Analysis, 92.0), (Creativity, 45.0), (Empathy, 40.0),
                (Leadership, 70.0), (Craft, 40.0), (Endurance, 65.0),
            ],
        )
        .with_meta("You see three moves ahead and enjoy the chessboard.", &["logic", "planning"]),
        CandidateProfile::new(
            "storyteller",
            "The Storyteller",
            2,
            &[
                (Analysis, 40.0), (Creativity, 92.0), (Empathy, 75.0),
                (Leadership, 50.0), (Craft, 55.0), (Endurance, 35.0),
            ],
        )
        .with_meta("Ideas arrive faster than you can write them down.", &["imagination"]),
        CandidateProfile::new(
            "healer",
            "The Healer",
            3,
            &[
                (Analysis, 50.0), (Creativity, 50.0), (Empathy, 95.0),
                (Leadership, 40.0), (Craft, 35.0), (Endurance, 70.0),
            ],
        )
        .with_meta("People leave conversations with you feeling lighter.", &["care"]),
        CandidateProfile::new(
            "captain",
            "The Captain",
            4,
            &[
                (Analysis, 60.0), (Creativity, 45.0), (Empathy, 60.0),
                (Leadership, 95.0), (Craft, 35.0), (Endurance, 75.0),
            ],
        )
        .with_meta("Rooms reorganise themselves around you.", &["drive"]),
        CandidateProfile::new(
            "artisan",
            "The Artisan",
            5,
            &[
                (Analysis, 65.0), (Creativity, 70.0), (Empathy, 35.0),
                (Leadership, 25.0), (Craft, 95.0), (Endurance, 70.0),
            ],
        )
        .with_meta("Your hands think as well as your head.", &["making"]),
        CandidateProfile::new(
            "explorer",
            "The Explorer",
            6,
            &[
                (Analysis, 50.0), (Creativity, 60.0), (Empathy, 45.0),
                (Leadership, 55.0), (Craft, 50.0), (Endurance, 95.0),
            ],
        )
        .with_meta("The longer the road, the happier you are.", &["grit"]),
    ]
}

pub fn definition() -> QuizDefinition<TalentDimension> {
    QuizDefinition {
        title: "What is your hidden talent?",
        questions: questions(),
        candidates: candidates(),
        config: ScoringConfig::for_scale(DimensionScale::ZERO_TO_HUNDRED).with_env_overrides(),
        calibration: None,
        question_range: (5, 7),
        share_count: 0,
        subtype: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::ScoringEngine;

    #[test]
    fn definition_loads_on_hundred_scale() {
        let engine = ScoringEngine::new(definition()).expect("talent catalog is valid");
        assert_eq!(engine.config().scale.neutral(), 50.0);
        assert_eq!(engine.catalog().len(), 6);
    }

    #[test]
    fn empathetic_answers_find_the_healer() {
        let engine = ScoringEngine::new(definition()).unwrap();
        let questions = engine.questions();
        let answers = vec![
            Some("d"), // puzzle: ask others
            Some("b"), // group: keep everyone along
            Some("d"), // stress: company
            Some("b"), // compliment: easy to talk to
            Some("b"), // free day: get-together
            Some("a"), // conflict: mediate
            Some("c"), // museum: portraits
        ];

        let outcome = engine.evaluate(questions, &answers);
        assert_eq!(outcome.top().unwrap().candidate.id, "healer");
        assert!(outcome.top().unwrap().score <= 100.0);
        assert_eq!(outcome.tags.first().map(String::as_str), Some("people-reader"));
    }
}
