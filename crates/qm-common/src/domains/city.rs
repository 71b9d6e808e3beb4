//! 五行シティマッチ: 暮らし方の好みから相性の良い都市を選ぶ。
//! 候補数が多く上位が詰まりやすいので表示スコアは補正する。

use crate::{
    catalog::CandidateProfile,
    dimension::{Dimension, DimensionScale},
    matching::{CalibrationPolicy, QuizDefinition, ScoringConfig},
    question::{AnswerOption, Question},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CityDimension {
    Warmth,
    Pace,
    Cost,
    Nature,
    Heritage,
    Cuisine,
    Nightlife,
    Openness,
}

use CityDimension::*;

impl Dimension for CityDimension {
    const ALL: &'static [Self] = &[
        Warmth, Pace, Cost, Nature, Heritage, Cuisine, Nightlife, Openness,
    ];

    fn key(self) -> &'static str {
        match self {
            Warmth => "warmth",
            Pace => "pace",
            Cost => "cost",
            Nature => "nature",
            Heritage => "heritage",
            Cuisine => "cuisine",
            Nightlife => "nightlife",
            Openness => "openness",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Warmth => "climate warmth",
            Pace => "pace of life",
            Cost => "budget level",
            Nature => "nature access",
            Heritage => "history and heritage",
            Cuisine => "food culture",
            Nightlife => "nightlife",
            Openness => "openness to newcomers",
        }
    }

    fn high_label(self) -> &'static str {
        match self {
            Warmth => "sun-seeker",
            Pace => "fast-lane",
            Cost => "big-spender",
            Nature => "outdoorsy",
            Heritage => "history-buff",
            Cuisine => "foodie",
            Nightlife => "night-owl",
            Openness => "cosmopolitan",
        }
    }

    fn low_label(self) -> &'static str {
        match self {
            Warmth => "cool-climate",
            Pace => "slow-living",
            Cost => "budget-minded",
            Nature => "urbanite",
            Heritage => "future-facing",
            Cuisine => "simple-eater",
            Nightlife => "early-riser",
            Openness => "close-knit",
        }
    }
}

fn o(id: &str, label: &str, pairs: &[(CityDimension, f64)]) -> AnswerOption<CityDimension> {
    AnswerOption::new(id, label, pairs)
}

fn questions() -> Vec<Question<CityDimension>> {
    vec![
        Question::new(
            "city-weekend",
            "Your ideal free weekend looks like...",
            1.2,
            vec![
                o("a", "Hiking a misty mountain trail", &[(Nature, 9.0), (Pace, 3.0)]),
                o("b", "Museum hopping and old streets", &[(Heritage, 9.0), (Pace, 4.0)]),
                o("c", "Brunch, shopping, then a rooftop bar", &[(Nightlife, 8.0), (Cost, 7.0)]),
                o("d", "A long lazy teahouse afternoon", &[(Pace, 1.0), (Cuisine, 6.0)]),
            ],
        ),
        Question::new(
            "city-weather",
            "Which weather makes you happiest?",
            1.35,
            vec![
                o("a", "Tropical heat all year", &[(Warmth, 10.0)]),
                o("b", "Mild spring that lingers", &[(Warmth, 6.0)]),
                o("c", "Crisp four distinct seasons", &[(Warmth, 4.0), (Heritage, 6.0)]),
                o("d", "Cool sea breeze", &[(Warmth, 3.0), (Nature, 7.0)]),
            ],
        ),
        Question::new(
            "city-rent",
            "How much of your budget would you put into rent?",
            1.1,
            vec![
                o("a", "Whatever it takes for the view", &[(Cost, 10.0)]),
                o("b", "A comfortable middle", &[(Cost, 6.0)]),
                o("c", "As little as possible", &[(Cost, 2.0), (Pace, 4.0)]),
                o("d", "I'd rather spend it on food", &[(Cost, 4.0), (Cuisine, 9.0)]),
            ],
        ),
        Question::new(
            "city-commute",
            "Your dream commute is...",
            1.0,
            vec![
                o("a", "A packed metro, reading the news", &[(Pace, 9.0), (Openness, 7.0)]),
                o("b", "A bike ride along the lake", &[(Pace, 4.0), (Nature, 8.0)]),
                o("c", "Walking past temples and alleys", &[(Heritage, 8.0), (Pace, 3.0)]),
                o("d", "No commute, I work from a cafe", &[(Pace, 2.0), (Openness, 6.0)]),
            ],
        ),
        Question::new(
            "city-food",
            "Pick a late-night snack.",
            1.15,
            vec![
                o("a", "Numbing hotpot that burns", &[(Cuisine, 10.0), (Nightlife, 7.0)]),
                o("b", "Hand-pulled noodles at a stall", &[(Cuisine, 8.0), (Cost, 3.0)]),
                o("c", "Fresh seafood by the pier", &[(Cuisine, 7.0), (Nature, 6.0)]),
                o("d", "Whatever the delivery app finds", &[(Cuisine, 3.0), (Pace, 8.0)]),
            ],
        ),
        Question::new(
            "city-friends",
            "How do you make friends in a new place?",
            1.25,
            vec![
                o("a", "Meetups full of people from everywhere", &[(Openness, 10.0), (Pace, 7.0)]),
                o(
                    "b",
                    "Neighbours who've lived there forever",
                    &[(Openness, 3.0), (Heritage, 7.0)],
                ),
                o("c", "Clubs and live music", &[(Nightlife, 9.0), (Openness, 7.0)]),
                o("d", "I keep a small circle", &[(Openness, 4.0), (Nightlife, 2.0)]),
            ],
        ),
        Question::new(
            "city-night",
            "It's 11pm on a Friday. Where are you?",
            1.05,
            vec![
                o("a", "Still out, the night is young", &[(Nightlife, 10.0)]),
                o("b", "At a night market", &[(Nightlife, 7.0), (Cuisine, 8.0)]),
                o("c", "Home with a book", &[(Nightlife, 1.0), (Pace, 3.0)]),
                o("d", "Stargazing somewhere quiet", &[(Nightlife, 2.0), (Nature, 9.0)]),
            ],
        ),
        Question::new(
            "city-element",
            "Which element do you feel closest to?",
            1.3,
            vec![
                o("a", "Wood: growth and greenery", &[(Nature, 8.0), (Warmth, 6.0)]),
                o("b", "Fire: passion and spice", &[(Warmth, 8.0), (Cuisine, 8.0)]),
                o("c", "Metal: order and ambition", &[(Pace, 8.0), (Cost, 8.0)]),
                o("d", "Water: calm and flow", &[(Pace, 2.0), (Nature, 7.0), (Warmth, 4.0)]),
            ],
        ),
        Question::new(
            "city-history",
            "A city's past matters to you...",
            1.0,
            vec![
                o("a", "A lot, I want walls that tell stories", &[(Heritage, 10.0)]),
                o("b", "Some, mixed with modern life", &[(Heritage, 6.0), (Openness, 6.0)]),
                o("c", "Not much, I want what's next", &[(Heritage, 2.0), (Pace, 8.0)]),
                o("d", "Only if there's good food nearby", &[(Heritage, 5.0), (Cuisine, 8.0)]),
            ],
        ),
        Question::new(
            "city-career",
            "What should a city give your career?",
            1.2,
            vec![
                o(
                    "a",
                    "Speed and big opportunities",
                    &[(Pace, 10.0), (Cost, 8.0), (Openness, 8.0)],
                ),
                o("b", "Balance, time for a life outside work", &[(Pace, 4.0), (Cost, 5.0)]),
                o("c", "Room for creative side projects", &[(Openness, 7.0), (Cost, 3.0)]),
                o("d", "Nothing, I'm here to rest", &[(Pace, 1.0), (Nature, 7.0)]),
            ],
        ),
    ]
}

fn candidates() -> Vec<CandidateProfile<CityDimension>> {
    vec![
        CandidateProfile::new(
            "chengdu",
            "Chengdu",
            1,
            &[
                (Warmth, 6.0), (Pace, 3.0), (Cost, 4.0), (Nature, 6.0),
                (Heritage, 7.0), (Cuisine, 10.0), (Nightlife, 8.0), (Openness, 7.0),
            ],
        )
        .with_meta("Teahouses, hotpot and an easy-going rhythm.", &["fire", "earth"]),
        CandidateProfile::new(
            "hangzhou",
            "Hangzhou",
            2,
            &[
                (Warmth, 6.0), (Pace, 5.0), (Cost, 6.0), (Nature, 9.0),
                (Heritage, 8.0), (Cuisine, 6.0), (Nightlife, 4.0), (Openness, 6.0),
            ],
        )
        .with_meta("West Lake calm with a quietly ambitious tech scene.", &["water", "wood"]),
        CandidateProfile::new(
            "shenzhen",
            "Shenzhen",
            3,
            &[
                (Warmth, 8.0), (Pace, 10.0), (Cost, 9.0), (Nature, 5.0),
                (Heritage, 2.0), (Cuisine, 6.0), (Nightlife, 7.0), (Openness, 10.0),
            ],
        )
        .with_meta("A young city where everyone is from somewhere else.", &["metal", "fire"]),
        CandidateProfile::new(
            "xian",
            "Xi'an",
            4,
            &[
                (Warmth, 5.0), (Pace, 4.0), (Cost, 3.0), (Nature, 4.0),
                (Heritage, 10.0), (Cuisine, 8.0), (Nightlife, 6.0), (Openness, 5.0),
            ],
        )
        .with_meta("City walls, noodles and thirteen dynasties of stories.", &["earth", "metal"]),
        CandidateProfile::new(
            "dali",
            "Dali",
            5,
            &[
                (Warmth, 6.0), (Pace, 1.0), (Cost, 3.0), (Nature, 10.0),
                (Heritage, 6.0), (Cuisine, 5.0), (Nightlife, 3.0), (Openness, 8.0),
            ],
        )
        .with_meta("Mountains, lake and nowhere in particular to be.", &["wood", "water"]),
        CandidateProfile::new(
            "qingdao",
            "Qingdao",
            6,
            &[
                (Warmth, 4.0), (Pace, 5.0), (Cost, 5.0), (Nature, 8.0),
                (Heritage, 5.0), (Cuisine, 7.0), (Nightlife, 6.0), (Openness, 6.0),
            ],
        )
        .with_meta("Sea breeze, red roofs and beer by the bag.", &["water", "metal"]),
        CandidateProfile::new(
            "chongqing",
            "Chongqing",
            7,
            &[
                (Warmth, 8.0), (Pace, 7.0), (Cost, 4.0), (Nature, 5.0),
                (Heritage, 6.0), (Cuisine, 10.0), (Nightlife, 10.0), (Openness, 6.0),
            ],
        )
        .with_meta("A vertical city that never turns the lights off.", &["fire", "water"]),
        CandidateProfile::new(
            "beijing",
            "Beijing",
            8,
            &[
                (Warmth, 4.0), (Pace, 9.0), (Cost, 8.0), (Nature, 3.0),
                (Heritage, 9.0), (Cuisine, 7.0), (Nightlife, 7.0), (Openness, 8.0),
            ],
        )
        .with_meta("Hutongs and headquarters, side by side.", &["metal", "earth"]),
    ]
}

pub fn definition() -> QuizDefinition<CityDimension> {
    QuizDefinition {
        title: "Which city matches your elements?",
        questions: questions(),
        candidates: candidates(),
        config: ScoringConfig::for_scale(DimensionScale::ZERO_TO_TEN).with_env_overrides(),
        calibration: Some(CalibrationPolicy::default()),
        question_range: (6, 8),
        share_count: 0,
        subtype: None,
    }
}
