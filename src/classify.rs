//! Rule-based topic and project classification.
//!
//! A deterministic, pure function of the lower-cased `filename + " " + text`.
//! Topic scoring counts how many *distinct* keywords from each category's
//! table occur as substrings (presence per keyword, not occurrence count);
//! the strictly highest-scoring category wins, with ties resolved by the
//! fixed category order below. Project tagging is a list of ordered
//! first-match-wins substring rules.

use crate::models::Classification;

/// Topic categories in tie-break order, each with its keyword table.
pub const TOPIC_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Strategy",
        &[
            "strategy", "strategic", "plan", "planning", "roadmap", "vision",
            "objective", "goal", "mission", "approach", "framework", "methodology",
        ],
    ),
    (
        "Content",
        &[
            "content", "blog", "post", "article", "calendar", "schedule",
            "editorial", "publishing", "social media", "social", "campaign",
            "email", "newsletter", "draft", "writing",
        ],
    ),
    (
        "Report",
        &[
            "report", "results", "performance", "metrics", "analytics", "data",
            "analysis", "summary", "findings", "insights", "quarterly", "q1",
            "q2", "q3", "q4", "roi", "conversion", "engagement", "campaign results",
        ],
    ),
    (
        "Brief",
        &[
            "brief", "briefing", "overview", "summary", "outline", "proposal",
            "project brief", "campaign brief", "creative brief",
        ],
    ),
];

/// Project rules in precedence order; the first rule with any marker present
/// short-circuits the rest.
const PROJECT_RULES: &[(&str, &[&str])] = &[
    ("Project X", &["project x", "projectx", "proj x", "projx"]),
    ("Project Y", &["project y", "projecty", "proj y", "projy"]),
    ("Internal", &["internal", "team", "meeting"]),
];

/// Classify a document's text and filename into an optional topic and project.
pub fn classify(text: &str, filename: &str) -> Classification {
    let combined = format!("{} {}", filename.to_lowercase(), text.to_lowercase());

    // Strict `>` keeps the first category in table order on a tie, and a
    // zero maximum leaves the topic absent.
    let mut topic = None;
    let mut best = 0;
    for (name, keywords) in TOPIC_CATEGORIES {
        let score = keywords.iter().filter(|kw| combined.contains(*kw)).count();
        if score > best {
            best = score;
            topic = Some((*name).to_string());
        }
    }

    let mut project = None;
    for (name, markers) in PROJECT_RULES {
        if markers.iter().any(|m| combined.contains(m)) {
            project = Some((*name).to_string());
            break;
        }
    }

    Classification { topic, project }
}
