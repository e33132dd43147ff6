use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

static LABEL_RE: OnceLock<Regex> = OnceLock::new();
static LEVEL_RE: OnceLock<Regex> = OnceLock::new();

fn label_re() -> &'static Regex {
    LABEL_RE.get_or_init(|| {
        Regex::new(r"(?i)risk\s+(?:score|level|rating)").expect("risk label pattern is valid")
    })
}

fn level_re() -> &'static Regex {
    LEVEL_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(low|medium|moderate|high)\b").expect("risk level pattern is valid")
    })
}

/// Categorical score the risk analyst is asked to end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" | "moderate" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(format!("Unknown risk level: {}", s)),
        }
    }
}

/// Find the final risk score in a risk report.
///
/// Lines naming a risk score/level/rating take precedence (the last such
/// line wins, using the last level word on it, or on the next non-empty
/// line when the line is only a heading). Otherwise the last standalone
/// Low/Medium/High in the text is used.
pub fn extract_risk_level(text: &str) -> Option<RiskLevel> {
    let label = label_re();
    let level = level_re();

    let last_level_in = |line: &str| -> Option<RiskLevel> {
        level
            .find_iter(line)
            .last()
            .and_then(|m| m.as_str().parse().ok())
    };

    let lines: Vec<&str> = text.lines().collect();
    let mut labelled = None;
    for (idx, line) in lines.iter().enumerate() {
        if !label.is_match(line) {
            continue;
        }
        let found = last_level_in(line).or_else(|| {
            lines[idx + 1..]
                .iter()
                .find(|l| !l.trim().is_empty())
                .and_then(|l| last_level_in(*l))
        });
        if found.is_some() {
            labelled = found;
        }
    }

    labelled.or_else(|| last_level_in(text))
}
