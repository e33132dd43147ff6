mod risk;

pub use risk::{extract_risk_level, RiskLevel};
