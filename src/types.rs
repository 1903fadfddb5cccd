// =============================================================================
// Shared types used across the TA dashboard
// =============================================================================

use serde::{Deserialize, Serialize};

/// One of the three overlays the dashboard can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Bollinger,
    Macd,
    Rsi,
}

impl Indicator {
    pub const ALL: [Indicator; 3] = [Self::Bollinger, Self::Macd, Self::Rsi];

    /// Human-readable label used by the presentation layer.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bollinger => "Bollinger Bands",
            Self::Macd => "MACD",
            Self::Rsi => "RSI",
        }
    }
}

impl std::fmt::Display for Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bollinger => write!(f, "bollinger"),
            Self::Macd => write!(f, "macd"),
            Self::Rsi => write!(f, "rsi"),
        }
    }
}

impl std::str::FromStr for Indicator {
    type Err = String;

    /// Accepts the short keys as well as the display labels, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bollinger" | "bb" | "bollinger bands" => Ok(Self::Bollinger),
            "macd" => Ok(Self::Macd),
            "rsi" => Ok(Self::Rsi),
            other => Err(format!(
                "unknown indicator '{other}'. Use 'bollinger', 'macd' or 'rsi'."
            )),
        }
    }
}

/// Parse a comma-separated indicator list. Empty entries are ignored and
/// duplicates collapse, preserving first-seen order.
pub fn parse_indicator_list(raw: &str) -> Result<Vec<Indicator>, String> {
    let mut out = Vec::new();
    for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let ind: Indicator = part.parse()?;
        if !out.contains(&ind) {
            out.push(ind);
        }
    }
    Ok(out)
}
