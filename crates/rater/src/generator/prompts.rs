use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use storage::models::{Competition, RatingCategory, TeamParticipation};

use crate::error::RaterError;

/// Prompt wording under evaluation. Each variant is exported separately so
/// results can be compared offline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptVariant {
    #[default]
    Standard,
    SpoilerSafe,
}

impl PromptVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::SpoilerSafe => "spoiler-safe",
        }
    }
}

impl fmt::Display for PromptVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptVariant {
    type Err = RaterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "spoiler-safe" | "spoiler_safe" => Ok(Self::SpoilerSafe),
            other => Err(RaterError::InvalidPayload(format!(
                "unknown prompt variant '{}'",
                other
            ))),
        }
    }
}

pub struct PromptBuilder;

impl PromptBuilder {
    pub fn system_prompt(variant: PromptVariant) -> String {
        let extra_rules = match variant {
            PromptVariant::Standard => "",
            PromptVariant::SpoilerSafe => {
                "\n   - The spoiler-free explanation must not reveal the winner, the final score, or whether the game went to overtime"
            }
        };

        format!(
            r#"You rate how exciting a finished sports game was to watch. Output ONLY valid JSON.

Schema:
{{
  "score": <integer 0-100>,
  "explanation": "<two or three sentences, may mention the result>",
  "spoiler_free_explanation": "<one or two sentences that do not reveal the result>"
}}

Scale:
{}

Rules:
   - Close scores, comebacks, late lead changes and overtime raise the score
   - Blowouts and low-event games lower the score
   - Consider what was at stake given both teams' records{}"#,
            Self::scale(),
            extra_rules
        )
    }

    pub fn user_prompt(competition: &Competition) -> String {
        let mut prompt = format!(
            "Rate this {} game from {}.\n\n",
            competition.sport, competition.period
        );

        let _ = writeln!(prompt, "Away: {}", Self::describe(competition.away()));
        let _ = writeln!(prompt, "Home: {}", Self::describe(competition.home()));

        if let Some(start_time) = competition.start_time {
            let _ = writeln!(prompt, "Kickoff: {}", start_time.format("%Y-%m-%d %H:%M UTC"));
        }

        prompt
    }

    fn describe(participation: &TeamParticipation) -> String {
        let mut line = participation.team.display_name.clone();
        if let Some(record) = participation.record {
            let _ = write!(line, " ({})", record);
        }
        match participation.score {
            Some(score) => {
                let _ = write!(line, ", final score {}", score);
            }
            None => line.push_str(", score unavailable"),
        }
        line
    }

    fn scale() -> String {
        RatingCategory::ALL
            .iter()
            .map(|category| {
                let (low, high) = category.bounds();
                format!("   - {}-{}: {}", low, high, category)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::competition;

    #[test]
    fn test_user_prompt_names_both_teams_and_scores() {
        let prompt = PromptBuilder::user_prompt(&competition("401547439"));

        assert!(prompt.contains("Away: Atlanta Falcons (10-7), final score 23"));
        assert!(prompt.contains("Home: Arizona Cardinals (10-7), final score 25"));
        assert!(prompt.contains("2023 regular week 10"));
    }

    #[test]
    fn test_system_prompt_lists_every_band() {
        let prompt = PromptBuilder::system_prompt(PromptVariant::Standard);
        assert!(prompt.contains("0-39: boring"));
        assert!(prompt.contains("95-100: legendary"));
        assert!(!prompt.contains("must not reveal the winner"));

        let spoiler_safe = PromptBuilder::system_prompt(PromptVariant::SpoilerSafe);
        assert!(spoiler_safe.contains("must not reveal the winner"));
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!(
            "spoiler_safe".parse::<PromptVariant>().unwrap(),
            PromptVariant::SpoilerSafe
        );
        assert!("verbose".parse::<PromptVariant>().is_err());
    }
}
