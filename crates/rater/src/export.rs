use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storage::models::{Competition, Rating, RatingCategory, RatingSource, RatingType};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::generator::PromptVariant;

/// One evaluated (competition, prompt variant) pair, as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub competition_id: String,
    pub matchup: String,
    pub prompt_variant: String,
    pub score: u8,
    pub category: RatingCategory,
    pub explanation: String,
    pub spoiler_free_explanation: String,
    pub source: RatingSource,
    pub rating_type: RatingType,
    pub generated_at: DateTime<Utc>,
}

impl EvaluationRecord {
    pub fn new(competition: &Competition, variant: PromptVariant, rating: &Rating) -> Self {
        Self {
            competition_id: competition.competition_id.clone(),
            matchup: competition.matchup(),
            prompt_variant: variant.as_str().to_string(),
            score: rating.score.value(),
            category: rating.category(),
            explanation: rating.explanation.clone(),
            spoiler_free_explanation: rating.spoiler_free_explanation.clone(),
            source: rating.source,
            rating_type: rating.rating_type,
            generated_at: rating.generated_at,
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.json",
            self.generated_at.format("%Y%m%dT%H%M%S%3fZ"),
            sanitize(&self.competition_id),
            self.prompt_variant
        )
    }
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Writes evaluation records into a directory. Existing files are never
/// overwritten.
pub struct EvaluationExporter {
    dir: PathBuf,
}

impl EvaluationExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn write(&self, record: &EvaluationRecord) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(record.file_name());

        let json = serde_json::to_string_pretty(record)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(json.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RaterError;
    use crate::test_support::{competition, rating};

    #[tokio::test]
    async fn test_writes_one_file_per_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = EvaluationExporter::new(dir.path().join("evals"));
        let record = EvaluationRecord::new(
            &competition("401547439"),
            PromptVariant::SpoilerSafe,
            &rating(92, RatingSource::Ollama),
        );

        let path = exporter.write(&record).await.unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("_401547439_spoiler-safe.json"), "{}", name);

        let written: EvaluationRecord =
            serde_json::from_str(&fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(written, record);
        assert_eq!(written.matchup, "Atlanta Falcons @ Arizona Cardinals");
        assert_eq!(written.category, RatingCategory::Amazing);
    }

    #[tokio::test]
    async fn test_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = EvaluationExporter::new(dir.path());
        let record = EvaluationRecord::new(
            &competition("1"),
            PromptVariant::Standard,
            &rating(50, RatingSource::Ollama),
        );

        let path = exporter.write(&record).await.unwrap();
        let first = fs::read_to_string(&path).await.unwrap();
        let err = exporter.write(&record).await.unwrap_err();

        match err {
            RaterError::IoError(e) => assert_eq!(e.kind(), std::io::ErrorKind::AlreadyExists),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(fs::read_to_string(&path).await.unwrap(), first);
    }
}
