use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rater::{
    enumerator::{EnumeratorLimits, PeriodEnumerator},
    export::EvaluationExporter,
    generator::{OllamaClient, OllamaRatingGenerator, PromptVariant},
    jobs::{JobPayload, JobQueue, PgJobQueue, RatingJobConsumer},
    observer::{PipelineObserver, TracingObserver},
    use_cases::{EvaluateRating, GenerateRating, GenerateRatingInput, RatingOutcome},
};
use storage::{Database, PgCompetitionStore, models::Sport};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rater")]
#[command(about = "Competition excitement rating worker and tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[command(flatten)]
    ollama: OllamaArgs,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::Args)]
struct OllamaArgs {
    #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    ollama_url: String,

    #[arg(long, env = "OLLAMA_MODEL", default_value = "qwen2.5:7b")]
    ollama_model: String,

    #[arg(long, env = "GENERATOR_TIMEOUT_SECS", default_value_t = 120)]
    generator_timeout_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume rating jobs until interrupted
    Worker {
        /// Number of consumers polling the queue
        #[arg(long, default_value_t = 1)]
        consumers: usize,

        /// Seconds a claimed job may run before another worker may claim it
        #[arg(long, env = "JOB_LEASE_SECS", default_value_t = 600)]
        lease_secs: u64,
    },
    /// Rate one competition now and store the result
    Rate {
        competition_id: String,

        #[arg(long)]
        force: bool,
    },
    /// Rate one competition without storing it and write the result to a file
    Evaluate {
        competition_id: String,

        #[arg(long, default_value = "standard")]
        variant: PromptVariant,

        #[arg(long, default_value = "./evaluations")]
        output: PathBuf,
    },
    /// Queue a rating job
    Enqueue {
        competition_id: String,

        #[arg(long)]
        force: bool,
    },
    /// List the most recent competitions of a sport with their ratings
    Recent {
        #[arg(long)]
        sport: Sport,

        #[arg(long, default_value_t = 10)]
        max_periods: usize,

        #[arg(long, default_value_t = 50)]
        max_competitions: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("rater={},storage={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database = Database::new(&cli.database_url).await?;

    match cli.command {
        Commands::Worker {
            consumers,
            lease_secs,
        } => {
            handle_worker(
                &database,
                &cli.ollama,
                consumers,
                Duration::from_secs(lease_secs),
            )
            .await?;
        }
        Commands::Rate {
            competition_id,
            force,
        } => {
            handle_rate(&database, &cli.ollama, competition_id, force).await?;
        }
        Commands::Evaluate {
            competition_id,
            variant,
            output,
        } => {
            handle_evaluate(&database, &cli.ollama, &competition_id, variant, output).await?;
        }
        Commands::Enqueue {
            competition_id,
            force,
        } => {
            let queue = PgJobQueue::new(database.pool().clone());
            let job_id = queue
                .enqueue(&JobPayload::sentiment_analysis(competition_id.clone(), force))
                .await?;
            tracing::info!(%job_id, competition_id, "Rating job queued");
        }
        Commands::Recent {
            sport,
            max_periods,
            max_competitions,
        } => {
            handle_recent(
                &database,
                sport,
                EnumeratorLimits {
                    max_periods,
                    max_competitions,
                },
            )
            .await?;
        }
    }

    Ok(())
}

fn build_generator(
    args: &OllamaArgs,
    variant: PromptVariant,
) -> Result<OllamaRatingGenerator, Box<dyn std::error::Error>> {
    let timeout = Duration::from_secs(args.generator_timeout_secs);
    let client = OllamaClient::new(args.ollama_url.clone(), args.ollama_model.clone(), timeout)?;
    Ok(OllamaRatingGenerator::new(client, variant, timeout))
}

async fn check_generator(generator: &OllamaRatingGenerator) {
    let client = generator.client();
    match client.verify_model().await {
        Ok(true) => tracing::info!(model = client.model(), "Ollama model available"),
        Ok(false) => tracing::warn!(
            model = client.model(),
            "Ollama model not installed, ratings will fail until it is pulled"
        ),
        Err(e) => tracing::warn!(error = %e, "Ollama is not reachable"),
    }
}

async fn handle_worker(
    database: &Database,
    ollama: &OllamaArgs,
    consumers: usize,
    lease: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let generator = build_generator(ollama, PromptVariant::Standard)?;
    check_generator(&generator).await;

    if lease <= Duration::from_secs(ollama.generator_timeout_secs) {
        tracing::warn!(
            lease_secs = lease.as_secs(),
            generator_timeout_secs = ollama.generator_timeout_secs,
            "Job lease is not longer than the generator timeout, slow jobs may be delivered twice"
        );
    }

    let observer: Arc<dyn PipelineObserver> = Arc::new(TracingObserver);
    let store = Arc::new(PgCompetitionStore::new(database.pool().clone()));
    let queue = PgJobQueue::new(database.pool().clone()).with_lease(lease);

    let use_case = Arc::new(GenerateRating::new(
        store,
        Arc::new(generator),
        observer.clone(),
    ));
    let consumer = Arc::new(RatingJobConsumer::new(
        Arc::new(queue),
        use_case,
        observer,
    ));

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested, finishing in-flight jobs");
        }
        signal.cancel();
    });

    let mut handles = Vec::with_capacity(consumers.max(1));
    for _ in 0..consumers.max(1) {
        let consumer = consumer.clone();
        let shutdown = shutdown.clone();
        handles.push(tokio::spawn(async move { consumer.run(shutdown).await }));
    }
    for handle in handles {
        handle.await?;
    }

    Ok(())
}

async fn handle_rate(
    database: &Database,
    ollama: &OllamaArgs,
    competition_id: String,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let generator = build_generator(ollama, PromptVariant::Standard)?;
    let use_case = GenerateRating::new(
        Arc::new(PgCompetitionStore::new(database.pool().clone())),
        Arc::new(generator),
        Arc::new(TracingObserver),
    );

    let input = GenerateRatingInput {
        competition_id,
        force,
    };
    match use_case.execute(input).await? {
        RatingOutcome::Generated(rating) => tracing::info!(
            "✓ Rated {} ({}): {}",
            rating.score,
            rating.category(),
            rating.explanation
        ),
        RatingOutcome::AlreadyRated(rating) => tracing::info!(
            "Already rated {} ({}) by {}, use --force to regenerate",
            rating.score,
            rating.category(),
            rating.source
        ),
    }

    Ok(())
}

async fn handle_evaluate(
    database: &Database,
    ollama: &OllamaArgs,
    competition_id: &str,
    variant: PromptVariant,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let generator = build_generator(ollama, variant)?;
    check_generator(&generator).await;

    let evaluate = EvaluateRating::new(
        Arc::new(PgCompetitionStore::new(database.pool().clone())),
        Arc::new(generator),
        variant,
        EvaluationExporter::new(output),
    );

    let (record, path) = evaluate.execute(competition_id).await?;
    tracing::info!(
        "✓ {} scored {} ({}) with the {} prompt",
        record.matchup,
        record.score,
        record.category,
        record.prompt_variant
    );
    tracing::info!("Written to {}", path.display());

    Ok(())
}

async fn handle_recent(
    database: &Database,
    sport: Sport,
    limits: EnumeratorLimits,
) -> Result<(), Box<dyn std::error::Error>> {
    let enumerator = PeriodEnumerator::new(
        Arc::new(PgCompetitionStore::new(database.pool().clone())),
        Arc::new(TracingObserver),
    )
    .with_limits(limits);

    let recent = enumerator.recent_competitions(sport).await?;

    for competition in &recent.competitions {
        let rating = competition
            .rating
            .as_ref()
            .map(|r| format!("{} ({})", r.score, r.category()))
            .unwrap_or_else(|| "unrated".to_string());
        tracing::info!(
            "  {} | {} | {} | {}",
            competition.period,
            competition.competition_id,
            competition.matchup(),
            rating
        );
    }

    tracing::info!(
        "Summary: {} competitions from {} periods, {} periods failed",
        recent.competitions.len(),
        recent.periods_examined,
        recent.failed_periods.len()
    );

    Ok(())
}
