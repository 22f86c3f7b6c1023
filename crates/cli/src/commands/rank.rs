use docket_core::{SimilarityRanker, SimilarityResult, Tokenizer};
use docket_db::repositories::{DocumentRepository, SqlDocumentRepository};
use docket_db::{connect_with_config, migrations};

use crate::commands::{prepare, CommandResult, StepError};

/// Ranks stored documents against `text` with the configured tokenizer and
/// threshold.
pub fn run(text: &str) -> CommandResult {
    let (config, runtime) = match prepare("rank") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let tokenizer = match Tokenizer::new(&config.estimation.token_split_pattern) {
        Ok(tokenizer) => tokenizer,
        Err(error) => {
            return CommandResult::failure("rank", "config_validation", error.to_string(), 2);
        }
    };
    let ranker = SimilarityRanker::new(tokenizer, config.estimation.top_threshold);

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let documents = SqlDocumentRepository::new(pool.clone())
            .find_all()
            .await
            .map_err(|error| ("document_lookup", error.to_string(), 5u8))?;
        let corpus_size = documents.len();
        let ranked = ranker.rank(text, documents);

        pool.close().await;
        Ok::<(usize, Vec<SimilarityResult>), StepError>((corpus_size, ranked))
    });

    match result {
        Ok((corpus_size, ranked)) => match serde_json::to_value(&ranked) {
            Ok(data) => CommandResult::success_with_data(
                "rank",
                format!("ranked {corpus_size} documents, kept {}", ranked.len()),
                Some(data),
            ),
            Err(error) => CommandResult::failure("rank", "serialization", error.to_string(), 8),
        },
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("rank", error_class, message, exit_code)
        }
    }
}
