use docket_db::{connect_with_config, migrations, DemoSeedDataset, TableSeedInfo};

use crate::commands::{prepare, CommandResult, StepError};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = DemoSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<Vec<TableSeedInfo>, StepError> = if verification.all_present {
            Ok(seed_result.tables_seeded)
        } else {
            let failed = verification
                .checks
                .iter()
                .filter_map(|(table, present)| (!present).then_some(*table))
                .collect::<Vec<_>>();
            Err(("seed_verification", verification_message(&failed), 6u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(tables) => {
            let lines = tables
                .iter()
                .map(|table| format!("  - {}: {} rows", table.table, table.rows))
                .collect::<Vec<_>>();
            let message = format!(
                "demo dataset loaded for account {}:\n{}",
                DemoSeedDataset::PRIMARY_ACCOUNT_ID,
                lines.join("\n")
            );
            CommandResult::success("seed", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_message(failed_tables: &[&str]) -> String {
    if failed_tables.is_empty() {
        "some seed data failed to load".to_string()
    } else {
        format!("seed verification failed for tables: {}", failed_tables.join(", "))
    }
}
