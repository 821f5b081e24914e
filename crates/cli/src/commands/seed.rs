use crate::commands::CommandResult;
use supportflow_core::config::{AppConfig, LoadOptions};
use supportflow_db::{connect, fixtures, migrations};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = fixtures::seed(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = fixtures::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<usize, (&'static str, String, u8)> = if !verification.valid {
            Err((
                "seed_verification",
                format!("seed verification failed: {}", verification.problems.join("; ")),
                6u8,
            ))
        } else {
            Ok(seed_result.tickets_inserted)
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(tickets_inserted) => CommandResult::success(
            "seed",
            format!(
                "loaded {tickets_inserted} demo tickets; status queries can use T-123 (in_progress)"
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
