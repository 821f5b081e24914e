use std::fs;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use supportflow_agent::LexiconModel;
use supportflow_core::audit::{AuditLog, InMemoryAuditLog};
use supportflow_core::chaos::{ChaosController, Fault};
use supportflow_core::config::{AppConfig, LoadOptions};
use supportflow_core::cost::CostTracker;
use supportflow_core::domain::message::{Message, SessionId};
use supportflow_core::domain::response::Response;
use supportflow_core::pipeline::Orchestrator;
use supportflow_core::policy::PolicyService;
use supportflow_db::{connect, migrations, SqlTicketStore};

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ProcessOutput {
    command: &'static str,
    status: &'static str,
    session_id: String,
    response: Response,
    audit_chain_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    audit_trail: Option<Vec<AuditLine>>,
}

#[derive(Debug, Serialize)]
struct AuditLine {
    component: String,
    action: &'static str,
    detail: String,
}

pub fn run(
    message_text: &str,
    session: Option<&str>,
    fault_names: &[String],
    include_audit: bool,
) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "process",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let mut faults: Vec<Fault> = Vec::new();
    for name in fault_names {
        match name.parse::<Fault>() {
            Ok(fault) => faults.push(fault),
            Err(error) => {
                return CommandResult::failure("process", "unknown_fault", error.to_string(), 2);
            }
        }
    }

    let policies = match load_policies(&config) {
        Ok(policies) => policies,
        Err((error_class, message)) => {
            return CommandResult::failure("process", error_class, message, 2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "process",
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

        let chaos = Arc::new(ChaosController::new());
        for fault in &faults {
            chaos.set_fault(*fault, true);
        }

        let audit = Arc::new(InMemoryAuditLog::new());
        let orchestrator = Orchestrator::new(
            Arc::new(LexiconModel::new()),
            Arc::new(SqlTicketStore::new(pool.clone())),
            Arc::new(policies),
            Arc::clone(&audit) as Arc<dyn AuditLog>,
            Arc::new(CostTracker::new(config.cost.rates())),
            chaos,
        )
        .with_model_deadline(Duration::from_secs(config.llm.timeout_secs));

        let session_id = match session {
            Some(session) => SessionId(session.to_owned()),
            None => SessionId::random(),
        };
        let response = orchestrator.process(&Message::new(message_text), &session_id).await;
        pool.close().await;

        let audit_trail = include_audit.then(|| {
            audit
                .entries_for_session(&session_id)
                .into_iter()
                .map(|entry| AuditLine {
                    component: entry.component,
                    action: entry.action.as_str(),
                    detail: entry.detail,
                })
                .collect()
        });
        let audit_chain_valid = audit.verify_session(&session_id).valid;

        Ok::<ProcessOutput, (&'static str, String, u8)>(ProcessOutput {
            command: "process",
            status: "ok",
            session_id: session_id.0,
            response,
            audit_chain_valid,
            audit_trail,
        })
    });

    match result {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(json) => CommandResult { exit_code: 0, output: json },
            Err(error) => CommandResult::failure("process", "serialization", error.to_string(), 6),
        },
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("process", error_class, message, exit_code)
        }
    }
}

fn load_policies(config: &AppConfig) -> Result<PolicyService, (&'static str, String)> {
    match &config.policy.corpus_path {
        None => Ok(PolicyService::builtin()),
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|error| {
                ("policy_corpus", format!("could not read `{}`: {error}", path.display()))
            })?;
            PolicyService::from_markdown(&raw).map_err(|error| {
                ("policy_corpus", format!("could not parse `{}`: {error}", path.display()))
            })
        }
    }
}
