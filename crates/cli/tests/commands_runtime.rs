use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use supportflow_cli::commands::{migrate, process, seed};

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("SUPPORTFLOW_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn seed_reports_the_demo_ticket_contract() {
    with_env(&[("SUPPORTFLOW_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected deterministic seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("3 demo tickets"));
        assert!(message.contains("T-123"));
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_env(&[("SUPPORTFLOW_DATABASE_URL", "sqlite::memory:")], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");

        assert_eq!(parse_payload(&first.output)["message"], parse_payload(&second.output)["message"]);
    });
}

#[test]
fn process_produces_a_response_and_a_valid_audit_chain() {
    with_env(&[("SUPPORTFLOW_DATABASE_URL", "sqlite::memory:")], || {
        let result = process::run(
            "Thank you so much, the new card arrived quickly!",
            Some("session-cli-1"),
            &[],
            true,
        );
        assert_eq!(result.exit_code, 0, "expected successful process run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "process");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["session_id"], "session-cli-1");
        assert_eq!(payload["audit_chain_valid"], true);

        let text = payload["response"]["text"].as_str().unwrap_or("");
        assert!(!text.is_empty());

        let trail = payload["audit_trail"].as_array().expect("audit trail requested");
        assert_eq!(trail.first().and_then(|entry| entry["action"].as_str()), Some("receive"));
        assert_eq!(trail.last().and_then(|entry| entry["action"].as_str()), Some("complete"));
    });
}

#[test]
fn process_degrades_gracefully_under_an_injected_fault() {
    with_env(&[("SUPPORTFLOW_DATABASE_URL", "sqlite::memory:")], || {
        let result = process::run(
            "My card was stolen yesterday and I'm furious",
            None,
            &["classifier_failure".to_string()],
            false,
        );
        assert_eq!(result.exit_code, 0, "degraded responses still exit zero");

        let payload = parse_payload(&result.output);
        assert_eq!(
            payload["response"]["text"],
            "We're experiencing a temporary issue, please try again."
        );
        assert!(payload["response"]["ticket_id"].is_null());
    });
}

#[test]
fn process_rejects_unknown_fault_names() {
    with_env(&[("SUPPORTFLOW_DATABASE_URL", "sqlite::memory:")], || {
        let result = process::run("hello", None, &["disk_full".to_string()], false);
        assert_eq!(result.exit_code, 2, "expected argument validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "unknown_fault");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "SUPPORTFLOW_DATABASE_URL",
        "SUPPORTFLOW_DATABASE_MAX_CONNECTIONS",
        "SUPPORTFLOW_DATABASE_TIMEOUT_SECS",
        "SUPPORTFLOW_LLM_PROVIDER",
        "SUPPORTFLOW_LLM_API_KEY",
        "SUPPORTFLOW_LLM_BASE_URL",
        "SUPPORTFLOW_LLM_MODEL",
        "SUPPORTFLOW_LLM_TIMEOUT_SECS",
        "SUPPORTFLOW_COST_RATE_IN_PER_1K",
        "SUPPORTFLOW_COST_RATE_OUT_PER_1K",
        "SUPPORTFLOW_POLICY_CORPUS_PATH",
        "SUPPORTFLOW_LOGGING_LEVEL",
        "SUPPORTFLOW_LOGGING_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
