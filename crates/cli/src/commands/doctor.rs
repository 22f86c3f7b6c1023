use docket_core::config::{AppConfig, LoadOptions};
use docket_core::{AccountId, TokenAuthority};
use docket_db::{connect_with_config, migrations::MIGRATOR};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: "skipped because configuration did not load".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

/// Exits non-zero when any readiness check fails.
pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_token_signing(&config));
            checks.extend(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck::skipped("token_signing"));
            checks.push(DoctorCheck::skipped("database_connectivity"));
            checks.push(DoctorCheck::skipped("schema_version"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_token_signing(config: &AppConfig) -> DoctorCheck {
    let authority = TokenAuthority::new(config.auth.token_secret.clone());
    let probe = AccountId("doctor-probe".to_string());

    let outcome = authority
        .issue(&probe)
        .and_then(|token| authority.resolve(&token))
        .map_err(|error| error.to_string())
        .and_then(|resolved| {
            if resolved == probe {
                Ok(())
            } else {
                Err("issued token resolved to a different account".to_string())
            }
        });

    match outcome {
        Ok(()) => DoctorCheck {
            name: "token_signing",
            status: CheckStatus::Pass,
            details: "bearer tokens issue and verify with the configured secret".to_string(),
        },
        Err(details) => DoctorCheck { name: "token_signing", status: CheckStatus::Fail, details },
    }
}

/// Connectivity plus the newest applied migration against the embedded set.
fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            }];
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;

        let applied = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MAX(version) FROM _sqlx_migrations WHERE success = 1",
        )
        .fetch_one(&pool)
        .await
        .ok()
        .flatten();

        pool.close().await;
        Ok::<Option<i64>, String>(applied)
    });

    let applied = match result {
        Ok(applied) => applied,
        Err(details) => {
            return vec![
                DoctorCheck { name: "database_connectivity", status: CheckStatus::Fail, details },
                DoctorCheck {
                    name: "schema_version",
                    status: CheckStatus::Skipped,
                    details: "skipped because the database is unreachable".to_string(),
                },
            ];
        }
    };

    let expected = MIGRATOR.iter().map(|migration| migration.version).max().unwrap_or(0);
    let schema = match applied {
        Some(version) if version >= expected => DoctorCheck {
            name: "schema_version",
            status: CheckStatus::Pass,
            details: format!("schema at version {version}"),
        },
        Some(version) => DoctorCheck {
            name: "schema_version",
            status: CheckStatus::Fail,
            details: format!(
                "schema at version {version}, expected {expected}; run `docket migrate`"
            ),
        },
        None => DoctorCheck {
            name: "schema_version",
            status: CheckStatus::Fail,
            details: "no migrations applied; run `docket migrate`".to_string(),
        },
    };

    vec![
        DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        },
        schema,
    ]
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
