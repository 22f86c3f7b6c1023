use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use docket_core::domain::document::{Document, DocumentId};
use docket_core::domain::entry::{AccountId, Entry, EntryFilter, EntryId, TransactionType};
use docket_core::domain::estimate::NewEstimate;
use docket_core::domain::external::{ExternalClient, ExternalEntry, ExternalMatter};
use docket_db::repositories::{
    DocumentRepository, EntryRepository, EstimateRepository, ExternalRecordRepository,
    InMemoryDocumentRepository, InMemoryEntryRepository, InMemoryEstimateRepository,
    InMemoryExternalRecordRepository, SqlDocumentRepository, SqlEntryRepository,
    SqlEstimateRepository, SqlExternalRecordRepository,
};
use docket_db::{connect_with_settings, migrations};

type ContractResult<T = ()> = Result<T, String>;

struct Repositories {
    documents: Arc<dyn DocumentRepository>,
    entries: Arc<dyn EntryRepository>,
    estimates: Arc<dyn EstimateRepository>,
    external: Arc<dyn ExternalRecordRepository>,
}

async fn sql_repositories() -> ContractResult<Repositories> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;

    Ok(Repositories {
        documents: Arc::new(SqlDocumentRepository::new(pool.clone())),
        entries: Arc::new(SqlEntryRepository::new(pool.clone())),
        estimates: Arc::new(SqlEstimateRepository::new(pool.clone())),
        external: Arc::new(SqlExternalRecordRepository::new(pool)),
    })
}

fn memory_repositories() -> Repositories {
    let entries = Arc::new(InMemoryEntryRepository::default());
    Repositories {
        documents: Arc::new(InMemoryDocumentRepository::default()),
        estimates: Arc::new(InMemoryEstimateRepository::new(entries.clone())),
        entries,
        external: Arc::new(InMemoryExternalRecordRepository::default()),
    }
}

fn parse_ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value).map(|ts| ts.with_timezone(&Utc)).unwrap_or_default()
}

fn entry(id: &str, matter: &str, account: &str, kind: TransactionType) -> Entry {
    Entry {
        id: EntryId(id.to_string()),
        matter_name: matter.to_string(),
        transaction_type: kind,
        time_spent: (kind == TransactionType::Time).then(|| "1h".to_string()),
        price: (kind == TransactionType::Expense).then_some(2_500),
        account_id: AccountId(account.to_string()),
        created_at: parse_ts("2026-03-01T10:00:00Z"),
    }
}

async fn seed(repos: &Repositories) -> ContractResult {
    for (id, matter, text) in [
        ("d1", "Smith", "custody hearing motion"),
        ("d2", "Jones", "lease breach demand"),
    ] {
        repos
            .documents
            .save(Document {
                id: DocumentId(id.to_string()),
                matter_name: matter.to_string(),
                text: text.to_string(),
            })
            .await
            .map_err(|error| error.to_string())?;
    }

    for value in [
        entry("t1", "Smith", "acct-1", TransactionType::Time),
        entry("x1", "Smith", "acct-1", TransactionType::Expense),
        entry("x2", "Smith", "acct-1", TransactionType::Expense),
        entry("x3", "Jones", "acct-1", TransactionType::Expense),
        entry("y1", "Smith", "acct-2", TransactionType::Expense),
    ] {
        repos.entries.save(value).await.map_err(|error| error.to_string())?;
    }

    repos
        .external
        .save_client(ExternalClient {
            id: "c1".to_string(),
            account_id: AccountId("acct-1".to_string()),
            name: "Smith Family".to_string(),
        })
        .await
        .map_err(|error| error.to_string())?;
    for (id, created_at) in [("m1", "2025-12-01T00:00:00Z"), ("m2", "2026-02-15T00:00:00Z")] {
        repos
            .external
            .save_matter(ExternalMatter {
                id: id.to_string(),
                client_id: "c1".to_string(),
                created_at: parse_ts(created_at),
            })
            .await
            .map_err(|error| error.to_string())?;
    }
    repos
        .external
        .save_entry(ExternalEntry {
            id: "xe1".to_string(),
            matter_id: "m2".to_string(),
            created_at: parse_ts("2026-02-16T00:00:00Z"),
        })
        .await
        .map_err(|error| error.to_string())?;

    Ok(())
}

async fn observe(repos: &Repositories) -> ContractResult<Vec<String>> {
    let account = AccountId("acct-1".to_string());
    let mut observed = Vec::new();

    let documents = repos.documents.find_all().await.map_err(|error| error.to_string())?;
    observed.push(format!(
        "documents={:?}",
        documents.iter().map(|document| document.id.0.clone()).collect::<Vec<_>>()
    ));

    let filter = EntryFilter::for_account(account.clone())
        .with_matter_names(vec!["Smith".to_string()]);
    let entries = repos.entries.find(&filter).await.map_err(|error| error.to_string())?;
    observed.push(format!(
        "smith_entries={:?}",
        entries.iter().map(|entry| entry.id.0.clone()).collect::<Vec<_>>()
    ));

    let created = repos
        .estimates
        .create(NewEstimate {
            estimate_type: TransactionType::Expense,
            low_estimate_id: EntryId("x1".to_string()),
            medium_estimate_id: EntryId("x2".to_string()),
            high_estimate_id: EntryId("x3".to_string()),
            average: 2_500.0,
        })
        .await
        .map_err(|error| error.to_string())?;
    let listed = repos
        .estimates
        .list_since(created.created_at - Duration::minutes(5), &account)
        .await
        .map_err(|error| error.to_string())?;
    observed.push(format!(
        "estimates={} amount={}",
        listed.len(),
        listed.iter().map(|estimate| estimate.amount_cents()).sum::<i64>()
    ));

    let matters = repos.external.count_matters(&account).await.map_err(|e| e.to_string())?;
    let external_entries =
        repos.external.count_entries(&account).await.map_err(|e| e.to_string())?;
    let recent = repos
        .external
        .list_matters_since(&account, parse_ts("2026-01-01T00:00:00Z"))
        .await
        .map_err(|error| error.to_string())?;
    observed.push(format!(
        "external matters={matters} entries={external_entries} recent={:?}",
        recent.iter().map(|matter| matter.id.clone()).collect::<Vec<_>>()
    ));

    Ok(observed)
}

#[tokio::test]
async fn sql_and_in_memory_repositories_agree() -> ContractResult {
    let sql = sql_repositories().await?;
    let memory = memory_repositories();
    seed(&sql).await?;
    seed(&memory).await?;

    let sql_observed = observe(&sql).await?;
    let memory_observed = observe(&memory).await?;

    if sql_observed != memory_observed {
        return Err(format!(
            "repositories disagree:\n sql: {sql_observed:?}\n mem: {memory_observed:?}"
        ));
    }

    let expected = vec![
        r#"documents=["d1", "d2"]"#.to_string(),
        r#"smith_entries=["t1", "x1", "x2"]"#.to_string(),
        "estimates=1 amount=7500".to_string(),
        r#"external matters=2 entries=1 recent=["m2"]"#.to_string(),
    ];
    if sql_observed != expected {
        return Err(format!("unexpected observations: {sql_observed:?}"));
    }
    Ok(())
}
