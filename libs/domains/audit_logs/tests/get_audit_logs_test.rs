//! Audit log listing through the mediator

use chrono::{Duration, TimeZone, Utc};
use core_config::paging::PagingConfig;
use database::CancellationToken;
use domain_audit_logs::*;
use mediator::{Mediator, VALIDATION_MESSAGE, Validated};
use test_utils::assertions::assert_success;
use test_utils::{TestDataBuilder, TestStore, init_test_tracing};

fn seeded(builder: &TestDataBuilder) -> TestStore {
    let start = Utc.with_ymd_and_hms(2025, 6, 1, 7, 30, 0).unwrap();
    let material_id = builder.id("material");
    let team_id = builder.id("team");

    let mut logs = Vec::new();
    for hour in 0..7 {
        logs.push(
            AuditLog::new("Material", material_id, AuditAction::Restock)
                .changed_at(start + Duration::hours(hour))
                .changed_by(Some(builder.user_id()))
                .with_description(format!("Restocked batch {}", hour)),
        );
    }
    logs.push(
        AuditLog::new("Team", team_id, AuditAction::Creation)
            .changed_at(start + Duration::days(2))
            .with_values("", r#"{"TeamCode":"CR-01","TeamName":"Concrete"}"#),
    );

    TestStore::new().with_rows(logs)
}

fn mediator(store: &TestStore, paging: PagingConfig) -> Mediator {
    let mut mediator = Mediator::new();
    mediator.register::<GetAuditLogsQuery, _>(Validated::new(GetAuditLogsHandler::new(
        store.store(),
        paging,
    )));
    mediator
}

#[tokio::test]
async fn test_pages_newest_first_with_totals() {
    init_test_tracing();
    let builder = TestDataBuilder::from_test_name("test_pages_newest_first_with_totals");
    let store = seeded(&builder);
    let mediator = mediator(&store, PagingConfig::default());

    let query = GetAuditLogsQuery {
        table_name: Some("material".to_string()),
        page: 2,
        page_size: 3,
        ..Default::default()
    };
    let outcome = mediator.send(query, CancellationToken::new()).await.unwrap();
    let page = assert_success(outcome, "audit page");

    assert_eq!(page.total_count, 7);
    assert_eq!(page.total_pages, 3);
    assert!(page.has_next_page());
    assert!(page.has_previous_page());

    let descriptions: Vec<_> = page
        .items
        .iter()
        .map(|dto| dto.description.clone().unwrap_or_default())
        .collect();
    assert_eq!(
        descriptions,
        vec!["Restocked batch 3", "Restocked batch 2", "Restocked batch 1"]
    );
}

#[tokio::test]
async fn test_page_size_falls_back_to_configured_bounds() {
    let builder = TestDataBuilder::from_test_name("test_page_size_falls_back_to_configured_bounds");
    let store = seeded(&builder);
    let mediator = mediator(&store, PagingConfig::new(5, 6));

    let outcome = mediator
        .send(GetAuditLogsQuery::default(), CancellationToken::new())
        .await
        .unwrap();
    let page = assert_success(outcome, "default page");
    assert_eq!((page.page, page.page_size), (1, 5));
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.total_count, 8);

    let query = GetAuditLogsQuery {
        page: 1,
        page_size: 500,
        ..Default::default()
    };
    let page = assert_success(
        mediator.send(query, CancellationToken::new()).await.unwrap(),
        "capped page",
    );
    assert_eq!(page.page_size, 6);
    assert_eq!(page.items.len(), 6);
}

#[tokio::test]
async fn test_creation_entry_lists_field_changes() {
    let builder = TestDataBuilder::from_test_name("test_creation_entry_lists_field_changes");
    let store = seeded(&builder);
    let mediator = mediator(&store, PagingConfig::default());

    let query = GetAuditLogsQuery {
        record_id: Some(builder.id("team")),
        action: Some(AuditAction::Creation),
        page: 1,
        page_size: 10,
        ..Default::default()
    };
    let page = assert_success(
        mediator.send(query, CancellationToken::new()).await.unwrap(),
        "team entries",
    );

    assert_eq!(page.items.len(), 1);
    let fields: Vec<_> = page.items[0].changes.iter().map(|c| c.field.as_str()).collect();
    assert_eq!(fields, vec!["Team Code", "Team Name"]);
}

#[tokio::test]
async fn test_overlong_search_is_rejected_before_querying() {
    let store = TestStore::new();
    let mediator = mediator(&store, PagingConfig::default());

    let query = GetAuditLogsQuery {
        search: Some("x".repeat(201)),
        page: 1,
        page_size: 10,
        ..Default::default()
    };
    let outcome = mediator.send(query, CancellationToken::new()).await.unwrap();

    assert!(outcome.is_failure());
    assert_eq!(outcome.message(), VALIDATION_MESSAGE);
    assert_eq!(outcome.errors(), ["search length".to_string()]);
}

#[tokio::test]
async fn test_cancelled_request_surfaces_database_error() {
    let builder = TestDataBuilder::from_test_name("test_cancelled_request_surfaces_database_error");
    let store = seeded(&builder);
    let mediator = mediator(&store, PagingConfig::default());

    let cancellation = CancellationToken::new();
    cancellation.cancel();

    let report = mediator
        .send(GetAuditLogsQuery::default(), cancellation)
        .await
        .unwrap_err();
    assert!(matches!(
        report.downcast_ref::<database::DatabaseError>(),
        Some(database::DatabaseError::Cancelled)
    ));
}
