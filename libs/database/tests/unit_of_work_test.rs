//! End-to-end tests for the data-access layer
//!
//! Every test drives the public API only: a shared `Store`, units of work,
//! repositories and specifications.

use chrono::{DateTime, Duration, TimeZone, Utc};
use database::*;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
struct Project {
    id: Uuid,
    name: String,
}

impl Entity for Project {
    type Key = Uuid;
    const NAME: &'static str = "Project";

    fn key(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Module {
    id: Uuid,
    tag: String,
    status: String,
    created_date: DateTime<Utc>,
    project_id: Uuid,
    project: Option<Project>,
}

impl Entity for Module {
    type Key = Uuid;
    const NAME: &'static str = "Module";

    fn key(&self) -> Uuid {
        self.id
    }

    fn load_navigation(&mut self, path: &str, related: &Related<'_>) -> DatabaseResult<()> {
        match path {
            "Project" => {
                self.project = related.find::<Project>(&self.project_id)?;
                Ok(())
            }
            other => Err(DatabaseError::UnknownNavigation {
                entity: Self::NAME,
                path: other.to_string(),
            }),
        }
    }
}

fn base_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
}

fn module(tag: &str, status: &str, day: i64, project_id: Uuid) -> Module {
    Module {
        id: Uuid::new_v4(),
        tag: tag.to_string(),
        status: status.to_string(),
        created_date: base_date() + Duration::days(day),
        project_id,
        project: None,
    }
}

fn seeded_store() -> (Store, Project) {
    let store = Store::new();
    let project = Project {
        id: Uuid::new_v4(),
        name: "Tower A".to_string(),
    };
    store.seed(vec![project.clone()]).unwrap();

    let statuses = [
        ("M-1", "Active"),
        ("M-2", "Inactive"),
        ("M-3", "Active"),
        ("M-4", "Active"),
        ("M-5", "Inactive"),
        ("M-6", "Active"),
        ("M-7", "Inactive"),
        ("M-8", "Active"),
    ];
    let modules: Vec<Module> = statuses
        .iter()
        .enumerate()
        .map(|(day, (tag, status))| module(tag, status, day as i64, project.id))
        .collect();
    store.seed(modules).unwrap();

    (store, project)
}

fn tags(rows: &[Module]) -> Vec<&str> {
    rows.iter().map(|row| row.tag.as_str()).collect()
}

#[tokio::test]
async fn test_add_complete_then_get_by_id_round_trips() {
    let store = Store::new();
    let project_id = Uuid::new_v4();
    let added = module("M-1", "Active", 0, project_id);

    let uow = UnitOfWork::new(&store);
    uow.repository::<Module>().add(added.clone()).await.unwrap();
    assert_eq!(uow.complete().await.unwrap(), 1);

    let reader = UnitOfWork::new(&store);
    let fetched = reader
        .repository::<Module>()
        .get_by_id(&added.id)
        .await
        .unwrap();
    assert_eq!(fetched, Some(added));
}

#[tokio::test]
async fn test_staged_add_is_visible_through_every_handle_of_the_same_type() {
    let store = Store::new();
    let uow = UnitOfWork::new(&store);
    let added = module("M-1", "Active", 0, Uuid::new_v4());

    uow.repository::<Module>().add(added.clone()).await.unwrap();

    let again = uow.repository::<Module>();
    assert_eq!(again.get_by_id(&added.id).await.unwrap(), Some(added));
    assert_eq!(store.row_count::<Module>().unwrap(), 0);
}

#[tokio::test]
async fn test_get_all_is_idempotent_without_writes() {
    let (store, _) = seeded_store();
    let uow = UnitOfWork::new(&store);
    let modules = uow.repository::<Module>();

    let first = modules.get_all().await.unwrap();
    let second = modules.get_all().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(modules.get().unwrap(), first);
}

#[tokio::test]
async fn test_writes_reach_other_units_only_after_complete() {
    let (store, _) = seeded_store();
    let writer = UnitOfWork::new(&store);
    let reader = UnitOfWork::new(&store);

    let modules = writer.repository::<Module>();
    let mut first = modules
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .find(|m| m.status == "Active")
        .unwrap();
    first.status = "Archived".to_string();
    modules.update(first.clone()).unwrap();

    let seen = reader.repository::<Module>().get_by_id(&first.id).await.unwrap();
    assert_eq!(seen.unwrap().status, "Active");

    writer.complete().await.unwrap();
    let seen = reader.repository::<Module>().get_by_id(&first.id).await.unwrap();
    assert_eq!(seen.unwrap().status, "Archived");
}

#[tokio::test]
async fn test_active_page_two_by_newest_first() {
    let (store, _) = seeded_store();
    let uow = UnitOfWork::new(&store);

    let mut spec = Specification::<Module>::new();
    spec.add_criteria(|m| m.status == "Active")
        .add_order_by_descending(|m| m.created_date)
        .apply_paging(2, 2);

    let (rows, total_count) = uow.repository::<Module>().get_with_spec(&spec).await.unwrap();

    // Active newest first: M-8, M-6, M-4, M-3, M-1
    assert_eq!(tags(&rows), vec!["M-4", "M-3"]);
    assert_eq!(total_count, 5);
}

#[tokio::test]
async fn test_includes_are_loaded_for_the_page_only() {
    let (store, project) = seeded_store();
    let uow = UnitOfWork::new(&store);

    let mut spec = Specification::<Module>::new();
    spec.add_include("Project")
        .add_order_by(|m| m.tag.clone())
        .enable_split_query()
        .apply_paging(3, 1);

    let (rows, total_count) = uow.repository::<Module>().get_with_spec(&spec).await.unwrap();
    assert_eq!(total_count, 8);
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|m| m.project.as_ref() == Some(&project)));
}

#[tokio::test]
async fn test_unknown_include_path_is_an_error() {
    let (store, _) = seeded_store();
    let uow = UnitOfWork::new(&store);

    let mut spec = Specification::<Module>::new();
    spec.add_include("Factory");

    let err = uow
        .repository::<Module>()
        .get_with_spec(&spec)
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::UnknownNavigation { .. }));
}

#[tokio::test]
async fn test_get_entity_with_spec_returns_first_match() {
    let (store, project) = seeded_store();
    let uow = UnitOfWork::new(&store);

    let mut spec = Specification::<Module>::with_criteria(|m| m.status == "Inactive");
    spec.add_order_by_descending(|m| m.created_date)
        .add_include("Project");

    let found = uow
        .repository::<Module>()
        .get_entity_with_spec(&spec)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.tag, "M-7");
    assert_eq!(found.project, Some(project));

    let none = Specification::<Module>::with_criteria(|m| m.status == "Demolished");
    assert!(
        uow.repository::<Module>()
            .get_entity_with_spec(&none)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_exists_and_count_read_committed_rows() {
    let (store, _) = seeded_store();
    let uow = UnitOfWork::new(&store);
    let modules = uow.repository::<Module>();

    assert!(modules.is_exist(|m| m.tag == "M-5").await.unwrap());
    assert!(!modules.is_exist(|m| m.tag == "M-99").await.unwrap());
    assert_eq!(modules.count(None).await.unwrap(), 8);
    assert_eq!(
        modules
            .count(Some(predicate(|m: &Module| m.status == "Inactive")))
            .await
            .unwrap(),
        3
    );
}

#[tokio::test]
async fn test_range_operations_flush_together() {
    let (store, project) = seeded_store();
    let uow = UnitOfWork::new(&store);
    let modules = uow.repository::<Module>();

    let inactive: Vec<Module> = modules
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.status == "Inactive")
        .collect();
    modules.delete_range(inactive).unwrap();
    modules
        .add_range(vec![
            module("M-9", "Active", 9, project.id),
            module("M-10", "Active", 10, project.id),
        ])
        .await
        .unwrap();

    assert_eq!(uow.complete().await.unwrap(), 5);
    assert_eq!(store.row_count::<Module>().unwrap(), 7);
}

#[tokio::test]
async fn test_duplicate_key_rejects_the_whole_batch() {
    let (store, _) = seeded_store();
    let existing = UnitOfWork::new(&store)
        .repository::<Module>()
        .get_all()
        .await
        .unwrap()
        .remove(0);

    let uow = UnitOfWork::new(&store);
    let modules = uow.repository::<Module>();
    modules
        .add(module("M-9", "Active", 9, existing.project_id))
        .await
        .unwrap();
    modules.add(existing).await.unwrap();

    let err = uow.complete().await.unwrap_err();
    assert!(matches!(err, DatabaseError::DuplicateKey { .. }));
    assert!(err.is_conflict());
    assert_eq!(store.row_count::<Module>().unwrap(), 8);
}

#[tokio::test]
async fn test_concurrent_delete_surfaces_as_conflict() {
    let (store, _) = seeded_store();
    let first = UnitOfWork::new(&store);
    let second = UnitOfWork::new(&store);

    let target = first.repository::<Module>().get_all().await.unwrap().remove(0);

    first.repository::<Module>().delete(target.clone()).unwrap();
    first.complete().await.unwrap();

    let mut edited = target;
    edited.status = "Inactive".to_string();
    second.repository::<Module>().update(edited).unwrap();

    let err = second.complete().await.unwrap_err();
    assert!(matches!(err, DatabaseError::ConcurrencyConflict { .. }));
}

#[tokio::test]
async fn test_cancelled_unit_of_work_stops_reading_and_writing() {
    let (store, project) = seeded_store();
    let token = CancellationToken::new();
    let uow = UnitOfWork::with_cancellation(&store, token.clone());
    let modules = uow.repository::<Module>();

    modules
        .add(module("M-9", "Active", 9, project.id))
        .await
        .unwrap();
    token.cancel();

    assert!(matches!(
        modules.get_all().await.unwrap_err(),
        DatabaseError::Cancelled
    ));
    assert!(matches!(
        uow.complete().await.unwrap_err(),
        DatabaseError::Cancelled
    ));
    assert_eq!(store.row_count::<Module>().unwrap(), 8);
}
