use chrono::{Days, NaiveDate, NaiveTime};
use database::Specification;
use uuid::Uuid;

use crate::models::{AuditAction, AuditLog};

/// Filters accepted by [`audit_log_search`]
#[derive(Debug, Clone, Default)]
pub struct AuditLogSearch {
    pub table_name: Option<String>,
    pub record_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub search: Option<String>,
    pub changed_by: Option<Uuid>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

/// Newest-first page of audit entries matching every given filter.
///
/// Table names match case-insensitively. The free-text search looks at the
/// table name, description and both value snapshots. Date bounds cover whole
/// days in UTC.
pub fn audit_log_search(filter: AuditLogSearch, page_size: u32, page: u32) -> Specification<AuditLog> {
    let mut spec = Specification::new();

    if let Some(table_name) = non_blank(filter.table_name) {
        let table_name = table_name.to_lowercase();
        spec.add_criteria(move |log: &AuditLog| log.table_name.to_lowercase() == table_name);
    }

    if let Some(record_id) = filter.record_id {
        spec.add_criteria(move |log: &AuditLog| log.record_id == record_id);
    }

    if let Some(action) = filter.action {
        spec.add_criteria(move |log: &AuditLog| log.action == action);
    }

    if let Some(changed_by) = filter.changed_by {
        spec.add_criteria(move |log: &AuditLog| log.changed_by == Some(changed_by));
    }

    if let Some(from) = filter.from_date {
        let start = from.and_time(NaiveTime::MIN).and_utc();
        spec.add_criteria(move |log: &AuditLog| log.changed_date >= start);
    }

    if let Some(to) = filter.to_date {
        // Exclusive bound at the start of the following day
        if let Some(end) = to.checked_add_days(Days::new(1)) {
            let end = end.and_time(NaiveTime::MIN).and_utc();
            spec.add_criteria(move |log: &AuditLog| log.changed_date < end);
        }
    }

    if let Some(term) = non_blank(filter.search) {
        let term = term.to_lowercase();
        spec.add_criteria(move |log: &AuditLog| {
            let contains = |value: &str| value.to_lowercase().contains(&term);
            contains(&log.table_name)
                || log.description.as_deref().is_some_and(contains)
                || log.old_values.as_deref().is_some_and(contains)
                || log.new_values.as_deref().is_some_and(contains)
        });
    }

    spec.add_order_by_descending(|log: &AuditLog| log.changed_date)
        .apply_paging(page_size, page);
    spec
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use database::SpecificationEvaluator;

    fn log_at(table: &str, action: AuditAction, day: u32, hour: u32) -> AuditLog {
        AuditLog::new(table, Uuid::new_v4(), action)
            .changed_at(Utc.with_ymd_and_hms(2025, 5, day, hour, 0, 0).unwrap())
    }

    fn tables(rows: &[AuditLog]) -> Vec<(String, u32)> {
        use chrono::Datelike;
        rows.iter()
            .map(|log| (log.table_name.clone(), log.changed_date.day()))
            .collect()
    }

    #[test]
    fn test_newest_first_with_table_filter() {
        let logs = vec![
            log_at("Team", AuditAction::Creation, 1, 9),
            log_at("Material", AuditAction::Creation, 2, 9),
            log_at("team", AuditAction::Update, 3, 9),
        ];

        let filter = AuditLogSearch {
            table_name: Some(" TEAM ".to_string()),
            ..Default::default()
        };
        let spec = audit_log_search(filter, 25, 1);
        let (query, total) = SpecificationEvaluator::get_query(logs, &spec);

        assert_eq!(tables(query.rows()), vec![("team".to_string(), 3), ("Team".to_string(), 1)]);
        assert_eq!(total, 2);
    }

    #[test]
    fn test_date_bounds_are_inclusive_days() {
        let logs = vec![
            log_at("Team", AuditAction::Update, 1, 23),
            log_at("Team", AuditAction::Update, 2, 0),
            log_at("Team", AuditAction::Update, 3, 23),
            log_at("Team", AuditAction::Update, 4, 0),
        ];

        let filter = AuditLogSearch {
            from_date: NaiveDate::from_ymd_opt(2025, 5, 2),
            to_date: NaiveDate::from_ymd_opt(2025, 5, 3),
            ..Default::default()
        };
        let (query, total) = SpecificationEvaluator::get_query(logs, &audit_log_search(filter, 25, 1));

        assert_eq!(total, 2);
        assert_eq!(tables(query.rows()), vec![("Team".to_string(), 3), ("Team".to_string(), 2)]);
    }

    #[test]
    fn test_search_looks_into_snapshots_and_description() {
        let logs = vec![
            log_at("Team", AuditAction::Update, 1, 9).with_values("Leader: none", "Leader: Rana"),
            log_at("Team", AuditAction::Update, 2, 9).with_description("Crew renamed"),
            log_at("Material", AuditAction::Restock, 3, 9),
        ];

        let filter = AuditLogSearch {
            search: Some("rana".to_string()),
            ..Default::default()
        };
        let (query, _) = SpecificationEvaluator::get_query(logs.clone(), &audit_log_search(filter, 25, 1));
        assert_eq!(query.rows().len(), 1);

        let filter = AuditLogSearch {
            search: Some("CREW".to_string()),
            action: Some(AuditAction::Update),
            ..Default::default()
        };
        let (query, _) = SpecificationEvaluator::get_query(logs, &audit_log_search(filter, 25, 1));
        assert_eq!(query.rows()[0].description.as_deref(), Some("Crew renamed"));
    }
}
