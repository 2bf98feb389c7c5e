use async_trait::async_trait;
use core_config::paging::PagingConfig;
use database::{CancellationToken, Store, UnitOfWork};
use mediator::{Outcome, PageRequest, PaginatedResponse, RequestHandler};
use tracing::instrument;

use crate::models::{AuditLog, AuditLogDto, GetAuditLogsQuery};
use crate::specifications::{AuditLogSearch, audit_log_search};

/// Serves [`GetAuditLogsQuery`]
pub struct GetAuditLogsHandler {
    store: Store,
    paging: PagingConfig,
}

impl GetAuditLogsHandler {
    pub fn new(store: Store, paging: PagingConfig) -> Self {
        Self { store, paging }
    }
}

#[async_trait]
impl RequestHandler<GetAuditLogsQuery> for GetAuditLogsHandler {
    #[instrument(skip_all, fields(table_name = ?request.table_name, page = request.page))]
    async fn handle(
        &self,
        request: GetAuditLogsQuery,
        cancellation: CancellationToken,
    ) -> eyre::Result<Outcome<PaginatedResponse<AuditLogDto>>> {
        let uow = UnitOfWork::with_cancellation(&self.store, cancellation);
        let page = PageRequest::new(request.page, request.page_size).normalize(&self.paging);

        let filter = AuditLogSearch {
            table_name: request.table_name,
            record_id: request.record_id,
            action: request.action,
            search: request.search,
            changed_by: request.changed_by,
            from_date: request.from_date,
            to_date: request.to_date,
        };
        let spec = audit_log_search(filter, page.page_size, page.page);

        let (logs, total_count) = uow.repository::<AuditLog>().get_with_spec(&spec).await?;
        let items: Vec<AuditLogDto> = logs.into_iter().map(AuditLogDto::from).collect();

        Ok(Outcome::success(PaginatedResponse::new(
            items,
            total_count,
            page.page,
            page.page_size,
        )))
    }
}
