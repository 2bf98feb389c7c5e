use std::sync::Arc;

use async_trait::async_trait;
use core_config::paging::PagingConfig;
use database::{CancellationToken, Store, UnitOfWork};
use mediator::{CurrentUser, Outcome, PageRequest, PaginatedResponse, RequestHandler};
use tracing::{info, instrument};

use crate::error::MaterialError;
use crate::models::{
    CreateMaterialCommand, GetLowStockMaterialsQuery, GetMaterialByIdQuery, GetMaterialsQuery,
    LowStockMaterialDto, Material, MaterialDto, MaterialTransaction, RestockMaterialCommand,
    RestockMaterialDto, TransactionType, UpdateMaterialCommand,
};
use crate::specifications::{MaterialSearch, low_stock_materials, material_search};

pub struct CreateMaterialHandler {
    store: Store,
    current_user: Arc<dyn CurrentUser>,
}

impl CreateMaterialHandler {
    pub fn new(store: Store, current_user: Arc<dyn CurrentUser>) -> Self {
        Self { store, current_user }
    }
}

#[async_trait]
impl RequestHandler<CreateMaterialCommand> for CreateMaterialHandler {
    #[instrument(skip_all, fields(material_code = %request.material_code))]
    async fn handle(
        &self,
        request: CreateMaterialCommand,
        cancellation: CancellationToken,
    ) -> eyre::Result<Outcome<MaterialDto>> {
        let uow = UnitOfWork::with_cancellation(&self.store, cancellation);
        let materials = uow.repository::<Material>();

        let code = request.material_code.clone();
        if materials.is_exist(|m| m.material_code == code).await? {
            return Ok(Outcome::failure(MaterialError::DuplicateCode));
        }

        let material = materials.add(Material::from(request)).await?;

        // Opening stock is booked as a receipt in the same flush
        if let Some(quantity) = material.current_stock.filter(|q| *q > 0.0) {
            let mut receipt =
                MaterialTransaction::receipt(material.material_id, quantity, self.current_user.user_id());
            receipt.reference = Some(format!(
                "Initial stock upon creation (Code: {})",
                material.material_code
            ));
            uow.repository::<MaterialTransaction>().add(receipt).await?;
        }

        uow.complete().await?;
        info!(material_id = material.material_id, "Material created");

        Ok(Outcome::success(MaterialDto::from(material)))
    }
}

pub struct UpdateMaterialHandler {
    store: Store,
}

impl UpdateMaterialHandler {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestHandler<UpdateMaterialCommand> for UpdateMaterialHandler {
    #[instrument(skip_all, fields(material_id = request.material_id))]
    async fn handle(
        &self,
        request: UpdateMaterialCommand,
        cancellation: CancellationToken,
    ) -> eyre::Result<Outcome<MaterialDto>> {
        let uow = UnitOfWork::with_cancellation(&self.store, cancellation);
        let materials = uow.repository::<Material>();

        let Some(mut material) = materials.get_by_id(&request.material_id).await? else {
            return Ok(Outcome::failure(MaterialError::NotFound));
        };

        let new_code = request
            .material_code
            .clone()
            .filter(|code| !code.is_empty() && *code != material.material_code);
        if let Some(code) = new_code {
            if materials.is_exist(|m| m.material_code == code).await? {
                return Ok(Outcome::failure(MaterialError::CodeTaken));
            }
        }

        material.apply_update(request);
        materials.update(material.clone())?;
        uow.complete().await?;

        Ok(Outcome::success(MaterialDto::from(material)))
    }
}

pub struct RestockMaterialHandler {
    store: Store,
    current_user: Arc<dyn CurrentUser>,
}

impl RestockMaterialHandler {
    pub fn new(store: Store, current_user: Arc<dyn CurrentUser>) -> Self {
        Self { store, current_user }
    }
}

#[async_trait]
impl RequestHandler<RestockMaterialCommand> for RestockMaterialHandler {
    #[instrument(skip_all, fields(material_id = request.material_id, quantity = request.quantity))]
    async fn handle(
        &self,
        request: RestockMaterialCommand,
        cancellation: CancellationToken,
    ) -> eyre::Result<Outcome<RestockMaterialDto>> {
        let uow = UnitOfWork::with_cancellation(&self.store, cancellation);
        let materials = uow.repository::<Material>();

        let Some(mut material) = materials.get_by_id(&request.material_id).await? else {
            return Ok(Outcome::failure(MaterialError::RestockTargetMissing));
        };

        let Some(performed_by) = self.current_user.user_id() else {
            return Ok(Outcome::failure(MaterialError::UnknownInspector));
        };

        if request.quantity <= 0.0 {
            return Ok(Outcome::failure(MaterialError::NonPositiveQuantity));
        }

        let current_stock = material.current_stock.unwrap_or(0.0) + request.quantity;
        material.current_stock = Some(current_stock);

        let mut receipt =
            MaterialTransaction::receipt(material.material_id, request.quantity, Some(performed_by));
        receipt.reference = request.reference.clone();
        receipt.remarks = request.remarks;

        uow.repository::<MaterialTransaction>().add(receipt).await?;
        materials.update(material)?;
        uow.complete().await?;

        info!(current_stock, "Material restocked");
        Ok(Outcome::success(RestockMaterialDto {
            material_id: request.material_id,
            restock_quantity: request.quantity,
            current_stock,
            transaction_type: TransactionType::Receipt,
            reason: request.reference,
        }))
    }
}

pub struct GetMaterialByIdHandler {
    store: Store,
}

impl GetMaterialByIdHandler {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestHandler<GetMaterialByIdQuery> for GetMaterialByIdHandler {
    async fn handle(
        &self,
        request: GetMaterialByIdQuery,
        cancellation: CancellationToken,
    ) -> eyre::Result<Outcome<MaterialDto>> {
        let uow = UnitOfWork::with_cancellation(&self.store, cancellation);
        let material = uow
            .repository::<Material>()
            .get_by_id(&request.material_id)
            .await?;

        Ok(Outcome::create_or(
            material.map(MaterialDto::from),
            MaterialError::NotFound,
        ))
    }
}

pub struct GetMaterialsHandler {
    store: Store,
    paging: PagingConfig,
}

impl GetMaterialsHandler {
    pub fn new(store: Store, paging: PagingConfig) -> Self {
        Self { store, paging }
    }
}

#[async_trait]
impl RequestHandler<GetMaterialsQuery> for GetMaterialsHandler {
    #[instrument(skip_all, fields(page = request.page, low_stock_only = request.low_stock_only))]
    async fn handle(
        &self,
        request: GetMaterialsQuery,
        cancellation: CancellationToken,
    ) -> eyre::Result<Outcome<PaginatedResponse<MaterialDto>>> {
        let uow = UnitOfWork::with_cancellation(&self.store, cancellation);
        let page = PageRequest::new(request.page, request.page_size).normalize(&self.paging);

        let filter = MaterialSearch {
            search: request.search,
            category: request.category,
            is_active: request.is_active,
            low_stock_only: request.low_stock_only,
        };
        let spec = material_search(filter, page.page_size, page.page);

        let (materials, total_count) = uow.repository::<Material>().get_with_spec(&spec).await?;
        let items = materials.into_iter().map(MaterialDto::from).collect();

        Ok(Outcome::success(PaginatedResponse::new(
            items,
            total_count,
            page.page,
            page.page_size,
        )))
    }
}

pub struct GetLowStockMaterialsHandler {
    store: Store,
}

impl GetLowStockMaterialsHandler {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestHandler<GetLowStockMaterialsQuery> for GetLowStockMaterialsHandler {
    async fn handle(
        &self,
        _request: GetLowStockMaterialsQuery,
        cancellation: CancellationToken,
    ) -> eyre::Result<Outcome<Vec<LowStockMaterialDto>>> {
        let uow = UnitOfWork::with_cancellation(&self.store, cancellation);
        let (materials, _) = uow
            .repository::<Material>()
            .get_with_spec(&low_stock_materials())
            .await?;

        let mut items: Vec<LowStockMaterialDto> =
            materials.into_iter().map(LowStockMaterialDto::from).collect();
        // Stable, so equal shortages keep code order
        items.sort_by(|a, b| b.shortage.total_cmp(&a.shortage));

        let total = items.len();
        Ok(Outcome::success_with_count(items, total))
    }
}
