use std::borrow::Cow;

use chrono::{DateTime, Utc};
use database::Entity;
use mediator::{PaginatedResponse, Request};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A stocked construction material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Store-generated; 0 until the material is added
    pub material_id: i64,
    pub material_code: String,
    pub material_name: String,
    pub material_category: Option<String>,
    pub unit: Option<String>,
    pub unit_cost: Option<f64>,
    pub current_stock: Option<f64>,
    pub minimum_stock: Option<f64>,
    pub reorder_level: Option<f64>,
    pub supplier_name: Option<String>,
    pub is_active: bool,
}

impl Material {
    fn stock(&self) -> f64 {
        self.current_stock.unwrap_or(0.0)
    }

    pub fn is_low_stock(&self) -> bool {
        self.minimum_stock.is_some_and(|minimum| self.stock() <= minimum)
    }

    pub fn needs_reorder(&self) -> bool {
        self.reorder_level.is_some_and(|level| self.stock() <= level)
    }

    /// How far the stock sits below its minimum, never negative
    pub fn shortage(&self) -> f64 {
        self.minimum_stock
            .map(|minimum| (minimum - self.stock()).max(0.0))
            .unwrap_or(0.0)
    }
}

impl Entity for Material {
    type Key = i64;
    const NAME: &'static str = "Material";

    fn key(&self) -> i64 {
        self.material_id
    }

    fn identity_pending(&self) -> bool {
        self.material_id == 0
    }

    fn assign_identity(&mut self, identity: i64) {
        self.material_id = identity;
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum TransactionType {
    Receipt,
    Issue,
    Adjustment,
}

/// One stock movement of a material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialTransaction {
    pub transaction_id: Uuid,
    pub material_id: i64,
    pub transaction_type: TransactionType,
    pub quantity: f64,
    pub transaction_date: DateTime<Utc>,
    pub reference: Option<String>,
    pub remarks: Option<String>,
    pub performed_by_id: Option<Uuid>,
}

impl MaterialTransaction {
    pub fn receipt(material_id: i64, quantity: f64, performed_by_id: Option<Uuid>) -> Self {
        Self {
            transaction_id: Uuid::new_v4(),
            material_id,
            transaction_type: TransactionType::Receipt,
            quantity,
            transaction_date: Utc::now(),
            reference: None,
            remarks: None,
            performed_by_id,
        }
    }
}

impl Entity for MaterialTransaction {
    type Key = Uuid;
    const NAME: &'static str = "MaterialTransaction";

    fn key(&self) -> Uuid {
        self.transaction_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDto {
    pub material_id: i64,
    pub material_code: String,
    pub material_name: String,
    pub material_category: Option<String>,
    pub unit: Option<String>,
    pub unit_cost: Option<f64>,
    pub current_stock: Option<f64>,
    pub minimum_stock: Option<f64>,
    pub reorder_level: Option<f64>,
    pub supplier_name: Option<String>,
    pub is_active: bool,
    pub is_low_stock: bool,
    pub needs_reorder: bool,
}

impl From<Material> for MaterialDto {
    fn from(material: Material) -> Self {
        let is_low_stock = material.is_low_stock();
        let needs_reorder = material.needs_reorder();
        Self {
            material_id: material.material_id,
            material_code: material.material_code,
            material_name: material.material_name,
            material_category: material.material_category,
            unit: material.unit,
            unit_cost: material.unit_cost,
            current_stock: material.current_stock,
            minimum_stock: material.minimum_stock,
            reorder_level: material.reorder_level,
            supplier_name: material.supplier_name,
            is_active: material.is_active,
            is_low_stock,
            needs_reorder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestockMaterialDto {
    pub material_id: i64,
    pub restock_quantity: f64,
    pub current_stock: f64,
    pub transaction_type: TransactionType,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockMaterialDto {
    pub material_id: i64,
    pub material_code: String,
    pub material_name: String,
    pub current_stock: Option<f64>,
    pub minimum_stock: Option<f64>,
    pub reorder_level: Option<f64>,
    pub shortage: f64,
    pub needs_reorder: bool,
}

impl From<Material> for LowStockMaterialDto {
    fn from(material: Material) -> Self {
        Self {
            shortage: material.shortage(),
            needs_reorder: material.needs_reorder(),
            material_id: material.material_id,
            material_code: material.material_code,
            material_name: material.material_name,
            current_stock: material.current_stock,
            minimum_stock: material.minimum_stock,
            reorder_level: material.reorder_level,
        }
    }
}

fn validate_stock_levels(command: &CreateMaterialCommand) -> Result<(), ValidationError> {
    match (command.minimum_stock, command.current_stock) {
        (Some(minimum), Some(current)) if minimum > current => Err(ValidationError::new(
            "minimum_stock",
        )
        .with_message(Cow::Borrowed(
            "Minimum Stock cannot be greater than the Current Stock.",
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_stock_levels", skip_on_field_errors = false))]
pub struct CreateMaterialCommand {
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub material_code: String,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub material_name: String,
    #[validate(length(max = 50, message = "must not exceed 50 characters"))]
    pub material_category: Option<String>,
    #[validate(length(max = 20, message = "must not exceed 20 characters"))]
    pub unit: Option<String>,
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub unit_cost: Option<f64>,
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub current_stock: Option<f64>,
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub minimum_stock: Option<f64>,
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub reorder_level: Option<f64>,
    #[validate(length(max = 100, message = "must not exceed 100 characters"))]
    pub supplier_name: Option<String>,
}

impl Request for CreateMaterialCommand {
    type Response = MaterialDto;
}

impl From<CreateMaterialCommand> for Material {
    fn from(command: CreateMaterialCommand) -> Self {
        Self {
            material_id: 0,
            material_code: command.material_code,
            material_name: command.material_name,
            material_category: command.material_category,
            unit: command.unit,
            unit_cost: command.unit_cost,
            current_stock: command.current_stock,
            minimum_stock: command.minimum_stock,
            reorder_level: command.reorder_level,
            supplier_name: command.supplier_name,
            is_active: true,
        }
    }
}

/// Partial update; `None` leaves a field as it is
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMaterialCommand {
    #[validate(range(min = 1, message = "is required"))]
    pub material_id: i64,
    #[validate(length(max = 50, message = "must not exceed 50 characters"))]
    pub material_code: Option<String>,
    #[validate(length(max = 200, message = "must not exceed 200 characters"))]
    pub material_name: Option<String>,
    #[validate(length(max = 100, message = "must not exceed 100 characters"))]
    pub material_category: Option<String>,
    #[validate(length(max = 50, message = "must not exceed 50 characters"))]
    pub unit: Option<String>,
    #[validate(range(min = 0.0, message = "must be greater than or equal to 0"))]
    pub unit_cost: Option<f64>,
    #[validate(range(min = 0.0, message = "must be greater than or equal to 0"))]
    pub minimum_stock: Option<f64>,
    #[validate(range(min = 0.0, message = "must be greater than or equal to 0"))]
    pub reorder_level: Option<f64>,
    #[validate(length(max = 200, message = "must not exceed 200 characters"))]
    pub supplier_name: Option<String>,
    pub is_active: Option<bool>,
}

impl Request for UpdateMaterialCommand {
    type Response = MaterialDto;
}

impl Material {
    /// Apply the fields an update carries. Empty code and name are ignored.
    pub fn apply_update(&mut self, update: UpdateMaterialCommand) {
        if let Some(code) = update.material_code.filter(|code| !code.is_empty()) {
            self.material_code = code;
        }
        if let Some(name) = update.material_name.filter(|name| !name.is_empty()) {
            self.material_name = name;
        }
        if let Some(category) = update.material_category {
            self.material_category = Some(category);
        }
        if let Some(unit) = update.unit {
            self.unit = Some(unit);
        }
        if let Some(supplier_name) = update.supplier_name {
            self.supplier_name = Some(supplier_name);
        }
        if let Some(unit_cost) = update.unit_cost {
            self.unit_cost = Some(unit_cost);
        }
        if let Some(minimum_stock) = update.minimum_stock {
            self.minimum_stock = Some(minimum_stock);
        }
        if let Some(reorder_level) = update.reorder_level {
            self.reorder_level = Some(reorder_level);
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
    }
}

/// Quantity is checked by the handler so a non-positive value is a business
/// failure rather than a validation error.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RestockMaterialCommand {
    pub material_id: i64,
    pub quantity: f64,
    #[validate(length(max = 200))]
    pub reference: Option<String>,
    #[validate(length(max = 500))]
    pub remarks: Option<String>,
}

impl Request for RestockMaterialCommand {
    type Response = RestockMaterialDto;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GetMaterialByIdQuery {
    pub material_id: i64,
}

impl Request for GetMaterialByIdQuery {
    type Response = MaterialDto;
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GetMaterialsQuery {
    #[validate(length(max = 100))]
    pub search: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub low_stock_only: bool,
    pub page: u32,
    pub page_size: u32,
}

impl Request for GetMaterialsQuery {
    type Response = PaginatedResponse<MaterialDto>;
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GetLowStockMaterialsQuery;

impl Request for GetLowStockMaterialsQuery {
    type Response = Vec<LowStockMaterialDto>;
}
