//! Materials Domain
//!
//! Stock-keeping for construction materials: the material catalogue and the
//! receipts that move stock.
//!
//! Commands and queries go through the mediator like every other domain:
//!
//! ```rust,ignore
//! use domain_materials::*;
//! use mediator::{Mediator, Validated};
//!
//! let mut mediator = Mediator::new();
//! mediator
//!     .register::<CreateMaterialCommand, _>(Validated::new(CreateMaterialHandler::new(
//!         store.clone(),
//!         current_user.clone(),
//!     )))
//!     .register::<GetMaterialByIdQuery, _>(GetMaterialByIdHandler::new(store.clone()));
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod specifications;

pub use error::MaterialError;
pub use handlers::{
    CreateMaterialHandler, GetLowStockMaterialsHandler, GetMaterialByIdHandler,
    GetMaterialsHandler, RestockMaterialHandler, UpdateMaterialHandler,
};
pub use models::{
    CreateMaterialCommand, GetLowStockMaterialsQuery, GetMaterialByIdQuery, GetMaterialsQuery,
    LowStockMaterialDto, Material, MaterialDto, MaterialTransaction, RestockMaterialCommand,
    RestockMaterialDto, TransactionType, UpdateMaterialCommand,
};
pub use specifications::{MaterialSearch, low_stock_materials, material_search};
