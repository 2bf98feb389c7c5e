use database::Specification;

use crate::models::Material;

/// Filters accepted by [`material_search`]
#[derive(Debug, Clone, Default)]
pub struct MaterialSearch {
    pub search: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
    pub low_stock_only: bool,
}

/// Page of materials ordered by code.
///
/// The search term matches code, name and supplier, ignoring case.
pub fn material_search(filter: MaterialSearch, page_size: u32, page: u32) -> Specification<Material> {
    let mut spec = Specification::new();

    if let Some(term) = filter.search.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()) {
        spec.add_criteria(move |material: &Material| {
            let contains = |value: &str| value.to_lowercase().contains(&term);
            contains(&material.material_code)
                || contains(&material.material_name)
                || material.supplier_name.as_deref().is_some_and(contains)
        });
    }

    if let Some(category) = filter.category.filter(|c| !c.trim().is_empty()) {
        spec.add_criteria(move |material: &Material| {
            material
                .material_category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(category.trim()))
        });
    }

    if let Some(is_active) = filter.is_active {
        spec.add_criteria(move |material: &Material| material.is_active == is_active);
    }

    if filter.low_stock_only {
        spec.add_criteria(Material::is_low_stock);
    }

    spec.add_order_by(|material: &Material| material.material_code.clone())
        .apply_paging(page_size, page);
    spec
}

/// Active materials at or below their minimum stock, by code
pub fn low_stock_materials() -> Specification<Material> {
    let mut spec = Specification::with_criteria(|material: &Material| {
        material.is_active && material.is_low_stock()
    });
    spec.add_order_by(|material: &Material| material.material_code.clone());
    spec
}
