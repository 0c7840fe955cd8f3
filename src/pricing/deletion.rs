use crate::models::{PriceCategory, PriceCategoryId, DEFAULT_PRICE_CATEGORY_LABEL};

/// Результат удаления тарифа из формы.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionPlan {
    /// Удаление запрещено: у оффера всегда остаётся хотя бы один тариф.
    Disabled,
    Remove {
        remaining: Vec<PriceCategory>,
        /// Тариф уже сохранён - нужен запрос на удаление до повторной отправки.
        delete_request: Option<PriceCategoryId>,
        /// Остался один тариф: его метка зафиксирована как "Tarif unique".
        label_locked: bool,
    },
}

pub fn is_deletion_enabled(categories: &[PriceCategory]) -> bool {
    categories.len() > 1
}

pub fn is_label_editable(categories: &[PriceCategory]) -> bool {
    categories.len() > 1
}

/// Единственному тарифу ставит метку "Tarif unique". Возвращает `true`, если тариф один.
pub fn lock_single_label(categories: &mut [PriceCategory]) -> bool {
    let [single] = categories else {
        return false;
    };
    if single.label != DEFAULT_PRICE_CATEGORY_LABEL {
        single.label = DEFAULT_PRICE_CATEGORY_LABEL.to_string();
    }
    true
}

/// Планирует удаление тарифа `index`. Флаг duo не трогается.
pub fn plan_deletion(categories: &[PriceCategory], index: usize) -> DeletionPlan {
    if !is_deletion_enabled(categories) || index >= categories.len() {
        return DeletionPlan::Disabled;
    }

    let mut remaining = categories.to_vec();
    let removed = remaining.remove(index);

    let label_locked = lock_single_label(&mut remaining);

    DeletionPlan::Remove {
        remaining,
        delete_request: removed.id,
        label_locked,
    }
}
