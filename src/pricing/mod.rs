//! Чистая логика экрана тарифов: классификация правок, удаление тарифов, проверка формы.

pub mod classifier;
pub mod deletion;
pub mod validation;

pub use classifier::{get_popin_type, PopinType};
pub use deletion::{
    is_deletion_enabled, is_label_editable, lock_single_label, plan_deletion, DeletionPlan,
};
pub use validation::{validate_form, FieldError, MAX_PRICE, MAX_PRICE_CATEGORIES};
