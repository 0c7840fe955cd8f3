//! submit.rs
//!
//! Сценарий сохранения тарифов оффера.
//!
//! Одна попытка проходит состояния `Idle -> Validating -> (Confirming) -> Persisting
//! -> (Success | Failure)`. Одновременно выполняется не больше одной попытки:
//! повторный вызов во время полёта игнорируется и возвращает `Ignored`.

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::errors::{ApiError, PricingError};
use crate::models::{
    Offer, OfferId, PriceCategory, PriceCategoryFormValues, PriceCategoryId, StockIndex,
};
use crate::pricing::{
    get_popin_type, lock_single_label, plan_deletion, validate_form, DeletionPlan, FieldError,
    PopinType,
};
use crate::services::notify::{ConfirmationDialog, Notification, Notifier};
use crate::services::offer_api::{OfferApi, PatchOfferBody};

const UPDATE_ERROR_MESSAGE: &str = "Une erreur est survenue lors de la mise à jour de vos tarifs";
const DELETE_ERROR_MESSAGE: &str = "Une erreur est survenue lors de la suppression du tarif";
const DELETE_SUCCESS_MESSAGE: &str = "Le tarif a été supprimé.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Validating,
    Confirming(PopinType),
    Persisting,
    Success,
    Failure,
}

impl SubmitState {
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            SubmitState::Validating | SubmitState::Confirming(_) | SubmitState::Persisting
        )
    }
}

/// Режим, в котором вызывающий экран сохраняет тарифы.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Сохранение черновика, остаёмся на шаге тарифов.
    Draft,
    /// Создание оффера: переход к шагу стоков.
    StepAdvance,
    /// Редактирование опубликованного оффера.
    Edition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    PriceCategories,
    Stocks,
    PriceCategoriesReadOnly,
}

impl SubmitMode {
    pub fn next_step(self) -> WizardStep {
        match self {
            SubmitMode::Draft => WizardStep::PriceCategories,
            SubmitMode::StepAdvance => WizardStep::Stocks,
            SubmitMode::Edition => WizardStep::PriceCategoriesReadOnly,
        }
    }

    pub fn success_message(self) -> Option<&'static str> {
        match self {
            SubmitMode::Draft => Some("Brouillon sauvegardé dans la liste des offres"),
            SubmitMode::StepAdvance => None,
            SubmitMode::Edition => Some("Vos modifications ont été sauvegardées"),
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Saved { offer: Offer, next_step: WizardStep },
    /// Пользователь отменил подтверждение, ничего не сохранено.
    Cancelled,
    Invalid(Vec<FieldError>),
    Failed(PricingError),
    /// Другая отправка уже в полёте.
    Ignored,
}

impl SubmitOutcome {
    /// Сворачивает исход в `Result`: `Ok(None)` - ничего не сохранено (отмена или игнор).
    pub fn into_result(self) -> Result<Option<(Offer, WizardStep)>, PricingError> {
        match self {
            SubmitOutcome::Saved { offer, next_step } => Ok(Some((offer, next_step))),
            SubmitOutcome::Cancelled | SubmitOutcome::Ignored => Ok(None),
            SubmitOutcome::Invalid(errors) => Err(PricingError::Validation(errors)),
            SubmitOutcome::Failed(e) => Err(e),
        }
    }
}

#[derive(Debug)]
pub enum DeletionOutcome {
    /// Остался один тариф, удалять нечего.
    Disabled,
    Removed {
        values: PriceCategoryFormValues,
        label_locked: bool,
    },
    /// Сохранённых тарифов не осталось, а оставшиеся строки формы не проходят проверку.
    /// Удаление на сервере не выполнялось.
    Invalid(Vec<FieldError>),
    Failed(PricingError),
    Ignored,
}

struct Session {
    state: SubmitState,
    initial_values: PriceCategoryFormValues,
    stocks: StockIndex,
}

/// Оркестратор сохранения тарифов одного оффера.
pub struct SubmitOrchestrator {
    offer_id: OfferId,
    /// Подкатегория оффера допускает duo-бронирование.
    can_be_duo: bool,
    api: Arc<dyn OfferApi>,
    dialog: Arc<dyn ConfirmationDialog>,
    notifier: Arc<dyn Notifier>,
    session: Mutex<Session>,
}

impl SubmitOrchestrator {
    pub fn new(
        offer: &Offer,
        stocks: StockIndex,
        can_be_duo: bool,
        api: Arc<dyn OfferApi>,
        dialog: Arc<dyn ConfirmationDialog>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            offer_id: offer.id,
            can_be_duo,
            api,
            dialog,
            notifier,
            session: Mutex::new(Session {
                state: SubmitState::Idle,
                initial_values: PriceCategoryFormValues::from_offer(offer),
                stocks,
            }),
        }
    }

    /// Загружает оффер и все его стоки.
    pub async fn load(
        offer_id: OfferId,
        can_be_duo: bool,
        api: Arc<dyn OfferApi>,
        dialog: Arc<dyn ConfirmationDialog>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ApiError> {
        let offer = api.get_offer(offer_id).await?;
        let stocks = api.get_all_stocks(offer_id).await?;
        info!(
            "Loaded offer {} with {} price categories and {} stocks",
            offer_id,
            offer.price_categories.len(),
            stocks.len()
        );
        Ok(Self::new(&offer, stocks, can_be_duo, api, dialog, notifier))
    }

    pub fn offer_id(&self) -> OfferId {
        self.offer_id
    }

    pub fn state(&self) -> SubmitState {
        self.lock().state
    }

    pub fn initial_values(&self) -> PriceCategoryFormValues {
        self.lock().initial_values.clone()
    }

    pub fn stocks(&self) -> StockIndex {
        self.lock().stocks.clone()
    }

    /// Перечитывает оффер и стоки с сервера.
    pub async fn refresh(&self) -> Result<Offer, ApiError> {
        let offer = self.api.get_offer(self.offer_id).await?;
        let stocks = self.api.get_all_stocks(self.offer_id).await?;

        let mut session = self.lock();
        session.initial_values = PriceCategoryFormValues::from_offer(&offer);
        session.stocks = stocks;
        Ok(offer)
    }

    /// Проверяет, при необходимости подтверждает и сохраняет значения формы.
    pub async fn submit(&self, values: &PriceCategoryFormValues, mode: SubmitMode) -> SubmitOutcome {
        let Some(flight) = self.begin() else {
            return SubmitOutcome::Ignored;
        };

        // единственный тариф всегда называется "Tarif unique"
        let mut values = values.clone();
        lock_single_label(&mut values.price_categories);
        let values = &values;

        if let Err(errors) = validate_form(values) {
            debug!("offer {}: {} validation error(s)", self.offer_id, errors.len());
            flight.finish(SubmitState::Idle);
            return SubmitOutcome::Invalid(errors);
        }

        let popin = {
            let session = self.lock();
            get_popin_type(&session.stocks, &session.initial_values, values)
        };

        if popin.requires_confirmation() {
            flight.transition(SubmitState::Confirming(popin));
            if !self.dialog.confirm(popin).await {
                info!("offer {}: price change cancelled by user", self.offer_id);
                flight.finish(SubmitState::Idle);
                return SubmitOutcome::Cancelled;
            }
        }

        flight.transition(SubmitState::Persisting);
        match self.persist(values).await {
            Ok(offer) => {
                self.lock().initial_values = PriceCategoryFormValues::from_offer(&offer);
                flight.finish(SubmitState::Success);
                if let Some(message) = mode.success_message() {
                    self.notifier.notify(Notification::success(message));
                }
                SubmitOutcome::Saved {
                    offer,
                    next_step: mode.next_step(),
                }
            }
            Err(e) => {
                error!("offer {}: failed to save price categories: {}", self.offer_id, e);
                flight.finish(SubmitState::Failure);
                self.notifier.notify(Notification::error(UPDATE_ERROR_MESSAGE));
                SubmitOutcome::Failed(PricingError::Persistence(e))
            }
        }
    }

    /// Удаляет тариф `index` из формы. Сохранённый тариф удаляется на сервере,
    /// после чего оставшиеся сохранённые тарифы отправляются повторно. Если
    /// сохранённых не осталось, вместо них отправляются оставшиеся строки формы,
    /// чтобы у оффера на сервере всегда был хотя бы один тариф.
    pub async fn delete_price_category(
        &self,
        values: &PriceCategoryFormValues,
        index: usize,
    ) -> DeletionOutcome {
        let DeletionPlan::Remove {
            remaining,
            delete_request,
            label_locked,
        } = plan_deletion(&values.price_categories, index)
        else {
            return DeletionOutcome::Disabled;
        };

        let next_values = PriceCategoryFormValues {
            price_categories: remaining,
            is_duo: values.is_duo,
        };

        let Some(price_category_id) = delete_request else {
            // тариф ещё не сохранён - достаточно убрать строку из формы
            return DeletionOutcome::Removed {
                values: next_values,
                label_locked,
            };
        };

        let Some(flight) = self.begin() else {
            return DeletionOutcome::Ignored;
        };

        let resubmission = self.resubmission_for(&next_values.price_categories, price_category_id);
        let only_unsaved_left = resubmission.iter().all(|category| !category.is_persisted());
        if only_unsaved_left {
            if let Err(errors) = validate_form(&next_values) {
                debug!(
                    "offer {}: deletion of {} refused, {} validation error(s) in remaining rows",
                    self.offer_id,
                    price_category_id,
                    errors.len()
                );
                flight.finish(SubmitState::Idle);
                return DeletionOutcome::Invalid(errors);
            }
        }

        flight.transition(SubmitState::Persisting);
        match self.delete_and_resubmit(price_category_id, &resubmission).await {
            Ok(offer) => {
                self.lock().initial_values = PriceCategoryFormValues::from_offer(&offer);
                flight.finish(SubmitState::Success);
                self.notifier.notify(Notification::success(DELETE_SUCCESS_MESSAGE));
                // строки формы получили id на сервере
                let values = if only_unsaved_left {
                    PriceCategoryFormValues {
                        price_categories: offer.price_categories,
                        is_duo: next_values.is_duo,
                    }
                } else {
                    next_values
                };
                DeletionOutcome::Removed {
                    values,
                    label_locked,
                }
            }
            Err(e) => {
                error!(
                    "offer {}: failed to delete price category {}: {}",
                    self.offer_id, price_category_id, e
                );
                flight.finish(SubmitState::Failure);
                self.notifier.notify(Notification::error(DELETE_ERROR_MESSAGE));
                DeletionOutcome::Failed(PricingError::Persistence(e))
            }
        }
    }

    async fn persist(&self, values: &PriceCategoryFormValues) -> Result<Offer, ApiError> {
        // isDuo отправляется только если подкатегория его допускает
        let patch = PatchOfferBody {
            is_duo: self.can_be_duo.then_some(values.is_duo),
        };
        self.api.patch_offer(self.offer_id, &patch).await?;
        self.api
            .post_price_categories(self.offer_id, &values.price_categories)
            .await
    }

    async fn delete_and_resubmit(
        &self,
        price_category_id: PriceCategoryId,
        resubmission: &[PriceCategory],
    ) -> Result<Offer, ApiError> {
        self.api
            .delete_price_category(self.offer_id, price_category_id)
            .await?;
        self.api
            .post_price_categories(self.offer_id, resubmission)
            .await
    }

    // Повторно отправляем уже сохранённые тарифы в их серверном виде;
    // несохранённые строки и правки формы уйдут при следующей отправке.
    // Если сохранённых не осталось, отправляются строки формы как есть.
    fn resubmission_for(
        &self,
        remaining: &[PriceCategory],
        deleted: PriceCategoryId,
    ) -> Vec<PriceCategory> {
        let session = self.lock();
        let mut out: Vec<PriceCategory> = remaining
            .iter()
            .filter_map(|category| category.id)
            .filter(|id| *id != deleted)
            .filter_map(|id| session.initial_values.find(id).cloned())
            .collect();

        if out.is_empty() {
            return remaining.to_vec();
        }
        if let ([server], [local]) = (out.as_mut_slice(), remaining) {
            server.label = local.label.clone();
        }
        out
    }

    fn begin(&self) -> Option<InFlight<'_>> {
        let mut session = self.lock();
        if session.state.is_in_flight() {
            warn!(
                "offer {}: submission ignored, another one is {:?}",
                self.offer_id, session.state
            );
            return None;
        }
        debug!("offer {}: {:?} -> Validating", self.offer_id, session.state);
        session.state = SubmitState::Validating;
        Some(InFlight {
            owner: self,
            done: false,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Текущая попытка. Если future отброшен посреди полёта, состояние возвращается в `Idle`.
struct InFlight<'a> {
    owner: &'a SubmitOrchestrator,
    done: bool,
}

impl InFlight<'_> {
    fn transition(&self, next: SubmitState) {
        let mut session = self.owner.lock();
        debug!("offer {}: {:?} -> {:?}", self.owner.offer_id, session.state, next);
        session.state = next;
    }

    fn finish(mut self, next: SubmitState) {
        self.transition(next);
        self.done = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.transition(SubmitState::Idle);
        }
    }
}
