pub mod circuit_breaker;
pub mod notify;
pub mod offer_api;
pub mod submit;

pub use notify::{ConfirmationDialog, Notification, NotificationKind, Notifier};
pub use offer_api::{HttpOfferApi, OfferApi, PatchOfferBody};
pub use submit::{DeletionOutcome, SubmitMode, SubmitOrchestrator, SubmitOutcome, SubmitState, WizardStep};
