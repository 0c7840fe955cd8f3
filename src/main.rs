use anyhow::{bail, Context};
use async_trait::async_trait;
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

use offer_pricing::{
    config::Config,
    init_tracing,
    models::{OfferId, PriceCategoryFormValues},
    pricing::PopinType,
    services::{
        ConfirmationDialog, HttpOfferApi, Notification, NotificationKind, Notifier, SubmitMode,
        SubmitOrchestrator,
    },
};

const USAGE: &str =
    "usage: pricing_sync <offer_id> <values.json> [--mode draft|step|edition] [--yes] [--duo]";

/// Уведомления печатаются в stdout.
struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => println!("✅ {}", notification.message),
            NotificationKind::Error => println!("❌ {}", notification.message),
        }
    }
}

/// Подтверждение в терминале: y/N, либо всегда "да" с `--yes`.
struct TerminalDialog {
    assume_yes: bool,
}

#[async_trait]
impl ConfirmationDialog for TerminalDialog {
    async fn confirm(&self, popin: PopinType) -> bool {
        println!("{}", popin.title());
        if let Some(message) = popin.message() {
            println!("{}", message);
        }
        if self.assume_yes {
            return true;
        }

        let answer = tokio::task::spawn_blocking(|| {
            print!("Confirmer la modification ? [y/N] ");
            let _ = std::io::stdout().flush();
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await;

        matches!(answer, Ok(Ok(line)) if line.trim().eq_ignore_ascii_case("y"))
    }
}

struct Args {
    offer_id: OfferId,
    values_path: String,
    mode: SubmitMode,
    assume_yes: bool,
    can_be_duo: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut mode = SubmitMode::Edition;
    let mut assume_yes = false;
    let mut can_be_duo = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--yes" => assume_yes = true,
            "--duo" => can_be_duo = true,
            "--mode" => {
                mode = match args.next().as_deref() {
                    Some("draft") => SubmitMode::Draft,
                    Some("step") => SubmitMode::StepAdvance,
                    Some("edition") => SubmitMode::Edition,
                    other => bail!("unknown mode {:?}\n{}", other, USAGE),
                }
            }
            _ => positional.push(arg),
        }
    }

    let [offer_id, values_path] = <[String; 2]>::try_from(positional)
        .map_err(|_| anyhow::anyhow!(USAGE))?;

    Ok(Args {
        offer_id: OfferId(offer_id.parse().context("offer_id must be a number")?),
        values_path,
        mode,
        assume_yes,
        can_be_duo,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(&config.app);

    let args = parse_args()?;
    info!("Syncing price categories of offer {}", args.offer_id);

    let raw = std::fs::read_to_string(&args.values_path)
        .with_context(|| format!("cannot read {}", args.values_path))?;
    let values: PriceCategoryFormValues =
        serde_json::from_str(&raw).context("invalid price categories file")?;

    let api = Arc::new(HttpOfferApi::from_config(&config.api, &config.circuit_breaker)?);
    let orchestrator = SubmitOrchestrator::load(
        args.offer_id,
        args.can_be_duo,
        api,
        Arc::new(TerminalDialog {
            assume_yes: args.assume_yes,
        }),
        Arc::new(StdoutNotifier),
    )
    .await
    .context("cannot load offer")?;

    match orchestrator.submit(&values, args.mode).await.into_result() {
        Ok(Some((offer, next_step))) => {
            info!(
                "Offer {} saved with {} price categories, next step {:?}",
                offer.id,
                offer.price_categories.len(),
                next_step
            );
            Ok(())
        }
        Ok(None) => {
            warn!("Nothing saved for offer {}", args.offer_id);
            Ok(())
        }
        Err(offer_pricing::errors::PricingError::Validation(errors)) => {
            for error in &errors {
                eprintln!("{}: {}", error.field, error.message);
            }
            bail!("{} invalid field(s)", errors.len())
        }
        Err(e) => Err(e.into()),
    }
}
