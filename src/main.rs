use clap::Parser;
use miette::{IntoDiagnostic, Result, miette};
use scholarpay::application::checkout::{Checkout, CheckoutEntry, CheckoutForm, SubmissionOutcome};
use scholarpay::application::result_view::ResultView;
use scholarpay::config::{CheckoutConfig, DEFAULT_API_URL, DEFAULT_PROCESSOR_URL};
use scholarpay::domain::application::PaymentMethod;
use scholarpay::domain::payment::CardToken;
use scholarpay::domain::ports::{
    ApplicationReaderBox, ApplicationWriterBox, IdentityProviderBox, PaymentGatewayBox,
    ScholarshipCatalogBox,
};
use scholarpay::domain::scholarship::ScholarshipId;
use scholarpay::domain::session::{BearerToken, Identity};
use scholarpay::infrastructure::in_memory::{InMemoryApplicationStore, InMemoryScholarshipCatalog};
use scholarpay::infrastructure::scripted_gateway::{GatewayBehavior, ScriptedGateway};
use scholarpay::infrastructure::session::StaticSession;
use scholarpay::interfaces::csv::reconciliation_writer::ReconciliationWriter;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const OFFLINE_TOKEN: &str = "offline";

#[derive(Parser)]
#[command(author, version, about = "Pay the application fee for a scholarship and submit the application", long_about = None)]
struct Cli {
    /// Scholarship to apply for
    scholarship_id: String,

    /// Name printed on the card
    #[arg(long, default_value = "")]
    cardholder_name: String,

    /// Accept the terms and conditions (required to pay)
    #[arg(long)]
    accept_terms: bool,

    /// Card token issued by the processor's tokenization library
    #[arg(long, default_value = "tok_visa")]
    card_token: String,

    /// stripe, paypal or credit-card
    #[arg(long, default_value = "stripe")]
    payment_method: PaymentMethod,

    /// Signed-in applicant's email. Without it the caller is anonymous.
    #[arg(long, env = "SCHOLARPAY_EMAIL")]
    email: Option<String>,

    #[arg(long)]
    display_name: Option<String>,

    #[arg(long)]
    photo_url: Option<String>,

    /// Bearer token from the identity provider
    #[arg(long, env = "SCHOLARPAY_ID_TOKEN", hide_env_values = true)]
    id_token: Option<String>,

    #[arg(long, env = "SCHOLARPAY_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    #[arg(long, env = "SCHOLARPAY_PROCESSOR_URL", default_value = DEFAULT_PROCESSOR_URL)]
    processor_url: String,

    #[arg(long, env = "SCHOLARPAY_PUBLISHABLE_KEY", default_value = "", hide_env_values = true)]
    publishable_key: String,

    /// HTTP timeout in seconds. Defaults to the HTTP client's own.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Run against in-memory adapters instead of the REST backend
    #[arg(long, requires = "scholarship_file")]
    offline: bool,

    /// JSON file with one scholarship offer or an array of them (offline mode)
    #[arg(long)]
    scholarship_file: Option<PathBuf>,

    /// Replace the processor with a scripted one: succeed[:tx], decline[:message],
    /// intent-error[:message], confirm-error[:message], unverified[:message] or not-ready
    #[arg(long)]
    mock_gateway: Option<GatewayBehavior>,

    /// Make application writes fail (offline mode)
    #[arg(long, requires = "offline")]
    fail_record_writes: bool,

    /// Append payments that were captured without a saved application to this CSV file
    #[arg(long)]
    reconciliation_log: Option<PathBuf>,
}

struct Wiring {
    catalog: ScholarshipCatalogBox,
    gateway: PaymentGatewayBox,
    writer: ApplicationWriterBox,
    reader: ApplicationReaderBox,
}

fn session(cli: &Cli) -> Result<IdentityProviderBox> {
    let Some(email) = cli.email.clone() else {
        return Ok(Box::new(StaticSession::anonymous()));
    };
    let token = match (&cli.id_token, cli.offline) {
        (Some(token), _) => token.clone(),
        (None, true) => OFFLINE_TOKEN.to_string(),
        (None, false) => return Err(miette!("--id-token is required for {email}")),
    };
    let identity = Identity {
        email,
        display_name: cli.display_name.clone(),
        photo_url: cli.photo_url.clone(),
    };
    Ok(Box::new(StaticSession::signed_in(identity, BearerToken::new(token))))
}

fn wiring(cli: &Cli) -> Result<Wiring> {
    let scripted = cli.mock_gateway.clone().map(ScriptedGateway::new);

    if cli.offline {
        let path = cli
            .scholarship_file
            .as_ref()
            .ok_or_else(|| miette!("--offline needs --scholarship-file"))?;
        let file = File::open(path).into_diagnostic()?;
        let catalog = InMemoryScholarshipCatalog::from_json_reader(file).into_diagnostic()?;
        let store = InMemoryApplicationStore::new();
        store.set_fail_writes(cli.fail_record_writes);
        let gateway = scripted.unwrap_or_else(|| {
            ScriptedGateway::new(GatewayBehavior::Succeed {
                transaction_id: None,
            })
        });
        return Ok(Wiring {
            catalog: Box::new(catalog),
            gateway: Box::new(gateway),
            writer: Box::new(store.clone()),
            reader: Box::new(store),
        });
    }

    let config = CheckoutConfig {
        api_base_url: cli.api_url.clone(),
        processor_base_url: cli.processor_url.clone(),
        publishable_key: cli.publishable_key.clone(),
        request_timeout: cli.timeout_secs.map(Duration::from_secs),
    };
    let client = config.http_client().into_diagnostic()?;
    let api = config.rest_api(client.clone()).into_diagnostic()?;
    let gateway: PaymentGatewayBox = match scripted {
        Some(scripted) => Box::new(scripted),
        None => Box::new(config.stripe_gateway(client).into_diagnostic()?),
    };
    Ok(Wiring {
        catalog: Box::new(api.clone()),
        gateway,
        writer: Box::new(api.clone()),
        reader: Box::new(api),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let session = session(&cli)?;
    let Wiring {
        catalog,
        gateway,
        writer,
        reader,
    } = wiring(&cli)?;
    let checkout = Checkout::new(session, catalog, gateway, writer);

    let scholarship_id = ScholarshipId::new(cli.scholarship_id.clone());
    let page = match checkout.open(&scholarship_id).await {
        CheckoutEntry::Ready(page) => page,
        CheckoutEntry::Redirect(redirect) => {
            println!("redirect: {redirect}");
            return Ok(());
        }
    };
    println!(
        "checkout: {} ({}) total {}",
        page.offer().scholarship_name,
        page.offer().university_name,
        page.total_due()
    );

    let submission = page
        .submit(CheckoutForm {
            cardholder_name: cli.cardholder_name.clone(),
            terms_accepted: cli.accept_terms,
            card: CardToken::new(cli.card_token.clone()),
            payment_method: cli.payment_method,
        })
        .await;
    println!("state: {}", submission.state());

    if let Some(message) = submission.outcome.inline_error() {
        return Err(miette!("{message}"));
    }

    if let SubmissionOutcome::Inconsistent(inconsistency) = &submission.outcome
        && let Some(path) = &cli.reconciliation_log
    {
        ReconciliationWriter::append_to(path)
            .and_then(|mut log| log.write(inconsistency))
            .into_diagnostic()?;
    }

    if let Some(redirect) = submission.outcome.redirect() {
        println!("redirect: {redirect}");
        if let Some(view) = ResultView::load(reader.as_ref(), &redirect).await
            && let Some(record) = view.application()
        {
            println!(
                "application: {}",
                serde_json::to_string(record).into_diagnostic()?
            );
        }
    }

    match submission.outcome {
        SubmissionOutcome::Inconsistent(inconsistency) => Err(miette!(
            "payment {} was captured but the application was not saved",
            inconsistency.transaction_id
        )),
        _ => Ok(()),
    }
}
