mod common;

use common::{SCHOLARSHIP_ID, StubServer, applicant, form, signed_in};
use scholarpay::application::checkout::{Checkout, CheckoutEntry, SubmissionOutcome};
use scholarpay::application::result_view::ResultView;
use scholarpay::application::state::CheckoutState;
use scholarpay::config::CheckoutConfig;
use scholarpay::domain::application::{ApplicationId, ApplicationRecord};
use scholarpay::domain::payment::SubmissionKey;
use scholarpay::domain::route::Redirect;
use scholarpay::domain::ports::{ApplicationReader, ApplicationWriter, ScholarshipCatalog};
use scholarpay::domain::scholarship::{ScholarshipId, ScholarshipOffer};
use scholarpay::domain::session::BearerToken;
use scholarpay::error::CheckoutError;
use scholarpay::infrastructure::rest_api::RestApi;

const OFFER_BODY: &str = r#"{
    "_id": "665f1c2e9b1e8a0012345678",
    "scholarshipName": "Global Excellence Scholarship",
    "universityName": "University of Oslo",
    "universityImage": "https://img.example/oslo.png",
    "universityCountry": "Norway",
    "degree": "Masters",
    "subjectCategory": "Engineering",
    "applicationFees": 150,
    "serviceCharge": 50
}"#;

fn config(server: &StubServer) -> CheckoutConfig {
    CheckoutConfig {
        api_base_url: server.base_url.clone(),
        processor_base_url: server.base_url.clone(),
        publishable_key: "pk_test_123".to_string(),
        request_timeout: None,
    }
}

fn api(server: &StubServer) -> RestApi {
    let config = config(server);
    config.rest_api(config.http_client().unwrap()).unwrap()
}

fn stripe_checkout(server: &StubServer) -> Checkout {
    let config = config(server);
    let client = config.http_client().unwrap();
    let api = config.rest_api(client.clone()).unwrap();
    Checkout::new(
        Box::new(signed_in()),
        Box::new(api.clone()),
        Box::new(config.stripe_gateway(client).unwrap()),
        Box::new(api),
    )
}

#[tokio::test]
async fn test_catalog_fetches_offer() {
    let server = StubServer::builder()
        .route("GET", &format!("/api/scholarships/{SCHOLARSHIP_ID}"), 200, OFFER_BODY)
        .start()
        .await;

    let offer = ScholarshipCatalog::get(&api(&server), &ScholarshipId::new(SCHOLARSHIP_ID))
        .await
        .unwrap();

    assert_eq!(offer.scholarship_name, "Global Excellence Scholarship");
    assert_eq!(offer.total_due().to_string(), "200.00");
}

#[tokio::test]
async fn test_catalog_missing_offer() {
    let server = StubServer::builder().start().await;

    let result = ScholarshipCatalog::get(&api(&server), &ScholarshipId::new("nope")).await;

    assert!(matches!(result, Err(CheckoutError::NotFoundError(_))));
}

#[tokio::test]
async fn test_writer_surfaces_server_message() {
    let server = StubServer::builder()
        .route("POST", "/api/applications", 401, r#"{"message": "Unauthorized access"}"#)
        .start()
        .await;
    let offer: ScholarshipOffer = serde_json::from_str(OFFER_BODY).unwrap();
    let record = ApplicationRecord::unpaid(
        &offer,
        &applicant(),
        Default::default(),
        offer.total_due(),
        "card_declined",
    );

    let result = api(&server)
        .create(&record, &BearerToken::new("expired"), &SubmissionKey::generate())
        .await;

    match result {
        Err(error @ CheckoutError::ApiError { status: 401, .. }) => {
            assert_eq!(error.user_message(), "Unauthorized access");
        }
        other => panic!("unexpected result {other:?}"),
    }
    let sent = &server.requests_to("/api/applications")[0];
    assert_eq!(sent.header("authorization"), Some("Bearer expired"));
    assert_eq!(sent.json()["paymentStatus"], "unpaid");
}

#[tokio::test]
async fn test_reader_missing_application_is_none() {
    let server = StubServer::builder().start().await;

    let record = ApplicationReader::get(&api(&server), &ApplicationId::new("app-1"))
        .await
        .unwrap();

    assert!(record.is_none());
}

#[tokio::test]
async fn test_failure_view_reads_backend_record() {
    let server = StubServer::builder()
        .route(
            "GET",
            "/api/applications/app-11",
            200,
            r#"{
                "_id": "app-11", "scholarshipId": "665f1c2e9b1e8a0012345678",
                "scholarshipName": "Global Excellence Scholarship", "universityName": "University of Oslo",
                "universityImage": null, "userEmail": "ada@example.com", "userName": "Ada Lovelace",
                "applicationStatus": "payment-pending", "paymentStatus": "unpaid", "totalPaid": 200,
                "paymentError": "card_declined", "applicationDate": "2024-06-01T10:00:00.000Z"
            }"#,
        )
        .start()
        .await;
    let redirect = Redirect::PaymentFailure {
        application_id: Some(ApplicationId::new("app-11")),
        error: "card_declined".to_string(),
    };

    let view = ResultView::load(&api(&server), &redirect).await.unwrap();

    let record = view.application().unwrap();
    assert_eq!(record.id, Some(ApplicationId::new("app-11")));
    assert_eq!(record.university_image, "");
    assert_eq!(record.application_date.as_deref(), Some("2024-06-01T10:00:00.000Z"));
    assert_eq!(view.next().path(), format!("/checkout/{SCHOLARSHIP_ID}"));
}

#[tokio::test]
async fn test_stripe_checkout_success_end_to_end() {
    let server = StubServer::builder()
        .route("GET", &format!("/api/scholarships/{SCHOLARSHIP_ID}"), 200, OFFER_BODY)
        .route(
            "POST",
            "/api/create-payment-intent",
            200,
            r#"{"clientSecret": "pi_1_secret_abc"}"#,
        )
        .route(
            "POST",
            "/v1/payment_intents/pi_1/confirm",
            200,
            r#"{"id": "pi_1", "status": "succeeded"}"#,
        )
        .route(
            "POST",
            "/api/applications",
            200,
            r#"{"acknowledged": true, "insertedId": "app-9"}"#,
        )
        .start()
        .await;
    let checkout = stripe_checkout(&server);
    let CheckoutEntry::Ready(page) = checkout.open(&ScholarshipId::new(SCHOLARSHIP_ID)).await
    else {
        panic!("checkout did not open");
    };

    let submission = page.submit(form()).await;

    assert_eq!(submission.state(), CheckoutState::Succeeded);
    assert_eq!(
        submission.outcome.redirect().unwrap().path(),
        "/payment-success?applicationId=app-9"
    );

    let intent = &server.requests_to("/api/create-payment-intent")[0];
    assert_eq!(intent.header("authorization"), Some("Bearer id-token-1"));
    assert_eq!(
        intent.json(),
        serde_json::json!({"amount": 200.0, "scholarshipName": "Global Excellence Scholarship"})
    );

    let confirm = &server.requests_to("/v1/payment_intents/pi_1/confirm")[0];
    assert_eq!(confirm.header("authorization"), Some("Bearer pk_test_123"));
    assert!(confirm.body.contains("client_secret=pi_1_secret_abc"));
    assert!(confirm.body.contains("payment_method_data%5Bcard%5D%5Btoken%5D=tok_visa"));

    let application = &server.requests_to("/api/applications")[0];
    let body = application.json();
    assert_eq!(body["paymentStatus"], "paid");
    assert_eq!(body["applicationStatus"], "pending");
    assert_eq!(body["totalPaid"], 200.0);
    assert_eq!(body["stripePaymentIntentId"], "pi_1");

    // The same submission key travels with the intent and the record.
    let key = intent.header("idempotency-key").unwrap();
    assert_eq!(application.header("idempotency-key"), Some(key));
    assert_eq!(key, submission.key.to_string());
}

#[tokio::test]
async fn test_stripe_checkout_decline_end_to_end() {
    let server = StubServer::builder()
        .route("GET", &format!("/api/scholarships/{SCHOLARSHIP_ID}"), 200, OFFER_BODY)
        .route(
            "POST",
            "/api/create-payment-intent",
            200,
            r#"{"clientSecret": "pi_2_secret_def"}"#,
        )
        .route(
            "POST",
            "/v1/payment_intents/pi_2/confirm",
            402,
            r#"{"error": {"type": "card_error", "code": "card_declined", "message": "Your card was declined."}}"#,
        )
        .route("POST", "/api/applications", 201, r#"{"insertedId": "app-10"}"#)
        .route(
            "GET",
            "/api/applications/app-10",
            200,
            r#"{
                "scholarshipId": "665f1c2e9b1e8a0012345678", "scholarshipName": "Global Excellence Scholarship",
                "universityName": "University of Oslo", "universityImage": "", "universityCountry": "Norway",
                "degree": "Masters", "subjectCategory": "Engineering", "applicationFees": 150,
                "serviceCharge": 50, "userEmail": "ada@example.com", "userName": "Ada Lovelace",
                "userPhoto": "", "applicationStatus": "payment-pending", "paymentMethod": "stripe",
                "paymentStatus": "unpaid", "totalPaid": 200, "paymentError": "Your card was declined."
            }"#,
        )
        .start()
        .await;
    let checkout = stripe_checkout(&server);
    let CheckoutEntry::Ready(page) = checkout.open(&ScholarshipId::new(SCHOLARSHIP_ID)).await
    else {
        panic!("checkout did not open");
    };

    let submission = page.submit(form()).await;

    let SubmissionOutcome::PaymentFailed {
        application_id,
        error,
        ..
    } = &submission.outcome
    else {
        panic!("unexpected outcome {:?}", submission.outcome);
    };
    assert_eq!(application_id.as_ref().unwrap().as_str(), "app-10");
    assert_eq!(error, "Your card was declined.");
    assert_eq!(
        server.requests_to("/api/applications")[0].json()["paymentError"],
        "Your card was declined."
    );

    let redirect = submission.outcome.redirect().unwrap();
    let view = ResultView::load(&api(&server), &redirect).await.unwrap();
    assert_eq!(
        view.next().path(),
        format!("/checkout/{SCHOLARSHIP_ID}")
    );
}

#[tokio::test]
async fn test_intent_rejection_by_backend() {
    let server = StubServer::builder()
        .route("GET", &format!("/api/scholarships/{SCHOLARSHIP_ID}"), 200, OFFER_BODY)
        .route(
            "POST",
            "/api/create-payment-intent",
            403,
            r#"{"message": "Forbidden access"}"#,
        )
        .start()
        .await;
    let checkout = stripe_checkout(&server);
    let CheckoutEntry::Ready(page) = checkout.open(&ScholarshipId::new(SCHOLARSHIP_ID)).await
    else {
        panic!("checkout did not open");
    };

    let submission = page.submit(form()).await;

    assert_eq!(
        submission.outcome,
        SubmissionOutcome::IntentFailed {
            error: "Forbidden access".to_string()
        }
    );
    assert!(server.requests_to("/api/applications").is_empty());
    assert!(server.requests_to("/v1/payment_intents/pi_1/confirm").is_empty());
}

#[tokio::test]
async fn test_unreadable_confirm_reply_is_flagged_for_reconciliation() {
    let server = StubServer::builder()
        .route("GET", &format!("/api/scholarships/{SCHOLARSHIP_ID}"), 200, OFFER_BODY)
        .route(
            "POST",
            "/api/create-payment-intent",
            200,
            r#"{"clientSecret": "pi_3_secret_ghi"}"#,
        )
        .route("POST", "/v1/payment_intents/pi_3/confirm", 200, "<html>gateway</html>")
        .start()
        .await;
    let checkout = stripe_checkout(&server);
    let CheckoutEntry::Ready(page) = checkout.open(&ScholarshipId::new(SCHOLARSHIP_ID)).await
    else {
        panic!("checkout did not open");
    };

    let submission = page.submit(form()).await;

    let SubmissionOutcome::Inconsistent(inconsistency) = &submission.outcome else {
        panic!("unexpected outcome {:?}", submission.outcome);
    };
    assert_eq!(inconsistency.transaction_id, "pi_3");
    assert_eq!(submission.state(), CheckoutState::Inconsistent);
    assert!(server.requests_to("/api/applications").is_empty());
}
