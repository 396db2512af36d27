//! Integration tests for the verification service.
//!
//! These tests use stub providers and scripted stores to exercise the
//! service without a network connection.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use addressledger_core::{
    AddressInput, AddressProvider, CodeRules, DuplicateKey, Error, ErrorKind, RecordId, RecordStore,
    RecordUpdate, Result, SqliteRecordStore, SqliteTransaction, StoreTransaction,
    ValidationError, VerificationRecord, VerificationService, verify_address,
};
use addressledger_melissa::{GlobalAddressRequest, RawResponse};

// ---------------------------------------------------------------------------
// Stub provider
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Reply {
    Status(u16, &'static str, String),
    Unreachable,
}

/// Provider returning a canned reply and recording every request.
struct StubProvider {
    reply: Reply,
    delay: Option<Duration>,
    requests: Mutex<Vec<GlobalAddressRequest>>,
}

impl StubProvider {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn ok(body: impl Into<String>) -> Self {
        Self::new(Reply::Status(200, "OK", body.into()))
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_request(&self) -> GlobalAddressRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

impl AddressProvider for StubProvider {
    async fn send(&self, request: &GlobalAddressRequest) -> Result<RawResponse> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.reply.clone() {
            Reply::Status(status, reason, body) => Ok(RawResponse {
                status,
                reason: reason.to_string(),
                body,
            }),
            Reply::Unreachable => Err(Error::Transport {
                status: None,
                reason: "connection refused".to_string(),
            }),
        }
    }
}

fn record_body(results: &str, address_type: Option<&str>) -> String {
    let address_type = address_type.map_or_else(String::new, |t| format!(r#","AddressType":"{t}""#));
    format!(
        r#"{{"TransmissionReference":"1","Records":[{{"Results":"{results}","FormattedAddress":"123 MAIN ST;SPRINGFIELD IL 12345","AddressLine1":"123 MAIN ST","AddressLine2":"","AddressLine3":"","Locality":"SPRINGFIELD","AdministrativeArea":"IL","PostalCode":"12345-6789","CountryName":"United States of America","Latitude":"39.781721","Longitude":"-89.650148"{address_type}}}]}}"#
    )
}

fn main_street() -> AddressInput {
    AddressInput::new("123 Main St", "12345", "US")
}

// ---------------------------------------------------------------------------
// Counting store
// ---------------------------------------------------------------------------

/// `SQLite` store that counts how often a transaction is opened.
struct CountingStore {
    inner: SqliteRecordStore,
    begins: AtomicUsize,
}

impl RecordStore for CountingStore {
    type Transaction = SqliteTransaction;

    async fn begin(&self) -> Result<SqliteTransaction> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        self.inner.begin().await
    }
}

// ---------------------------------------------------------------------------
// Scripted store
// ---------------------------------------------------------------------------

/// Store whose create/update outcomes are fixed, logging each call.
#[derive(Clone)]
struct ScriptedStore {
    create_id: Option<RecordId>,
    update_ok: bool,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl ScriptedStore {
    fn new(create_id: Option<RecordId>, update_ok: bool) -> Self {
        Self {
            create_id,
            update_ok,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn log(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }
}

struct ScriptedTransaction {
    store: ScriptedStore,
}

impl ScriptedTransaction {
    fn push(&self, entry: &'static str) {
        self.store.log.lock().unwrap().push(entry);
    }
}

impl RecordStore for ScriptedStore {
    type Transaction = ScriptedTransaction;

    async fn begin(&self) -> Result<ScriptedTransaction> {
        Ok(ScriptedTransaction {
            store: self.clone(),
        })
    }
}

impl StoreTransaction for ScriptedTransaction {
    async fn find_duplicate(
        &mut self,
        _key: &DuplicateKey<'_>,
    ) -> Result<Option<VerificationRecord>> {
        self.push("find_duplicate");
        Ok(None)
    }

    async fn create(&mut self, _input: &AddressInput) -> Result<Option<RecordId>> {
        self.push("create");
        Ok(self.store.create_id)
    }

    async fn update_results(&mut self, _id: RecordId, _update: &RecordUpdate) -> Result<bool> {
        self.push("update_results");
        Ok(self.store.update_ok)
    }

    async fn record_raw_response(&mut self, _id: RecordId, _raw_response: &str) -> Result<bool> {
        self.push("record_raw_response");
        Ok(true)
    }

    async fn commit(self) -> Result<()> {
        self.push("commit");
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.push("rollback");
        Ok(())
    }
}

async fn sqlite_service(provider: StubProvider) -> VerificationService<SqliteRecordStore, StubProvider> {
    let store = SqliteRecordStore::in_memory().await.unwrap();
    VerificationService::new(store, provider)
}

// ---------------------------------------------------------------------------
// Classification through the service
// ---------------------------------------------------------------------------

#[tokio::test]
async fn good_address_is_verified_and_stored() {
    let service = sqlite_service(StubProvider::ok(record_body("AC01,AV24,GS05", Some("S")))).await;

    let result = service.verify(&main_street()).await.unwrap();
    assert!(result.valid);
    assert!(!result.duplicate);
    assert_eq!(result.address.address_1, "123 MAIN ST");
    assert_eq!(result.address.city, "SPRINGFIELD");
    assert_eq!(result.address.postal, "12345-6789");
    assert_eq!(result.address.latitude, "39.781721");
    assert_eq!(service.provider().calls(), 1);

    let records = service.store().list_recent(10).await.unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.good, Some(true));
    assert_eq!(record.codes.as_deref(), Some("AC01,AV24,GS05"));
    assert_eq!(
        record.formatted_address.as_deref(),
        Some("123 MAIN ST;SPRINGFIELD IL 12345")
    );
    assert!(record.raw_response.as_deref().unwrap().contains("AV24"));
}

#[tokio::test]
async fn unconditional_good_code_wins_over_error_code() {
    let service = sqlite_service(StubProvider::ok(record_body("AV25,AE001", None))).await;

    let result = service.verify(&main_street()).await.unwrap();
    assert!(result.valid);

    let record = &service.store().list_recent(1).await.unwrap()[0];
    assert_eq!(record.codes.as_deref(), Some("AV25,AE001"));
}

#[tokio::test]
async fn conditional_good_code_alone_is_valid() {
    let service = sqlite_service(StubProvider::ok(record_body("AV14", None))).await;
    assert!(service.verify(&main_street()).await.unwrap().valid);
}

#[tokio::test]
async fn conditional_good_code_with_error_is_invalid() {
    let service = sqlite_service(StubProvider::ok(record_body("AV14,AE001", None))).await;
    assert!(!service.verify(&main_street()).await.unwrap().valid);
}

#[tokio::test]
async fn blocked_po_box_is_invalid_and_marked() {
    let service = sqlite_service(StubProvider::ok(record_body("AV25", Some("P")))).await;

    let input = AddressInput::new("PO Box 123", "12345", "US");
    let result = service.verify(&input).await.unwrap();
    assert!(!result.valid);

    let record = &service.store().list_recent(1).await.unwrap()[0];
    assert_eq!(record.codes.as_deref(), Some("AV25,AEPOBOX"));
    assert_eq!(record.good, Some(false));
}

#[tokio::test]
async fn allowed_po_box_follows_codes() {
    let service = sqlite_service(StubProvider::ok(record_body("AV25", Some("P")))).await;

    let input = AddressInput::new("PO Box 123", "12345", "US").allow_po_boxes();
    let result = service.verify(&input).await.unwrap();
    assert!(result.valid);

    let record = &service.store().list_recent(1).await.unwrap()[0];
    assert_eq!(record.codes.as_deref(), Some("AV25"));
    assert!(!record.input.block_po_boxes);
}

#[tokio::test]
async fn custom_rules_drive_the_verdict() {
    const STRICT: CodeRules<'static> = CodeRules {
        good: &["AV25"],
        good_if_no_error: &[],
        error_prefix: "AE",
        po_box_type: "P",
        po_box_rejection: "AEPOBOX",
    };
    let store = SqliteRecordStore::in_memory().await.unwrap();
    let service = VerificationService::new(store, StubProvider::ok(record_body("AV24", None)))
        .with_rules(STRICT);

    let result = service.verify(&main_street()).await.unwrap();
    assert!(!result.valid);
}

// ---------------------------------------------------------------------------
// Deduplication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn identical_address_is_served_from_store() {
    let service = sqlite_service(StubProvider::ok(record_body("AV25", None))).await;

    let first = service.verify(&main_street()).await.unwrap();
    let second = service.verify(&main_street()).await.unwrap();

    assert!(!first.duplicate);
    assert!(second.duplicate);
    assert_eq!(second.address, first.address);
    assert_eq!(second.valid, first.valid);
    assert_eq!(service.provider().calls(), 1);
    assert_eq!(service.store().list_recent(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_ignores_city_and_line_3() {
    let service = sqlite_service(StubProvider::ok(record_body("AV25", None))).await;

    service
        .verify(&main_street().with_city("Springfield"))
        .await
        .unwrap();
    let second = service
        .verify(&main_street().with_address_3("Rear entrance"))
        .await
        .unwrap();

    assert!(second.duplicate);
    assert_eq!(service.provider().calls(), 1);
}

#[tokio::test]
async fn different_address_2_is_not_a_duplicate() {
    let service = sqlite_service(StubProvider::ok(record_body("AV25", None))).await;

    service.verify(&main_street()).await.unwrap();
    let second = service
        .verify(&main_street().with_address_2("Apt 4"))
        .await
        .unwrap();

    assert!(!second.duplicate);
    assert_eq!(service.provider().calls(), 2);
}

#[tokio::test]
async fn verify_address_with_borrowed_collaborators() {
    let store = SqliteRecordStore::in_memory().await.unwrap();
    let provider = StubProvider::ok(record_body("AV23", None));

    let first = verify_address(&store, &provider, &main_street()).await.unwrap();
    let second = verify_address(&store, &provider, &main_street()).await.unwrap();

    assert!(first.valid);
    assert!(second.duplicate);
    assert_eq!(provider.calls(), 1);
}

// ---------------------------------------------------------------------------
// Request construction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn request_carries_record_id_and_empty_secondary_lines() {
    let service = sqlite_service(StubProvider::ok(record_body("AV25", None))).await;

    let input = main_street().with_city("Springfield").with_state("IL");
    service.verify(&input).await.unwrap();

    let request = service.provider().last_request();
    let record = &service.store().list_recent(1).await.unwrap()[0];
    assert_eq!(request.tracking, record.id.to_string());
    assert_eq!(request.locality.as_deref(), Some("Springfield"));
    assert_eq!(request.administrative_area.as_deref(), Some("IL"));

    let params = request.query_params("key");
    assert!(params.contains(&("a2", "")));
    assert!(params.contains(&("a3", "")));
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_address_1_fails_before_any_io() {
    let store = CountingStore {
        inner: SqliteRecordStore::in_memory().await.unwrap(),
        begins: AtomicUsize::new(0),
    };
    let service = VerificationService::new(store, StubProvider::ok(record_body("AV25", None)));

    let input = AddressInput::new("", "12345", "US");
    let err = service.verify(&input).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(matches!(&err, Error::Validation(errors) if errors == &vec![ValidationError::EmptyAddress1]));
    assert_eq!(service.store().begins.load(Ordering::SeqCst), 0);
    assert_eq!(service.provider().calls(), 0);
}

#[tokio::test]
async fn missing_postal_and_country_are_reported_together() {
    let service = sqlite_service(StubProvider::ok(record_body("AV25", None))).await;

    let err = service
        .verify(&AddressInput::new("123 Main St", "", " "))
        .await
        .unwrap_err();

    match err {
        Error::Validation(errors) => assert_eq!(
            errors,
            vec![ValidationError::EmptyPostal, ValidationError::EmptyCountry]
        ),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(service.provider().calls(), 0);
}

#[tokio::test]
async fn missing_records_commits_attempt_with_raw_response() {
    let body = r#"{"TransmissionReference":"1","TransmissionResults":"SE01"}"#;
    let service = sqlite_service(StubProvider::ok(body)).await;

    let err = service.verify(&main_street()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderFormat);

    let Error::ProviderFormat { record_id, .. } = err else {
        panic!("expected provider format error");
    };
    let record = service.store().get(record_id).await.unwrap().unwrap();
    assert_eq!(record.input, main_street());
    assert_eq!(record.raw_response.as_deref(), Some(body));
    assert!(record.good.is_none());
    assert!(!record.is_complete());
}

#[tokio::test]
async fn failed_attempt_is_not_served_as_duplicate() {
    let service = sqlite_service(StubProvider::ok(r#"{"Records":[]}"#)).await;

    assert!(service.verify(&main_street()).await.is_err());
    assert!(service.verify(&main_street()).await.is_err());

    assert_eq!(service.provider().calls(), 2);
    assert_eq!(service.store().list_recent(10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn error_status_is_transport_error_and_rolls_back() {
    let provider = StubProvider::new(Reply::Status(503, "Service Unavailable", "busy".into()));
    let service = sqlite_service(provider).await;

    let err = service.verify(&main_street()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(matches!(
        &err,
        Error::Transport { status: Some(503), reason } if reason == "Service Unavailable"
    ));
    assert!(service.store().list_recent(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_provider_is_transport_error_and_rolls_back() {
    let service = sqlite_service(StubProvider::new(Reply::Unreachable)).await;

    let err = service.verify(&main_street()).await.unwrap_err();
    assert!(matches!(err, Error::Transport { status: None, .. }));
    assert!(service.store().list_recent(10).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_verifications_wait_for_each_other() {
    let dir = std::env::temp_dir().join(format!("addressledger-concurrent-{}", std::process::id()));
    let _ = tokio::fs::remove_dir_all(&dir).await;
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let path = dir.join("verifications.db");

    let store = SqliteRecordStore::new(&path.to_string_lossy()).await.unwrap();
    let delay = Duration::from_millis(300);
    let provider = StubProvider::ok(record_body("AV25", None)).with_delay(delay);
    let service = VerificationService::new(store, provider);

    let first_input = AddressInput::new("1 A St", "12345", "US");
    let second_input = AddressInput::new("2 B St", "12345", "US");
    let started = Instant::now();
    let (first, second) = tokio::join!(
        service.verify(&first_input),
        service.verify(&second_input)
    );

    assert!(first.unwrap().valid);
    assert!(second.unwrap().valid);
    // The second transaction only starts once the first has committed
    assert!(started.elapsed() >= delay * 2);
    assert_eq!(service.provider().calls(), 2);

    let records = service.store().list_recent(10).await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|record| record.is_complete()));

    drop(service);
    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn concurrent_identical_addresses_call_provider_once() {
    let dir = std::env::temp_dir().join(format!("addressledger-identical-{}", std::process::id()));
    let _ = tokio::fs::remove_dir_all(&dir).await;
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let path = dir.join("verifications.db");

    let store = SqliteRecordStore::new(&path.to_string_lossy()).await.unwrap();
    let provider = StubProvider::ok(record_body("AV25", None)).with_delay(Duration::from_millis(100));
    let service = VerificationService::new(store, provider);

    let (addr_a, addr_b) = (main_street(), main_street());
    let (first, second) = tokio::join!(service.verify(&addr_a), service.verify(&addr_b));
    let first = first.unwrap();
    let second = second.unwrap();

    assert!(first.duplicate != second.duplicate);
    assert_eq!(service.provider().calls(), 1);

    drop(service);
    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

// ---------------------------------------------------------------------------
// Transaction decisions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn success_commits() {
    let store = ScriptedStore::new(Some(RecordId(5)), true);
    let service = VerificationService::new(store.clone(), StubProvider::ok(record_body("AV25", None)));

    service.verify(&main_street()).await.unwrap();
    assert_eq!(
        store.log(),
        vec!["find_duplicate", "create", "update_results", "commit"]
    );
    assert_eq!(service.provider().last_request().tracking, "5");
}

#[tokio::test]
async fn create_without_id_is_persistence_error() {
    let store = ScriptedStore::new(None, true);
    let service = VerificationService::new(store.clone(), StubProvider::ok(record_body("AV25", None)));

    let err = service.verify(&main_street()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert_eq!(service.provider().calls(), 0);
    assert_eq!(store.log(), vec!["find_duplicate", "create", "rollback"]);
}

#[tokio::test]
async fn rejected_update_is_persistence_error() {
    let store = ScriptedStore::new(Some(RecordId(5)), false);
    let service = VerificationService::new(store.clone(), StubProvider::ok(record_body("AV25", None)));

    let err = service.verify(&main_street()).await.unwrap_err();
    assert!(matches!(err, Error::Persistence(msg) if msg.contains('5')));
    assert_eq!(
        store.log(),
        vec!["find_duplicate", "create", "update_results", "commit"]
    );
}

#[tokio::test]
async fn unusable_response_commits_then_fails() {
    let store = ScriptedStore::new(Some(RecordId(5)), true);
    let service = VerificationService::new(store.clone(), StubProvider::ok("not json"));

    let err = service.verify(&main_street()).await.unwrap_err();
    assert!(matches!(err, Error::ProviderFormat { record_id: RecordId(5), .. }));
    assert_eq!(
        store.log(),
        vec!["find_duplicate", "create", "record_raw_response", "commit"]
    );
}

#[tokio::test]
async fn transport_failure_rolls_back() {
    let store = ScriptedStore::new(Some(RecordId(5)), true);
    let service = VerificationService::new(store.clone(), StubProvider::new(Reply::Unreachable));

    service.verify(&main_street()).await.unwrap_err();
    assert_eq!(store.log(), vec!["find_duplicate", "create", "rollback"]);
}
