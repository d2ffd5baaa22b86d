//! End-to-end tests against an in-process async-graphql server

use async_graphql::{
    BatchRequest, BatchResponse, ComplexObject, EmptySubscription, InputObject, Object, Schema,
    SimpleObject, ID,
};
use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use crm_client::storage::save_json;
use crm_client::{
    ClientConfig, CrmClient, CrmError, LeadForm, LocationCascade, LocationLevel, Lookup,
    MemoryStore, NoticeLevel, Notifier, SelectOption, TransportError,
};
use reqwest::Url;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const BROKEN_ROLE: &str = "broken";

#[derive(SimpleObject, Clone)]
#[graphql(complex)]
struct User {
    id: ID,
    full_name: String,
    username: String,
    email: Option<String>,
    phone: Option<String>,
    is_active: bool,
    created_at: String,
    #[graphql(skip)]
    role_id: Option<String>,
}

#[ComplexObject]
impl User {
    async fn role(&self) -> async_graphql::Result<Option<Named>> {
        match self.role_id.as_deref() {
            Some(BROKEN_ROLE) => Err("role service unavailable".into()),
            Some(id) => Ok(roles().into_iter().find(|role| role.id.as_str() == id)),
            None => Ok(None),
        }
    }
}

#[derive(SimpleObject, Clone)]
struct Named {
    id: ID,
    name: String,
}

#[derive(SimpleObject, Clone)]
struct Person {
    id: ID,
    full_name: String,
    username: Option<String>,
}

#[derive(SimpleObject, Clone)]
struct Transaction {
    id: ID,
    code: String,
    date: String,
    created_at: String,
    is_active: bool,
    note: Option<String>,
    customer: Option<Person>,
    user: Option<Person>,
    product: Option<Named>,
    account: Option<Named>,
    channel: Option<Named>,
    status: Option<Named>,
    #[graphql(name = "type")]
    kind: Option<Named>,
}

#[derive(SimpleObject)]
struct Created {
    id: ID,
}

#[derive(InputObject)]
struct UserInput {
    full_name: String,
    username: String,
    email: Option<String>,
    phone: Option<String>,
    role_id: ID,
    is_active: bool,
    password: Option<String>,
}

fn named(id: &str, name: &str) -> Named {
    Named {
        id: ID::from(id),
        name: name.to_string(),
    }
}

fn roles() -> Vec<Named> {
    vec![named("1", "Admin"), named("2", "Agent")]
}

fn users(broken_role: bool) -> Vec<User> {
    vec![
        User {
            id: ID::from("1"),
            full_name: "Ayşe Yılmaz".into(),
            username: "ayse".into(),
            email: Some("ayse@example.com".into()),
            phone: None,
            is_active: true,
            created_at: "2024-01-10T09:30:00Z".into(),
            role_id: Some("1".into()),
        },
        User {
            id: ID::from("2"),
            full_name: "Mehmet Demir".into(),
            username: "mehmet".into(),
            email: None,
            phone: Some("555 010 20 30".into()),
            is_active: false,
            created_at: "2024-01-11T14:00:00Z".into(),
            role_id: Some(if broken_role { BROKEN_ROLE } else { "2" }.into()),
        },
    ]
}

fn transactions() -> Vec<Transaction> {
    vec![
        Transaction {
            id: ID::from("r1"),
            code: "RZ-1001".into(),
            date: "2024-01-10".into(),
            created_at: "2024-01-02T08:00:00Z".into(),
            is_active: true,
            note: None,
            customer: Some(Person {
                id: ID::from("c1"),
                full_name: "Ayşe Yılmaz".into(),
                username: None,
            }),
            user: Some(Person {
                id: ID::from("2"),
                full_name: "Mehmet Demir".into(),
                username: Some("mehmet".into()),
            }),
            product: Some(named("p1", "Kapadokya Turu")),
            account: Some(named("a1", "Merkez")),
            channel: Some(named("c1", "Web")),
            status: Some(named("s1", "Onaylandı")),
            kind: Some(named("k1", "Bireysel")),
        },
        Transaction {
            id: ID::from("r2"),
            code: "RZ-1002".into(),
            date: "2024-01-12T21:00:00.000Z".into(),
            created_at: "2024-01-03T10:15:00Z".into(),
            is_active: false,
            note: Some("iptal talebi".into()),
            customer: None,
            user: None,
            product: None,
            account: None,
            channel: None,
            status: Some(named("s2", "İptal")),
            kind: None,
        },
    ]
}

struct QueryRoot {
    /// Breaks the second user's role and the whole transactions list
    broken_role: bool,
}

#[Object]
impl QueryRoot {
    async fn users(&self) -> Vec<User> {
        users(self.broken_role)
    }

    async fn user(&self, id: ID) -> Option<User> {
        users(self.broken_role)
            .into_iter()
            .find(|user| user.id.as_str() == id.as_str())
    }

    async fn transactions(&self) -> async_graphql::Result<Option<Vec<Transaction>>> {
        if self.broken_role {
            return Err("reservation store offline".into());
        }
        Ok(Some(transactions()))
    }

    async fn roles(&self) -> Vec<Named> {
        roles()
    }

    async fn products(&self) -> async_graphql::Result<Vec<Named>> {
        Err("product catalogue offline".into())
    }

    async fn countries(&self) -> Vec<Named> {
        vec![named("tr", "Türkiye"), named("de", "Deutschland")]
    }

    async fn cities(&self, country_id: ID) -> Vec<Named> {
        match country_id.as_str() {
            "tr" => vec![named("34", "İstanbul"), named("06", "Ankara")],
            "de" => vec![named("b", "Berlin")],
            _ => Vec::new(),
        }
    }
}

struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_user(&self, input: UserInput) -> async_graphql::Result<Created> {
        if input.full_name.trim().is_empty() {
            return Err("fullName is required".into());
        }
        Ok(Created {
            id: ID::from(format!("{}-{}", input.username, input.role_id.as_str())),
        })
    }
}

type TestSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(Debug, Clone)]
struct Hit {
    authorization: Option<String>,
    operations: usize,
    batched: bool,
}

#[derive(Clone)]
struct AppState {
    schema: TestSchema,
    hits: Arc<Mutex<Vec<Hit>>>,
}

async fn graphql(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(batch): Json<BatchRequest>,
) -> Json<BatchResponse> {
    let (operations, batched) = match &batch {
        BatchRequest::Single(_) => (1, false),
        BatchRequest::Batch(requests) => (requests.len(), true),
    };
    state.hits.lock().unwrap().push(Hit {
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        operations,
        batched,
    });
    Json(state.schema.execute_batch(batch).await)
}

struct Server {
    endpoint: Url,
    unavailable: Url,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl Server {
    fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }
}

async fn spawn_server(broken_role: bool) -> Server {
    let schema = Schema::build(QueryRoot { broken_role }, MutationRoot, EmptySubscription).finish();
    let hits = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/graphql", post(graphql))
        .route(
            "/unavailable",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        )
        .with_state(AppState {
            schema,
            hits: Arc::clone(&hits),
        });

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind graphql test server");
    let addr = listener.local_addr().expect("graphql test server addr");
    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("serve graphql test server");
    });

    Server {
        endpoint: Url::parse(&format!("http://{addr}/graphql")).unwrap(),
        unavailable: Url::parse(&format!("http://{addr}/unavailable")).unwrap(),
        hits,
    }
}

fn client(endpoint: &Url, token: Option<&str>) -> CrmClient {
    let store = Arc::new(MemoryStore::new());
    if let Some(token) = token {
        save_json(store.as_ref(), "user", &json!({ "token": token })).unwrap();
    }
    CrmClient::from_store(&ClientConfig::new(endpoint.clone()), store).unwrap()
}

#[derive(Default)]
struct Notices(Mutex<Vec<(NoticeLevel, String)>>);

impl Notifier for Notices {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.0.lock().unwrap().push((level, message.to_string()));
    }
}

#[tokio::test]
async fn test_leads_carry_bearer_token() {
    let server = spawn_server(false).await;
    let client = client(&server.endpoint, Some("jwt-1"));

    let leads = client.leads().await.unwrap();

    assert!(leads.is_complete());
    assert_eq!(leads.data.len(), 2);
    assert_eq!(leads.data[0].full_name.as_deref(), Some("Ayşe Yılmaz"));
    assert_eq!(leads.data[1].role.as_ref().map(|r| r.name.as_str()), Some("Agent"));
    assert_eq!(
        leads.data[0].created_at.map(|at| at.to_rfc3339()),
        Some("2024-01-10T09:30:00+00:00".to_string())
    );

    let hits = server.hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].authorization.as_deref(), Some("Bearer jwt-1"));
    assert!(!hits[0].batched);
}

#[tokio::test]
async fn test_logged_out_sends_empty_authorization() {
    let server = spawn_server(false).await;
    let client = client(&server.endpoint, None);

    client.lookup_options(Lookup::Roles).await.unwrap();
    assert_eq!(server.hits()[0].authorization.as_deref(), Some(""));
}

#[tokio::test]
async fn test_concurrent_queries_share_one_post() {
    let server = spawn_server(false).await;
    let client = client(&server.endpoint, Some("jwt-1"));

    let (roles, users, countries) = tokio::join!(
        client.lookup_options(Lookup::Roles),
        client.lookup_options(Lookup::Users),
        client.location_options(LocationLevel::Country, None),
    );

    assert_eq!(
        roles.unwrap().data,
        vec![SelectOption::new("1", "Admin"), SelectOption::new("2", "Agent")]
    );
    assert_eq!(users.unwrap().data[1].label, "Mehmet Demir");
    assert_eq!(countries.unwrap().data.len(), 2);

    let hits = server.hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].operations, 3);
    assert!(hits[0].batched);
}

#[tokio::test]
async fn test_partial_errors_keep_data() {
    let server = spawn_server(true).await;
    let client = client(&server.endpoint, Some("jwt-1"));

    let leads = client.leads().await.unwrap();

    assert_eq!(leads.data.len(), 2);
    assert!(leads.data[1].role.is_none());
    assert_eq!(leads.errors.len(), 1);
    assert_eq!(leads.errors[0].message, "role service unavailable");
    assert_eq!(leads.errors[0].path, vec![json!("users"), json!(1), json!("role")]);
}

#[tokio::test]
async fn test_reservations_over_http() {
    let server = spawn_server(false).await;
    let client = client(&server.endpoint, Some("jwt-1"));

    let reservations = client.reservations().await.unwrap();

    assert!(reservations.is_complete());
    assert_eq!(reservations.data.len(), 2);
    let first = &reservations.data[0];
    assert_eq!(first.code.as_deref(), Some("RZ-1001"));
    assert_eq!(first.date, chrono::NaiveDate::from_ymd_opt(2024, 1, 10));
    assert_eq!(first.customer.as_ref().map(|c| c.full_name.as_str()), Some("Ayşe Yılmaz"));
    assert_eq!(
        first.user.as_ref().and_then(|u| u.username.as_deref()),
        Some("mehmet")
    );
    assert_eq!(first.kind.as_ref().map(|k| k.name.as_str()), Some("Bireysel"));
    assert_eq!(reservations.data[1].date, chrono::NaiveDate::from_ymd_opt(2024, 1, 12));
    assert_eq!(reservations.data[1].is_active, Some(false));

    assert_eq!(server.hits()[0].authorization.as_deref(), Some("Bearer jwt-1"));
}

#[tokio::test]
async fn test_failed_reservation_list_reports_server_error() {
    let server = spawn_server(true).await;
    let client = client(&server.endpoint, Some("jwt-1"));

    match client.reservations().await {
        Err(CrmError::GraphQL(errors)) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].message, "reservation store offline");
        }
        other => panic!("expected server errors, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_lookup_degrades_to_empty_options() {
    let server = spawn_server(false).await;
    let client = client(&server.endpoint, Some("jwt-1"));
    let notices = Notices::default();

    let options = client.options_or_empty(Lookup::Products, &notices).await;

    assert!(options.is_empty());
    let notices = notices.0.lock().unwrap().clone();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].0, NoticeLevel::Error);
    assert!(notices[0].1.contains("product catalogue offline"));
}

#[tokio::test]
async fn test_create_lead_goes_unbatched() {
    let server = spawn_server(false).await;
    let client = client(&server.endpoint, Some("jwt-1"));
    let form = LeadForm {
        full_name: "Zeynep Kaya".into(),
        username: "zeynep".into(),
        role: Some(SelectOption::new("2", "Agent")),
        is_active: true,
        ..Default::default()
    };

    let (created, roles) = tokio::join!(
        client.create_lead(&form),
        client.lookup_options(Lookup::Roles)
    );

    assert_eq!(created.unwrap(), "zeynep-2");
    assert!(roles.is_ok());
    let hits = server.hits();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|hit| hit.operations == 1));
}

#[tokio::test]
async fn test_invalid_form_sends_nothing() {
    let server = spawn_server(false).await;
    let client = client(&server.endpoint, Some("jwt-1"));

    let result = client.create_lead(&LeadForm::default()).await;

    assert!(matches!(result, Err(CrmError::Validation(_))));
    assert!(server.hits().is_empty());
}

#[tokio::test]
async fn test_lead_by_id() {
    let server = spawn_server(false).await;
    let client = client(&server.endpoint, Some("jwt-1"));

    let lead = client.lead("2").await.unwrap().unwrap();
    assert_eq!(lead.username.as_deref(), Some("mehmet"));
    assert_eq!(lead.is_active, Some(false));

    assert_eq!(client.lead("99").await.unwrap(), None);
}

#[tokio::test]
async fn test_http_error_status_surfaces() {
    let server = spawn_server(false).await;
    let client = client(&server.unavailable, Some("jwt-1"));

    let result = client.leads().await;

    match result {
        Err(CrmError::Transport(TransportError::Http { status, body })) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_location_cascade_over_http() {
    let server = spawn_server(false).await;
    let client = client(&server.endpoint, Some("jwt-1"));
    let mut cascade = LocationCascade::new();

    let ticket = cascade.start();
    assert!(cascade.load(&ticket, &client).await.unwrap());
    let turkey = cascade.options(LocationLevel::Country)[0].clone();

    let ticket = cascade.select(LocationLevel::Country, Some(turkey)).unwrap();
    assert!(cascade.load(&ticket, &client).await.unwrap());

    let labels: Vec<&str> = cascade
        .options(LocationLevel::City)
        .iter()
        .map(|option| option.label.as_str())
        .collect();
    assert_eq!(labels, vec!["İstanbul", "Ankara"]);
}
