//! Integration tests for the employee agreement backend.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::db::{connect, AgreementStore};
use crate::errors::AppError;
use crate::models::{AgreementFields, EmployeeAgreement, SortField, SortOrder};
use crate::service::AgreementService;
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_max_limit(100).await
    }

    async fn with_max_limit(max_page_limit: u32) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_url = format!("sqlite:{}", temp_dir.path().join("test.sqlite").display());

        // Initialize database
        let repo = connect(&db_url).await.expect("Failed to init DB");
        repo.ensure_schema().await.expect("Failed to create schema");

        let state = AppState {
            service: Arc::new(AgreementService::new(Arc::new(repo), max_page_limit)),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn create(&self, body: &Value) -> Value {
        let resp = self
            .client
            .post(self.url("/emps"))
            .json(body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        resp.json().await.unwrap()
    }
}

fn ann() -> Value {
    json!({
        "employeeName": "Ann",
        "role": "Engineer",
        "startDate": "2024-01-01",
        "endDate": "2024-12-31",
        "salary": 90000,
        "terms": "FT",
        "otherDetails": { "department": "R&D", "manager": "Sam" }
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_agreement_crud() {
    let fixture = TestFixture::new().await;

    // Create
    let created = fixture.create(&ann()).await;
    let id = created["id"].as_str().unwrap();
    assert_eq!(created["employeeName"], "Ann");
    assert_eq!(created["salary"], 90000);
    assert_eq!(created["startDate"], "2024-01-01T00:00:00.000Z");
    assert_eq!(created["otherDetails"]["manager"], "Sam");
    assert!(created["createdAt"].is_string());
    assert_eq!(created["createdAt"], created["updatedAt"]);

    // Get
    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/emps/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_resp.status(), 200);
    let fetched: Value = get_resp.json().await.unwrap();
    assert_eq!(fetched, created);

    // Patch
    tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    let patch_resp = fixture
        .client
        .patch(fixture.url(&format!("/emps/{}", id)))
        .json(&json!({ "salary": 5000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(patch_resp.status(), 200);
    let patched: Value = patch_resp.json().await.unwrap();
    assert_eq!(patched["salary"], 5000);
    for key in ["id", "employeeName", "role", "startDate", "endDate", "terms", "otherDetails", "createdAt"] {
        assert_eq!(patched[key], created[key], "field {} changed", key);
    }
    assert!(patched["updatedAt"].as_str().unwrap() > created["updatedAt"].as_str().unwrap());

    // Put
    tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    let put_resp = fixture
        .client
        .put(fixture.url(&format!("/emps/{}", id)))
        .json(&json!({
            "employeeName": "Ann Lee",
            "role": "Lead",
            "startDate": "2025-01-01",
            "endDate": "2026-01-01",
            "salary": 0,
            "terms": "PT",
            "otherDetails": { "department": "Ops", "manager": "Kim" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(put_resp.status(), 200);
    let replaced: Value = put_resp.json().await.unwrap();
    assert_eq!(replaced["id"], created["id"]);
    assert_eq!(replaced["role"], "Lead");
    assert_eq!(replaced["salary"], 0);
    assert_eq!(replaced["otherDetails"]["department"], "Ops");
    assert_eq!(replaced["createdAt"], created["createdAt"]);
    assert!(replaced["updatedAt"].as_str().unwrap() > patched["updatedAt"].as_str().unwrap());

    // Delete
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/emps/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);
    let delete_body: Value = delete_resp.json().await.unwrap();
    assert_eq!(delete_body["message"], "Employee Agreement successfully deleted");
    assert_eq!(delete_body["deletedEmployee"]["employeeName"], "Ann Lee");

    // Verify deleted
    let get_deleted_resp = fixture
        .client
        .get(fixture.url(&format!("/emps/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_deleted_resp.status(), 404);
    let body: Value = get_deleted_resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Employee not found" }));
}

#[tokio::test]
async fn test_create_validation_errors() {
    let fixture = TestFixture::new().await;

    let mut missing = ann();
    missing["otherDetails"] = json!({ "department": "R&D" });
    let mut inverted = ann();
    inverted["startDate"] = json!("2024-12-31");
    let mut negative = ann();
    negative["salary"] = json!(-1);
    let mut wrong_type = ann();
    wrong_type["salary"] = json!("a lot");

    let cases = [
        (missing, Some("Missing required fields. Please ensure all fields, including 'otherDetails.department' and 'otherDetails.manager', are provided.")),
        (inverted, Some("Start date must be earlier than end date.")),
        (negative, Some("Salary cannot be negative.")),
        (wrong_type, None),
    ];

    for (body, message) in cases {
        let resp = fixture
            .client
            .post(fixture.url("/emps"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        match message {
            Some(expected) => assert_eq!(body["error"], expected),
            None => assert!(body["error"].is_string()),
        }
    }

    // Nothing was stored
    let list: Value = fixture
        .client
        .get(fixture.url("/emps"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn test_malformed_json_body() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/emps"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_patch_negative_salary() {
    let fixture = TestFixture::new().await;
    let created = fixture.create(&ann()).await;
    let id = created["id"].as_str().unwrap();

    let resp = fixture
        .client
        .patch(fixture.url(&format!("/emps/{}", id)))
        .json(&json!({ "salary": -1 }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Salary cannot be negative." }));
}

#[tokio::test]
async fn test_put_rejections_leave_record_unchanged() {
    let fixture = TestFixture::new().await;
    let created = fixture.create(&ann()).await;
    let id = created["id"].as_str().unwrap();

    let mut inverted = ann();
    inverted["endDate"] = json!("2023-01-01");
    let mut partial = ann();
    partial.as_object_mut().unwrap().remove("role");

    for body in [inverted, partial] {
        let resp = fixture
            .client
            .put(fixture.url(&format!("/emps/{}", id)))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    let fetched: Value = fixture
        .client
        .get(fixture.url(&format!("/emps/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let fixture = TestFixture::new().await;
    let missing = uuid::Uuid::new_v4();

    let resp = fixture
        .client
        .get(fixture.url(&format!("/emps/{}", missing)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/emps/{}", missing)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .put(fixture.url(&format!("/emps/{}", missing)))
        .json(&ann())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .patch(fixture.url(&format!("/emps/{}", missing)))
        .json(&json!({ "role": "Lead" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .get(fixture.url("/emps/12345"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid employee id: 12345");
}

#[tokio::test]
async fn test_out_of_range_year_is_rejected() {
    let fixture = TestFixture::new().await;
    fixture.create(&ann()).await;

    for date in ["+10000-01-01", "-0001-01-01"] {
        let mut body = ann();
        body["endDate"] = json!(date);
        let resp = fixture
            .client
            .post(fixture.url("/emps"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "date {}", date);
    }

    let resp = fixture.client.get(fixture.url("/emps")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let list: Value = resp.json().await.unwrap();
    assert_eq!(list["total"], 1);
}

#[tokio::test]
async fn test_id_lookup_ignores_uuid_spelling() {
    let fixture = TestFixture::new().await;
    let created = fixture.create(&ann()).await;
    let id = created["id"].as_str().unwrap();

    for form in [id.to_uppercase(), id.replace('-', "")] {
        let resp = fixture
            .client
            .get(fixture.url(&format!("/emps/{}", form)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "form {}", form);
        let fetched: Value = resp.json().await.unwrap();
        assert_eq!(fetched["id"], created["id"]);
    }

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/emps/{}", id.to_uppercase())))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_list_pagination_and_sorting() {
    let fixture = TestFixture::new().await;

    let mut ids = Vec::new();
    for (i, salary) in [300, 100, 500, 200, 400].iter().enumerate() {
        let mut body = ann();
        body["employeeName"] = json!(format!("Emp {}", i + 1));
        body["salary"] = json!(salary);
        let created = fixture.create(&body).await;
        ids.push(created["id"].as_str().unwrap().to_string());
    }

    // Default order is newest first: page 2 of size 2 holds the 3rd and 4th newest.
    let page: Value = fixture
        .client
        .get(fixture.url("/emps?limit=2&page=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["total"], 5);
    assert_eq!(page["page"], 2);
    assert_eq!(page["limit"], 2);
    let got: Vec<&str> = page["employees"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(got, vec![ids[2].as_str(), ids[1].as_str()]);

    // Defaults
    let page: Value = fixture
        .client
        .get(fixture.url("/emps"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["page"], 1);
    assert_eq!(page["limit"], 10);
    assert_eq!(page["employees"].as_array().unwrap().len(), 5);

    // Ascending by salary
    let page: Value = fixture
        .client
        .get(fixture.url("/emps?sortBy=salary&order=asc&limit=3"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let salaries: Vec<i64> = page["employees"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["salary"].as_i64().unwrap())
        .collect();
    assert_eq!(salaries, vec![100, 200, 300]);

    // Anything other than "asc" is descending
    let page: Value = fixture
        .client
        .get(fixture.url("/emps?sortBy=salary&order=ascending&limit=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["employees"][0]["salary"], 500);

    // Bad numbers
    let resp = fixture
        .client
        .get(fixture.url("/emps?page=zero"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_list_limit_is_clamped() {
    let fixture = TestFixture::with_max_limit(3).await;
    for _ in 0..4 {
        fixture.create(&ann()).await;
    }

    let page: Value = fixture
        .client
        .get(fixture.url("/emps?limit=1000"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["limit"], 3);
    assert_eq!(page["total"], 4);
    assert_eq!(page["employees"].as_array().unwrap().len(), 3);
}

/// Store that fails every call, standing in for an unreachable database.
struct UnreachableStore;

fn unreachable() -> AppError {
    AppError::Database("connection refused".to_string())
}

#[async_trait]
impl AgreementStore for UnreachableStore {
    async fn insert(&self, _fields: &AgreementFields) -> Result<EmployeeAgreement, AppError> {
        Err(unreachable())
    }

    async fn find_by_id(&self, _id: &str) -> Result<Option<EmployeeAgreement>, AppError> {
        Err(unreachable())
    }

    async fn replace(
        &self,
        _id: &str,
        _fields: &AgreementFields,
    ) -> Result<Option<EmployeeAgreement>, AppError> {
        Err(unreachable())
    }

    async fn delete(&self, _id: &str) -> Result<Option<EmployeeAgreement>, AppError> {
        Err(unreachable())
    }

    async fn find_page(
        &self,
        _sort_by: SortField,
        _order: SortOrder,
        _offset: i64,
        _limit: i64,
    ) -> Result<Vec<EmployeeAgreement>, AppError> {
        Err(unreachable())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Err(unreachable())
    }
}

async fn send_to_unreachable(method: &str, uri: String, body: Option<Value>) -> (StatusCode, Value) {
    let state = AppState {
        service: Arc::new(AgreementService::new(Arc::new(UnreachableStore), 100)),
    };
    let app = create_router(state);

    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_storage_failures_map_to_500() {
    let id = uuid::Uuid::new_v4();

    let (status, body) = send_to_unreachable("GET", "/emps".to_string(), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Error retrieving employees: connection refused"
    );

    let (status, body) = send_to_unreachable("GET", format!("/emps/{}", id), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error retrieving employee: connection refused");

    let (status, body) = send_to_unreachable("DELETE", format!("/emps/{}", id), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error deleting employee: connection refused");

    // Validation still runs before the store is touched
    let (status, body) =
        send_to_unreachable("POST", "/emps".to_string(), Some(json!({ "role": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Missing required fields"));

    let (status, body) = send_to_unreachable("POST", "/emps".to_string(), Some(ann())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error saving employee: connection refused");

    let (status, body) = send_to_unreachable(
        "PATCH",
        format!("/emps/{}", id),
        Some(json!({ "salary": 5000 })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error updating employee: connection refused");

    let (status, body) = send_to_unreachable("PUT", format!("/emps/{}", id), Some(ann())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error replacing employee: connection refused");
}

