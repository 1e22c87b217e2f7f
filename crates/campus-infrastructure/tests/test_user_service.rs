use async_trait::async_trait;
use campus_core::error::{ApiError, ErrorCode, ServiceError};
use campus_core::transport::{ApiRequest, ApiResponse, ApiTransport, Method};
use campus_core::user::{
    CreateUserRequest, DateRange, Role, UpdateUserRequest, UserDetail, UserService,
};
use campus_infrastructure::{AuthError, AuthService, HttpUserService, TokenStore};
use chrono::NaiveDate;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Transport that replays canned responses and records what was sent.
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    fn with(responses: Vec<Result<ApiResponse, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::default(),
        })
    }

    fn reply(status: u16, body: Value) -> Arc<Self> {
        Self::with(vec![Ok(ApiResponse::new(status, body))])
    }

    fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left")
    }
}

fn service(transport: &Arc<ScriptedTransport>) -> HttpUserService {
    HttpUserService::new(transport.clone())
}

fn store_code(err: ServiceError) -> ErrorCode {
    err.code().expect("expected a structured error")
}

#[tokio::test]
async fn test_list_users() {
    let transport = ScriptedTransport::reply(
        200,
        json!({
            "data": [
                {
                    "_id": "u1",
                    "role": "admin",
                    "username": "root",
                    "created_at": "2024-01-01T00:00:00"
                },
                {"id": "u2", "role": "student", "username": "alice", "email": "a@school.test"}
            ],
            "status": true,
            "msg": "Users fetched successfully"
        }),
    );

    let users = service(&transport).list_users().await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id, "u1");
    assert_eq!(users[1].role, Role::Student);

    let sent = transport.requests();
    assert_eq!(sent[0].method, Method::Get);
    assert_eq!(sent[0].path, "/api/admin/");
}

#[tokio::test]
async fn test_list_users_empty_is_no_users_found() {
    for data in [json!([]), Value::Null] {
        let transport = ScriptedTransport::reply(200, json!({"data": data, "status": true}));
        let err = service(&transport).list_users().await.unwrap_err();
        assert_eq!(store_code(err), ErrorCode::NoUsersFound);
    }
}

#[tokio::test]
async fn test_list_users_server_error_is_foreign() {
    let transport = ScriptedTransport::reply(500, json!({"msg": "Error fetching users: boom"}));
    let err = service(&transport).list_users().await.unwrap_err();

    match err {
        ServiceError::Api(ApiError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Error fetching users: boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_get_user_details() {
    let transport = ScriptedTransport::reply(
        200,
        json!({
            "data": {
                "profile": {"_id": "u7", "role": "student", "username": "ben"},
                "student_info": {"student_id": "S-7", "attendance_record": {"2024-05-01": "absent"}}
            },
            "status": true
        }),
    );

    let detail = service(&transport).get_user_details("u7").await.unwrap();
    assert!(matches!(detail, UserDetail::Student { .. }));
    assert_eq!(detail.student_info().unwrap().student_id, "S-7");
    assert_eq!(transport.requests()[0].path, "/api/admin/users/detail/u7");
}

#[tokio::test]
async fn test_get_user_details_without_data_is_user_not_found() {
    let transport = ScriptedTransport::reply(200, json!({"data": null, "status": true}));
    let err = service(&transport).get_user_details("ghost").await.unwrap_err();

    let ServiceError::Store(err) = err else {
        panic!("expected a structured error");
    };
    assert_eq!(err.code, ErrorCode::UserNotFound);
    assert_eq!(err.message, "No user details found for id ghost");
    assert!(matches!(
        err.cause_as::<ApiError>(),
        Some(ApiError::UnexpectedPayload { .. })
    ));
}

#[tokio::test]
async fn test_create_user() {
    let transport = ScriptedTransport::reply(
        201,
        json!({
            "data": {"_id": "u9", "role": "teacher", "username": "mia"},
            "status": true,
            "msg": "User created successfully"
        }),
    );
    let request = CreateUserRequest {
        username: "mia".to_string(),
        email: None,
        password: "secret".to_string(),
        role: Role::Teacher,
    };

    let user = service(&transport).create_user(&request).await.unwrap();
    assert_eq!(user.id, "u9");

    let sent = transport.requests();
    assert_eq!(sent[0].method, Method::Post);
    assert_eq!(sent[0].path, "/api/admin/users");
    assert_eq!(
        sent[0].body,
        Some(json!({"username": "mia", "password": "secret", "role": "teacher"}))
    );
}

#[tokio::test]
async fn test_create_user_failure_uses_server_message() {
    let request = CreateUserRequest {
        username: "mia".to_string(),
        email: None,
        password: "secret".to_string(),
        role: Role::Teacher,
    };

    // Wrong status even though the payload looks fine.
    let transport = ScriptedTransport::reply(
        200,
        json!({"data": {"id": "u9", "role": "teacher", "username": "mia"}, "status": true}),
    );
    let err = service(&transport).create_user(&request).await.unwrap_err();
    let ServiceError::Store(err) = err else {
        panic!("expected a structured error");
    };
    assert_eq!(err.code, ErrorCode::CreateUserFailed);
    assert_eq!(err.message, "Failed to create user");

    let transport = ScriptedTransport::reply(
        400,
        json!({"data": null, "status": false, "msg": "Username already exists"}),
    );
    let err = service(&transport).create_user(&request).await.unwrap_err();
    let ServiceError::Store(err) = err else {
        panic!("expected a structured error");
    };
    assert_eq!(err.code, ErrorCode::CreateUserFailed);
    assert_eq!(err.message, "Username already exists");
}

#[tokio::test]
async fn test_update_user() {
    let transport = ScriptedTransport::with(vec![
        Ok(ApiResponse::new(
            200,
            json!({"data": {"id": "u2", "role": "student", "username": "bob"}, "status": true}),
        )),
        Ok(ApiResponse::new(200, json!({"data": {}, "status": true}))),
        Ok(ApiResponse::new(200, json!({"data": null, "status": false}))),
    ]);
    let service = service(&transport);
    let request = UpdateUserRequest {
        username: Some("bob".to_string()),
        email: None,
    };

    let user = service.update_user("u2", &request).await.unwrap();
    assert_eq!(user.username, "bob");
    assert_eq!(transport.requests()[0].path, "/api/admin/users/u2");
    assert_eq!(transport.requests()[0].method, Method::Patch);

    // An empty object is truthy but is not a user.
    let err = service.update_user("u2", &request).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Api(ApiError::Deserialization { .. })
    ));

    let err = service.update_user("u2", &request).await.unwrap_err();
    assert_eq!(store_code(err), ErrorCode::UpdateUserFailed);
}

#[tokio::test]
async fn test_delete_user() {
    let transport = ScriptedTransport::with(vec![
        Ok(ApiResponse::new(200, json!({"data": null, "status": true}))),
        Ok(ApiResponse::new(204, Value::Null)),
        Err(ApiError::transport("connection reset")),
    ]);
    let service = service(&transport);

    service.delete_user("u3").await.unwrap();
    assert_eq!(transport.requests()[0].method, Method::Delete);
    assert_eq!(transport.requests()[0].path, "/api/admin/users/u3");

    let ServiceError::Store(err) = service.delete_user("u3").await.unwrap_err() else {
        panic!("expected a structured error");
    };
    assert_eq!(err.code, ErrorCode::DeleteUserFailed);
    assert_eq!(err.message, "Failed to delete user");
    assert_eq!(err.cause_as::<ApiError>().and_then(ApiError::status), Some(204));

    let ServiceError::Store(err) = service.delete_user("u3").await.unwrap_err() else {
        panic!("expected a structured error");
    };
    assert_eq!(err.code, ErrorCode::DeleteUserFailed);
    assert_eq!(
        err.cause_as::<ApiError>(),
        Some(&ApiError::transport("connection reset"))
    );
}

#[tokio::test]
async fn test_count_by_role() {
    let transport = ScriptedTransport::reply(
        200,
        json!({"data": {"admin": 1, "teacher": 4, "student": 30}, "status": true}),
    );
    let counts = service(&transport).count_by_role().await.unwrap();

    assert_eq!(counts.get(&Role::Student), Some(&30));
    assert_eq!(counts.values().sum::<u64>(), 35);
    assert_eq!(
        transport.requests()[0].path,
        "/api/admin/users/count-by-role"
    );
}

#[tokio::test]
async fn test_compare_growth_stats_by_role() {
    let transport = ScriptedTransport::with(vec![
        Ok(ApiResponse::new(
            200,
            json!({"data": {"student": 12.5, "teacher": -3.0}, "status": true}),
        )),
        Ok(ApiResponse::new(200, json!({"data": null, "status": true}))),
    ]);
    let service = service(&transport);
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
    );

    let stats = service.compare_growth_stats_by_role(&range).await.unwrap();
    assert_eq!(stats.get("student"), Some(&12.5));

    let sent = transport.requests();
    assert_eq!(sent[0].path, "/api/admin/users/growth-stats-by-role");
    assert_eq!(sent[0].query, range.query_pairs());

    let err = service.compare_growth_stats_by_role(&range).await.unwrap_err();
    assert_eq!(store_code(err), ErrorCode::CompareGrowthStatsByRoleFailed);
}

#[tokio::test]
async fn test_edit_user_detail() {
    let transport = ScriptedTransport::with(vec![
        Ok(ApiResponse::new(
            200,
            json!({
                "data": {"status": true, "msg": "User detail updated successfully"},
                "status": true
            }),
        )),
        Ok(ApiResponse::new(200, json!({"data": null, "status": false}))),
    ]);
    let service = service(&transport);
    let partial = json!({"student_info": {"major": "Chemistry"}});

    let outcome = service.edit_user_detail("u7", &partial).await.unwrap();
    assert!(outcome.is_confirmed());
    assert_eq!(
        outcome.msg.as_deref(),
        Some("User detail updated successfully")
    );

    let sent = transport.requests();
    assert_eq!(sent[0].path, "/api/admin/users/edit-user-detail/u7");
    assert_eq!(sent[0].body, Some(partial.clone()));

    let ServiceError::Store(err) = service.edit_user_detail("u7", &partial).await.unwrap_err()
    else {
        panic!("expected a structured error");
    };
    assert_eq!(err.code, ErrorCode::EditUserDetailFailed);
    assert_eq!(err.message, "Failed to edit user detail");
}

#[tokio::test]
async fn test_edit_user_detail_truthy_indicators() {
    let transport = ScriptedTransport::with(vec![
        Ok(ApiResponse::new(200, json!({"data": {"success": true}}))),
        Ok(ApiResponse::new(
            200,
            json!({"data": {"status": 1, "msg": "ok"}, "success": true}),
        )),
    ]);
    let service = service(&transport);
    let partial = json!({"teacher_info": {"lecturer_name": "Dr. Mia"}});

    let by_success = service.edit_user_detail("t1", &partial).await.unwrap();
    assert!(by_success.is_confirmed());
    assert_eq!(by_success.success, json!(true));

    let numeric = service.edit_user_detail("t1", &partial).await.unwrap();
    assert!(numeric.is_confirmed());
    assert_eq!(numeric.status, json!(1));
    assert_eq!(numeric.msg.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_custom_base_path() {
    let transport = ScriptedTransport::reply(200, json!({"data": {"admin": 1}}));
    let service = HttpUserService::new(transport.clone()).with_base_path("/v2/admin");

    assert_eq!(service.base_path(), "/v2/admin/");
    service.count_by_role().await.unwrap();
    assert_eq!(transport.requests()[0].path, "/v2/admin/users/count-by-role");
}

#[tokio::test]
async fn test_login_stores_token() {
    let transport = ScriptedTransport::reply(
        200,
        json!({
            "data": {
                "user": {"_id": "a1", "username": "root", "role": "admin"},
                "access_token": "jwt-token"
            },
            "status": true,
            "msg": "Login successful"
        }),
    );
    let tokens = TokenStore::default();
    let auth = AuthService::new(transport.clone(), tokens.clone());

    let login = auth.login(" root ", "pw").await.unwrap();
    assert_eq!(login.user.role, Role::Admin);
    assert_eq!(tokens.get().as_deref(), Some("jwt-token"));
    assert!(auth.is_authenticated());

    let sent = transport.requests();
    assert_eq!(sent[0].path, "/api/auth/login");
    assert_eq!(
        sent[0].body,
        Some(json!({"username": "root", "password": "pw"}))
    );

    auth.logout();
    assert_eq!(tokens.get(), None);
}

#[tokio::test]
async fn test_login_failures() {
    let transport = ScriptedTransport::with(vec![
        Ok(ApiResponse::new(200, json!({"data": {"user": null}, "status": true}))),
        Err(ApiError::Unauthorized),
    ]);
    let tokens = TokenStore::default();
    let auth = AuthService::new(transport.clone(), tokens.clone());

    assert_eq!(
        auth.login("", "pw").await.unwrap_err(),
        AuthError::MissingCredentials
    );
    assert!(transport.requests().is_empty());

    let err = auth.login("root", "pw").await.unwrap_err();
    assert!(matches!(err, AuthError::Api(ref api) if api.is_deserialization()));

    let err = auth.login("root", "wrong").await.unwrap_err();
    assert_eq!(err, AuthError::Api(ApiError::Unauthorized));
    assert!(!tokens.is_authenticated());
}
