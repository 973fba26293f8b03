//! Permgate REST API server
//!
//! Run with: cargo run --features server --bin permgate-server
//!
//! Endpoints:
//!   GET  /health                        - Liveness
//!   POST /sync                          - Re-synchronize role templates
//!   GET  /kinds                         - Permission catalog
//!   GET  /roles/:role/template          - Role template preview
//!   POST /members                       - Add a project member
//!   GET  /projects/:id/permissions      - Grant maps for every member
//!   GET  /members/:id/permissions       - One member's grant map
//!   PUT  /members/:id/permissions       - Bulk-update overrides
//!   PUT  /members/:id/role              - Change role (cascades)
//!   POST /members/:id/reset             - Reset overrides to template
//!   POST /check                         - Permission check

use std::collections::BTreeMap;

use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use permgate::{
    add_member, all_member_permissions, all_permission_kinds, has_permission, init,
    member_permissions, reset_to_default_permissions, role_template, sync_role_templates,
    update_member_permissions, update_member_role, Actor, Member, MemberPermissions,
    NoExternalRoles, PermError, PermissionKind, ProjectRole,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct AddMemberReq {
    project_id: u64,
    person_id: u64,
    role: String,
}

#[derive(Deserialize)]
struct UpdateGrantsReq {
    grants: BTreeMap<String, bool>,
}

#[derive(Deserialize)]
struct ChangeRoleReq {
    role: String,
}

#[derive(Deserialize)]
struct CheckReq {
    project_id: u64,
    person_id: u64,
    #[serde(default)]
    super_admin: bool,
    kind: String,
}

#[derive(Serialize)]
struct CheckRes {
    granted: bool,
}

#[derive(Serialize)]
struct KindInfo {
    kind: PermissionKind,
    description: &'static str,
}

#[derive(Serialize)]
struct ProjectPermissionsRes {
    members: Vec<MemberPermissions>,
}

#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(msg.into()) }
    }
}

fn status_for(e: &PermError) -> StatusCode {
    match e {
        PermError::NotFound(_) => StatusCode::NOT_FOUND,
        PermError::Forbidden(_) => StatusCode::FORBIDDEN,
        PermError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        PermError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(r: permgate::Result<T>) -> (StatusCode, Json<ApiResponse<T>>) {
    match r {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))),
        Err(e) => (status_for(&e), Json(ApiResponse::err(e.to_string()))),
    }
}

fn parse_role(name: &str) -> permgate::Result<ProjectRole> {
    ProjectRole::from_name(name)
        .ok_or_else(|| PermError::InvalidInput(format!("unknown role '{}'", name)))
}

fn parse_kind(name: &str) -> permgate::Result<PermissionKind> {
    PermissionKind::from_name(name)
        .ok_or_else(|| PermError::InvalidInput(format!("unknown permission kind '{}'", name)))
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::ok("ok"))
}

async fn sync() -> (StatusCode, Json<ApiResponse<&'static str>>) {
    respond(sync_role_templates(&NoExternalRoles).map(|_| "synchronized"))
}

async fn kinds() -> Json<ApiResponse<Vec<KindInfo>>> {
    let list = all_permission_kinds()
        .into_iter()
        .map(|(kind, description)| KindInfo { kind, description })
        .collect();
    Json(ApiResponse::ok(list))
}

async fn role_template_handler(
    Path(role): Path<String>,
) -> (StatusCode, Json<ApiResponse<BTreeMap<PermissionKind, bool>>>) {
    respond(parse_role(&role).and_then(role_template))
}

async fn add_member_handler(
    Json(req): Json<AddMemberReq>,
) -> (StatusCode, Json<ApiResponse<Member>>) {
    respond(parse_role(&req.role).and_then(|role| add_member(req.project_id, req.person_id, role)))
}

async fn project_permissions(
    Path(project_id): Path<u64>,
) -> (StatusCode, Json<ApiResponse<ProjectPermissionsRes>>) {
    respond(all_member_permissions(project_id).map(|members| ProjectPermissionsRes { members }))
}

async fn get_member_permissions(
    Path(member_id): Path<u64>,
) -> (StatusCode, Json<ApiResponse<MemberPermissions>>) {
    respond(member_permissions(member_id))
}

async fn put_member_permissions(
    Path(member_id): Path<u64>,
    Json(req): Json<UpdateGrantsReq>,
) -> (StatusCode, Json<ApiResponse<MemberPermissions>>) {
    let parsed: permgate::Result<Vec<(PermissionKind, bool)>> = req
        .grants
        .iter()
        .map(|(name, granted)| parse_kind(name).map(|k| (k, *granted)))
        .collect();
    respond(parsed.and_then(|updates| update_member_permissions(member_id, &updates)))
}

async fn put_member_role(
    Path(member_id): Path<u64>,
    Json(req): Json<ChangeRoleReq>,
) -> (StatusCode, Json<ApiResponse<MemberPermissions>>) {
    respond(parse_role(&req.role).and_then(|role| update_member_role(member_id, role)))
}

async fn reset_member(
    Path(member_id): Path<u64>,
) -> (StatusCode, Json<ApiResponse<MemberPermissions>>) {
    respond(reset_to_default_permissions(member_id))
}

async fn check(Json(req): Json<CheckReq>) -> (StatusCode, Json<ApiResponse<CheckRes>>) {
    let actor = Actor { person_id: req.person_id, super_admin: req.super_admin };
    respond(
        parse_kind(&req.kind)
            .and_then(|kind| has_permission(&actor, req.project_id, kind))
            .map(|granted| CheckRes { granted }),
    )
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let db_path = std::env::var("PERMGATE_DB").unwrap_or_else(|_| "./permgate-db".into());
    let addr = std::env::var("PERMGATE_ADDR").unwrap_or_else(|_| "127.0.0.1:8710".into());

    init(&db_path).expect("database init failed");
    sync_role_templates(&NoExternalRoles).expect("template sync failed");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/sync", post(sync))
        .route("/kinds", get(kinds))
        .route("/roles/:role/template", get(role_template_handler))
        .route("/members", post(add_member_handler))
        .route("/projects/:project_id/permissions", get(project_permissions))
        .route(
            "/members/:member_id/permissions",
            get(get_member_permissions).put(put_member_permissions),
        )
        .route("/members/:member_id/role", put(put_member_role))
        .route("/members/:member_id/reset", post(reset_member))
        .route("/check", post(check))
        .layer(cors);

    tracing::info!(%addr, db = %db_path, "permgate server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await.expect("bind failed");
    axum::serve(listener, app).await.expect("server failed");
}
