//! Session token authentication.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use staffline_db::{find_employee_by_token, find_staff_by_token, DbError, DbPool};
use staffline_types::{Principal, RoleFlags};
use std::sync::Arc;

use crate::AppState;

/// The authenticated principal and its resolved role flags, stored in
/// request extensions by [`auth_middleware`].
#[derive(Clone, Debug)]
pub struct PrincipalContext {
    pub principal: Principal,
    pub flags: RoleFlags,
}

/// Resolves a session token to a principal.
///
/// The staff and employee portals issue tokens in separate namespaces;
/// the staff table is consulted first, then employees. Inactive accounts
/// resolve to `None` the same as unknown tokens.
pub fn resolve_principal(
    conn: &rusqlite::Connection,
    token: &str,
) -> Result<Option<PrincipalContext>, DbError> {
    if let Some(staff) = find_staff_by_token(conn, token)? {
        if !staff.active {
            return Ok(None);
        }
        return Ok(Some(PrincipalContext {
            principal: Principal::staff(staff.id, staff.name),
            flags: staff.flags,
        }));
    }

    if let Some(employee) = find_employee_by_token(conn, token)? {
        if !employee.active {
            return Ok(None);
        }
        return Ok(Some(PrincipalContext {
            principal: Principal::employee(employee.id, employee.name),
            flags: RoleFlags::none(),
        }));
    }

    Ok(None)
}

/// Resolves a token against the pool on a blocking thread.
pub async fn resolve_principal_blocking(
    pool: DbPool,
    token: String,
) -> Result<Option<PrincipalContext>, StatusCode> {
    tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        resolve_principal(&conn, &token).map_err(|e| {
            tracing::error!(error = %e, "principal lookup failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
}

/// Middleware authenticating requests via `X-Staffline-Token` or
/// `Authorization: Bearer`.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let token = if let Some(val) = req.headers().get("X-Staffline-Token") {
        val.to_str()
            .map_err(|_| StatusCode::UNAUTHORIZED)?
            .to_string()
    } else if let Some(val) = req.headers().get("Authorization") {
        let val_str = val.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;
        if let Some(token) = val_str.strip_prefix("Bearer ") {
            token.to_string()
        } else {
            return Err(StatusCode::UNAUTHORIZED);
        }
    } else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();

    let context = resolve_principal_blocking(state.pool.clone(), token)
        .await?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
