use actix_web::{
    body::EitherBody,
    dev::{self, forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, FromRequest, HttpRequest, HttpResponse,
};
use actix_session::{Session, SessionExt};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use serde::Serialize;
use serde_json::json;
use std::future::{ready, Ready as StdReady};

use crate::models::{Notification, Role};
use crate::AppState;

pub const LOGIN_PATH: &str = "/login";

/// Identity claims kept in the signed session cookie.
#[derive(Serialize, Debug, Clone)]
pub struct AuthenticatedUser {
    #[serde(skip)]
    pub session_id: String,
    #[serde(skip)]
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub email: String,
}

impl AuthenticatedUser {
    pub fn from_session(session: &Session) -> Option<AuthenticatedUser> {
        if session.get::<bool>("logged_in").unwrap_or(None) != Some(true) {
            return None;
        }
        let role = session
            .get::<String>("role")
            .unwrap_or(None)
            .and_then(|role| Role::parse(&role))?;
        Some(AuthenticatedUser {
            session_id: session.get("sid").unwrap_or(None)?,
            token: session.get("token").unwrap_or(None)?,
            user_id: session.get("user_id").unwrap_or(None)?,
            username: session.get("username").unwrap_or(None)?,
            role,
            email: session.get("email").unwrap_or(None).unwrap_or_default(),
        })
    }

    /// Writes the claims of a fresh login into the cookie.
    pub fn store_in(&self, session: &Session) -> Result<(), actix_session::SessionInsertError> {
        session.renew();
        session.insert("sid", &self.session_id)?;
        session.insert("token", &self.token)?;
        session.insert("user_id", self.user_id)?;
        session.insert("username", &self.username)?;
        session.insert("role", self.role.as_str())?;
        session.insert("email", &self.email)?;
        session.insert("logged_in", true)?;
        Ok(())
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = StdReady<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let session = req.get_session();
        match AuthenticatedUser::from_session(&session) {
            Some(user) => ready(Ok(user)),
            None => ready(Err(actix_web::error::ErrorUnauthorized("Not logged in."))),
        }
    }
}

pub fn admin_guard(session: &Session) -> bool {
    session.get::<String>("role").unwrap_or(None) == Some(Role::Admin.as_str().to_string())
}

pub fn member_guard(session: &Session) -> bool {
    session.get::<bool>("logged_in").unwrap_or(None) == Some(true)
}

/// Body sent when an automatic logout happened.
pub fn expired_response() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({
        "success": false,
        "error": "Your trial has expired.",
        "notification": Notification {
            message: "Your trial has expired. Please log in again.".to_string(),
            r#type: "error".to_string(),
        },
        "redirect": LOGIN_PATH,
    }))
}

// --- Trial expiry gate ---
// Ends the cookie session of any browser whose trial countdown fired and
// answers with the expiry notice instead of running the handler.

pub struct TrialExpiryGate;

impl<S, B> Transform<S, ServiceRequest> for TrialExpiryGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = TrialExpiryGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(TrialExpiryGateMiddleware { service })
    }
}

pub struct TrialExpiryGateMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TrialExpiryGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let session = req.get_session();
        let session_id = session.get::<String>("sid").unwrap_or(None);
        let expired = match (req.app_data::<web::Data<AppState>>(), session_id.as_deref()) {
            (Some(state), Some(sid)) if state.sessions.is_expired(sid) => {
                state.sessions.close(sid);
                true
            }
            _ => false,
        };

        if expired {
            log::warn!("Rejected request from a session whose trial has expired.");
            session.purge();
            Box::pin(async move {
                let (http_req, _payload) = req.into_parts();
                let res = expired_response().map_into_right_body();
                Ok(ServiceResponse::new(http_req, res))
            })
        } else {
            let fut = self.service.call(req);
            Box::pin(async move {
                let res = fut.await?;
                Ok(res.map_into_left_body())
            })
        }
    }
}
