use actix_web::{web, HttpRequest, HttpResponse};
use df_core::error::AppError;
use df_core::traits::{IdentityEvent, WebhookHeaders};
use df_services::users::UpdateUserParams;
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::AppState;

fn header(req: &HttpRequest, name: &str) -> String {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Applies a signed user-lifecycle event from the identity provider.
pub async fn identity_webhook(data: web::Data<AppState>, req: HttpRequest, body: web::Bytes) -> ApiResult<HttpResponse> {
    let Some(identity) = data.identity.as_ref() else {
        warn!("identity webhook received but no signing secret is configured");
        return Err(AppError::Unauthorized("webhook verification is not configured".into()).into());
    };

    let headers = WebhookHeaders {
        id: header(&req, "svix-id"),
        timestamp: header(&req, "svix-timestamp"),
        signature: header(&req, "svix-signature"),
    };
    let event = identity.verify_webhook(&headers, &body).map_err(AppError::from)?;

    match event {
        IdentityEvent::UserCreated(user) => {
            let created = data.forum.users.create_user(user).await?;
            Ok(HttpResponse::Created().json(created))
        }
        IdentityEvent::UserUpdated { clerk_id, update } => {
            let updated = data.forum.users.update_user(UpdateUserParams { clerk_id, update }).await?;
            Ok(HttpResponse::Ok().json(updated))
        }
        IdentityEvent::UserDeleted { clerk_id } => {
            let deleted = data.forum.users.delete_user(&clerk_id).await?;
            Ok(HttpResponse::Ok().json(deleted))
        }
        IdentityEvent::Ignored(kind) => {
            info!(%kind, "ignoring identity event");
            Ok(HttpResponse::NoContent().finish())
        }
    }
}
