use serde_json::Value;
use uuid::Uuid;

use crate::gateway::{AuditEvent, StoreGateway};

/// Record an audit event. Failures are logged and never fail the caller.
pub async fn log_audit(
    gateway: &dyn StoreGateway,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) {
    let event = AuditEvent {
        user_id,
        action: action.to_string(),
        resource: resource.map(str::to_string),
        metadata,
    };
    if let Err(err) = gateway.record_audit(event).await {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}
