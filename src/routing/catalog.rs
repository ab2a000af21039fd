//! Built-in operation table for the fitness admin console.
//!
//! Used whenever the configuration file declares no `[[operations]]`.

use crate::config::schema::OperationConfig;

/// (name, inbound method, gateway route, outbound method, backend path)
const CATALOG: &[(&str, &str, &str, &str, &str)] = &[
    ("list-categories", "GET", "/api/categories", "GET", "/categories"),
    ("get-category", "GET", "/api/categories/{id}", "GET", "/categories/{id}"),
    ("create-category", "POST", "/api/categories", "POST", "/categories"),
    ("update-category", "PUT", "/api/categories/{id}", "PUT", "/categories/{id}"),
    // The backend only accepts deletes as a POST to the delete action.
    ("delete-category", "DELETE", "/api/categories/{id}", "POST", "/categories/{id}/delete"),
    ("list-workouts", "GET", "/api/workouts", "GET", "/workouts"),
    ("get-workout", "GET", "/api/workouts/{id}", "GET", "/workouts/{id}"),
    ("create-workout", "POST", "/api/workouts", "POST", "/workouts"),
    ("update-workout", "PUT", "/api/workouts/{id}", "PUT", "/workouts/{id}"),
    ("delete-workout", "DELETE", "/api/workouts/{id}", "DELETE", "/workouts/{id}"),
    ("upload-workout-video", "POST", "/api/workouts/{id}/video", "POST", "/workouts/{id}/video"),
    ("list-users", "GET", "/api/users", "GET", "/users"),
    ("get-user", "GET", "/api/users/{id}", "GET", "/users/{id}"),
    ("update-user", "PUT", "/api/users/{id}", "PUT", "/users/{id}"),
    ("get-page", "GET", "/api/pages/{slug}", "GET", "/cms/pages/{slug}"),
    ("update-page", "PUT", "/api/pages/{slug}", "PUT", "/cms/pages/{slug}"),
];

/// Video uploads may approach `limits.max_body_bytes` and must be received
/// and re-sent within one operation timeout.
pub const VIDEO_UPLOAD_TIMEOUT_SECS: u64 = 900;

pub fn default_operations() -> Vec<OperationConfig> {
    CATALOG
        .iter()
        .map(|(name, inbound, route, outbound, backend)| {
            let op = OperationConfig::new(name, inbound, route, outbound, backend);
            if *name == "upload-workout-video" {
                op.with_timeout(VIDEO_UPLOAD_TIMEOUT_SECS)
            } else {
                op
            }
        })
        .collect()
}
