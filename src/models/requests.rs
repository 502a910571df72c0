//! Request DTOs for the driver API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::models::NewDriver;

/// Maximum accepted driver name length in characters
pub const MAX_NAME_LENGTH: usize = 128;

/// Request body for `POST /api/drivers/AddDriver`
///
/// # Fields
/// - `name`: The driver's name
/// - `driver_number`: Optional racing number (defaults to 0)
///
/// Any `id` in the body is ignored; the store assigns it.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDriverRequest {
    pub name: String,
    #[serde(default)]
    pub driver_number: i32,
}

impl CreateDriverRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("Name cannot be empty".to_string());
        }
        if self.name.chars().count() > MAX_NAME_LENGTH {
            return Some(format!(
                "Name exceeds maximum length of {} characters",
                MAX_NAME_LENGTH
            ));
        }
        if self.driver_number < 0 {
            return Some("Driver number cannot be negative".to_string());
        }
        None
    }

    pub fn into_new_driver(self) -> NewDriver {
        NewDriver {
            name: self.name,
            driver_number: self.driver_number,
        }
    }
}

/// Query string carrying a driver id, e.g. `?id=1`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DriverIdQuery {
    pub id: i64,
}
