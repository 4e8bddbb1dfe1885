use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Envelope every API handler responds with.
#[derive(Debug, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response, with `data` and no message.
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Creates an error response, with `message` and no data.
    pub fn error(message: &str) -> Self {
        ApiResponse {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_serializes_message_without_data() {
        let response = ApiResponse::<()>::error("Not enough gems");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Not enough gems");
        assert!(json["data"].is_null());
    }

    #[test]
    fn success_carries_data() {
        let json = serde_json::to_value(ApiResponse::<i64>::success(3)).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 3);
        assert!(json["message"].is_null());
    }
}
