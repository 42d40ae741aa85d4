//! JSON response envelope: `{success, message, data}`.
//!
//! Errors travel as values; a failed call serializes with `success: false`,
//! the error text in `message` and no `data`.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T, E: Display> From<Result<T, E>> for ApiResponse<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_omits_message() {
        let resp: ApiResponse<u32> = Ok::<_, String>(7).into();
        assert_eq!(serde_json::to_string(&resp).unwrap(), r#"{"success":true,"data":7}"#);
    }

    #[test]
    fn error_envelope_carries_message() {
        let resp: ApiResponse<u32> = Err::<u32, _>("insufficient data").into();
        assert!(!resp.success);
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"success":false,"message":"insufficient data"}"#
        );
    }

    #[test]
    fn message_can_accompany_data() {
        let resp = ApiResponse::ok(vec![1, 2]).with_message("2 pairs");
        let back: ApiResponse<Vec<i32>> =
            serde_json::from_str(&serde_json::to_string(&resp).unwrap()).unwrap();
        assert_eq!(back, resp);
    }
}
