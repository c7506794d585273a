//! REST API 响应 DTO 定义
//!
//! 所有端点统一返回 `{success, code, message, data}` 四字段结构，
//! 列表类端点在 data 中嵌套分页信息。

use serde::Serialize;

/// 统一 API 响应包装
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "OK".to_string(),
            message: "success".to_string(),
            data: Some(data),
        }
    }

    /// 成功响应（自定义消息）
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "OK".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }

    /// 错误响应
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }
}

impl ApiResponse<()> {
    /// 无数据的成功响应
    pub fn ok() -> Self {
        Self::success(())
    }
}

/// 分页响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
}

impl<T> PageResponse<T> {
    pub fn new(items: Vec<T>, page: i64, page_size: i64) -> Self {
        Self {
            items,
            page,
            page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response_shape() {
        let resp = ApiResponse::success(42);
        assert!(resp.success);
        assert_eq!(resp.code, "OK");
        assert_eq!(resp.data, Some(42));

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 42);
    }

    #[test]
    fn test_error_response_has_no_data() {
        let resp: ApiResponse<()> = ApiResponse::error("NOT_FOUND", "资源不存在");
        assert!(!resp.success);
        assert_eq!(resp.code, "NOT_FOUND");
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_page_response_serializes_camel_case() {
        let page = PageResponse::new(vec![1, 2, 3], 1, 20);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["items"].as_array().unwrap().len(), 3);
        assert_eq!(json["pageSize"], 20);
    }
}
