use actix_web::http::StatusCode;
use std::fmt;

#[derive(Debug, Clone)]
pub enum ShortifyError {
    Validation(String),
    AliasTaken(String),
    BlacklistedDomain(String),
    RateLimited(String),
    NotFound(String),
    CacheConnection(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
}

impl ShortifyError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShortifyError::Validation(_) => "E001",
            ShortifyError::AliasTaken(_) => "E002",
            ShortifyError::BlacklistedDomain(_) => "E003",
            ShortifyError::RateLimited(_) => "E004",
            ShortifyError::NotFound(_) => "E005",
            ShortifyError::CacheConnection(_) => "E006",
            ShortifyError::DatabaseConnection(_) => "E007",
            ShortifyError::DatabaseOperation(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShortifyError::Validation(_) => "Validation Error",
            ShortifyError::AliasTaken(_) => "Alias Taken",
            ShortifyError::BlacklistedDomain(_) => "Blacklisted Domain",
            ShortifyError::RateLimited(_) => "Rate Limited",
            ShortifyError::NotFound(_) => "Resource Not Found",
            ShortifyError::CacheConnection(_) => "Cache Connection Error",
            ShortifyError::DatabaseConnection(_) => "Database Connection Error",
            ShortifyError::DatabaseOperation(_) => "Database Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShortifyError::Validation(msg)
            | ShortifyError::AliasTaken(msg)
            | ShortifyError::BlacklistedDomain(msg)
            | ShortifyError::RateLimited(msg)
            | ShortifyError::NotFound(msg)
            | ShortifyError::CacheConnection(msg)
            | ShortifyError::DatabaseConnection(msg)
            | ShortifyError::DatabaseOperation(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码
    ///
    /// 校验 / 策略类错误统一 400（与对外 API 约定一致），
    /// 限流 429，未找到 404，基础设施错误 5xx。
    pub fn http_status(&self) -> StatusCode {
        match self {
            ShortifyError::Validation(_)
            | ShortifyError::AliasTaken(_)
            | ShortifyError::BlacklistedDomain(_) => StatusCode::BAD_REQUEST,
            ShortifyError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ShortifyError::NotFound(_) => StatusCode::NOT_FOUND,
            ShortifyError::CacheConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            ShortifyError::DatabaseConnection(_) | ShortifyError::DatabaseOperation(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for ShortifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for ShortifyError {}

// 便捷的构造函数
impl ShortifyError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ShortifyError::Validation(msg.into())
    }

    pub fn alias_taken<T: Into<String>>(msg: T) -> Self {
        ShortifyError::AliasTaken(msg.into())
    }

    pub fn blacklisted_domain<T: Into<String>>(msg: T) -> Self {
        ShortifyError::BlacklistedDomain(msg.into())
    }

    pub fn rate_limited<T: Into<String>>(msg: T) -> Self {
        ShortifyError::RateLimited(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShortifyError::NotFound(msg.into())
    }

    pub fn cache_connection<T: Into<String>>(msg: T) -> Self {
        ShortifyError::CacheConnection(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        ShortifyError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        ShortifyError::DatabaseOperation(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for ShortifyError {
    fn from(err: sea_orm::DbErr) -> Self {
        ShortifyError::DatabaseOperation(err.to_string())
    }
}

impl From<redis::RedisError> for ShortifyError {
    fn from(err: redis::RedisError) -> Self {
        ShortifyError::CacheConnection(err.to_string())
    }
}

impl From<std::io::Error> for ShortifyError {
    fn from(err: std::io::Error) -> Self {
        ShortifyError::DatabaseOperation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortifyError>;
