use std::fmt;

#[derive(Debug)]
pub enum WeatherError {
    InvalidRequest(String),
    Network(String),
    Status(u16),
    Provider { code: i64, info: String },
    Document(String),
}

impl WeatherError {
    /// True when the request was rejected before reaching the provider
    pub fn is_user_error(&self) -> bool {
        matches!(self, WeatherError::InvalidRequest(_))
    }
}

impl fmt::Display for WeatherError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WeatherError::InvalidRequest(e) => write!(f, "WeatherError::InvalidRequest: {}", e),
            WeatherError::Network(e) => write!(f, "WeatherError::Network: {}", e),
            WeatherError::Status(s) => write!(f, "WeatherError::Status: provider answered {}", s),
            WeatherError::Provider { code, info } => write!(f, "WeatherError::Provider: {} ({})", info, code),
            WeatherError::Document(e) => write!(f, "WeatherError::Document: {}", e),
        }
    }
}
impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        WeatherError::Network(e.to_string())
    }
}
impl From<serde_json::Error> for WeatherError {
    fn from(e: serde_json::Error) -> Self {
        WeatherError::Document(e.to_string())
    }
}
