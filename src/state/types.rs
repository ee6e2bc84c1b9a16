use serde::{Deserialize, Deserializer, Serialize};

/// A database container as reported by `list_containers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// Docker container ID
    pub id: String,

    /// Container name
    pub name: String,

    /// Docker status text (e.g. "running", "exited")
    pub status: String,

    /// Published host port; `None` when the container publishes none.
    /// The backend sends it as a string, empty when unpublished.
    #[serde(default, deserialize_with = "deserialize_port")]
    pub port: Option<u16>,

    /// Creation time as reported by Docker
    pub created: String,

    /// Name of the database inside the container
    pub database_name: String,

    /// Database engine, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_type: Option<String>,
}

impl ContainerInfo {
    pub fn is_running(&self) -> bool {
        self.status.eq_ignore_ascii_case("running") || self.status.starts_with("Up")
    }
}

/// A local Docker image as reported by `list_images`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub id: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub size: ImageSize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

/// Image size as the backend reports it: a byte count or a display string
/// such as `"412.5 MB"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSize {
    Bytes(u64),
    Display(String),
}

impl Default for ImageSize {
    fn default() -> Self {
        ImageSize::Bytes(0)
    }
}

impl ImageSize {
    /// Approximate size in bytes. Unreadable display strings count as 0.
    pub fn bytes(&self) -> u64 {
        match self {
            ImageSize::Bytes(bytes) => *bytes,
            ImageSize::Display(text) => parse_size(text).unwrap_or(0),
        }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageSize::Bytes(bytes) => write!(f, "{}", bytes),
            ImageSize::Display(text) => f.write_str(text),
        }
    }
}

fn parse_size(text: &str) -> Option<u64> {
    let text = text.trim();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let value: f64 = number.parse().ok()?;
    let multiplier = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1.0,
        "KB" => 1024.0,
        "MB" => 1024.0 * 1024.0,
        "GB" => 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    Some((value * multiplier) as u64)
}

/// Accept the port as a number, a numeric string, an empty string or null.
fn deserialize_port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u16),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(port)) => Ok(Some(port)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text.trim().parse().map(Some).map_err(|_| {
            serde::de::Error::custom(format!("invalid port '{}'", text))
        }),
    }
}
