use super::{invoke_as, invoke_unit, SharedBackend};
use crate::error::Result;
use crate::state::ImageInfo;
use serde_json::{json, Value};

/// Docker image commands.
#[derive(Clone)]
pub struct ImageService {
    backend: SharedBackend,
}

impl ImageService {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    pub async fn list_images(&self) -> Result<Vec<ImageInfo>> {
        invoke_as(self.backend.as_ref(), "list_images", Value::Null).await
    }

    pub async fn remove_image(&self, image_id: &str) -> Result<()> {
        invoke_unit(
            self.backend.as_ref(),
            "remove_image",
            json!({ "imageId": image_id }),
        )
        .await
    }

    pub async fn pull_image(&self, image_name: &str) -> Result<()> {
        invoke_unit(
            self.backend.as_ref(),
            "pull_image",
            json!({ "imageName": image_name }),
        )
        .await
    }
}
