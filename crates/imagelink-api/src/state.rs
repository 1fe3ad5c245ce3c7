//! Shared application state handed to every handler.

use imagelink_services::ImageService;

pub struct AppState {
    pub image_service: ImageService,
    pub max_file_size_bytes: usize,
}

impl AppState {
    pub fn new(image_service: ImageService) -> Self {
        let max_file_size_bytes = image_service.limits().max_file_size_bytes;
        Self {
            image_service,
            max_file_size_bytes,
        }
    }
}
