use axum::{
    body::Body,
    extract::{multipart::Field, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use crate::{
    adapters::{dto::image_dto::ImageResponse, state::AppState},
    application::error::ApplicationError,
    domain::models::{
        file::{FileData, FALLBACK_CONTENT_TYPE},
        image::{ImageContent, ImageMetadata},
    },
};

/// Parts of an upload or update form.
struct ImageForm {
    file: FileData,
    name: Option<String>,
}

pub struct ImageController;

impl ImageController {
    /// POST /api/images/upload/limited
    pub async fn upload_limited(
        State(app_state): State<AppState>,
        multipart: Multipart,
    ) -> Result<Response, ApplicationError> {
        let limit = app_state.config.upload_size_limit;
        let form = read_image_form(multipart, Some(limit)).await?;
        let metadata = app_state
            .image_service
            .upload(form.into_file(), Some(limit))
            .await?;
        Ok(created(metadata))
    }

    /// POST /api/images/upload/unlimited
    pub async fn upload_unlimited(
        State(app_state): State<AppState>,
        multipart: Multipart,
    ) -> Result<Response, ApplicationError> {
        let form = read_image_form(multipart, None).await?;
        let metadata = app_state.image_service.upload(form.into_file(), None).await?;
        Ok(created(metadata))
    }

    /// GET /api/images/view/id/{id}
    pub async fn view_by_id(
        State(app_state): State<AppState>,
        Path(id): Path<i64>,
    ) -> Result<Response, ApplicationError> {
        let image = app_state.image_service.fetch_by_id(id).await?;
        Ok(image_bytes(image))
    }

    /// GET /api/images/view/filename/{name}
    pub async fn view_by_filename(
        State(app_state): State<AppState>,
        Path(name): Path<String>,
    ) -> Result<Response, ApplicationError> {
        let image = app_state.image_service.fetch_by_name(&name).await?;
        Ok(image_bytes(image))
    }

    /// GET /api/images
    pub async fn list_images(
        State(app_state): State<AppState>,
    ) -> Result<Json<Vec<ImageResponse>>, ApplicationError> {
        let images = app_state.image_service.list_metadata().await?;
        Ok(Json(images.into_iter().map(ImageResponse::from).collect()))
    }

    /// GET /api/images/{id}
    pub async fn get_image(
        State(app_state): State<AppState>,
        Path(id): Path<i64>,
    ) -> Result<Json<ImageResponse>, ApplicationError> {
        let metadata = app_state.image_service.get_metadata(id).await?;
        Ok(Json(ImageResponse::from(metadata)))
    }

    /// PUT /api/images/update/{id}
    ///
    /// Replaces the bytes. The record keeps its name unless a `name` part is sent.
    pub async fn update_image(
        State(app_state): State<AppState>,
        Path(id): Path<i64>,
        multipart: Multipart,
    ) -> Result<Json<ImageResponse>, ApplicationError> {
        let form = read_image_form(multipart, None).await?;
        let metadata = app_state
            .image_service
            .update(id, form.file, form.name)
            .await?;
        Ok(Json(ImageResponse::from(metadata)))
    }

    /// DELETE /api/images/delete/{id}
    pub async fn delete_image(
        State(app_state): State<AppState>,
        Path(id): Path<i64>,
    ) -> Result<StatusCode, ApplicationError> {
        app_state.image_service.delete(id).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}

impl ImageForm {
    /// On upload, a `name` part takes the place of the file part's filename.
    fn into_file(self) -> FileData {
        match self.name {
            Some(name) => FileData {
                filename: name,
                ..self.file
            },
            None => self.file,
        }
    }
}

async fn read_image_form(
    mut multipart: Multipart,
    limit: Option<u64>,
) -> Result<ImageForm, ApplicationError> {
    let mut file: Option<FileData> = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Invalid multipart data: {}", e);
        ApplicationError::BadRequest("Invalid request format".to_string())
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().map(str::to_string).ok_or_else(|| {
                    ApplicationError::BadRequest("File part has no filename".to_string())
                })?;
                let mime_type = field.content_type().map(str::to_string);
                let content = read_limited(field, limit).await?;
                file = Some(FileData::new(content, filename, mime_type));
            }
            "name" => {
                let text = field.text().await.map_err(|e| {
                    warn!("Invalid name field: {}", e);
                    ApplicationError::BadRequest("Invalid request data".to_string())
                })?;
                if !text.trim().is_empty() {
                    name = Some(text);
                }
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| {
        warn!("Missing required 'file' field");
        ApplicationError::BadRequest("Missing required field".to_string())
    })?;

    Ok(ImageForm { file, name })
}

/// Reads a file part, giving up as soon as it grows past `limit`.
async fn read_limited(mut field: Field<'_>, limit: Option<u64>) -> Result<Vec<u8>, ApplicationError> {
    let mut content = Vec::new();

    while let Some(chunk) = field.chunk().await.map_err(|e| {
        warn!("Cannot read file bytes: {}", e);
        ApplicationError::BadRequest("Invalid file data".to_string())
    })? {
        content.extend_from_slice(&chunk);
        if let Some(limit) = limit {
            if content.len() as u64 > limit {
                return Err(ApplicationError::PayloadTooLarge { limit });
            }
        }
    }

    Ok(content)
}

fn created(metadata: ImageMetadata) -> Response {
    info!("Image {} available at {}", metadata.id, metadata.url);

    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(&metadata.url) {
        Ok(location) => {
            headers.insert(header::LOCATION, location);
        }
        Err(e) => warn!("No Location header for image {}: {}", metadata.id, e),
    }

    (
        StatusCode::CREATED,
        headers,
        Json(ImageResponse::from(metadata)),
    )
        .into_response()
}

fn image_bytes(image: ImageContent) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&image.metadata.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE)),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(image.content.len()));
    let disposition = format!(
        "inline; filename=\"{}\"",
        image.metadata.name.replace('\\', "\\\\").replace('"', "\\\"")
    );
    if let Ok(disposition) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    (StatusCode::OK, headers, Body::from(image.content)).into_response()
}
