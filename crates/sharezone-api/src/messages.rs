use std::path::Path;

use axum::{
    Extension, Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
};
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use sharezone_db::models::MessageRow;
use sharezone_types::api::{HistoryRequest, HistoryResponse, Principal, SendMessageResponse};
use sharezone_types::events::GatewayEvent;
use sharezone_types::models::{Message, MessageType};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

/// 10 MB limit for a single image attachment
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

const IMAGE_TOO_LARGE: &str = "Image exceeds the 10 MB limit";

/// Request body limit for the send endpoint: the image plus the scalar fields.
pub const MAX_SEND_BODY: usize = MAX_IMAGE_SIZE + 64 * 1024;

struct ImagePart {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

#[derive(Default)]
struct SendForm {
    to_user_id: Option<String>,
    text: String,
    image: Option<ImagePart>,
}

/// Running past the route's body limit surfaces as a multipart read error.
fn form_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(IMAGE_TOO_LARGE.into())
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

async fn read_send_form(multipart: &mut Multipart) -> Result<SendForm, ApiError> {
    let mut form = SendForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(form_error)?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "to_user_id" => {
                form.to_user_id = Some(field.text().await.map_err(form_error)?);
            }
            "text" => {
                form.text = field.text().await.map_err(form_error)?;
            }
            "image" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(form_error)?;
                // Browsers send an empty part when no file was picked
                if !bytes.is_empty() {
                    form.image = Some(ImagePart {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
            }
            other => debug!("Ignoring unknown multipart field '{}'", other),
        }
    }

    Ok(form)
}

/// POST /api/message/send — multipart `{ to_user_id, text, image? }`.
/// Persists the message, pushes it to the recipient's live stream and
/// returns the canonical record.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_send_form(&mut multipart).await?;

    let to_user_id: Uuid = form
        .to_user_id
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("to_user_id is required".into()))?
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid recipient id".into()))?;

    if to_user_id == principal.user_id {
        return Err(ApiError::BadRequest("Cannot send a message to yourself".into()));
    }
    if form.text.trim().is_empty() && form.image.is_none() {
        return Err(ApiError::BadRequest("Message must contain text or an image".into()));
    }

    let db = state.clone();
    let recipient = to_user_id.to_string();
    if !run_blocking(move || db.db.user_exists(&recipient)).await? {
        return Err(ApiError::NotFound("Recipient not found".into()));
    }

    let (message_type, stored_file) = match form.image {
        Some(image) => (MessageType::Image, Some(store_image(&state, image).await?)),
        None => (MessageType::Text, None),
    };

    let message = Message {
        id: Uuid::new_v4(),
        from_user_id: principal.user_id,
        to_user_id,
        text: form.text,
        message_type,
        media_url: stored_file.as_deref().map(|f| state.uploads.media_url(f)),
        created_at: Utc::now().trunc_subsecs(3),
    };

    let db = state.clone();
    let row = message_to_row(&message);
    if let Err(e) = run_blocking(move || db.db.insert_message(&row)).await {
        if let Some(file) = stored_file {
            let _ = tokio::fs::remove_file(state.uploads.dir.join(file)).await;
        }
        return Err(e);
    }

    info!("{} -> {}: {} message {}", message.from_user_id, message.to_user_id, message_type.as_str(), message.id);

    state
        .dispatcher
        .send_to_user(to_user_id, GatewayEvent::MessageCreate(message.clone()))
        .await;

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            success: true,
            message,
        }),
    ))
}

/// POST /api/message/get — full history between the principal and `to_user_id`.
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<HistoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let me = principal.user_id.to_string();
    let peer = req.to_user_id.to_string();
    let rows = run_blocking(move || db.db.get_conversation(&me, &peer)).await?;

    let messages: Vec<Message> = rows.into_iter().filter_map(message_from_row).collect();

    Ok(Json(HistoryResponse {
        success: true,
        messages,
    }))
}

/// Write the image under a fresh name, keeping a sane extension. Returns the file name.
async fn store_image(state: &AppState, image: ImagePart) -> Result<String, ApiError> {
    if image.bytes.len() > MAX_IMAGE_SIZE {
        return Err(ApiError::PayloadTooLarge(IMAGE_TOO_LARGE.into()));
    }
    let content_type = image.content_type.unwrap_or_default();
    if !content_type.starts_with("image/") {
        return Err(ApiError::BadRequest("Only image attachments are supported".into()));
    }

    let ext = image
        .file_name
        .as_deref()
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .or_else(|| content_type.strip_prefix("image/"))
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("img")
        .to_ascii_lowercase();
    let file_name = format!("{}.{}", Uuid::new_v4(), ext);

    tokio::fs::create_dir_all(&state.uploads.dir)
        .await
        .map_err(|e| anyhow::anyhow!("failed to create {}: {}", state.uploads.dir.display(), e))?;

    let path = state.uploads.dir.join(&file_name);
    tokio::fs::write(&path, &image.bytes)
        .await
        .map_err(|e| anyhow::anyhow!("failed to write {}: {}", path.display(), e))?;

    Ok(file_name)
}

fn message_to_row(message: &Message) -> MessageRow {
    MessageRow {
        id: message.id.to_string(),
        from_user_id: message.from_user_id.to_string(),
        to_user_id: message.to_user_id.to_string(),
        text: message.text.clone(),
        message_type: message.message_type.as_str().to_string(),
        media_url: message.media_url.clone(),
        created_at: message.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Rows that fail to parse are logged and skipped.
fn message_from_row(row: MessageRow) -> Option<Message> {
    let parsed = (|| {
        Some(Message {
            id: row.id.parse().ok()?,
            from_user_id: row.from_user_id.parse().ok()?,
            to_user_id: row.to_user_id.parse().ok()?,
            text: row.text.clone(),
            message_type: MessageType::parse(&row.message_type)?,
            media_url: row.media_url.clone(),
            created_at: parse_timestamp(&row.created_at)?,
        })
    })();

    if parsed.is_none() {
        warn!("Skipping corrupt message row '{}'", row.id);
    }
    parsed
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    s.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') has no timezone; treat it as UTC
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .ok()
}
