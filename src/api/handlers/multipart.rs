use crate::api::error::AppError;
use axum::extract::Multipart;
use bytes::Bytes;

/// One uploaded file plus any plain-text fields that rode along with it.
pub struct Upload {
    pub filename: String,
    pub data: Bytes,
    pub fields: Vec<(String, String)>,
}

/// Drains a multipart body, keeping the `file` part and collecting the other
/// text fields. Missing or empty `file` is a validation failure.
pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut fields = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?;
            file = Some((filename, data));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read field: {}", e)))?;
            fields.push((name, value));
        }
    }

    let (filename, data) =
        file.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    Ok(Upload {
        filename,
        data,
        fields,
    })
}

impl Upload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
