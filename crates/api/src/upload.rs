use axum::extract::Multipart;

use crate::error::AppError;

/// A PDF received through the upload form.
pub struct UploadedPdf {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Read the `pdf` field of a multipart form. Other fields are ignored.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<UploadedPdf, AppError> {
    let mut upload: Option<UploadedPdf> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadUpload(format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "pdf" | "file" => {
                let filename = field.file_name().unwrap_or("upload.pdf").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadUpload(format!("Failed to read file data: {}", e)))?
                    .to_vec();

                upload = Some(UploadedPdf { filename, data });
            }
            _ => {
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadUpload(format!("Failed to read field `{}`: {}", name, e)))?;
            }
        }
    }

    match upload {
        Some(upload) if !upload.data.is_empty() => Ok(upload),
        Some(_) => Err(AppError::BadUpload("Uploaded file is empty".to_string())),
        None => Err(AppError::BadUpload("No file uploaded".to_string())),
    }
}
