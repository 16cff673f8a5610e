use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::parser::decode::DocumentFormat;

/// Object key for an archived upload.
pub fn upload_key(user_id: Uuid, resume_id: Uuid, format: DocumentFormat) -> String {
    format!("uploads/{}/{}.{}", user_id, resume_id, format.extension())
}

/// Archives the original uploaded bytes to S3.
pub async fn archive_upload(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    bytes: Bytes,
    format: DocumentFormat,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(bytes))
        .content_type(format.mime())
        .send()
        .await
        .map_err(|e| AppError::S3(format!("upload archive failed: {e}")))?;

    info!("Archived upload to s3://{}/{}", bucket, key);
    Ok(())
}
