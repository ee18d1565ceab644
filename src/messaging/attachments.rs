//! Attachment operations
//!
//! Files are stored in object storage and shared as `file` messages whose
//! content is the object's public URL.

use crate::messaging::error::MessagingError;
use crate::messaging::repository::MessageRepository;
use crate::shared::attachment::attachment_file_name;
use crate::shared::message::now_millis;
use crate::shared::Message;

impl MessageRepository {
    /// Store `bytes` as `bucket/file_name`
    pub async fn upload_attachment(
        &self,
        bucket: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), MessagingError> {
        let size = bytes.len();
        match self.backend.upload(bucket, file_name, bytes).await {
            Ok(()) => {
                tracing::info!("[Storage] Uploaded {} ({} bytes) to {}", file_name, size, bucket);
                Ok(())
            }
            Err(e) => {
                tracing::error!("[Storage] Error uploading {} to {}: {}", file_name, bucket, e);
                Err(e.into())
            }
        }
    }

    /// Public URL of `bucket/file_name`
    pub fn public_url(&self, bucket: &str, file_name: &str) -> String {
        self.backend.public_url(bucket, file_name)
    }

    /// Upload a file and post it to the conversation
    ///
    /// The file goes to the configured attachments bucket under a
    /// timestamped name. A non-empty `caption` is sent first as a text
    /// message, then a `file` message carrying the public URL. Returns that
    /// URL.
    pub async fn send_attachment(
        &self,
        sender: &str,
        receiver: &str,
        original_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<String, MessagingError> {
        Message::new(sender, receiver, "", "file", 0)
            .validate()
            .map_err(MessagingError::InvalidMessage)?;

        let bucket = self.config.attachments_bucket.clone();
        let file_name = attachment_file_name(original_name, now_millis());
        self.upload_attachment(&bucket, &file_name, bytes).await?;
        let url = self.public_url(&bucket, &file_name);

        if let Some(text) = caption.filter(|c| !c.trim().is_empty()) {
            self.send(&Message::text(sender, receiver, text)).await?;
        }
        self.send(&Message::file(sender, receiver, url.clone())).await?;

        Ok(url)
    }
}
