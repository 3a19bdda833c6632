//! # rc-storage-local
//! Local filesystem implementation of `MediaStore`.
//! Content-addressed per bucket, sharded by hash prefix, with a WebP thumbnail
//! next to every original.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{DynamicImage, ImageReader};
use rc_core::traits::MediaStore;
use rc_core::{AppError, MediaBucket};
use sha2::{Digest, Sha256};
use tokio::fs;

const THUMB_EDGE: u32 = 250;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/static/uploads")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: String) -> Self {
        Self {
            root_path: root,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// "<root>/<bucket>/ab/cd/abcd...hash"
    fn sharded_path(&self, bucket: MediaBucket, hash: &str) -> PathBuf {
        let mut path = self.root_path.join(bucket.as_str());
        path.push(&hash[0..2]);
        path.push(&hash[2..4]);
        path.push(hash);
        path
    }
}

fn decode(data: &[u8]) -> anyhow::Result<DynamicImage> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            log::debug!("rejected upload: {e}");
            anyhow::Error::new(AppError::ValidationError("file is not a readable image".into()))
        })
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Saves an upload using its SHA-256 hash as the filename.
    /// Identical bytes in the same bucket are stored once.
    async fn save_upload(
        &self,
        data: Vec<u8>,
        content_type: &str,
        bucket: MediaBucket,
    ) -> anyhow::Result<String> {
        let hash = hex::encode(Sha256::digest(&data));
        let target_path = self.sharded_path(bucket, &hash);
        if fs::try_exists(&target_path).await? {
            return Ok(hash);
        }

        let (data, thumb) = tokio::task::spawn_blocking(move || {
            let img = decode(&data)?;
            Ok::<_, anyhow::Error>((data, img.thumbnail(THUMB_EDGE, THUMB_EDGE)))
        })
        .await??;

        let parent = target_path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("sharded path has no parent"))?
            .to_path_buf();
        fs::create_dir_all(&parent).await?;
        fs::write(&target_path, &data).await?;

        let thumb_path = parent.join(format!("thumb_{hash}.webp"));
        tokio::task::spawn_blocking(move || {
            thumb.to_rgba8().save_with_format(thumb_path, image::ImageFormat::WebP)
        })
        .await??;

        log::info!(
            "stored {} upload {} ({} bytes, {})",
            bucket.as_str(),
            hash,
            data.len(),
            content_type
        );
        Ok(hash)
    }

    fn get_url(&self, bucket: MediaBucket, media_id: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.url_prefix,
            bucket.as_str(),
            &media_id[0..2],
            &media_id[2..4],
            media_id
        )
    }

    fn get_thumbnail_url(&self, bucket: MediaBucket, media_id: &str) -> String {
        format!(
            "{}/{}/{}/{}/thumb_{}.webp",
            self.url_prefix,
            bucket.as_str(),
            &media_id[0..2],
            &media_id[2..4],
            media_id
        )
    }
}
