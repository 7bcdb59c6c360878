// src/services/upload_storage.rs

use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;

use crate::common::error::AppError;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Extensão em minúsculas, se for uma das imagens aceitas.
pub fn image_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// `checklist-<milissegundos>-<aleatório>.<ext>`
pub fn checklist_file_name(ext: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("checklist-{}-{}.{}", Utc::now().timestamp_millis(), suffix, ext)
}

/// Fotos gravadas em disco e servidas em `/uploads`.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    dir: PathBuf,
}

impl UploadStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Valida e grava a foto; devolve o caminho público.
    pub async fn store_checklist_photo(&self, original_name: &str, bytes: &[u8]) -> Result<String, AppError> {
        let ext = image_extension(original_name)
            .ok_or_else(|| AppError::InvalidUpload("Apenas imagens são permitidas (jpeg, jpg, png, gif, webp)".into()))?;

        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::InvalidUpload("Arquivo maior que 10 MB".into()));
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let name = checklist_file_name(&ext);
        tokio::fs::write(self.dir.join(&name), bytes).await?;

        tracing::info!("📷 Foto do checklist salva: {}", name);

        Ok(format!("{PUBLIC_PREFIX}/{name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_image_extensions_are_accepted() {
        assert_eq!(image_extension("foto.JPG").as_deref(), Some("jpg"));
        assert_eq!(image_extension("a.b.webp").as_deref(), Some("webp"));
        assert_eq!(image_extension("script.sh"), None);
        assert_eq!(image_extension("sem_extensao"), None);
    }

    #[test]
    fn generated_names_follow_the_pattern() {
        let name = checklist_file_name("png");
        assert!(name.starts_with("checklist-"));
        assert!(name.ends_with(".png"));
        assert_eq!(name.split('-').count(), 3);
    }

    #[tokio::test]
    async fn stores_photo_under_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path().join("uploads"));

        let public = storage.store_checklist_photo("porta.png", b"fake-png").await.unwrap();
        assert!(public.starts_with("/uploads/checklist-"));

        let file_name = public.trim_start_matches("/uploads/");
        let saved = tokio::fs::read(storage.dir().join(file_name)).await.unwrap();
        assert_eq!(saved, b"fake-png");
    }

    #[tokio::test]
    async fn rejects_other_types_and_large_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path());

        let err = storage.store_checklist_photo("doc.pdf", b"x").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidUpload(_)));

        let big = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let err = storage.store_checklist_photo("big.jpg", &big).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidUpload(_)));
    }
}
