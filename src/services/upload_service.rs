// src/services/upload_service.rs
//! Guarda ficheiros enviados (documentos de veículos, licenças emitidas)
//! no diretório de uploads, servido publicamente em `/uploads`.
use crate::error::{AppError, AppResult};
use std::path::Path;
use uuid::Uuid;

/// Tamanho máximo aceite por ficheiro.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Ficheiro já lido do pedido multipart.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

fn is_accepted_type(content_type: &str) -> bool {
    content_type == "application/pdf" || content_type.starts_with("image/")
}

// Extensão do nome original, só caracteres seguros
fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
}

/// Valida e grava o ficheiro. Devolve o caminho público (`/uploads/<nome>`).
pub async fn store_upload(upload_dir: &Path, file: &UploadedFile) -> AppResult<String> {
    if !is_accepted_type(&file.content_type) {
        return Err(AppError::InvalidInput(
            "Formato de arquivo não suportado. Use apenas PDF ou imagens.".to_string(),
        ));
    }
    if file.bytes.is_empty() {
        return Err(AppError::InvalidInput("Nenhum arquivo enviado".to_string()));
    }
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::InvalidInput(
            "Arquivo excede o tamanho máximo de 10MB".to_string(),
        ));
    }

    let name = match extension_of(&file.file_name) {
        Some(ext) => format!("{}-{}.{}", file.field, Uuid::new_v4(), ext),
        None => format!("{}-{}", file.field, Uuid::new_v4()),
    };

    tokio::fs::create_dir_all(upload_dir).await?;
    tokio::fs::write(upload_dir.join(&name), &file.bytes).await?;
    tracing::info!(
        "📎 Ficheiro '{}' ({} bytes) guardado como {}.",
        file.file_name,
        file.bytes.len(),
        name
    );

    Ok(format!("/uploads/{}", name))
}

/// Apaga um ficheiro gravado por `store_upload` quando a operação que o
/// usaria é recusada. Falhas ficam só no log.
pub async fn discard_upload(upload_dir: &Path, url: &str) {
    let Some(name) = url
        .strip_prefix("/uploads/")
        .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && *name != "..")
    else {
        tracing::warn!("Caminho de upload inesperado, nada apagado: {}", url);
        return;
    };
    match tokio::fs::remove_file(upload_dir.join(name)).await {
        Ok(()) => tracing::debug!("🗑️ Upload {} descartado.", name),
        Err(e) => tracing::warn!("Falha ao descartar upload {}: {}", name, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(bytes: Vec<u8>) -> UploadedFile {
        UploadedFile {
            field: "licenseFile".into(),
            file_name: "licenca final.PDF".into(),
            content_type: "application/pdf".into(),
            bytes,
        }
    }

    #[tokio::test]
    async fn stores_pdf_under_field_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let url = store_upload(dir.path(), &pdf(b"%PDF-1.4".to_vec())).await.unwrap();

        assert!(url.starts_with("/uploads/licenseFile-"));
        assert!(url.ends_with(".pdf"));
        let name = url.trim_start_matches("/uploads/");
        let written = std::fs::read(dir.path().join(name)).unwrap();
        assert_eq!(written, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn rejects_unsupported_or_oversized_files() {
        let dir = tempfile::tempdir().unwrap();

        let mut text = pdf(b"ola".to_vec());
        text.content_type = "text/plain".into();
        assert!(matches!(
            store_upload(dir.path(), &text).await,
            Err(AppError::InvalidInput(_))
        ));

        let big = pdf(vec![0u8; MAX_UPLOAD_BYTES + 1]);
        assert!(matches!(
            store_upload(dir.path(), &big).await,
            Err(AppError::InvalidInput(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn discarded_upload_leaves_directory_empty() {
        let dir = tempfile::tempdir().unwrap();
        let url = store_upload(dir.path(), &pdf(b"%PDF-1.4".to_vec())).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        discard_upload(dir.path(), &url).await;
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        // Caminhos fora de /uploads são ignorados
        let outside = dir.path().join("fica.txt");
        std::fs::write(&outside, b"x").unwrap();
        discard_upload(dir.path(), "/uploads/../fica.txt").await;
        discard_upload(dir.path(), "/outro/fica.txt").await;
        assert!(outside.exists());
    }

    #[test]
    fn extension_ignores_unsafe_names() {
        assert_eq!(extension_of("foto.JPG").as_deref(), Some("jpg"));
        assert_eq!(extension_of("semextensao"), None);
        assert_eq!(extension_of("x.p/df"), None);
    }
}
