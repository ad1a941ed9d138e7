// src/web/multipart_form.rs
// Leitura de formulários multipart: campos de texto mais, no máximo, um ficheiro.
use crate::{
    error::{AppError, AppResult},
    services::upload_service::UploadedFile,
};
use axum::extract::{multipart::MultipartError, Multipart};
use std::{collections::HashMap, str::FromStr};

fn multipart_error(e: MultipartError) -> AppError {
    tracing::warn!("Pedido multipart inválido: {}", e);
    AppError::InvalidInput(format!("Formulário inválido: {}", e))
}

#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl MultipartForm {
    /// Lê o pedido inteiro. Só o campo `file_field` é tratado como ficheiro;
    /// um campo de ficheiro vazio conta como ausente.
    pub async fn read(mut multipart: Multipart, file_field: &str) -> AppResult<Self> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == file_field {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if !bytes.is_empty() {
                    form.file = Some(UploadedFile {
                        field: name,
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Valor de texto não vazio.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, name: &str) -> AppResult<&str> {
        self.text(name)
            .ok_or_else(|| AppError::InvalidInput(format!("Campo obrigatório: {}", name)))
    }

    /// Converte o campo, se presente.
    pub fn parsed<T: FromStr>(&self, name: &str) -> AppResult<Option<T>> {
        self.text(name)
            .map(|raw| {
                raw.parse::<T>().map_err(|_| {
                    AppError::InvalidInput(format!("Valor inválido para {}: '{}'", name, raw))
                })
            })
            .transpose()
    }
}
