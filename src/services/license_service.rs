// src/services/license_service.rs
//! Ciclo de vida das licenças AET.
//!
//! Rascunho → enviada (recebe o número `AET-<ano>-<id>`) → status livres
//! definidos pelo admin → liberada (só através da emissão do ficheiro).
//! Cada transição grava a licença e a atividade na mesma transação.
use crate::{
    error::{AppError, AppResult},
    models::{
        activity::NewActivity,
        license::{
            dedupe_states, format_license_number, validate_set_length, IssueMetadata, License,
            LicensePatch, LicenseStage, LicenseStatus, NewLicense,
        },
    },
    repositories::{
        license_repository::{self, LicenseInsert},
        vehicle_repository,
    },
    services::activity_service,
};
use chrono::{Months, Utc};
use sqlx::{SqliteConnection, SqlitePool};

// --- Validações ---

// Veículos referenciados têm de existir, pertencer ao dono e não se repetir
async fn ensure_vehicles_owned(
    conn: &mut SqliteConnection,
    owner_id: i64,
    ids: &[i64],
) -> AppResult<()> {
    for (pos, id) in ids.iter().enumerate() {
        if ids[..pos].contains(id) {
            return Err(AppError::InvalidInput(format!(
                "O veículo {} aparece mais de uma vez no conjunto",
                id
            )));
        }
        match vehicle_repository::get(&mut *conn, *id).await? {
            None => {
                return Err(AppError::InvalidInput(format!("Veículo {} não encontrado", id)));
            }
            Some(vehicle) if vehicle.user_id != owner_id => {
                tracing::warn!(
                    "Licença do user {} referencia veículo {} de outro dono.",
                    owner_id,
                    id
                );
                return Err(AppError::InvalidInput(format!(
                    "Veículo {} não pertence ao utilizador",
                    id
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

// Regras que só valem a partir do envio
fn ensure_submittable(license: &License) -> AppResult<()> {
    if license.states.is_empty() {
        return Err(AppError::InvalidInput(
            "Selecione pelo menos um estado".to_string(),
        ));
    }
    let allowed = license.set_type.allowed_roles();
    if let Some((role, _)) = license
        .filled_roles()
        .into_iter()
        .find(|(role, _)| !allowed.contains(role))
    {
        return Err(AppError::InvalidInput(format!(
            "O conjunto {} não utiliza {}",
            license.set_type.as_str(),
            role.label()
        )));
    }
    Ok(())
}

fn reject_direct_release(status: LicenseStatus) -> AppResult<()> {
    if status == LicenseStatus::Liberada {
        return Err(AppError::InvalidState(
            "A licença só é liberada com a emissão do ficheiro".to_string(),
        ));
    }
    Ok(())
}

// Carrega a licença e confirma o dono
async fn load_owned(conn: &mut SqliteConnection, id: i64, user_id: i64) -> AppResult<License> {
    let license = license_repository::get(conn, id).await?.ok_or(AppError::NotFound)?;
    if license.user_id != user_id {
        tracing::warn!("User {} tentou aceder à licença {} de outro dono.", user_id, id);
        return Err(AppError::Forbidden);
    }
    Ok(license)
}

// Grava o novo estado; o id foi lido na mesma transação, por isso tem de existir
async fn save(conn: &mut SqliteConnection, license: &License) -> AppResult<License> {
    license_repository::update(conn, license)
        .await?
        .ok_or(AppError::NotFound)
}

// --- Operações do dono ---

/// Cria uma licença, como rascunho (por omissão) ou já enviada.
pub async fn create_license(
    db_pool: &SqlitePool,
    input: NewLicense,
    owner_id: i64,
) -> AppResult<License> {
    let is_draft = input.is_draft.unwrap_or(true);
    let status = input.status.unwrap_or_default();
    reject_direct_release(status)?;
    validate_set_length(&input.set_length)?;

    let insert = LicenseInsert {
        set_type: input.set_type,
        primary_vehicle_id: input.primary_vehicle_id,
        first_trailer_id: input.first_trailer_id,
        dolly_id: input.dolly_id,
        second_trailer_id: input.second_trailer_id,
        set_length: input.set_length.trim().to_string(),
        states: dedupe_states(input.states),
        status,
    };

    let vehicle_ids: Vec<i64> = [insert.primary_vehicle_id]
        .into_iter()
        .chain(insert.first_trailer_id)
        .chain(insert.dolly_id)
        .chain(insert.second_trailer_id)
        .collect();

    let mut tx = db_pool.begin().await?;
    ensure_vehicles_owned(&mut tx, owner_id, &vehicle_ids).await?;
    let draft = license_repository::create(&mut tx, owner_id, &insert).await?;

    if is_draft {
        tx.commit().await?;
        tracing::info!("Rascunho de licença {} criado por user {}.", draft.id, owner_id);
        return Ok(draft);
    }

    ensure_submittable(&draft)?;
    let submitted = License {
        stage: LicenseStage::Submitted {
            license_number: format_license_number(draft.id, Utc::now()),
            status,
        },
        ..draft
    };
    let license = save(&mut tx, &submitted).await?;
    activity_service::record(
        &mut tx,
        NewActivity::for_license(
            license.id,
            owner_id,
            format!("Nova licença solicitada - {}", license.set_type.as_str()),
        ),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        "📨 Licença {} enviada diretamente por user {}.",
        license.display_ref(),
        owner_id
    );
    Ok(license)
}

/// Atualização pelo dono: edição de campos, envio do rascunho e/ou mudança de status.
pub async fn update_license(
    db_pool: &SqlitePool,
    id: i64,
    patch: LicensePatch,
    requesting_user_id: i64,
) -> AppResult<License> {
    if let Some(status) = patch.status {
        reject_direct_release(status)?;
    }
    if let Some(set_length) = patch.set_length.as_deref() {
        validate_set_length(set_length)?;
    }

    let mut tx = db_pool.begin().await?;
    let existing = load_owned(&mut tx, id, requesting_user_id).await?;

    if existing.is_issued() {
        return Err(AppError::InvalidState(
            "Licença liberada não pode ser alterada".to_string(),
        ));
    }
    if patch.is_draft == Some(true) && !existing.is_draft() {
        return Err(AppError::InvalidState(
            "Licença já enviada não pode voltar a rascunho".to_string(),
        ));
    }

    let submitting = existing.is_draft() && patch.is_draft == Some(false);
    let old_status = existing.status();
    let new_status = patch.status.unwrap_or(old_status);

    // Merge: só os campos enviados mudam
    let mut merged = existing.clone();
    if let Some(set_type) = patch.set_type {
        merged.set_type = set_type;
    }
    if let Some(primary) = patch.primary_vehicle_id {
        merged.primary_vehicle_id = primary;
    }
    if let Some(first_trailer) = patch.first_trailer_id {
        merged.first_trailer_id = first_trailer;
    }
    if let Some(dolly) = patch.dolly_id {
        merged.dolly_id = dolly;
    }
    if let Some(second_trailer) = patch.second_trailer_id {
        merged.second_trailer_id = second_trailer;
    }
    if let Some(set_length) = patch.set_length {
        merged.set_length = set_length.trim().to_string();
    }
    if let Some(states) = patch.states {
        merged.states = dedupe_states(states);
    }

    merged.stage = match existing.stage.clone() {
        LicenseStage::Draft { .. } if submitting => LicenseStage::Submitted {
            license_number: format_license_number(existing.id, Utc::now()),
            status: new_status,
        },
        LicenseStage::Draft { .. } => LicenseStage::Draft { status: new_status },
        LicenseStage::Submitted { license_number, .. } => LicenseStage::Submitted {
            license_number,
            status: new_status,
        },
        LicenseStage::Issued { .. } => {
            return Err(AppError::InvalidState(
                "Licença liberada não pode ser alterada".to_string(),
            ));
        }
    };

    ensure_vehicles_owned(&mut tx, merged.user_id, &merged.vehicle_ids()).await?;
    if !merged.is_draft() {
        ensure_submittable(&merged)?;
    }

    let license = save(&mut tx, &merged).await?;

    if submitting {
        activity_service::record(
            &mut tx,
            NewActivity::for_license(
                license.id,
                requesting_user_id,
                format!("Licença {} enviada para processamento", license.set_type.as_str()),
            ),
        )
        .await?;
    }
    if new_status != old_status {
        activity_service::record(
            &mut tx,
            NewActivity::for_license(
                license.id,
                requesting_user_id,
                format!(
                    "Licença {} mudou de status para: {}",
                    existing.display_ref(),
                    new_status.as_str()
                ),
            ),
        )
        .await?;
    }

    tx.commit().await?;
    tracing::info!("Licença {} atualizada por user {}.", id, requesting_user_id);
    Ok(license)
}

/// Apaga um rascunho do próprio utilizador.
pub async fn delete_license(
    db_pool: &SqlitePool,
    id: i64,
    requesting_user_id: i64,
) -> AppResult<()> {
    let mut tx = db_pool.begin().await?;
    let existing = load_owned(&mut tx, id, requesting_user_id).await?;

    if !existing.is_draft() {
        return Err(AppError::InvalidState(
            "Apenas licenças em rascunho podem ser excluídas".to_string(),
        ));
    }

    if !license_repository::delete(&mut tx, id).await? {
        return Err(AppError::NotFound);
    }
    tx.commit().await?;
    tracing::info!("🗑️ Rascunho {} excluído por user {}.", id, requesting_user_id);
    Ok(())
}

/// Licença visível pelo dono ou por um admin.
pub async fn get_license(
    db_pool: &SqlitePool,
    id: i64,
    user_id: i64,
    is_admin: bool,
) -> AppResult<License> {
    let mut conn = db_pool.acquire().await?;
    let license = license_repository::get(&mut conn, id)
        .await?
        .ok_or(AppError::NotFound)?;
    if license.user_id != user_id && !is_admin {
        return Err(AppError::Forbidden);
    }
    Ok(license)
}

// --- Projeções de leitura ---

async fn owned_licenses(db_pool: &SqlitePool, owner_id: i64) -> AppResult<Vec<License>> {
    let mut conn = db_pool.acquire().await?;
    license_repository::list_by_owner(&mut conn, owner_id).await
}

pub async fn list_drafts(db_pool: &SqlitePool, owner_id: i64) -> AppResult<Vec<License>> {
    let mut licenses = owned_licenses(db_pool, owner_id).await?;
    licenses.retain(License::is_draft);
    Ok(licenses)
}

/// Enviadas e ainda não liberadas.
pub async fn list_in_progress(db_pool: &SqlitePool, owner_id: i64) -> AppResult<Vec<License>> {
    let mut licenses = owned_licenses(db_pool, owner_id).await?;
    licenses.retain(|l| !l.is_draft() && !l.is_issued());
    Ok(licenses)
}

pub async fn list_completed(db_pool: &SqlitePool, owner_id: i64) -> AppResult<Vec<License>> {
    let mut licenses = owned_licenses(db_pool, owner_id).await?;
    licenses.retain(License::is_issued);
    Ok(licenses)
}

/// Vista do admin: todas as licenças enviadas, com filtro opcional por status.
pub async fn list_all(
    db_pool: &SqlitePool,
    status_filter: Option<LicenseStatus>,
) -> AppResult<Vec<License>> {
    let mut conn = db_pool.acquire().await?;
    let licenses = license_repository::list_submitted(&mut conn, status_filter).await?;
    tracing::debug!("Admin: {} licenças (filtro {:?}).", licenses.len(), status_filter);
    Ok(licenses)
}

// --- Operações de admin ---

/// Muda o status de uma licença enviada. "Liberada" fica reservada à emissão.
pub async fn set_status(
    db_pool: &SqlitePool,
    license_id: i64,
    new_status: &str,
    acting_user_id: i64,
) -> AppResult<License> {
    let new_status: LicenseStatus = new_status.parse()?;
    reject_direct_release(new_status)?;

    let mut tx = db_pool.begin().await?;
    let existing = license_repository::get(&mut tx, license_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let license_number = match &existing.stage {
        LicenseStage::Submitted { license_number, .. } => license_number.clone(),
        LicenseStage::Draft { .. } => {
            return Err(AppError::InvalidState(
                "Rascunhos não têm status de processamento".to_string(),
            ));
        }
        LicenseStage::Issued { .. } => {
            return Err(AppError::InvalidState(
                "Licença já liberada".to_string(),
            ));
        }
    };

    let updated = License {
        stage: LicenseStage::Submitted {
            license_number,
            status: new_status,
        },
        ..existing.clone()
    };
    let license = save(&mut tx, &updated).await?;
    activity_service::record(
        &mut tx,
        NewActivity::for_license(
            license.id,
            acting_user_id,
            format!(
                "Status da licença {} alterado para: {}",
                existing.display_ref(),
                new_status.as_str()
            ),
        ),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        "Admin {} mudou licença {} de '{}' para '{}'.",
        acting_user_id,
        license_id,
        existing.status().as_str(),
        new_status.as_str()
    );
    Ok(license)
}

/// Emite a licença: anexa o ficheiro, define as datas e marca como liberada,
/// tudo numa só escrita.
pub async fn issue_file(
    db_pool: &SqlitePool,
    license_id: i64,
    file_path: String,
    metadata: IssueMetadata,
    acting_user_id: i64,
) -> AppResult<License> {
    if file_path.trim().is_empty() {
        return Err(AppError::InvalidInput("Nenhum arquivo enviado".to_string()));
    }

    let issue_date = metadata.issue_date.unwrap_or_else(Utc::now);
    let expiration_date = match metadata.expiration_date {
        Some(date) => date,
        None => issue_date
            .checked_add_months(Months::new(12))
            .ok_or_else(|| AppError::InvalidInput("Data de emissão inválida".to_string()))?,
    };
    if expiration_date <= issue_date {
        return Err(AppError::InvalidInput(
            "A data de validade deve ser posterior à data de emissão".to_string(),
        ));
    }

    let mut tx = db_pool.begin().await?;
    let existing = license_repository::get(&mut tx, license_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let license_number = match &existing.stage {
        LicenseStage::Submitted { license_number, .. } => license_number.clone(),
        LicenseStage::Draft { .. } => {
            return Err(AppError::InvalidState(
                "Rascunhos não podem ser emitidos".to_string(),
            ));
        }
        LicenseStage::Issued { .. } => {
            return Err(AppError::InvalidState("Licença já liberada".to_string()));
        }
    };
    // O número atribuído no envio nunca muda
    if let Some(supplied) = metadata.license_number.as_deref() {
        if supplied != license_number {
            tracing::debug!(
                "Número '{}' enviado na emissão ignorado; licença já tem '{}'.",
                supplied,
                license_number
            );
        }
    }

    let issued = License {
        stage: LicenseStage::Issued {
            license_number,
            file_url: file_path,
            issue_date,
            expiration_date,
        },
        ..existing
    };
    let license = save(&mut tx, &issued).await?;
    activity_service::record(
        &mut tx,
        NewActivity::for_license(
            license.id,
            acting_user_id,
            format!("Licença {} emitida e disponibilizada", license.display_ref()),
        ),
    )
    .await?;
    tx.commit().await?;

    tracing::info!("✅ Licença {} emitida por admin {}.", license.display_ref(), acting_user_id);
    Ok(license)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        models::{
            license::{Jurisdiction, LicenseSetType},
            vehicle::VehicleType,
        },
        test_support::{seed_user, seed_vehicle},
    };
    use chrono::{Datelike, Duration, TimeZone};

    struct Fixture {
        pool: SqlitePool,
        owner_id: i64,
        admin_id: i64,
        tractor_id: i64,
        trailer_id: i64,
    }

    async fn fixture() -> Fixture {
        let pool = db::test_pool().await;
        let admin = seed_user(&pool, "admin@aet.com", true).await;
        let owner = seed_user(&pool, "dono@frota.com", false).await;
        let tractor = seed_vehicle(&pool, owner.id, "AAA1A11", VehicleType::UnidadeTratora).await;
        let trailer = seed_vehicle(&pool, owner.id, "BBB2B22", VehicleType::Prancha).await;
        Fixture {
            pool,
            owner_id: owner.id,
            admin_id: admin.id,
            tractor_id: tractor.id,
            trailer_id: trailer.id,
        }
    }

    fn prancha(primary: i64, states: Vec<Jurisdiction>, is_draft: Option<bool>) -> NewLicense {
        NewLicense {
            set_type: LicenseSetType::Prancha,
            primary_vehicle_id: primary,
            first_trailer_id: None,
            dolly_id: None,
            second_trailer_id: None,
            set_length: "22,40".into(),
            states,
            is_draft,
            status: None,
        }
    }

    fn submit() -> LicensePatch {
        LicensePatch {
            is_draft: Some(false),
            ..Default::default()
        }
    }

    async fn submitted_license(f: &Fixture) -> License {
        create_license(
            &f.pool,
            prancha(f.tractor_id, vec![Jurisdiction::Sp], Some(false)),
            f.owner_id,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn draft_with_empty_states_then_submission() {
        let f = fixture().await;

        let draft = create_license(&f.pool, prancha(f.tractor_id, vec![], None), f.owner_id)
            .await
            .unwrap();
        assert!(draft.is_draft());
        assert_eq!(draft.status(), LicenseStatus::PendenteCadastro);
        assert_eq!(draft.license_number(), None);
        assert_eq!(draft.id, 1);

        // Envio com estados vazios é recusado e nada muda
        let err = update_license(&f.pool, draft.id, submit(), f.owner_id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(list_drafts(&f.pool, f.owner_id).await.unwrap()[0].is_draft());

        let with_states = LicensePatch {
            states: Some(vec![Jurisdiction::Sp, Jurisdiction::Mg]),
            ..Default::default()
        };
        update_license(&f.pool, draft.id, with_states, f.owner_id).await.unwrap();
        let submitted = update_license(&f.pool, draft.id, submit(), f.owner_id).await.unwrap();

        assert!(!submitted.is_draft());
        assert_eq!(
            submitted.license_number(),
            Some(format!("AET-{}-0001", Utc::now().year()).as_str())
        );
        assert_eq!(submitted.states, vec![Jurisdiction::Sp, Jurisdiction::Mg]);

        let activities = activity_service::list_recent(&f.pool, f.owner_id, None).await.unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].description, "Licença Prancha enviada para processamento");
        assert_eq!(activities[0].license_id, Some(draft.id));
    }

    #[tokio::test]
    async fn license_number_is_stable_after_submission() {
        let f = fixture().await;
        let license = submitted_license(&f).await;
        let number = license.license_number().map(str::to_string);
        assert!(number.is_some());

        // Reenviar não gera outro número nem outra atividade de envio
        let again = update_license(&f.pool, license.id, submit(), f.owner_id).await.unwrap();
        assert_eq!(again.license_number().map(str::to_string), number);

        let edit = LicensePatch {
            set_length: Some("23".into()),
            status: Some(LicenseStatus::CadastroEmAndamento),
            ..Default::default()
        };
        let edited = update_license(&f.pool, license.id, edit, f.owner_id).await.unwrap();
        assert_eq!(edited.license_number().map(str::to_string), number);
        assert_eq!(edited.set_length, "23");

        let back_to_draft = LicensePatch {
            is_draft: Some(true),
            ..Default::default()
        };
        assert!(matches!(
            update_license(&f.pool, license.id, back_to_draft, f.owner_id).await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn direct_submission_logs_new_request() {
        let f = fixture().await;
        let license = submitted_license(&f).await;
        assert_eq!(list_in_progress(&f.pool, f.owner_id).await.unwrap().len(), 1);

        let activities = activity_service::list_recent(&f.pool, f.owner_id, None).await.unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].description, "Nova licença solicitada - Prancha");
        assert_eq!(activities[0].license_id, Some(license.id));
    }

    #[tokio::test]
    async fn direct_submission_without_states_is_rejected_and_rolled_back() {
        let f = fixture().await;
        let err = create_license(&f.pool, prancha(f.tractor_id, vec![], Some(false)), f.owner_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(list_drafts(&f.pool, f.owner_id).await.unwrap().is_empty());
        assert!(list_in_progress(&f.pool, f.owner_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn owner_status_change_is_logged_with_old_reference() {
        let f = fixture().await;
        let license = submitted_license(&f).await;
        let number = license.display_ref();

        let patch = LicensePatch {
            status: Some(LicenseStatus::CadastroEmAndamento),
            ..Default::default()
        };
        update_license(&f.pool, license.id, patch, f.owner_id).await.unwrap();

        let latest = activity_service::list_recent(&f.pool, f.owner_id, Some(1)).await.unwrap();
        assert_eq!(
            latest[0].description,
            format!("Licença {} mudou de status para: Cadastro em Andamento", number)
        );

        let release = LicensePatch {
            status: Some(LicenseStatus::Liberada),
            ..Default::default()
        };
        assert!(matches!(
            update_license(&f.pool, license.id, release, f.owner_id).await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn foreign_users_are_forbidden() {
        let f = fixture().await;
        let intruder = seed_user(&f.pool, "intruso@frota.com", false).await;
        let license = submitted_license(&f).await;

        assert!(matches!(
            update_license(&f.pool, license.id, LicensePatch::default(), intruder.id).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            delete_license(&f.pool, license.id, intruder.id).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            get_license(&f.pool, license.id, intruder.id, false).await,
            Err(AppError::Forbidden)
        ));
        // Admin vê qualquer licença
        assert!(get_license(&f.pool, license.id, f.admin_id, true).await.is_ok());
        assert!(matches!(
            update_license(&f.pool, 404, LicensePatch::default(), f.owner_id).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn vehicles_must_belong_to_owner() {
        let f = fixture().await;
        let other = seed_user(&f.pool, "outro@frota.com", false).await;
        let foreign = seed_vehicle(&f.pool, other.id, "ZZZ9Z99", VehicleType::UnidadeTratora).await;

        assert!(matches!(
            create_license(&f.pool, prancha(foreign.id, vec![], None), f.owner_id).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            create_license(&f.pool, prancha(9999, vec![], None), f.owner_id).await,
            Err(AppError::InvalidInput(_))
        ));

        let mut repeated = prancha(f.tractor_id, vec![], None);
        repeated.first_trailer_id = Some(f.tractor_id);
        assert!(matches!(
            create_license(&f.pool, repeated, f.owner_id).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn submission_rejects_roles_the_set_type_does_not_use() {
        let f = fixture().await;
        let dolly = seed_vehicle(&f.pool, f.owner_id, "DDD4D44", VehicleType::Dolly).await;

        let mut with_dolly = prancha(f.tractor_id, vec![Jurisdiction::Go], None);
        with_dolly.first_trailer_id = Some(f.trailer_id);
        with_dolly.dolly_id = Some(dolly.id);
        // Como rascunho é aceite
        let draft = create_license(&f.pool, with_dolly, f.owner_id).await.unwrap();

        assert!(matches!(
            update_license(&f.pool, draft.id, submit(), f.owner_id).await,
            Err(AppError::InvalidInput(_))
        ));

        // Sem o dolly o envio passa
        let fix = LicensePatch {
            dolly_id: Some(None),
            is_draft: Some(false),
            ..Default::default()
        };
        let submitted = update_license(&f.pool, draft.id, fix, f.owner_id).await.unwrap();
        assert_eq!(submitted.dolly_id, None);
        assert_eq!(submitted.first_trailer_id, Some(f.trailer_id));
    }

    #[tokio::test]
    async fn only_drafts_can_be_deleted() {
        let f = fixture().await;
        let draft = create_license(&f.pool, prancha(f.tractor_id, vec![], None), f.owner_id)
            .await
            .unwrap();
        let submitted = submitted_license(&f).await;

        assert!(matches!(
            delete_license(&f.pool, submitted.id, f.owner_id).await,
            Err(AppError::InvalidState(_))
        ));
        delete_license(&f.pool, draft.id, f.owner_id).await.unwrap();
        assert!(matches!(
            get_license(&f.pool, draft.id, f.owner_id, false).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn admin_status_change_then_issuance() {
        let f = fixture().await;
        let license = submitted_license(&f).await;

        let updated = set_status(&f.pool, license.id, "Análise do Órgão", f.admin_id)
            .await
            .unwrap();
        assert_eq!(updated.status(), LicenseStatus::AnaliseDoOrgao);
        assert_eq!(updated.license_file_url(), None);

        let admin_log = activity_service::list_recent(&f.pool, f.admin_id, None).await.unwrap();
        assert_eq!(admin_log.len(), 1);
        assert_eq!(
            admin_log[0].description,
            format!(
                "Status da licença {} alterado para: Análise do Órgão",
                license.display_ref()
            )
        );

        let before = Utc::now();
        let issued = issue_file(
            &f.pool,
            license.id,
            "/uploads/x.pdf".into(),
            IssueMetadata::default(),
            f.admin_id,
        )
        .await
        .unwrap();
        assert_eq!(issued.status(), LicenseStatus::Liberada);
        assert_eq!(issued.license_file_url(), Some("/uploads/x.pdf"));
        assert_eq!(issued.license_number(), license.license_number());
        let issue_date = issued.issue_date().unwrap();
        assert!(issue_date >= before && issue_date <= Utc::now());
        assert_eq!(
            issued.expiration_date(),
            issue_date.checked_add_months(Months::new(12))
        );

        let admin_log = activity_service::list_recent(&f.pool, f.admin_id, Some(1)).await.unwrap();
        assert_eq!(
            admin_log[0].description,
            format!("Licença {} emitida e disponibilizada", license.display_ref())
        );

        let completed = list_completed(&f.pool, f.owner_id).await.unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, license.id);
        assert!(list_in_progress(&f.pool, f.owner_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_status_validates_value_and_stage() {
        let f = fixture().await;
        let draft = create_license(&f.pool, prancha(f.tractor_id, vec![], None), f.owner_id)
            .await
            .unwrap();
        let license = submitted_license(&f).await;

        assert!(matches!(
            set_status(&f.pool, license.id, "Aprovada", f.admin_id).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            set_status(&f.pool, license.id, "Liberada", f.admin_id).await,
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            set_status(&f.pool, 404, "Análise do Órgão", f.admin_id).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            set_status(&f.pool, draft.id, "Análise do Órgão", f.admin_id).await,
            Err(AppError::InvalidState(_))
        ));

        // Reprovado é só mais um status; a licença pode voltar a andar
        set_status(&f.pool, license.id, "Reprovado – Pendência de Documentação", f.admin_id)
            .await
            .unwrap();
        let resumed = set_status(&f.pool, license.id, "Cadastro em Andamento", f.admin_id)
            .await
            .unwrap();
        assert_eq!(resumed.status(), LicenseStatus::CadastroEmAndamento);
    }

    #[tokio::test]
    async fn issuance_uses_supplied_dates_and_is_terminal() {
        let f = fixture().await;
        let license = submitted_license(&f).await;
        let issue = Utc.with_ymd_and_hms(2025, 2, 10, 0, 0, 0).unwrap();
        let expiry = issue + Duration::days(180);

        let issued = issue_file(
            &f.pool,
            license.id,
            "/uploads/licenseFile-1.pdf".into(),
            IssueMetadata {
                license_number: Some("OUTRO-NUMERO".into()),
                issue_date: Some(issue),
                expiration_date: Some(expiry),
            },
            f.admin_id,
        )
        .await
        .unwrap();
        assert_eq!(issued.issue_date(), Some(issue));
        assert_eq!(issued.expiration_date(), Some(expiry));
        assert_eq!(issued.license_number(), license.license_number());

        assert!(matches!(
            set_status(&f.pool, license.id, "Análise do Órgão", f.admin_id).await,
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            issue_file(
                &f.pool,
                license.id,
                "/uploads/y.pdf".into(),
                IssueMetadata::default(),
                f.admin_id,
            )
            .await,
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            update_license(&f.pool, license.id, LicensePatch::default(), f.owner_id).await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn issuance_rejects_drafts_and_bad_dates() {
        let f = fixture().await;
        let draft = create_license(&f.pool, prancha(f.tractor_id, vec![], None), f.owner_id)
            .await
            .unwrap();
        assert!(matches!(
            issue_file(
                &f.pool,
                draft.id,
                "/uploads/x.pdf".into(),
                IssueMetadata::default(),
                f.admin_id,
            )
            .await,
            Err(AppError::InvalidState(_))
        ));

        let license = submitted_license(&f).await;
        let issue = Utc::now();
        let backwards = IssueMetadata {
            license_number: None,
            issue_date: Some(issue),
            expiration_date: Some(issue - Duration::days(1)),
        };
        assert!(matches!(
            issue_file(&f.pool, license.id, "/uploads/x.pdf".into(), backwards, f.admin_id).await,
            Err(AppError::InvalidInput(_))
        ));
        // Nada foi escrito
        let reloaded = get_license(&f.pool, license.id, f.owner_id, false).await.unwrap();
        assert!(!reloaded.is_issued());
        assert_eq!(reloaded.license_file_url(), None);
    }

    #[tokio::test]
    async fn projections_partition_owner_licenses() {
        let f = fixture().await;
        let other = seed_user(&f.pool, "outro@frota.com", false).await;
        let other_tractor =
            seed_vehicle(&f.pool, other.id, "OOO0O00", VehicleType::UnidadeTratora).await;

        create_license(&f.pool, prancha(f.tractor_id, vec![], None), f.owner_id).await.unwrap();
        let a = submitted_license(&f).await;
        let b = submitted_license(&f).await;
        let foreign = prancha(other_tractor.id, vec![Jurisdiction::Rj], Some(false));
        create_license(&f.pool, foreign, other.id).await.unwrap();
        issue_file(&f.pool, b.id, "/uploads/b.pdf".into(), IssueMetadata::default(), f.admin_id)
            .await
            .unwrap();

        let drafts = list_drafts(&f.pool, f.owner_id).await.unwrap();
        let in_progress = list_in_progress(&f.pool, f.owner_id).await.unwrap();
        let completed = list_completed(&f.pool, f.owner_id).await.unwrap();

        let mut ids: Vec<i64> = drafts
            .iter()
            .chain(&in_progress)
            .chain(&completed)
            .map(|l| l.id)
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total, "projeções não podem sobrepor-se");
        assert_eq!(total, 3);
        assert_eq!(in_progress[0].id, a.id);
        assert_eq!(completed[0].id, b.id);

        // Admin: nunca rascunhos, filtro por status
        assert_eq!(list_all(&f.pool, None).await.unwrap().len(), 3);
        let released = list_all(&f.pool, Some(LicenseStatus::Liberada)).await.unwrap();
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].id, b.id);
    }
}
