use crate::cli::{Command, ContestCommand};
use app_state::AppSettings;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use common_services::context::ServiceContext;
use common_services::database::FacialArea;
use common_services::embedding_client::{Embedder, HttpEmbeddingClient, ImageUpload};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedOutput {
    dimensions: usize,
    magnitude: f64,
    facial_area: Option<FacialArea>,
    facial_confidence: Option<f64>,
    embedding: Vec<f64>,
}

/// Reads an image file into an upload named after the file.
pub async fn read_image(path: &Path) -> Result<ImageUpload> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| eyre!("{} is not a file path", path.display()))?;
    let bytes = tokio::fs::read(path).await?;
    Ok(ImageUpload::new(file_name, bytes))
}

fn storage_path_for(path: &Path, storage_path: Option<String>) -> String {
    storage_path.unwrap_or_else(|| path.display().to_string())
}

/// `embed` only talks to the embedding service, so it runs without stores.
pub async fn embed(settings: &AppSettings, path: &Path) -> Result<Value> {
    let client = HttpEmbeddingClient::new(&settings.embedding_service)?;
    let result = client.embed(&read_image(path).await?).await?;
    Ok(serde_json::to_value(EmbedOutput {
        dimensions: result.embedding.as_slice().len(),
        magnitude: result.embedding.magnitude(),
        facial_area: result.facial_area,
        facial_confidence: result.facial_confidence,
        embedding: result.embedding.to_vec(),
    })?)
}

pub async fn run(command: Command, ctx: &ServiceContext, settings: &AppSettings) -> Result<Value> {
    let value = match command {
        Command::Embed { image } => embed(settings, &image).await?,
        Command::Upload {
            user,
            image,
            storage_path,
        } => {
            let upload = read_image(&image).await?;
            let photo = ctx
                .photos
                .register(Some(user), &storage_path_for(&image, storage_path), &upload)
                .await?;
            info!("Uploaded {} as photo {}", image.display(), photo.id);
            serde_json::to_value(photo)?
        }
        Command::Profile { user, photo } => {
            serde_json::to_value(ctx.photos.set_profile_photo(user, &photo).await?)?
        }
        Command::Compare { photo_a, photo_b } => {
            serde_json::to_value(ctx.similarity.compare_photos(&photo_a, &photo_b).await?)?
        }
        Command::CompareUsers { user_a, user_b } => {
            serde_json::to_value(ctx.similarity.compare_users(user_a, user_b).await?)?
        }
        Command::Friends { user, friends } => {
            serde_json::to_value(ctx.similarity.rank_friends(user, &friends).await?)?
        }
        Command::Lookalikes {
            photo,
            collection,
            k,
        } => serde_json::to_value(
            ctx.similarity
                .find_lookalikes(&photo, collection, k)
                .await?,
        )?,
        Command::Contest(command) => run_contest(command, ctx).await?,
    };
    Ok(value)
}

async fn run_contest(command: ContestCommand, ctx: &ServiceContext) -> Result<Value> {
    let contests = &ctx.contests;
    let value = match command {
        ContestCommand::Create {
            name,
            image,
            storage_path,
        } => {
            let upload = read_image(&image).await?;
            let contest = contests
                .create_contest(&name, &storage_path_for(&image, storage_path), &upload)
                .await?;
            serde_json::to_value(contest)?
        }
        ContestCommand::Status { contest, status } => {
            serde_json::to_value(contests.set_status(&contest, status).await?)?
        }
        ContestCommand::Submit {
            contest,
            user,
            photo,
        } => serde_json::to_value(contests.submit_entry(&contest, user, &photo).await?)?,
        ContestCommand::Rank { contest } => {
            serde_json::to_value(contests.rank_entries(&contest).await?)?
        }
        ContestCommand::Standings { contest } => {
            serde_json::to_value(contests.standings(&contest).await?)?
        }
        ContestCommand::Show { contest } => {
            serde_json::to_value(contests.get_contest(&contest).await?)?
        }
    };
    Ok(value)
}
