//! Favorite toggle command handler.

use anyhow::Result;
use jobdeck_core::sync::favorites::FavoriteSet;

use super::Controller;

pub async fn toggle(controller: &Controller, job_id: i64) -> Result<()> {
    let Some(user) = controller.session().user() else {
        anyhow::bail!("Not logged in. Run `jobdeck login` first.");
    };

    let favorites = FavoriteSet::new();
    let favorited = favorites
        .toggle(controller.api(), user.id, job_id)
        .await
        .map_err(|err| anyhow::anyhow!("Favorite toggle failed, nothing changed: {err}"))?;

    if favorited {
        println!("✓ Job #{job_id} added to favorites");
    } else {
        println!("✓ Job #{job_id} removed from favorites");
    }
    Ok(())
}
