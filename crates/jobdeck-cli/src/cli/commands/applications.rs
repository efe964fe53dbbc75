//! Application status command handler.

use anyhow::Result;
use jobdeck_core::api::types::ApplicationStatus;
use jobdeck_core::sync::applications::ApplicationStatusStore;

use super::Controller;

pub async fn set_status(
    controller: &Controller,
    application_id: i64,
    status: ApplicationStatus,
) -> Result<()> {
    if controller.session().user().is_none() {
        anyhow::bail!("Not logged in. Run `jobdeck login` first.");
    }

    let store = ApplicationStatusStore::new();
    let confirmed = store
        .set_status(controller.api(), application_id, status)
        .await
        .map_err(|err| anyhow::anyhow!("Status change failed, nothing changed: {err}"))?;

    if confirmed == status {
        println!("✓ Application #{application_id} is now {}", confirmed.as_str());
    } else {
        // The server holds the authoritative value.
        println!(
            "✓ Application #{application_id} recorded as {} by the server",
            confirmed.as_str()
        );
    }
    Ok(())
}
