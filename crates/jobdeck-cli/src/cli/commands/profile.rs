//! Profile command handler.

use anyhow::Result;
use jobdeck_core::api::types::ProfileUpdate;

use super::Controller;

pub async fn update(
    controller: &Controller,
    name: Option<String>,
    headline: Option<String>,
    location: Option<String>,
) -> Result<()> {
    if controller.session().user().is_none() {
        anyhow::bail!("Not logged in. Run `jobdeck login` first.");
    }
    if name.is_none() && headline.is_none() && location.is_none() {
        anyhow::bail!("Nothing to update. Pass --name, --headline, or --location.");
    }

    let update = ProfileUpdate {
        name,
        headline,
        location,
    };
    let user = controller.update_profile(&update).await?;

    println!("✓ Profile updated for {}", user.name);
    if let Some(headline) = user.headline.as_deref() {
        println!("  headline: {headline}");
    }
    if let Some(location) = user.location.as_deref() {
        println!("  location: {location}");
    }
    Ok(())
}
